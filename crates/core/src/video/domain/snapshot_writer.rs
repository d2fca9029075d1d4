use std::path::PathBuf;

use crate::shared::frame::Frame;

/// Persists a sample image for a newly enrolled visitor.
///
/// Returns the path the image was written to so the store can reference
/// it. Failures are reported, not swallowed; the caller decides whether
/// enrollment proceeds without a sample.
pub trait SnapshotWriter: Send {
    fn save(&mut self, frame: &Frame) -> Result<PathBuf, Box<dyn std::error::Error>>;
}
