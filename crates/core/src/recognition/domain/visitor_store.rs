use std::path::Path;

use crate::recognition::domain::embedding::Embedding;
use crate::recognition::domain::identity_matcher::VisitorId;

/// Durable record of identities and visit counts.
///
/// Records carry first-seen/last-seen timestamps and a running visit count,
/// mutated only through these operations.
pub trait VisitorStore: Send {
    /// Enrolls a new visitor, optionally with a sample image path.
    /// Returns the assigned id.
    fn create(
        &mut self,
        embedding: &Embedding,
        sample_path: Option<&Path>,
    ) -> Result<VisitorId, Box<dyn std::error::Error>>;

    /// Records a repeat visit: bumps the visit count and last-seen time.
    fn record_visit(&mut self, id: VisitorId) -> Result<(), Box<dyn std::error::Error>>;

    /// All enrolled identities with their embeddings, for cache loading.
    fn list_all(&self) -> Result<Vec<(VisitorId, Embedding)>, Box<dyn std::error::Error>>;

    /// Number of unique visitors enrolled.
    fn count(&self) -> Result<u64, Box<dyn std::error::Error>>;
}
