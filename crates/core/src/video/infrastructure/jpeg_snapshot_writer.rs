use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbImage;

use crate::shared::frame::Frame;
use crate::video::domain::snapshot_writer::SnapshotWriter;

/// Writes visitor sample images as JPEG files named by capture time.
///
/// Filenames carry millisecond precision plus a running counter, so two
/// enrollments in the same millisecond still get distinct paths.
pub struct JpegSnapshotWriter {
    dir: PathBuf,
    counter: u64,
}

impl JpegSnapshotWriter {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            counter: 0,
        }
    }
}

impl SnapshotWriter for JpegSnapshotWriter {
    fn save(&mut self, frame: &Frame) -> Result<PathBuf, Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }
        let image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("frame buffer does not match its dimensions")?;

        fs::create_dir_all(&self.dir)?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.counter += 1;
        let path = self
            .dir
            .join(format!("visitor_{millis}_{:04}.jpg", self.counter));

        image.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_jpeg_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JpegSnapshotWriter::new(dir.path());

        let frame = Frame::new(vec![200u8; 32 * 24 * 3], 32, 24, 3, 0);
        let path = writer.save(&frame).unwrap();

        assert!(path.is_file());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.width(), 32);
        assert_eq!(reloaded.height(), 24);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("snapshots/today");
        let mut writer = JpegSnapshotWriter::new(&nested);

        let frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 3, 0);
        let path = writer.save(&frame).unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.is_file());
    }

    #[test]
    fn test_consecutive_saves_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JpegSnapshotWriter::new(dir.path());

        let frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 3, 0);
        let a = writer.save(&frame).unwrap();
        let b = writer.save(&frame).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_non_rgb_frame_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JpegSnapshotWriter::new(dir.path());

        let frame = Frame::new(vec![0u8; 8 * 8], 8, 8, 1, 0);
        assert!(writer.save(&frame).is_err());
    }
}
