//! Diagnostic artifacts for threshold tuning.
//!
//! When debug output is enabled the run writes annotated frames (green
//! boxes around scored faces) and a JSON report of per-capture score
//! breakdowns, so operators can see why a deployment over- or
//! under-counts before touching thresholds.

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::quality::domain::quality_score::QualityScore;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const BOX_THICKNESS: u32 = 2;

#[derive(Debug, Serialize)]
pub struct CaptureRecord {
    pub frame_index: usize,
    pub outcome: String,
    pub score: QualityScore,
}

/// Accumulates per-capture diagnostics over a run.
#[derive(Debug, Default, Serialize)]
pub struct DebugReport {
    pub captures: Vec<CaptureRecord>,
}

impl DebugReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, frame_index: usize, outcome: &str, score: QualityScore) {
        self.captures.push(CaptureRecord {
            frame_index,
            outcome: outcome.to_string(),
            score,
        });
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn write(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// Owns debug output for one run: annotated frames plus the JSON report.
///
/// File write failures are logged and swallowed so a full disk never
/// stops counting.
pub struct DebugSession {
    dir: std::path::PathBuf,
    report: DebugReport,
}

impl DebugSession {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            report: DebugReport::new(),
        }
    }

    /// Records one scored face and writes the annotated frame image.
    pub fn record(&mut self, frame: &Frame, outcome: &str, score: &QualityScore) {
        self.report.record(frame.index(), outcome, score.clone());

        let Some(image) = annotate_frame(frame, &[score.bbox]) else {
            return;
        };
        if let Err(e) = fs::create_dir_all(&self.dir) {
            log::warn!("debug dir create failed: {e}");
            return;
        }
        let path = self.dir.join(format!("frame_{:06}.jpg", frame.index()));
        if let Err(e) = image.save(&path) {
            log::warn!("debug frame write failed: {e}");
        }
    }

    /// Writes the accumulated report to `report.json` in the debug dir.
    pub fn finish(&self) {
        let path = self.dir.join("report.json");
        if let Err(e) = self.report.write(&path) {
            log::warn!("debug report write failed: {e}");
        }
    }

    pub fn report(&self) -> &DebugReport {
        &self.report
    }
}

/// Renders a frame with boxes around the given regions.
///
/// Returns `None` if the frame is not 3-channel RGB.
pub fn annotate_frame(frame: &Frame, regions: &[FaceRegion]) -> Option<RgbImage> {
    if frame.channels() != 3 {
        return None;
    }
    let mut image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())?;
    for region in regions {
        draw_box(&mut image, region);
    }
    Some(image)
}

fn draw_box(image: &mut RgbImage, region: &FaceRegion) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let x1 = (region.x1 as i64).max(0).min(w - 1);
    let y1 = (region.y1 as i64).max(0).min(h - 1);
    let x2 = (region.x2 as i64).max(0).min(w - 1);
    let y2 = (region.y2 as i64).max(0).min(h - 1);
    if x1 >= x2 || y1 >= y2 {
        return;
    }

    let t = BOX_THICKNESS as i64;
    for x in x1..=x2 {
        for dy in 0..t {
            if y1 + dy <= y2 {
                image.put_pixel(x as u32, (y1 + dy) as u32, BOX_COLOR);
            }
            if y2 - dy >= y1 {
                image.put_pixel(x as u32, (y2 - dy) as u32, BOX_COLOR);
            }
        }
    }
    for y in y1..=y2 {
        for dx in 0..t {
            if x1 + dx <= x2 {
                image.put_pixel((x1 + dx) as u32, y as u32, BOX_COLOR);
            }
            if x2 - dx >= x1 {
                image.put_pixel((x2 - dx) as u32, y as u32, BOX_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score() -> QualityScore {
        QualityScore {
            total: 0.55,
            face_size: 1.0,
            sharpness: 0.0,
            brightness: 1.0,
            contrast: 0.0,
            frontality: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            bbox: FaceRegion::new(10, 10, 40, 40),
        }
    }

    #[test]
    fn test_report_serializes_score_breakdown() {
        let mut report = DebugReport::new();
        report.record(42, "captured", score());

        let json = report.to_json_string().unwrap();
        assert!(json.contains("\"frame_index\": 42"));
        assert!(json.contains("\"outcome\": \"captured\""));
        assert!(json.contains("\"sharpness\""));
        assert!(json.contains("\"frontality\""));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.json");

        let mut report = DebugReport::new();
        report.record(0, "rejected", score());
        report.write(&path).unwrap();

        assert!(path.is_file());
    }

    #[test]
    fn test_session_writes_frames_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = DebugSession::new(dir.path());

        let frame = Frame::new(vec![128; 50 * 50 * 3], 50, 50, 3, 3);
        session.record(&frame, "captured", &score());
        session.finish();

        assert!(dir.path().join("frame_000003.jpg").is_file());
        assert!(dir.path().join("report.json").is_file());
        assert_eq!(session.report().captures.len(), 1);
    }

    #[test]
    fn test_annotate_draws_green_border() {
        let frame = Frame::new(vec![0; 50 * 50 * 3], 50, 50, 3, 0);
        let image = annotate_frame(&frame, &[FaceRegion::new(10, 10, 30, 30)]).unwrap();

        assert_eq!(*image.get_pixel(10, 10), BOX_COLOR);
        assert_eq!(*image.get_pixel(30, 30), BOX_COLOR);
        assert_eq!(*image.get_pixel(20, 10), BOX_COLOR);
        // Interior untouched.
        assert_eq!(*image.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_annotate_clips_out_of_bounds_region() {
        let frame = Frame::new(vec![0; 20 * 20 * 3], 20, 20, 3, 0);
        let image = annotate_frame(&frame, &[FaceRegion::new(-5, -5, 40, 40)]).unwrap();
        assert_eq!(*image.get_pixel(0, 0), BOX_COLOR);
    }

    #[test]
    fn test_annotate_rejects_non_rgb_frame() {
        let frame = Frame::new(vec![0; 20 * 20], 20, 20, 1, 0);
        assert!(annotate_frame(&frame, &[]).is_none());
    }
}
