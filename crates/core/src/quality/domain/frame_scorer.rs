//! Multi-factor frame quality scoring.
//!
//! Five independent sub-scores (size, sharpness, brightness, contrast,
//! frontality) combined into a weighted aggregate. The scorer is a
//! multi-frame selection tool: a capture window scores several frames and
//! keeps the best as the representative sample.

use crate::quality::domain::head_pose::HeadPoseEstimator;
use crate::quality::domain::pixel_stats;
use crate::quality::domain::quality_score::{QualityScore, ScoreWeights};
use crate::shared::config::FaceSizeBreakpoints;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// Padding applied to each side of the bbox before pixel statistics.
/// Reduces sensitivity to overly tight detector boxes.
const CROP_PADDING: f64 = 0.1;

/// Laplacian variance at which the sharpness score saturates.
const SHARPNESS_SATURATION: f64 = 300.0;

/// Intensity stddev at which the contrast score saturates.
const CONTRAST_SATURATION: f64 = 60.0;

/// Yaw/pitch angle (degrees) beyond which frontality bottoms out.
const FRONTALITY_MAX_ANGLE: f64 = 30.0;
const FRONTALITY_YAW_WEIGHT: f64 = 0.6;
const FRONTALITY_PITCH_WEIGHT: f64 = 0.4;

/// Frontality assigned when pose cannot be estimated at all.
const FRONTALITY_UNKNOWN: f64 = 0.5;

/// Finds the single largest face in a frame when the caller has no bbox.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Option<FaceRegion>;
}

/// Face size relative to the frame. Very small faces carry too little
/// resolution for recognition; oversized faces are not penalized further.
pub fn face_size_score(ratio: f64, breakpoints: FaceSizeBreakpoints) -> f64 {
    if ratio < breakpoints.min_ratio {
        0.0
    } else if ratio < breakpoints.full_ratio {
        ratio / breakpoints.full_ratio
    } else {
        1.0
    }
}

pub fn sharpness_score(laplacian_variance: f64) -> f64 {
    (laplacian_variance / SHARPNESS_SATURATION).min(1.0)
}

/// Piecewise over five intensity bands: flat optimum in [80, 180] with a
/// symmetric falloff for under- and over-exposure. May go negative above a
/// mean of 220; callers needing [0, 1] must clamp.
pub fn brightness_score(mean_intensity: f64) -> f64 {
    let m = mean_intensity;
    if m < 40.0 {
        m / 40.0
    } else if m < 80.0 {
        0.5 + 0.5 * (m - 40.0) / 40.0
    } else if m <= 180.0 {
        1.0
    } else if m <= 220.0 {
        1.0 - 0.5 * (m - 180.0) / 40.0
    } else {
        0.5 - 0.5 * (m - 220.0) / 35.0
    }
}

pub fn contrast_score(std_dev: f64) -> f64 {
    (std_dev / CONTRAST_SATURATION).min(1.0)
}

/// Yaw weighs more than pitch: left/right rotation degrades recognition
/// features harder than up/down tilt. Never below 0.
pub fn frontality_score(yaw: f64, pitch: f64) -> f64 {
    let yaw_penalty = (yaw.abs() / FRONTALITY_MAX_ANGLE).min(1.0);
    let pitch_penalty = (pitch.abs() / FRONTALITY_MAX_ANGLE).min(1.0);
    (1.0 - (FRONTALITY_YAW_WEIGHT * yaw_penalty + FRONTALITY_PITCH_WEIGHT * pitch_penalty)).max(0.0)
}

/// Stateless over frames; owns its pose estimator and optional locator.
pub struct FrameQualityScorer {
    weights: ScoreWeights,
    breakpoints: FaceSizeBreakpoints,
    pose: HeadPoseEstimator,
    locator: Option<Box<dyn FaceLocator>>,
}

impl FrameQualityScorer {
    pub fn new(
        weights: ScoreWeights,
        breakpoints: FaceSizeBreakpoints,
        pose: HeadPoseEstimator,
        locator: Option<Box<dyn FaceLocator>>,
    ) -> Self {
        Self {
            weights,
            breakpoints,
            pose,
            locator,
        }
    }

    /// Scores one face in one frame.
    ///
    /// With no `bbox`, the configured locator finds the largest face.
    /// Returns `None` when no face is found or the padded crop degenerates
    /// to zero area; malformed-but-nonempty input still gets a best-effort
    /// score.
    pub fn score(&mut self, frame: &Frame, bbox: Option<FaceRegion>) -> Option<QualityScore> {
        let bbox = match bbox {
            Some(b) => b,
            None => self.locator.as_mut()?.locate(frame)?,
        };

        let padded = bbox
            .padded(CROP_PADDING)
            .clipped(frame.width(), frame.height())?;
        let crop = pixel_stats::luma_crop(frame, padded)?;
        let crop_view = crop.view();

        let size = face_size_score(
            bbox.area_ratio(frame.width(), frame.height()),
            self.breakpoints,
        );
        let sharpness = sharpness_score(pixel_stats::laplacian_variance(&crop_view));
        let brightness = brightness_score(pixel_stats::mean(&crop_view));
        let contrast = contrast_score(pixel_stats::std_dev(&crop_view));

        // Pose works on the unpadded face crop. When the bbox itself has no
        // overlap with the frame the pose is unestimable: neutral angles and
        // an uncertain mid-range frontality.
        let (yaw, pitch, frontality) = match pixel_stats::luma_crop(frame, bbox) {
            Some(face) => {
                let pose = self.pose.estimate(&face.view());
                (pose.yaw, pose.pitch, frontality_score(pose.yaw, pose.pitch))
            }
            None => (0.0, 0.0, FRONTALITY_UNKNOWN),
        };

        let total = self.weights.face_size * size
            + self.weights.sharpness * sharpness
            + self.weights.brightness * brightness
            + self.weights.contrast * contrast
            + self.weights.frontality * frontality;

        Some(QualityScore {
            total,
            face_size: size,
            sharpness,
            brightness,
            contrast,
            frontality,
            yaw,
            pitch,
            bbox,
        })
    }

    /// Scores a capture window and orders it best-first.
    ///
    /// Frames with no detectable face are dropped. Each entry carries the
    /// index into `frames`.
    pub fn rank(&mut self, frames: &[Frame]) -> Vec<(usize, QualityScore)> {
        let mut scored: Vec<(usize, QualityScore)> = frames
            .iter()
            .enumerate()
            .filter_map(|(i, f)| self.score(f, None).map(|s| (i, s)))
            .collect();
        scored.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));
        scored
    }

    /// The highest-quality frame of a capture window, if any face was found.
    pub fn best(&mut self, frames: &[Frame]) -> Option<(usize, QualityScore)> {
        self.rank(frames).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn uniform_frame(w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h * 3) as usize], w, h, 3, 0)
    }

    fn scorer() -> FrameQualityScorer {
        FrameQualityScorer::new(
            ScoreWeights::default(),
            FaceSizeBreakpoints::default(),
            HeadPoseEstimator::new(None),
            None,
        )
    }

    struct FixedLocator(Option<FaceRegion>);

    impl FaceLocator for FixedLocator {
        fn locate(&mut self, _frame: &Frame) -> Option<FaceRegion> {
            self.0
        }
    }

    // ── Sub-scores ───────────────────────────────────────────────────

    #[rstest]
    #[case(0.005, 0.0)]
    #[case(0.009999, 0.0)]
    #[case(0.03, 0.2)]
    #[case(0.15, 1.0)]
    #[case(0.5, 1.0)]
    fn test_face_size_breakpoints(#[case] ratio: f64, #[case] expected: f64) {
        assert_relative_eq!(
            face_size_score(ratio, FaceSizeBreakpoints::default()),
            expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_face_size_monotonic_and_saturating() {
        let bp = FaceSizeBreakpoints::default();
        let mut prev = -1.0;
        for i in 0..200 {
            let ratio = i as f64 / 200.0;
            let s = face_size_score(ratio, bp);
            assert!(s >= prev, "size score must be non-decreasing at {ratio}");
            prev = s;
        }
        assert_relative_eq!(face_size_score(0.15, bp), 1.0);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(150.0, 0.5)]
    #[case(300.0, 1.0)]
    #[case(900.0, 1.0)]
    fn test_sharpness_saturation(#[case] variance: f64, #[case] expected: f64) {
        assert_relative_eq!(sharpness_score(variance), expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case(20.0, 0.5)]
    #[case(40.0, 0.5)]
    #[case(60.0, 0.75)]
    #[case(80.0, 1.0)]
    #[case(130.0, 1.0)]
    #[case(180.0, 1.0)]
    #[case(200.0, 0.75)]
    #[case(220.0, 0.5)]
    fn test_brightness_bands(#[case] mean: f64, #[case] expected: f64) {
        assert_relative_eq!(brightness_score(mean), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_brightness_strictly_decreases_away_from_plateau() {
        assert!(brightness_score(70.0) < brightness_score(80.0));
        assert!(brightness_score(50.0) < brightness_score(70.0));
        assert!(brightness_score(190.0) < brightness_score(180.0));
        assert!(brightness_score(230.0) < brightness_score(210.0));
    }

    #[test]
    fn test_brightness_can_go_negative_when_blown_out() {
        assert!(brightness_score(255.0) < 0.0);
    }

    #[test]
    fn test_frontality_perfect_only_at_zero() {
        assert_relative_eq!(frontality_score(0.0, 0.0), 1.0);
        assert!(frontality_score(0.1, 0.0) < 1.0);
        assert!(frontality_score(0.0, 0.1) < 1.0);
    }

    #[test]
    fn test_frontality_monotonic_and_floored_at_zero() {
        let mut prev = 2.0;
        for yaw in [0.0, 5.0, 10.0, 20.0, 30.0, 60.0, 90.0] {
            let s = frontality_score(yaw, 0.0);
            assert!(s <= prev);
            assert!(s >= 0.0);
            prev = s;
        }
        assert_relative_eq!(frontality_score(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_frontality_yaw_weighs_more_than_pitch() {
        assert!(frontality_score(15.0, 0.0) < frontality_score(0.0, 15.0));
    }

    // ── Scorer ───────────────────────────────────────────────────────

    #[test]
    fn test_score_bbox_outside_frame_is_absent() {
        let frame = uniform_frame(100, 100, 128);
        let mut s = scorer();
        assert!(s.score(&frame, Some(FaceRegion::new(500, 500, 600, 600))).is_none());
    }

    #[test]
    fn test_score_zero_area_bbox_is_absent() {
        let frame = uniform_frame(100, 100, 128);
        let mut s = scorer();
        assert!(s.score(&frame, Some(FaceRegion::new(50, 50, 50, 50))).is_none());
    }

    #[test]
    fn test_score_no_bbox_no_locator_is_absent() {
        let frame = uniform_frame(100, 100, 128);
        let mut s = scorer();
        assert!(s.score(&frame, None).is_none());
    }

    #[test]
    fn test_score_uses_locator_when_bbox_missing() {
        let frame = uniform_frame(100, 100, 128);
        let bbox = FaceRegion::new(20, 20, 80, 80);
        let mut s = FrameQualityScorer::new(
            ScoreWeights::default(),
            FaceSizeBreakpoints::default(),
            HeadPoseEstimator::new(None),
            Some(Box::new(FixedLocator(Some(bbox)))),
        );
        let score = s.score(&frame, None).unwrap();
        assert_eq!(score.bbox, bbox);
    }

    #[test]
    fn test_score_uniform_optimal_brightness_face() {
        // Uniform 128: brightness 1.0, sharpness 0, contrast 0,
        // symmetric → frontality 1.0; bbox 36% of frame → size 1.0.
        let frame = uniform_frame(100, 100, 128);
        let mut s = scorer();
        let score = s.score(&frame, Some(FaceRegion::new(20, 20, 80, 80))).unwrap();
        assert_relative_eq!(score.brightness, 1.0, epsilon = 1e-6);
        assert_relative_eq!(score.sharpness, 0.0, epsilon = 1e-6);
        assert_relative_eq!(score.contrast, 0.0, epsilon = 1e-6);
        assert_relative_eq!(score.face_size, 1.0, epsilon = 1e-6);
        assert_relative_eq!(score.frontality, 1.0, epsilon = 1e-6);
        // Weighted sum: 0.15 + 0 + 0.15 + 0 + 0.25
        assert_relative_eq!(score.total, 0.55, epsilon = 1e-6);
    }

    #[test]
    fn test_dark_frame_scores_below_bright_frame() {
        let dark = uniform_frame(100, 100, 10);
        let bright = uniform_frame(100, 100, 128);
        let bbox = FaceRegion::new(20, 20, 80, 80);
        let mut s = scorer();
        let dark_total = s.score(&dark, Some(bbox)).unwrap().total;
        let bright_total = s.score(&bright, Some(bbox)).unwrap().total;
        assert!(dark_total < bright_total);
    }

    #[test]
    fn test_rank_orders_best_first() {
        let bbox = FaceRegion::new(10, 10, 50, 50);
        let frames = vec![
            uniform_frame(100, 100, 10),  // dark
            uniform_frame(100, 100, 128), // optimal
            uniform_frame(100, 100, 240), // blown out
        ];
        let mut s = FrameQualityScorer::new(
            ScoreWeights::default(),
            FaceSizeBreakpoints::default(),
            HeadPoseEstimator::new(None),
            Some(Box::new(FixedLocator(Some(bbox)))),
        );
        let ranked = s.rank(&frames);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, 1);
        assert!(ranked[0].1.total >= ranked[1].1.total);
        assert!(ranked[1].1.total >= ranked[2].1.total);
    }

    #[test]
    fn test_rank_drops_faceless_frames() {
        let frames = vec![uniform_frame(100, 100, 128)];
        let mut s = FrameQualityScorer::new(
            ScoreWeights::default(),
            FaceSizeBreakpoints::default(),
            HeadPoseEstimator::new(None),
            Some(Box::new(FixedLocator(None))),
        );
        assert!(s.rank(&frames).is_empty());
        assert!(s.best(&frames).is_none());
    }

    #[test]
    fn test_best_returns_top_ranked() {
        let bbox = FaceRegion::new(10, 10, 50, 50);
        let frames = vec![uniform_frame(100, 100, 15), uniform_frame(100, 100, 128)];
        let mut s = FrameQualityScorer::new(
            ScoreWeights::default(),
            FaceSizeBreakpoints::default(),
            HeadPoseEstimator::new(None),
            Some(Box::new(FixedLocator(Some(bbox)))),
        );
        let (idx, _) = s.best(&frames).unwrap();
        assert_eq!(idx, 1);
    }
}
