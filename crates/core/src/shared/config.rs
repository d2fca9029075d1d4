use std::time::Duration;

use thiserror::Error;

use crate::quality::domain::quality_score::ScoreWeights;

/// Tolerance when checking that scoring weights sum to 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("scoring weights must sum to 1.0, got {0}")]
    WeightSum(f64),
    #[error("scoring weight '{name}' must be non-negative, got {value}")]
    NegativeWeight { name: &'static str, value: f64 },
    #[error("similarity threshold must be in [0, 1], got {0}")]
    SimilarityThreshold(f64),
    #[error("detection confidence floor must be in [0, 1], got {0}")]
    DetectionConfidence(f64),
    #[error("minimum quality score must be non-negative, got {0}")]
    QualityFloor(f64),
    #[error("face size breakpoints must satisfy 0 <= min < full, got min={min} full={full}")]
    FaceSizeBreakpoints { min: f64, full: f64 },
    #[error("process_every_n_frames must be at least 1")]
    FrameDecimation,
    #[error("target width must be non-zero")]
    TargetWidth,
}

/// Face-size normalization breakpoints (face area / frame area).
///
/// Below `min_ratio` the size score is 0; at `full_ratio` and above it
/// saturates at 1, with a linear ramp in between.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceSizeBreakpoints {
    pub min_ratio: f64,
    pub full_ratio: f64,
}

impl Default for FaceSizeBreakpoints {
    fn default() -> Self {
        Self {
            min_ratio: 0.01,
            full_ratio: 0.15,
        }
    }
}

/// Full tunable surface of the visitor counter.
///
/// A bad threshold here causes silent over- or under-counting rather than a
/// crash, so [`CounterConfig::validate`] runs eagerly at startup and refuses
/// nonsensical values.
#[derive(Clone, Debug)]
pub struct CounterConfig {
    /// Detector confidence below which a face is never considered.
    pub min_detection_confidence: f64,
    /// Aggregate quality total below which recognition is skipped.
    pub min_quality_score: f64,
    /// Cosine similarity required to match a known visitor.
    pub similarity_threshold: f64,
    /// Minimum wait between capture/match cycles.
    pub cooldown: Duration,
    /// Per-factor scoring weights; must sum to 1.
    pub weights: ScoreWeights,
    pub face_size: FaceSizeBreakpoints,
    /// Process every Nth frame from the stream.
    pub process_every_n_frames: usize,
    /// Resize frames to this width before processing.
    pub target_width: u32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.70,
            min_quality_score: 0.35,
            similarity_threshold: 0.45,
            cooldown: Duration::from_secs(10),
            weights: ScoreWeights::default(),
            face_size: FaceSizeBreakpoints::default(),
            process_every_n_frames: 5,
            target_width: 1280,
        }
    }
}

impl CounterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.weights.named() {
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::SimilarityThreshold(self.similarity_threshold));
        }
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(ConfigError::DetectionConfidence(
                self.min_detection_confidence,
            ));
        }
        if self.min_quality_score < 0.0 {
            return Err(ConfigError::QualityFloor(self.min_quality_score));
        }
        let fs = self.face_size;
        if !(fs.min_ratio >= 0.0 && fs.min_ratio < fs.full_ratio) {
            return Err(ConfigError::FaceSizeBreakpoints {
                min: fs.min_ratio,
                full: fs.full_ratio,
            });
        }
        if self.process_every_n_frames == 0 {
            return Err(ConfigError::FrameDecimation);
        }
        if self.target_width == 0 {
            return Err(ConfigError::TargetWidth);
        }
        Ok(())
    }
}
