use serde::Serialize;

use crate::shared::face_region::FaceRegion;

/// Per-factor weights for the aggregate quality score.
///
/// The aggregate is a weighted linear sum of independently normalized
/// sub-scores; weights are validated (sum to 1) by the config layer before
/// a scorer is built.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreWeights {
    pub face_size: f64,
    pub sharpness: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub frontality: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            face_size: 0.15,
            sharpness: 0.30,
            brightness: 0.15,
            contrast: 0.15,
            frontality: 0.25,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.face_size + self.sharpness + self.brightness + self.contrast + self.frontality
    }

    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("face_size", self.face_size),
            ("sharpness", self.sharpness),
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("frontality", self.frontality),
        ]
    }
}

/// Quality assessment of one face in one frame. Immutable once computed.
///
/// Sub-scores are nominally in [0, 1]; `brightness` may dip below 0 for
/// severely overexposed crops, and `total` inherits that. Consumers needing
/// a strict [0, 1] range must clamp.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualityScore {
    pub total: f64,
    pub face_size: f64,
    pub sharpness: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub frontality: f64,
    /// Estimated left/right head rotation, degrees, signed.
    pub yaw: f64,
    /// Estimated up/down head rotation, degrees, signed.
    pub pitch: f64,
    pub bbox: FaceRegion,
}
