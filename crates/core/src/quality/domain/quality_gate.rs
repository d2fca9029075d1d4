use crate::quality::domain::quality_score::QualityScore;

/// Outcome of the pre-recognition quality gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GateDecision {
    Accepted,
    /// Aggregate quality below the configured floor.
    BelowQuality { total: f64, min: f64 },
    /// The detector's own confidence is too low; a shaky box taints every
    /// downstream pixel statistic, whatever the quality score says.
    BelowConfidence { confidence: f64, min: f64 },
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted)
    }
}

/// Rejects frames unlikely to produce a usable match before the expensive
/// embedding step is attempted. Both thresholds are configuration.
#[derive(Clone, Copy, Debug)]
pub struct QualityGate {
    min_quality_score: f64,
    min_detection_confidence: f64,
}

impl QualityGate {
    pub fn new(min_quality_score: f64, min_detection_confidence: f64) -> Self {
        Self {
            min_quality_score,
            min_detection_confidence,
        }
    }

    pub fn evaluate(&self, score: &QualityScore, detection_confidence: f64) -> GateDecision {
        if detection_confidence < self.min_detection_confidence {
            return GateDecision::BelowConfidence {
                confidence: detection_confidence,
                min: self.min_detection_confidence,
            };
        }
        if score.total < self.min_quality_score {
            return GateDecision::BelowQuality {
                total: score.total,
                min: self.min_quality_score,
            };
        }
        GateDecision::Accepted
    }
}
