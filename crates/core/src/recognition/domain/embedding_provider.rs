use crate::recognition::domain::embedding::Embedding;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// One detected face with its identity signature.
#[derive(Clone, Debug)]
pub struct FaceObservation {
    pub embedding: Embedding,
    pub region: FaceRegion,
    /// The detector's own confidence for this face, in [0, 1].
    pub confidence: f64,
}

/// Detection plus embedding extraction in one step.
///
/// Returns zero or more observations per frame in undefined order.
/// Implementations may be stateful (model sessions), hence `&mut self`.
pub trait EmbeddingProvider: Send {
    fn extract(&mut self, frame: &Frame) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>>;
}
