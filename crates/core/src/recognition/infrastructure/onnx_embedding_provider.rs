use crate::recognition::domain::embedding_provider::{EmbeddingProvider, FaceObservation};
use crate::recognition::infrastructure::arcface_embedder::ArcFaceEmbedder;
use crate::recognition::infrastructure::onnx_face_detector::OnnxFaceDetector;
use crate::shared::frame::Frame;

/// Combined detect-and-embed step over the two ONNX models.
///
/// One call per processed frame: the detector proposes boxes, the
/// embedder turns each surviving box into a normalized vector. Faces
/// whose box degenerates after clipping are dropped silently; the
/// controller treats them like any other non-detection.
pub struct OnnxEmbeddingProvider {
    detector: OnnxFaceDetector,
    embedder: ArcFaceEmbedder,
}

impl OnnxEmbeddingProvider {
    pub fn new(detector: OnnxFaceDetector, embedder: ArcFaceEmbedder) -> Self {
        Self { detector, embedder }
    }
}

impl EmbeddingProvider for OnnxEmbeddingProvider {
    fn extract(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>> {
        let detections = self.detector.detect(frame)?;
        let mut observations = Vec::with_capacity(detections.len());
        for detection in detections {
            if let Some(embedding) = self.embedder.embed_region(frame, detection.region)? {
                observations.push(FaceObservation {
                    embedding,
                    region: detection.region,
                    confidence: detection.confidence,
                });
            }
        }
        Ok(observations)
    }
}
