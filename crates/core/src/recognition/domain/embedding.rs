use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingCodecError {
    #[error("embedding blob length {0} is not a multiple of 4")]
    MisalignedBlob(usize),
    #[error("embedding blob is empty")]
    EmptyBlob,
}

/// A face's identity signature: fixed-length f32 vector produced by the
/// embedding model (512 dimensions for ArcFace). Opaque to the core;
/// compared only via cosine similarity.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Scales the vector to unit length. A zero vector stays zero.
    pub fn l2_normalized(mut self) -> Self {
        let norm: f32 = self.0.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in self.0.iter_mut() {
                *x /= norm;
            }
        }
        self
    }

    /// Cosine similarity in [-1, 1]. Zero-norm inputs compare as 0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f64 {
        let dot: f64 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (*a as f64) * (*b as f64))
            .sum();
        let norm_a: f64 = self.0.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
        let norm_b: f64 = other.0.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }

    /// Storage representation: consecutive f32 little-endian words.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len() * 4);
        for v in &self.0 {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    /// Inverse of [`Embedding::to_bytes`]; exact (bit-for-bit) round trip.
    pub fn from_bytes(blob: &[u8]) -> Result<Self, EmbeddingCodecError> {
        if blob.is_empty() {
            return Err(EmbeddingCodecError::EmptyBlob);
        }
        if blob.len() % 4 != 0 {
            return Err(EmbeddingCodecError::MisalignedBlob(blob.len()));
        }
        let values = blob
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self(values))
    }
}
