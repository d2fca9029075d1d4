use crate::recognition::domain::embedding::Embedding;

pub type VisitorId = i64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdentityMatch {
    pub id: VisitorId,
    pub similarity: f64,
}

/// Maps an embedding to a known identity, or signals no match.
///
/// Must be deterministic for identical inputs.
pub trait IdentityMatcher: Send {
    fn best_match(
        &self,
        probe: &Embedding,
        known: &[(VisitorId, Embedding)],
    ) -> Option<IdentityMatch>;
}

/// Cosine-similarity matcher with a configured minimum threshold.
///
/// Among candidates at or above the threshold the highest similarity wins;
/// exact ties keep the earliest enrollment, so results are deterministic.
#[derive(Clone, Copy, Debug)]
pub struct CosineMatcher {
    threshold: f64,
}

impl CosineMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl IdentityMatcher for CosineMatcher {
    fn best_match(
        &self,
        probe: &Embedding,
        known: &[(VisitorId, Embedding)],
    ) -> Option<IdentityMatch> {
        let mut best: Option<IdentityMatch> = None;
        for (id, candidate) in known {
            let similarity = probe.cosine_similarity(candidate);
            if similarity < self.threshold {
                continue;
            }
            if best.map_or(true, |b| similarity > b.similarity) {
                best = Some(IdentityMatch {
                    id: *id,
                    similarity,
                });
            }
        }
        best
    }
}
