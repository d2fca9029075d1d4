//! The online identity deduplication state machine.
//!
//! Per processed frame: cooldown gate → detection + embedding → quality
//! gate → match-or-enroll → cooldown reset. The single global cooldown
//! timestamp is the primary anti-double-count mechanism: one resolved
//! capture silences further capture attempts for the whole window, no
//! matter how many faces stay in frame.

use std::time::{Duration, Instant};

use crate::counting::domain::clock::Clock;
use crate::counting::domain::known_identities::KnownIdentityCache;
use crate::counting::domain::session_stats::SessionStats;
use crate::quality::domain::frame_scorer::FrameQualityScorer;
use crate::quality::domain::quality_gate::{GateDecision, QualityGate};
use crate::quality::domain::quality_score::QualityScore;
use crate::recognition::domain::embedding_provider::EmbeddingProvider;
use crate::recognition::domain::identity_matcher::{IdentityMatcher, VisitorId};
use crate::recognition::domain::visitor_store::VisitorStore;
use crate::shared::frame::Frame;
use crate::video::domain::snapshot_writer::SnapshotWriter;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VisitKind {
    New,
    Returning { similarity: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisitEvent {
    pub visitor_id: VisitorId,
    pub kind: VisitKind,
    pub score: QualityScore,
}

/// What one controller tick did with a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Inside the cooldown window; no work was attempted.
    CoolingDown,
    /// Detection ran and found nothing.
    NoFace,
    /// Faces were found but every one failed the quality gate.
    /// Rejection does not start the cooldown. `scores` has one entry per
    /// face that survived cropping (confidence rejections still score).
    AllRejected {
        faces: usize,
        scores: Vec<QualityScore>,
    },
    /// At least one face was resolved (matched or enrolled).
    Captured { events: Vec<VisitEvent> },
}

/// Orchestrates quality gating, embedding, matching, and enrollment while
/// enforcing the global cooldown.
///
/// Single-writer by construction: all state (cache, cooldown, stats) is
/// mutated only through `process_frame` on one control thread. Known
/// coarse policy: the cooldown is shared across identities, so a second
/// person entering frame during another's window is silently skipped.
pub struct DedupController {
    provider: Box<dyn EmbeddingProvider>,
    matcher: Box<dyn IdentityMatcher>,
    store: Box<dyn VisitorStore>,
    scorer: FrameQualityScorer,
    gate: QualityGate,
    cache: KnownIdentityCache,
    clock: Box<dyn Clock>,
    cooldown: Duration,
    snapshots: Option<Box<dyn SnapshotWriter>>,
    last_capture: Option<Instant>,
    stats: SessionStats,
}

impl DedupController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Box<dyn EmbeddingProvider>,
        matcher: Box<dyn IdentityMatcher>,
        store: Box<dyn VisitorStore>,
        scorer: FrameQualityScorer,
        gate: QualityGate,
        cache: KnownIdentityCache,
        clock: Box<dyn Clock>,
        cooldown: Duration,
        snapshots: Option<Box<dyn SnapshotWriter>>,
    ) -> Self {
        Self {
            provider,
            matcher,
            store,
            scorer,
            gate,
            cache,
            clock,
            cooldown,
            snapshots,
            last_capture: None,
            stats: SessionStats::new(),
        }
    }

    /// Runs one tick of the state machine over a frame.
    ///
    /// Errors from the provider or the store leave cooldown and cache
    /// untouched for the failing face; the caller skips the tick and moves
    /// on (collaborator failures are recoverable at the boundary).
    pub fn process_frame(
        &mut self,
        frame: &Frame,
    ) -> Result<TickOutcome, Box<dyn std::error::Error>> {
        let now = self.clock.now();
        if let Some(last) = self.last_capture {
            if now.duration_since(last) < self.cooldown {
                return Ok(TickOutcome::CoolingDown);
            }
        }

        let observations = self.provider.extract(frame)?;
        if observations.is_empty() {
            return Ok(TickOutcome::NoFace);
        }

        let faces = observations.len();
        let mut events = Vec::new();
        let mut rejected = Vec::new();

        for obs in observations {
            let Some(score) = self.scorer.score(frame, Some(obs.region)) else {
                log::debug!("face at {:?} degenerate after padding, skipped", obs.region);
                continue;
            };

            match self.gate.evaluate(&score, obs.confidence) {
                GateDecision::Accepted => {}
                GateDecision::BelowQuality { total, min } => {
                    log::debug!("quality gate: total {total:.3} below floor {min:.3}");
                    rejected.push(score);
                    continue;
                }
                GateDecision::BelowConfidence { confidence, min } => {
                    log::debug!("quality gate: confidence {confidence:.2} below floor {min:.2}");
                    rejected.push(score);
                    continue;
                }
            }

            self.stats.total_detections += 1;
            log::info!(
                "face accepted (confidence {:.2}, quality {:.3})",
                obs.confidence,
                score.total
            );

            let event = match self.matcher.best_match(&obs.embedding, self.cache.entries()) {
                Some(m) => {
                    self.store.record_visit(m.id)?;
                    self.stats.returning_visitors += 1;
                    log::info!(
                        "returning visitor #{} (similarity {:.3})",
                        m.id,
                        m.similarity
                    );
                    VisitEvent {
                        visitor_id: m.id,
                        kind: VisitKind::Returning {
                            similarity: m.similarity,
                        },
                        score,
                    }
                }
                None => {
                    let sample_path = self.snapshots.as_mut().and_then(|w| {
                        w.save(frame)
                            .map_err(|e| log::warn!("snapshot save failed: {e}"))
                            .ok()
                    });
                    let id = self.store.create(&obs.embedding, sample_path.as_deref())?;
                    self.cache.push(id, obs.embedding.clone());
                    self.stats.new_visitors += 1;
                    log::info!("new visitor #{id} enrolled");
                    VisitEvent {
                        visitor_id: id,
                        kind: VisitKind::New,
                        score,
                    }
                }
            };
            events.push(event);

            // Every resolved face re-arms the same global window.
            self.last_capture = Some(self.clock.now());
        }

        if events.is_empty() {
            Ok(TickOutcome::AllRejected {
                faces,
                scores: rejected,
            })
        } else {
            Ok(TickOutcome::Captured { events })
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn known_identities(&self) -> usize {
        self.cache.len()
    }

    /// Unique visitors enrolled in the store, across all sessions.
    pub fn unique_visitors(&self) -> Result<u64, Box<dyn std::error::Error>> {
        self.store.count()
    }
}
