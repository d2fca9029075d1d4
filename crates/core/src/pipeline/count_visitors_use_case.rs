use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::counting::domain::controller::{DedupController, TickOutcome, VisitKind};
use crate::counting::domain::session_stats::SessionStats;
use crate::pipeline::debug_report::DebugSession;
use crate::pipeline::run_logger::RunLogger;
use crate::video::domain::frame_source::FrameSource;

/// Orchestrates the full counting run over a stream or file.
///
/// Pulls frames from the source, applies decimation and downscaling, and
/// feeds surviving frames to the controller. Per-frame failures (decode
/// errors, provider errors) are logged and skipped so a flaky camera
/// does not kill an overnight run; only failing to open the input aborts.
pub struct CountVisitorsUseCase {
    source: Box<dyn FrameSource>,
    controller: DedupController,
    logger: Box<dyn RunLogger>,
    process_every_n_frames: u32,
    target_width: u32,
    cancelled: Arc<AtomicBool>,
    debug: Option<DebugSession>,
}

impl CountVisitorsUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        controller: DedupController,
        logger: Box<dyn RunLogger>,
        process_every_n_frames: u32,
        target_width: u32,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source,
            controller,
            logger,
            process_every_n_frames,
            target_width,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            debug: None,
        }
    }

    /// Enables annotated-frame and score-report output for this run.
    pub fn with_debug(mut self, debug: DebugSession) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Runs until the source ends or a stop is requested. The frame in
    /// flight when the stop flag is raised still completes.
    pub fn execute(&mut self, input: &str) -> Result<SessionStats, Box<dyn std::error::Error>> {
        let info = self.source.open(input)?;
        self.logger.info(&format!(
            "input open: {}x{} @ {:.1} fps",
            info.width, info.height, info.fps
        ));

        let every = self.process_every_n_frames.max(1) as usize;

        {
            let mut frames = self.source.frames();
            loop {
                if self.cancelled.load(Ordering::Relaxed) {
                    self.logger.info("stop requested, finishing run");
                    break;
                }
                let Some(next) = frames.next() else {
                    break;
                };
                let frame = match next {
                    Ok(frame) => frame,
                    Err(e) => {
                        log::warn!("frame decode failed, skipping: {e}");
                        continue;
                    }
                };

                let index = frame.index();
                let selected = index % every == 0;
                self.logger.tick(index, selected);
                if !selected {
                    continue;
                }

                let start = Instant::now();
                let frame = frame.resize_to_width(self.target_width);
                self.logger
                    .timing("resize", start.elapsed().as_secs_f64() * 1000.0);

                let start = Instant::now();
                let outcome = match self.controller.process_frame(&frame) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        log::warn!("frame {index} skipped: {e}");
                        continue;
                    }
                };
                self.logger
                    .timing("controller", start.elapsed().as_secs_f64() * 1000.0);

                match outcome {
                    TickOutcome::CoolingDown | TickOutcome::NoFace => {}
                    TickOutcome::AllRejected { faces, scores } => {
                        self.logger.metric("rejected_faces", faces as f64);
                        if let Some(debug) = self.debug.as_mut() {
                            for score in &scores {
                                debug.record(&frame, "rejected", score);
                            }
                        }
                    }
                    TickOutcome::Captured { events } => {
                        self.logger.metric("captured_faces", events.len() as f64);
                        for event in events {
                            match event.kind {
                                VisitKind::New => self
                                    .logger
                                    .info(&format!("new visitor #{}", event.visitor_id)),
                                VisitKind::Returning { similarity } => self.logger.info(&format!(
                                    "returning visitor #{} (similarity {similarity:.3})",
                                    event.visitor_id
                                )),
                            }
                            if let Some(debug) = self.debug.as_mut() {
                                debug.record(&frame, "captured", &event.score);
                            }
                        }
                    }
                }
            }
        }

        self.source.close();
        if let Some(debug) = self.debug.as_ref() {
            debug.finish();
        }
        let stats = self.controller.stats();
        self.logger.info(&format!("session: {stats}"));
        self.logger.summary();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::counting::domain::clock::SystemClock;
    use crate::counting::domain::known_identities::KnownIdentityCache;
    use crate::pipeline::run_logger::NullRunLogger;
    use crate::quality::domain::frame_scorer::FrameQualityScorer;
    use crate::quality::domain::head_pose::HeadPoseEstimator;
    use crate::quality::domain::quality_gate::QualityGate;
    use crate::quality::domain::quality_score::ScoreWeights;
    use crate::recognition::domain::embedding::Embedding;
    use crate::recognition::domain::embedding_provider::{EmbeddingProvider, FaceObservation};
    use crate::recognition::domain::identity_matcher::{CosineMatcher, VisitorId};
    use crate::recognition::domain::visitor_store::VisitorStore;
    use crate::shared::config::FaceSizeBreakpoints;
    use crate::shared::frame::Frame;
    use crate::video::domain::frame_source::StreamInfo;

    // --- Stubs ---

    struct StubSource {
        frames: Vec<Result<Frame, Box<dyn std::error::Error + Send + Sync>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubSource {
        fn new(frames: Vec<Result<Frame, Box<dyn std::error::Error + Send + Sync>>>) -> Self {
            Self {
                frames,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self, _input: &str) -> Result<StreamInfo, Box<dyn std::error::Error>> {
            Ok(StreamInfo {
                width: 200,
                height: 100,
                fps: 30.0,
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(
                self.frames
                    .drain(..)
                    .map(|r| r.map_err(|e| e as Box<dyn std::error::Error>)),
            )
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct RecordingProvider {
        /// Widths of frames handed to `extract`.
        seen: Arc<Mutex<Vec<u32>>>,
    }

    impl EmbeddingProvider for RecordingProvider {
        fn extract(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>> {
            self.seen.lock().unwrap().push(frame.width());
            Ok(Vec::new())
        }
    }

    struct NullStore;

    impl VisitorStore for NullStore {
        fn create(
            &mut self,
            _embedding: &Embedding,
            _sample_path: Option<&Path>,
        ) -> Result<VisitorId, Box<dyn std::error::Error>> {
            Ok(1)
        }

        fn record_visit(&mut self, _id: VisitorId) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn list_all(&self) -> Result<Vec<(VisitorId, Embedding)>, Box<dyn std::error::Error>> {
            Ok(Vec::new())
        }

        fn count(&self) -> Result<u64, Box<dyn std::error::Error>> {
            Ok(0)
        }
    }

    // --- Helpers ---

    fn make_frame(index: usize) -> Frame {
        Frame::new(vec![128; 200 * 100 * 3], 200, 100, 3, index)
    }

    fn make_controller(seen: Arc<Mutex<Vec<u32>>>) -> DedupController {
        let scorer = FrameQualityScorer::new(
            ScoreWeights::default(),
            FaceSizeBreakpoints::default(),
            HeadPoseEstimator::new(None),
            None,
        );
        DedupController::new(
            Box::new(RecordingProvider { seen }),
            Box::new(CosineMatcher::new(0.45)),
            Box::new(NullStore),
            scorer,
            QualityGate::new(0.35, 0.70),
            KnownIdentityCache::new(),
            Box::new(SystemClock),
            Duration::from_secs(10),
            None,
        )
    }

    // --- Tests ---

    #[test]
    fn test_decimation_processes_every_nth_frame() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let frames = (0..10).map(|i| Ok(make_frame(i))).collect();
        let mut uc = CountVisitorsUseCase::new(
            Box::new(StubSource::new(frames)),
            make_controller(seen.clone()),
            Box::new(NullRunLogger),
            5,
            1280,
            None,
        );

        uc.execute("stub://camera").unwrap();
        // Frames 0 and 5 survive decimation.
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_frames_resized_before_processing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let frames = vec![Ok(make_frame(0))];
        let mut uc = CountVisitorsUseCase::new(
            Box::new(StubSource::new(frames)),
            make_controller(seen.clone()),
            Box::new(NullRunLogger),
            1,
            100,
            None,
        );

        uc.execute("stub://camera").unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[100]);
    }

    #[test]
    fn test_no_upscale_when_already_narrow() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let frames = vec![Ok(make_frame(0))];
        let mut uc = CountVisitorsUseCase::new(
            Box::new(StubSource::new(frames)),
            make_controller(seen.clone()),
            Box::new(NullRunLogger),
            1,
            1280,
            None,
        );

        uc.execute("stub://camera").unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[200]);
    }

    #[test]
    fn test_decode_errors_are_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let frames = vec![
            Ok(make_frame(0)),
            Err("corrupt packet".into()),
            Ok(make_frame(1)),
        ];
        let mut uc = CountVisitorsUseCase::new(
            Box::new(StubSource::new(frames)),
            make_controller(seen.clone()),
            Box::new(NullRunLogger),
            1,
            1280,
            None,
        );

        uc.execute("stub://camera").unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_stop_flag_ends_run_and_closes_source() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let frames = (0..100).map(|i| Ok(make_frame(i))).collect();
        let source = StubSource::new(frames);
        let closed = source.closed.clone();

        let cancelled = Arc::new(AtomicBool::new(true));
        let mut uc = CountVisitorsUseCase::new(
            Box::new(source),
            make_controller(seen.clone()),
            Box::new(NullRunLogger),
            1,
            1280,
            Some(cancelled),
        );

        uc.execute("stub://camera").unwrap();
        assert!(seen.lock().unwrap().is_empty());
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_empty_source_returns_zero_stats() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut uc = CountVisitorsUseCase::new(
            Box::new(StubSource::new(Vec::new())),
            make_controller(seen),
            Box::new(NullRunLogger),
            1,
            1280,
            None,
        );

        let stats = uc.execute("stub://camera").unwrap();
        assert_eq!(stats, SessionStats::new());
    }

    #[test]
    fn test_decimation_of_one_processes_everything() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let frames = (0..4).map(|i| Ok(make_frame(i))).collect();
        let mut uc = CountVisitorsUseCase::new(
            Box::new(StubSource::new(frames)),
            make_controller(seen.clone()),
            Box::new(NullRunLogger),
            1,
            1280,
            None,
        );

        uc.execute("stub://camera").unwrap();
        assert_eq!(seen.lock().unwrap().len(), 4);
    }
}
