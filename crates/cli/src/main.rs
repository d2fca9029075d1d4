use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use footfall_core::counting::domain::clock::SystemClock;
use footfall_core::counting::domain::controller::DedupController;
use footfall_core::counting::domain::known_identities::KnownIdentityCache;
use footfall_core::pipeline::count_visitors_use_case::CountVisitorsUseCase;
use footfall_core::pipeline::debug_report::DebugSession;
use footfall_core::pipeline::run_logger::{RunLogger, StdoutRunLogger};
use footfall_core::quality::domain::frame_scorer::FrameQualityScorer;
use footfall_core::quality::domain::head_pose::HeadPoseEstimator;
use footfall_core::quality::domain::quality_gate::QualityGate;
use footfall_core::quality::domain::quality_score::ScoreWeights;
use footfall_core::recognition::domain::identity_matcher::CosineMatcher;
use footfall_core::recognition::domain::visitor_store::VisitorStore;
use footfall_core::recognition::infrastructure::arcface_embedder::ArcFaceEmbedder;
use footfall_core::recognition::infrastructure::onnx_embedding_provider::OnnxEmbeddingProvider;
use footfall_core::recognition::infrastructure::onnx_face_detector::{
    OnnxFaceDetector, DEFAULT_CONFIDENCE,
};
use footfall_core::recognition::infrastructure::sqlite_visitor_store::SqliteVisitorStore;
use footfall_core::shared::config::{CounterConfig, FaceSizeBreakpoints};
use footfall_core::shared::model_resolver::{
    self, DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL, EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL,
};
use footfall_core::video::domain::snapshot_writer::SnapshotWriter;
use footfall_core::video::infrastructure::ffmpeg_source::FfmpegSource;
use footfall_core::video::infrastructure::jpeg_snapshot_writer::JpegSnapshotWriter;

/// Count unique visitors in a camera stream or video file.
#[derive(Parser)]
#[command(name = "footfall")]
struct Cli {
    /// Camera URL (rtsp://, http://) or video file path.
    input: String,

    /// Visitor database file.
    #[arg(long, default_value = "visitors.db")]
    db: PathBuf,

    /// Detector confidence below which a face is ignored (0.0-1.0).
    #[arg(long, default_value = "0.7")]
    min_confidence: f64,

    /// Aggregate quality score below which a face is not matched.
    #[arg(long, default_value = "0.35")]
    min_quality: f64,

    /// Cosine similarity required to match a known visitor (0.0-1.0).
    #[arg(long, default_value = "0.45")]
    similarity: f64,

    /// Seconds to wait after a capture before the next one.
    #[arg(long, default_value = "10")]
    cooldown_secs: u64,

    /// Process every Nth frame (1 = every frame).
    #[arg(long, default_value = "5")]
    process_every: usize,

    /// Resize frames wider than this before processing.
    #[arg(long, default_value = "1280")]
    target_width: u32,

    /// Quality weight for face size.
    #[arg(long, default_value = "0.15")]
    weight_size: f64,

    /// Quality weight for sharpness.
    #[arg(long, default_value = "0.30")]
    weight_sharpness: f64,

    /// Quality weight for brightness.
    #[arg(long, default_value = "0.15")]
    weight_brightness: f64,

    /// Quality weight for contrast.
    #[arg(long, default_value = "0.15")]
    weight_contrast: f64,

    /// Quality weight for frontality.
    #[arg(long, default_value = "0.25")]
    weight_frontality: f64,

    /// Save a sample JPEG per new visitor into this directory.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Directory with pre-downloaded ONNX models (skips download).
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Write annotated frames and a score report into this directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Stop gracefully after this many seconds (default: run until the
    /// input ends).
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Log a progress line every N frames.
    #[arg(long, default_value = "100")]
    log_every: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    config.validate()?;

    let provider = build_provider(&cli)?;

    let mut store = SqliteVisitorStore::open(&cli.db)?;
    let cache = KnownIdentityCache::load(&store)?;
    let enrolled = store.count()?;
    log::info!(
        "visitor database {} open: {} enrolled",
        cli.db.display(),
        enrolled
    );

    let scorer = FrameQualityScorer::new(
        config.weights,
        config.face_size,
        HeadPoseEstimator::new(None),
        None,
    );
    let gate = QualityGate::new(config.min_quality_score, config.min_detection_confidence);
    let matcher = CosineMatcher::new(config.similarity_threshold);
    let snapshots: Option<Box<dyn SnapshotWriter>> = cli
        .snapshot_dir
        .as_deref()
        .map(|dir| Box::new(JpegSnapshotWriter::new(dir)) as Box<dyn SnapshotWriter>);

    let controller = DedupController::new(
        provider,
        Box::new(matcher),
        Box::new(store),
        scorer,
        gate,
        cache,
        Box::new(SystemClock),
        config.cooldown,
        snapshots,
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    if let Some(secs) = cli.duration_secs {
        let flag = cancelled.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            flag.store(true, Ordering::Relaxed);
        });
    }

    let mut logger = StdoutRunLogger::new(cli.log_every);
    logger.info(&format!(
        "counting visitors on {} (similarity {:.2}, cooldown {}s, every {} frames)",
        cli.input,
        config.similarity_threshold,
        config.cooldown.as_secs(),
        config.process_every_n_frames
    ));

    let mut use_case = CountVisitorsUseCase::new(
        Box::new(FfmpegSource::new()),
        controller,
        Box::new(logger),
        config.process_every_n_frames as u32,
        config.target_width,
        Some(cancelled),
    );
    if let Some(dir) = cli.debug_dir.as_deref() {
        use_case = use_case.with_debug(DebugSession::new(dir));
    }

    let stats = use_case.execute(&cli.input)?;
    println!("Session: {stats}");
    Ok(())
}

fn build_config(cli: &Cli) -> CounterConfig {
    CounterConfig {
        min_detection_confidence: cli.min_confidence,
        min_quality_score: cli.min_quality,
        similarity_threshold: cli.similarity,
        cooldown: Duration::from_secs(cli.cooldown_secs),
        weights: ScoreWeights {
            face_size: cli.weight_size,
            sharpness: cli.weight_sharpness,
            brightness: cli.weight_brightness,
            contrast: cli.weight_contrast,
            frontality: cli.weight_frontality,
        },
        face_size: FaceSizeBreakpoints::default(),
        process_every_n_frames: cli.process_every,
        target_width: cli.target_width,
    }
}

fn build_provider(cli: &Cli) -> Result<Box<OnnxEmbeddingProvider>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {DETECTOR_MODEL_NAME}");
    let detector_path = model_resolver::resolve(
        DETECTOR_MODEL_NAME,
        DETECTOR_MODEL_URL,
        cli.models_dir.as_deref(),
        Some(Box::new(|d, t| download_progress("face detection", d, t))),
    )?;
    eprintln!();

    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let embedder_path = model_resolver::resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        cli.models_dir.as_deref(),
        Some(Box::new(|d, t| download_progress("face embedding", d, t))),
    )?;
    eprintln!();

    let detector = OnnxFaceDetector::new(&detector_path, DEFAULT_CONFIDENCE)?;
    let embedder = ArcFaceEmbedder::new(&embedder_path)?;
    Ok(Box::new(OnnxEmbeddingProvider::new(detector, embedder)))
}

fn download_progress(label: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {label} model... {pct}%");
    } else {
        eprint!("\rDownloading {label} model... {downloaded} bytes");
    }
}
