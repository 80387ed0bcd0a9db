use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use faceweave_core::analysis::domain::face_analyzer::FaceAnalyzer;
use faceweave_core::analysis::infrastructure::onnx_face_analyzer::{
    OnnxFaceAnalyzer, DEFAULT_SCORE_THRESHOLD,
};
use faceweave_core::pipeline::process_image_use_case::ProcessImageUseCase;
use faceweave_core::pipeline::process_video_use_case::ProcessVideoUseCase;
use faceweave_core::pipeline::readiness_gate::ReadinessGate;
use faceweave_core::pipeline::run_pipeline_use_case::RunPipelineUseCase;
use faceweave_core::policy::infrastructure::permissive_policy::PermissivePolicy;
use faceweave_core::processors::infrastructure::face_enhance_processor::FaceEnhanceProcessor;
use faceweave_core::processors::infrastructure::face_swap_processor::FaceSwapProcessor;
use faceweave_core::processors::infrastructure::onnx_enhance_engine::OnnxEnhanceEngine;
use faceweave_core::processors::infrastructure::onnx_swap_engine::OnnxSwapEngine;
use faceweave_core::processors::registry::ProcessorRegistry;
use faceweave_core::selection::reference_resolver::ReferenceResolver;
use faceweave_core::shared::face::FaceOrder;
use faceweave_core::shared::run_config::{FaceSelectorMode, RunConfiguration};
use faceweave_core::video::infrastructure::ffmpeg_audio_restorer::FfmpegAudioRestorer;
use faceweave_core::video::infrastructure::ffmpeg_frame_extractor::FfmpegFrameExtractor;
use faceweave_core::video::infrastructure::ffmpeg_frame_grabber::FfmpegFrameGrabber;
use faceweave_core::video::infrastructure::ffmpeg_video_merger::FfmpegVideoMerger;
use faceweave_core::video::infrastructure::image_file_compressor::ImageFileCompressor;
use faceweave_core::workspace::temp_workspace::TempWorkspace;

/// Face identity replacement for videos and images.
#[derive(Parser)]
#[command(name = "faceweave")]
struct Cli {
    /// Source face image(s); repeat for multiple shots of the same person.
    #[arg(short, long = "source", required = true)]
    sources: Vec<PathBuf>,

    /// Target image or video.
    #[arg(short, long)]
    target: PathBuf,

    /// Output file.
    #[arg(short, long)]
    output: PathBuf,

    /// Frame processors to run, in order.
    #[arg(long, value_delimiter = ',', default_value = "face_swapper")]
    processors: Vec<String>,

    /// Face selector mode: one, many, or reference.
    #[arg(long, default_value = "reference")]
    selector_mode: String,

    /// Face ordering policy for positional selection.
    #[arg(long, default_value = "left-right")]
    face_order: String,

    /// Ordinal position of the reference face under the ordering policy.
    #[arg(long, default_value = "0")]
    reference_face_position: usize,

    /// Frame number the reference face is resolved from (video targets).
    #[arg(long, default_value = "0")]
    reference_frame_number: usize,

    /// Maximum embedding distance for reference matching (0.0-2.0).
    #[arg(long, default_value = "0.6")]
    reference_face_distance: f64,

    /// Image to resolve the reference face from instead of the target.
    #[arg(long)]
    reference_frame_override: Option<PathBuf>,

    /// First frame to process (inclusive).
    #[arg(long)]
    trim_frame_start: Option<usize>,

    /// Last frame to process (exclusive).
    #[arg(long)]
    trim_frame_end: Option<usize>,

    /// Output resolution as WIDTHxHEIGHT (default: target resolution).
    #[arg(long)]
    resolution: Option<String>,

    /// Output frame rate (default: target frame rate).
    #[arg(long)]
    fps: Option<f64>,

    /// Extracted frame JPEG quality (0-100).
    #[arg(long, default_value = "100")]
    temp_frame_quality: u8,

    /// Output image quality (0-100).
    #[arg(long, default_value = "80")]
    output_image_quality: u8,

    /// Output video quality (0-100).
    #[arg(long, default_value = "80")]
    output_video_quality: u8,

    /// Keep the temp workspace after the run.
    #[arg(long)]
    keep_temp: bool,

    /// Skip audio restoration.
    #[arg(long)]
    skip_audio: bool,

    /// Worker threads per processor.
    #[arg(long, default_value = "4")]
    execution_threads: usize,

    /// Queued frames per processor worker pool.
    #[arg(long, default_value = "1")]
    execution_queues: usize,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    detector_score: f64,
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
    let config = build_config(&cli)?;

    log::info!("resolving face analysis models");
    let analyzer: Arc<dyn FaceAnalyzer> = Arc::new(OnnxFaceAnalyzer::new(
        if cli.detector_score > 0.0 {
            cli.detector_score
        } else {
            DEFAULT_SCORE_THRESHOLD
        },
        Some(download_progress),
    )?);
    eprintln!();

    let registry = build_registry(analyzer.clone());
    let processors = registry.create_chain(&config.processor_names)?;

    let mut pipeline = RunPipelineUseCase::new(
        processors,
        ReadinessGate::new(),
        ReferenceResolver::new(analyzer, Box::new(FfmpegFrameGrabber)),
        ProcessImageUseCase::new(
            Box::new(PermissivePolicy),
            Box::new(ImageFileCompressor),
            Box::new(FfmpegFrameGrabber),
            None,
        ),
        ProcessVideoUseCase::new(
            Box::new(PermissivePolicy),
            Box::new(FfmpegFrameExtractor),
            Box::new(FfmpegVideoMerger),
            Box::new(FfmpegAudioRestorer),
            Box::new(FfmpegFrameGrabber),
            TempWorkspace::new(),
            None,
        ),
    );

    let outcome = pipeline.run(&config)?;
    if !outcome.is_success() {
        return Err(outcome.to_string().into());
    }
    log::info!("output written to {}", config.output_path.display());
    Ok(())
}

fn build_registry(analyzer: Arc<dyn FaceAnalyzer>) -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    let swap_analyzer = analyzer.clone();
    registry.register(
        "face_swapper",
        Box::new(move || {
            Box::new(FaceSwapProcessor::new(
                swap_analyzer.clone(),
                Box::new(OnnxSwapEngine::new(Some(download_progress))),
            ))
        }),
    );
    registry.register(
        "face_enhancer",
        Box::new(move || {
            Box::new(FaceEnhanceProcessor::new(
                analyzer.clone(),
                Box::new(OnnxEnhanceEngine::new(Some(download_progress))),
            ))
        }),
    );
    registry
}

fn build_config(cli: &Cli) -> Result<RunConfiguration, Box<dyn std::error::Error>> {
    Ok(RunConfiguration {
        source_paths: cli.sources.clone(),
        target_path: cli.target.clone(),
        output_path: cli.output.clone(),
        processor_names: cli.processors.clone(),
        trim_frame_start: cli.trim_frame_start,
        trim_frame_end: cli.trim_frame_end,
        output_resolution: cli.resolution.as_deref().map(parse_resolution).transpose()?,
        output_fps: cli.fps,
        temp_frame_quality: cli.temp_frame_quality,
        output_image_quality: cli.output_image_quality,
        output_video_quality: cli.output_video_quality,
        keep_temp: cli.keep_temp,
        skip_audio: cli.skip_audio,
        execution_thread_count: cli.execution_threads,
        execution_queue_count: cli.execution_queues,
        face_selector_mode: parse_selector_mode(&cli.selector_mode)?,
        face_order: parse_face_order(&cli.face_order)?,
        reference_face_position: cli.reference_face_position,
        reference_frame_number: cli.reference_frame_number,
        reference_face_distance: cli.reference_face_distance,
        reference_frame_override: cli.reference_frame_override.clone(),
    })
}

fn parse_selector_mode(value: &str) -> Result<FaceSelectorMode, Box<dyn std::error::Error>> {
    match value {
        "one" => Ok(FaceSelectorMode::One),
        "many" => Ok(FaceSelectorMode::Many),
        "reference" => Ok(FaceSelectorMode::Reference),
        other => Err(format!("Selector mode must be one, many, or reference, got '{other}'").into()),
    }
}

fn parse_face_order(value: &str) -> Result<FaceOrder, Box<dyn std::error::Error>> {
    match value {
        "left-right" => Ok(FaceOrder::LeftRight),
        "right-left" => Ok(FaceOrder::RightLeft),
        "top-bottom" => Ok(FaceOrder::TopBottom),
        "bottom-top" => Ok(FaceOrder::BottomTop),
        "small-large" => Ok(FaceOrder::SmallLarge),
        "large-small" => Ok(FaceOrder::LargeSmall),
        "best-worst" => Ok(FaceOrder::BestWorst),
        "worst-best" => Ok(FaceOrder::WorstBest),
        other => Err(format!("Unknown face order '{other}'").into()),
    }
}

fn parse_resolution(value: &str) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("Resolution must be WIDTHxHEIGHT, got '{value}'"))?;
    Ok((width.trim().parse()?, height.trim().parse()?))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
