use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::shared::face::FaceOrder;

/// How processors pick which detected faces to transform in each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaceSelectorMode {
    /// The single face at the configured position.
    One,
    /// Every detected face.
    Many,
    /// Faces matching the resolved reference identity.
    #[default]
    Reference,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("target not found: {0}")]
    TargetNotFound(PathBuf),
    #[error("target is neither an image nor a video: {0}")]
    UnsupportedTarget(PathBuf),
    #[error("source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("no frame processors configured")]
    EmptyProcessorChain,
    #[error("trim range is inverted: start {start} > end {end}")]
    InvertedTrimRange { start: usize, end: usize },
    #[error("{name} must be between 0 and 100, got {value}")]
    QualityOutOfRange { name: &'static str, value: u8 },
    #[error("execution thread count must be at least 1")]
    ZeroThreads,
}

/// Immutable snapshot of all user-chosen options for one invocation.
///
/// Constructed once from external input (CLI layer) and read-only for the
/// rest of the run.
#[derive(Clone, Debug)]
pub struct RunConfiguration {
    pub source_paths: Vec<PathBuf>,
    pub target_path: PathBuf,
    pub output_path: PathBuf,
    pub processor_names: Vec<String>,

    pub trim_frame_start: Option<usize>,
    pub trim_frame_end: Option<usize>,
    /// `None` = keep the target's resolution.
    pub output_resolution: Option<(u32, u32)>,
    /// `None` = keep the target's frame rate.
    pub output_fps: Option<f64>,
    pub temp_frame_quality: u8,
    pub output_image_quality: u8,
    pub output_video_quality: u8,
    pub keep_temp: bool,
    pub skip_audio: bool,

    /// Concurrency hints handed opaquely to each processor.
    pub execution_thread_count: usize,
    pub execution_queue_count: usize,

    pub face_selector_mode: FaceSelectorMode,
    pub face_order: FaceOrder,
    pub reference_face_position: usize,
    pub reference_frame_number: usize,
    pub reference_face_distance: f64,
    /// When present on disk, overrides reference-frame selection.
    pub reference_frame_override: Option<PathBuf>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            source_paths: Vec::new(),
            target_path: PathBuf::new(),
            output_path: PathBuf::new(),
            processor_names: Vec::new(),
            trim_frame_start: None,
            trim_frame_end: None,
            output_resolution: None,
            output_fps: None,
            temp_frame_quality: 100,
            output_image_quality: 80,
            output_video_quality: 80,
            keep_temp: false,
            skip_audio: false,
            execution_thread_count: 4,
            execution_queue_count: 1,
            face_selector_mode: FaceSelectorMode::Reference,
            face_order: FaceOrder::LeftRight,
            reference_face_position: 0,
            reference_frame_number: 0,
            reference_face_distance: 0.6,
            reference_frame_override: None,
        }
    }
}

impl RunConfiguration {
    pub fn is_image_target(&self) -> bool {
        has_extension(&self.target_path, IMAGE_EXTENSIONS)
    }

    pub fn is_video_target(&self) -> bool {
        has_extension(&self.target_path, VIDEO_EXTENSIONS)
    }

    /// Checks paths and value ranges. Unknown processor names are caught
    /// separately by the registry, before this is ever reached.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_path.exists() {
            return Err(ConfigError::TargetNotFound(self.target_path.clone()));
        }
        if !self.is_image_target() && !self.is_video_target() {
            return Err(ConfigError::UnsupportedTarget(self.target_path.clone()));
        }
        for source in &self.source_paths {
            if !source.exists() {
                return Err(ConfigError::SourceNotFound(source.clone()));
            }
        }
        if self.processor_names.is_empty() {
            return Err(ConfigError::EmptyProcessorChain);
        }
        if let (Some(start), Some(end)) = (self.trim_frame_start, self.trim_frame_end) {
            if start > end {
                return Err(ConfigError::InvertedTrimRange { start, end });
            }
        }
        for (name, value) in [
            ("temp frame quality", self.temp_frame_quality),
            ("output image quality", self.output_image_quality),
            ("output video quality", self.output_video_quality),
        ] {
            if value > 100 {
                return Err(ConfigError::QualityOutOfRange { name, value });
            }
        }
        if self.execution_thread_count == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
