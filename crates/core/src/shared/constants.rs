pub const DETECTOR_MODEL_NAME: &str = "yoloface_8n.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/facefusion/facefusion-assets/releases/download/models/yoloface_8n.onnx";

pub const EMBEDDER_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDER_MODEL_URL: &str =
    "https://github.com/facefusion/facefusion-assets/releases/download/models/w600k_r50.onnx";

pub const SWAP_MODEL_NAME: &str = "inswapper_128.onnx";
pub const SWAP_MODEL_URL: &str =
    "https://github.com/facefusion/facefusion-assets/releases/download/models/inswapper_128.onnx";

pub const ENHANCE_MODEL_NAME: &str = "gfpgan_1.4.onnx";
pub const ENHANCE_MODEL_URL: &str =
    "https://github.com/facefusion/facefusion-assets/releases/download/models/gfpgan_1.4.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm", "m4v"];

/// Subdirectory of the system temp dir holding per-target frame workspaces.
pub const WORKSPACE_DIR_NAME: &str = "faceweave";

/// Extension used for extracted frame files.
pub const FRAME_EXTENSION: &str = "jpg";

/// Zero-padded width of frame file names; enumeration order = temporal order.
pub const FRAME_INDEX_WIDTH: usize = 6;

/// File name of the merged (not yet audio-restored) video inside a workspace.
pub const TEMP_OUTPUT_NAME: &str = "merged.mp4";
