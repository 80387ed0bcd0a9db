pub mod face_crop;
pub mod face_enhance_processor;
pub mod face_swap_processor;
pub mod frame_worker_pool;
pub mod onnx_enhance_engine;
pub mod onnx_swap_engine;
