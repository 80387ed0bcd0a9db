pub mod onnx_face_analyzer;
