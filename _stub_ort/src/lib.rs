//! THROWAWAY compile-only stub of the `ort` crate. Not shipped.
//! Exists solely so the real onnx-using source can be type-checked in an
//! offline environment where ort-sys cannot download onnxruntime.
use std::fmt;

#[derive(Debug)]
pub struct OrtError(pub String);
impl fmt::Display for OrtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ort stub error: {}", self.0)
    }
}
impl std::error::Error for OrtError {}

pub mod value {
    use super::OrtError;
    pub struct Tensor;
    impl Tensor {
        pub fn from_array<A>(_a: A) -> Result<Tensor, OrtError> {
            Ok(Tensor)
        }
    }
}

pub struct Value {
    data: ndarray::ArrayD<f32>,
}
impl Value {
    pub fn try_extract_array<T>(&self) -> Result<ndarray::ArrayViewD<'_, f32>, OrtError> {
        Ok(self.data.view())
    }
}

pub struct Outputs {
    items: Vec<Value>,
}
impl Outputs {
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
impl std::ops::Index<usize> for Outputs {
    type Output = Value;
    fn index(&self, i: usize) -> &Value {
        &self.items[i]
    }
}

pub mod session {
    use super::{Outputs, OrtError};
    use std::path::Path;

    pub mod builder {
        #[derive(Clone, Copy)]
        pub enum GraphOptimizationLevel {
            Level1,
            Level2,
            Level3,
        }
    }

    pub struct SessionBuilder;
    impl SessionBuilder {
        pub fn with_optimization_level(
            self,
            _level: builder::GraphOptimizationLevel,
        ) -> Result<Self, OrtError> {
            Ok(self)
        }
        pub fn with_inter_threads(self, _n: usize) -> Result<Self, OrtError> {
            Ok(self)
        }
        pub fn with_intra_threads(self, _n: usize) -> Result<Self, OrtError> {
            Ok(self)
        }
        pub fn commit_from_file<P: AsRef<Path>>(self, _path: P) -> Result<Session, OrtError> {
            Ok(Session)
        }
    }

    pub struct Session;
    impl Session {
        pub fn builder() -> Result<SessionBuilder, OrtError> {
            Ok(SessionBuilder)
        }
        pub fn run<T>(&mut self, _inputs: T) -> Result<Outputs, OrtError> {
            Err(OrtError("stub session cannot run".into()))
        }
    }
}

/// Stub of `ort::inputs!` — collects the tensors into a Vec the stub
/// `run` accepts generically.
#[macro_export]
macro_rules! inputs {
    ($($x:expr),* $(,)?) => {
        vec![$($x),*]
    };
}
