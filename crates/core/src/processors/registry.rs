use std::collections::HashMap;

use thiserror::Error;

use crate::processors::domain::frame_processor::FrameProcessor;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("unknown frame processor '{0}'")]
    Unknown(String),
}

pub type ProcessorFactory = Box<dyn Fn() -> Box<dyn FrameProcessor> + Send>;

/// Registry of available frame processors.
///
/// Embedders register a factory per processor name; a run's chain is then
/// instantiated from the configured names, in configured order. Unknown
/// names are a configuration error caught before any run starts — the
/// orchestrator never reflects over processor internals.
#[derive(Default)]
pub struct ProcessorRegistry {
    factories: HashMap<String, ProcessorFactory>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, factory: ProcessorFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiates the processor chain for `names`, preserving order.
    pub fn create_chain(
        &self,
        names: &[String],
    ) -> Result<Vec<Box<dyn FrameProcessor>>, RegistryError> {
        names
            .iter()
            .map(|name| {
                self.factories
                    .get(name)
                    .map(|factory| factory())
                    .ok_or_else(|| RegistryError::Unknown(name.clone()))
            })
            .collect()
    }
}
