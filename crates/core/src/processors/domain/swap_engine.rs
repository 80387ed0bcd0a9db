use crate::shared::face::Face;
use crate::shared::frame::Frame;

/// Port for the neural face-swap backend.
///
/// Engines own their backing resources: `prepare` resolves weights (and
/// may download them), `is_ready` reflects true loading state without
/// blocking, `release` drops whatever was lazily loaded.
pub trait SwapEngine: Send + Sync {
    fn prepare(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn is_ready(&self) -> bool;

    /// Returns a copy of `frame` with `target`'s face replaced by the
    /// `source` identity.
    fn swap(
        &self,
        source: &Face,
        target: &Face,
        frame: &Frame,
    ) -> Result<Frame, Box<dyn std::error::Error>>;

    fn release(&mut self);
}
