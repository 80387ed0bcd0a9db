use crate::shared::face::Face;
use crate::shared::frame::Frame;

/// Port for the neural face-restoration backend. Same lifecycle
/// contract as the swap engine.
pub trait EnhanceEngine: Send + Sync {
    fn prepare(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn is_ready(&self) -> bool;

    /// Returns a copy of `frame` with `target`'s face restored/sharpened.
    fn enhance(
        &self,
        target: &Face,
        frame: &Frame,
    ) -> Result<Frame, Box<dyn std::error::Error>>;

    fn release(&mut self);
}
