use crate::analysis::domain::face_order::select_face;
use crate::shared::face::{Face, FaceOrder};
use crate::shared::frame::Frame;

/// Domain interface for face detection and identity embedding.
///
/// Implementations are shared across processors and the reference
/// resolver, so calls take `&self`; stateful backends guard their
/// sessions internally.
pub trait FaceAnalyzer: Send + Sync {
    /// Detects all faces in a frame, in detector order.
    fn detect_faces(&self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>>;

    /// The face at ordinal `position` under the given ordering policy,
    /// or `None` when fewer faces are present.
    fn detect_one(
        &self,
        frame: &Frame,
        position: usize,
        order: FaceOrder,
    ) -> Result<Option<Face>, Box<dyn std::error::Error>> {
        let faces = self.detect_faces(frame)?;
        Ok(select_face(faces, order, position))
    }
}
