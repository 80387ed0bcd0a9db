use std::sync::Arc;

use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::processors::domain::frame_processor::FrameProcessor;
use crate::selection::reference_store::{ReferenceFaceStore, ORIGIN};
use crate::shared::face::{average_face, Face};
use crate::shared::frame::Frame;
use crate::shared::run_config::{FaceSelectorMode, RunConfiguration};
use crate::video::domain::frame_grabber::FrameGrabber;

/// Establishes the cross-frame notion of "which detected face is the
/// subject", once per run.
///
/// Resolution is best effort: any missing face abandons the remaining
/// steps with a warning and leaves the store partially populated (or
/// empty). Downstream selection falls back to unconditional positional
/// matching when its key is absent.
pub struct ReferenceResolver {
    analyzer: Arc<dyn FaceAnalyzer>,
    grabber: Box<dyn FrameGrabber>,
}

impl ReferenceResolver {
    pub fn new(analyzer: Arc<dyn FaceAnalyzer>, grabber: Box<dyn FrameGrabber>) -> Self {
        Self { analyzer, grabber }
    }

    /// No-op unless the run is reference-based and the store is still
    /// empty, so repeated calls never overwrite an established identity.
    pub fn resolve(
        &self,
        config: &RunConfiguration,
        store: &mut ReferenceFaceStore,
        processors: &[Box<dyn FrameProcessor>],
    ) {
        if config.face_selector_mode != FaceSelectorMode::Reference || !store.is_empty() {
            return;
        }

        let source_face = self.average_source_face(config);

        let Some(reference_frame) = self.reference_frame(config) else {
            log::warn!("reference resolution abandoned: no reference frame available");
            return;
        };

        let reference_face = match self.analyzer.detect_one(
            &reference_frame,
            config.reference_face_position,
            config.face_order,
        ) {
            Ok(Some(face)) => face,
            Ok(None) => {
                log::warn!(
                    "reference resolution abandoned: no face at position {}",
                    config.reference_face_position
                );
                return;
            }
            Err(e) => {
                log::warn!("reference resolution abandoned: {e}");
                return;
            }
        };
        store.append(ORIGIN, reference_face.clone());

        // Processor-specific references only make sense with a source
        // identity to preview against.
        let Some(source_face) = source_face else {
            return;
        };

        let mut current_frame = reference_frame;
        let mut current_face = reference_face;
        for processor in processors {
            let Some(abstract_frame) =
                processor.get_reference_frame(&source_face, &current_face, &current_frame)
            else {
                continue;
            };
            match self.analyzer.detect_one(
                &abstract_frame,
                config.reference_face_position,
                config.face_order,
            ) {
                Ok(Some(face)) => {
                    store.append(processor.name(), face.clone());
                    current_face = face;
                    current_frame = abstract_frame;
                }
                // No face in the preview: keep matching later stages
                // against the previous reference.
                _ => log::debug!(
                    "no face detected in {} reference preview",
                    processor.name()
                ),
            }
        }
    }

    /// Combines every face found in the supplied source images into one
    /// representative identity. Multiple images of the same person reduce
    /// embedding noise.
    fn average_source_face(&self, config: &RunConfiguration) -> Option<Face> {
        let mut faces = Vec::new();
        for path in &config.source_paths {
            match self.grabber.read_image(path) {
                Ok(frame) => match self.analyzer.detect_faces(&frame) {
                    Ok(detected) => faces.extend(detected),
                    Err(e) => {
                        log::warn!("face detection failed for source {}: {e}", path.display())
                    }
                },
                Err(e) => log::warn!("could not read source image {}: {e}", path.display()),
            }
        }
        average_face(&faces)
    }

    fn reference_frame(&self, config: &RunConfiguration) -> Option<Frame> {
        if let Some(override_path) = &config.reference_frame_override {
            if override_path.is_file() {
                match self.grabber.read_image(override_path) {
                    Ok(frame) => return Some(frame),
                    Err(e) => log::warn!(
                        "could not read reference override {}: {e}",
                        override_path.display()
                    ),
                }
            }
        }
        if config.is_video_target() {
            match self
                .grabber
                .grab_frame(&config.target_path, config.reference_frame_number)
            {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("could not grab reference frame: {e}");
                    None
                }
            }
        } else {
            match self.grabber.read_image(&config.target_path) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    log::warn!("could not read target image: {e}");
                    None
                }
            }
        }
    }
}
