use crate::analysis::domain::face_order::select_face;
use crate::selection::reference_store::{ReferenceFaceStore, ORIGIN};
use crate::shared::face::{cosine_distance, Face};
use crate::shared::run_config::{FaceSelectorMode, RunConfiguration};

/// Faces whose embedding lies within `max_distance` of the reference.
pub fn find_similar_faces(faces: &[Face], reference: &Face, max_distance: f64) -> Vec<Face> {
    faces
        .iter()
        .filter(|f| cosine_distance(&f.embedding, &reference.embedding) <= max_distance)
        .cloned()
        .collect()
}

/// Picks the faces a processor should transform in one frame.
///
/// In reference mode the processor matches against its own store key,
/// falling back to the origin identity. A store with no entry for either
/// key falls back to unconditional positional selection — a run whose
/// reference resolution was abandoned still processes frames.
pub fn select_target_faces(
    faces: Vec<Face>,
    processor_key: &str,
    store: &ReferenceFaceStore,
    config: &RunConfiguration,
) -> Vec<Face> {
    match config.face_selector_mode {
        FaceSelectorMode::Many => faces,
        FaceSelectorMode::One => positional(faces, config),
        FaceSelectorMode::Reference => {
            match store.get(processor_key).or_else(|| store.get(ORIGIN)) {
                Some(reference) => {
                    find_similar_faces(&faces, reference, config.reference_face_distance)
                }
                None => positional(faces, config),
            }
        }
    }
}

fn positional(faces: Vec<Face>, config: &RunConfiguration) -> Vec<Face> {
    select_face(faces, config.face_order, config.reference_face_position)
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face::{BoundingBox, FaceLandmarks};

    fn face(x1: f64, embedding: Vec<f32>) -> Face {
        Face {
            bounding_box: BoundingBox {
                x1,
                y1: 0.0,
                x2: x1 + 10.0,
                y2: 10.0,
            },
            landmarks: FaceLandmarks::new([(x1, 0.0); 5]),
            embedding,
            score: 0.9,
            age: None,
            gender: None,
        }
    }

    fn config(mode: FaceSelectorMode) -> RunConfiguration {
        RunConfiguration {
            face_selector_mode: mode,
            reference_face_distance: 0.6,
            ..RunConfiguration::default()
        }
    }

    #[test]
    fn test_find_similar_within_distance() {
        let reference = face(0.0, vec![1.0, 0.0]);
        let close = face(10.0, vec![0.95, 0.312]); // distance ~0.05
        let far = face(20.0, vec![0.0, 1.0]); // distance 1.0
        let similar = find_similar_faces(&[close.clone(), far], &reference, 0.6);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].bounding_box.x1, 10.0);
    }

    #[test]
    fn test_many_mode_selects_all() {
        let faces = vec![face(0.0, vec![1.0, 0.0]), face(50.0, vec![0.0, 1.0])];
        let store = ReferenceFaceStore::new();
        let selected =
            select_target_faces(faces, "face_swapper", &store, &config(FaceSelectorMode::Many));
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_one_mode_selects_positional() {
        let faces = vec![face(50.0, vec![1.0, 0.0]), face(0.0, vec![0.0, 1.0])];
        let store = ReferenceFaceStore::new();
        let mut cfg = config(FaceSelectorMode::One);
        cfg.reference_face_position = 0;
        let selected = select_target_faces(faces, "face_swapper", &store, &cfg);
        assert_eq!(selected.len(), 1);
        // Left-most face, not detector-first
        assert_eq!(selected[0].bounding_box.x1, 0.0);
    }

    #[test]
    fn test_reference_mode_matches_processor_key() {
        let mut store = ReferenceFaceStore::new();
        store.append(ORIGIN, face(0.0, vec![0.0, 1.0]));
        store.append("face_swapper", face(0.0, vec![1.0, 0.0]));

        let faces = vec![face(10.0, vec![1.0, 0.0]), face(20.0, vec![0.0, 1.0])];
        let selected = select_target_faces(
            faces,
            "face_swapper",
            &store,
            &config(FaceSelectorMode::Reference),
        );
        // Matches the processor-specific identity, not origin
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].bounding_box.x1, 10.0);
    }

    #[test]
    fn test_reference_mode_falls_back_to_origin() {
        let mut store = ReferenceFaceStore::new();
        store.append(ORIGIN, face(0.0, vec![0.0, 1.0]));

        let faces = vec![face(10.0, vec![1.0, 0.0]), face(20.0, vec![0.0, 1.0])];
        let selected = select_target_faces(
            faces,
            "face_enhancer",
            &store,
            &config(FaceSelectorMode::Reference),
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].bounding_box.x1, 20.0);
    }

    #[test]
    fn test_reference_mode_empty_store_falls_back_to_positional() {
        let store = ReferenceFaceStore::new();
        let faces = vec![face(50.0, vec![1.0, 0.0]), face(0.0, vec![0.0, 1.0])];
        let selected = select_target_faces(
            faces,
            "face_swapper",
            &store,
            &config(FaceSelectorMode::Reference),
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].bounding_box.x1, 0.0);
    }

    #[test]
    fn test_reference_mode_no_similar_faces_is_empty() {
        let mut store = ReferenceFaceStore::new();
        store.append(ORIGIN, face(0.0, vec![1.0, 0.0]));

        let faces = vec![face(10.0, vec![0.0, 1.0])];
        let selected = select_target_faces(
            faces,
            "face_swapper",
            &store,
            &config(FaceSelectorMode::Reference),
        );
        assert!(selected.is_empty());
    }
}
