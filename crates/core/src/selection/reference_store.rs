use std::collections::HashMap;

use crate::shared::face::Face;

/// Store key for the reference face before any processor-specific
/// transformation is applied.
pub const ORIGIN: &str = "origin";

/// Run-scoped mapping from processor name (or [`ORIGIN`]) to the face
/// chosen to represent the subject for that stage's matching logic.
///
/// Populated once during reference resolution and read by every
/// subsequent frame-processing call. A key is only ever written once per
/// run: the first resolution wins and later writes are ignored, so an
/// already-established identity can never flicker mid-run.
#[derive(Debug, Default)]
pub struct ReferenceFaceStore {
    faces: HashMap<String, Face>,
}

impl ReferenceFaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the face under `key` unless that key is already resolved.
    /// Returns whether the face was stored.
    pub fn append(&mut self, key: &str, face: Face) -> bool {
        if self.faces.contains_key(key) {
            return false;
        }
        self.faces.insert(key.to_string(), face);
        true
    }

    pub fn get(&self, key: &str) -> Option<&Face> {
        self.faces.get(key)
    }

    pub fn origin(&self) -> Option<&Face> {
        self.get(ORIGIN)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn clear(&mut self) {
        self.faces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face::{BoundingBox, FaceLandmarks};

    fn face(marker: f64) -> Face {
        Face {
            bounding_box: BoundingBox {
                x1: marker,
                y1: 0.0,
                x2: marker + 10.0,
                y2: 10.0,
            },
            landmarks: FaceLandmarks::new([(0.0, 0.0); 5]),
            embedding: vec![1.0],
            score: 0.9,
            age: None,
            gender: None,
        }
    }

    #[test]
    fn test_starts_empty() {
        let store = ReferenceFaceStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.origin().is_none());
    }

    #[test]
    fn test_append_and_get() {
        let mut store = ReferenceFaceStore::new();
        assert!(store.append(ORIGIN, face(1.0)));
        assert!(store.append("face_swapper", face(2.0)));

        assert_eq!(store.len(), 2);
        assert_eq!(store.origin().unwrap().bounding_box.x1, 1.0);
        assert_eq!(store.get("face_swapper").unwrap().bounding_box.x1, 2.0);
    }

    #[test]
    fn test_first_write_wins() {
        let mut store = ReferenceFaceStore::new();
        assert!(store.append(ORIGIN, face(1.0)));
        assert!(!store.append(ORIGIN, face(99.0)));
        assert_eq!(store.origin().unwrap().bounding_box.x1, 1.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = ReferenceFaceStore::new();
        store.append(ORIGIN, face(1.0));
        store.clear();
        assert!(store.is_empty());
        // After a clear, the key is writable again
        assert!(store.append(ORIGIN, face(2.0)));
        assert_eq!(store.origin().unwrap().bounding_box.x1, 2.0);
    }
}
