/// Axis-aligned face bounding box in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// 5-point landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeBracket {
    Child,
    Teen,
    Adult,
    Senior,
}

/// Ordering policy for ranking detected faces within one frame.
///
/// "Face at position N" always means position N under the configured
/// policy, never raw detector order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaceOrder {
    #[default]
    LeftRight,
    RightLeft,
    TopBottom,
    BottomTop,
    SmallLarge,
    LargeSmall,
    BestWorst,
    WorstBest,
}

/// A detected face: region, landmarks, identity embedding, and optional
/// derived attributes. Immutable once created.
#[derive(Clone, Debug)]
pub struct Face {
    pub bounding_box: BoundingBox,
    pub landmarks: FaceLandmarks,
    /// L2-normalized identity embedding.
    pub embedding: Vec<f32>,
    pub score: f64,
    pub age: Option<AgeBracket>,
    pub gender: Option<Gender>,
}

/// Scales a vector to unit L2 norm in place. Zero vectors are left as-is.
pub fn l2_normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine distance between two normalized embeddings: 0.0 = identical,
/// 2.0 = opposite. Mismatched lengths count as maximally distant.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 2.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    1.0 - dot as f64
}

/// Combines several detections of the same person into one representative
/// identity: the arithmetic mean of the normalized embeddings, re-normalized.
/// Region and landmarks come from the first face. Returns `None` when the
/// input is empty or the embedding dimensions disagree.
pub fn average_face(faces: &[Face]) -> Option<Face> {
    let first = faces.first()?;
    let dim = first.embedding.len();
    if dim == 0 || faces.iter().any(|f| f.embedding.len() != dim) {
        return None;
    }

    let mut mean = vec![0.0f32; dim];
    for face in faces {
        for (m, v) in mean.iter_mut().zip(&face.embedding) {
            *m += v;
        }
    }
    for m in mean.iter_mut() {
        *m /= faces.len() as f32;
    }
    l2_normalize(&mut mean);

    Some(Face {
        embedding: mean,
        ..first.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) fn face_with_embedding(embedding: Vec<f32>) -> Face {
        Face {
            bounding_box: BoundingBox {
                x1: 10.0,
                y1: 10.0,
                x2: 50.0,
                y2: 60.0,
            },
            landmarks: FaceLandmarks::new([(20.0, 25.0); 5]),
            embedding,
            score: 0.9,
            age: None,
            gender: None,
        }
    }

    #[test]
    fn test_bounding_box_geometry() {
        let bbox = BoundingBox {
            x1: 10.0,
            y1: 20.0,
            x2: 40.0,
            y2: 60.0,
        };
        assert_relative_eq!(bbox.width(), 30.0);
        assert_relative_eq!(bbox.height(), 40.0);
        assert_relative_eq!(bbox.area(), 1200.0);
        assert_eq!(bbox.center(), (25.0, 40.0));
    }

    #[test]
    fn test_degenerate_box_has_zero_area() {
        let bbox = BoundingBox {
            x1: 50.0,
            y1: 50.0,
            x2: 40.0,
            y2: 60.0,
        };
        assert_relative_eq!(bbox.width(), 0.0);
        assert_relative_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn test_l2_normalize_unit_norm() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert_relative_eq!(v[0], 0.6);
        assert_relative_eq!(v[1], 0.8);
    }

    #[test]
    fn test_l2_normalize_zero_vector_unchanged() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cosine_distance_identical_is_zero() {
        let v = vec![0.6f32, 0.8];
        assert_relative_eq!(cosine_distance(&v, &v), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_distance_orthogonal_is_one() {
        let a = vec![1.0f32, 0.0];
        let b = vec![0.0f32, 1.0];
        assert_relative_eq!(cosine_distance(&a, &b), 1.0);
    }

    #[test]
    fn test_cosine_distance_mismatched_lengths() {
        assert_relative_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), 2.0);
        assert_relative_eq!(cosine_distance(&[], &[]), 2.0);
    }

    #[test]
    fn test_average_face_of_one_is_identity() {
        let face = face_with_embedding(vec![0.6, 0.8]);
        let avg = average_face(std::slice::from_ref(&face)).unwrap();
        assert_relative_eq!(avg.embedding[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(avg.embedding[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_average_face_mean_renormalized() {
        let a = face_with_embedding(vec![1.0, 0.0]);
        let b = face_with_embedding(vec![0.0, 1.0]);
        let avg = average_face(&[a, b]).unwrap();
        // mean = (0.5, 0.5), renormalized = (1/sqrt(2), 1/sqrt(2))
        let expected = 1.0 / 2.0f32.sqrt();
        assert_relative_eq!(avg.embedding[0], expected, epsilon = 1e-6);
        assert_relative_eq!(avg.embedding[1], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_average_face_order_independent() {
        let a = face_with_embedding(vec![0.9, 0.1, 0.3]);
        let b = face_with_embedding(vec![0.2, 0.7, 0.5]);
        let ab = average_face(&[a.clone(), b.clone()]).unwrap();
        let ba = average_face(&[b, a]).unwrap();
        for (x, y) in ab.embedding.iter().zip(&ba.embedding) {
            assert_relative_eq!(*x, *y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_average_face_takes_region_from_first() {
        let mut a = face_with_embedding(vec![1.0, 0.0]);
        a.bounding_box.x1 = 99.0;
        let b = face_with_embedding(vec![0.0, 1.0]);
        let avg = average_face(&[a, b]).unwrap();
        assert_relative_eq!(avg.bounding_box.x1, 99.0);
    }

    #[test]
    fn test_average_face_empty_is_none() {
        assert!(average_face(&[]).is_none());
    }

    #[test]
    fn test_average_face_dimension_mismatch_is_none() {
        let a = face_with_embedding(vec![1.0, 0.0]);
        let b = face_with_embedding(vec![1.0]);
        assert!(average_face(&[a, b]).is_none());
    }
}
