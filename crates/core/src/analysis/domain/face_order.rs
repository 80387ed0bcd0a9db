use crate::shared::face::{Face, FaceOrder};

/// Sorts faces according to the configured ordering policy.
///
/// Positional ties break on the other axis so the order stays total; score
/// ties fall back to left-edge order.
pub fn sort_faces(faces: &mut [Face], order: FaceOrder) {
    match order {
        FaceOrder::LeftRight => sort_by(faces, |f| (f.bounding_box.x1, f.bounding_box.y1)),
        FaceOrder::RightLeft => sort_by(faces, |f| (-f.bounding_box.x1, f.bounding_box.y1)),
        FaceOrder::TopBottom => sort_by(faces, |f| (f.bounding_box.y1, f.bounding_box.x1)),
        FaceOrder::BottomTop => sort_by(faces, |f| (-f.bounding_box.y1, f.bounding_box.x1)),
        FaceOrder::SmallLarge => sort_by(faces, |f| (f.bounding_box.area(), f.bounding_box.x1)),
        FaceOrder::LargeSmall => sort_by(faces, |f| (-f.bounding_box.area(), f.bounding_box.x1)),
        FaceOrder::BestWorst => sort_by(faces, |f| (-f.score, f.bounding_box.x1)),
        FaceOrder::WorstBest => sort_by(faces, |f| (f.score, f.bounding_box.x1)),
    }
}

/// The face at ordinal `position` under the given ordering policy.
pub fn select_face(mut faces: Vec<Face>, order: FaceOrder, position: usize) -> Option<Face> {
    sort_faces(&mut faces, order);
    if position < faces.len() {
        Some(faces.swap_remove(position))
    } else {
        None
    }
}

fn sort_by(faces: &mut [Face], key: impl Fn(&Face) -> (f64, f64)) {
    faces.sort_by(|a, b| {
        key(a)
            .partial_cmp(&key(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
