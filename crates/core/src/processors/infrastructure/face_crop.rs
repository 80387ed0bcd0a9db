//! Crop/paste helpers shared by the ONNX engines: square model inputs are
//! cut around a face, run through a session, and written back into the
//! frame at the original location.

use crate::shared::face::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CropRect {
    pub x1: usize,
    pub y1: usize,
    pub width: usize,
    pub height: usize,
}

/// Face region expanded by `margin` (fraction of the larger side) and
/// clamped to the frame. `None` when the clamped region is empty.
pub(crate) fn crop_rect(
    bbox: &BoundingBox,
    frame_w: u32,
    frame_h: u32,
    margin: f64,
) -> Option<CropRect> {
    let pad = margin * bbox.width().max(bbox.height());
    let x1 = (bbox.x1 - pad).max(0.0) as usize;
    let y1 = (bbox.y1 - pad).max(0.0) as usize;
    let x2 = ((bbox.x2 + pad).min(frame_w as f64)) as usize;
    let y2 = ((bbox.y2 + pad).min(frame_h as f64)) as usize;

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(CropRect {
        x1,
        y1,
        width: x2 - x1,
        height: y2 - y1,
    })
}

/// Nearest-neighbor resize of a crop to `size`×`size`, normalized as
/// `(value - mean) / std`, NCHW layout.
pub(crate) fn crop_to_tensor(
    frame: &Frame,
    rect: &CropRect,
    size: usize,
    mean: f32,
    std: f32,
) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));

    for y in 0..size {
        let src_y = rect.y1
            + (((y as f64 + 0.5) * rect.height as f64 / size as f64) as usize)
                .min(rect.height - 1);
        for x in 0..size {
            let src_x = rect.x1
                + (((x as f64 + 0.5) * rect.width as f64 / size as f64) as usize)
                    .min(rect.width - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - mean) / std;
            }
        }
    }
    tensor
}

/// Writes a model output tensor back into the frame at `rect`,
/// denormalizing as `value * std + mean` and clamping to u8 range.
pub(crate) fn paste_tensor(
    frame: &mut Frame,
    rect: &CropRect,
    tensor: &ndarray::ArrayViewD<'_, f32>,
    mean: f32,
    std: f32,
) {
    let shape = tensor.shape().to_vec();
    if shape.len() != 4 || shape[1] != 3 {
        return;
    }
    let size_h = shape[2];
    let size_w = shape[3];
    let mut dst = frame.as_ndarray_mut();

    for y in 0..rect.height {
        let ty = (((y as f64 + 0.5) * size_h as f64 / rect.height as f64) as usize)
            .min(size_h - 1);
        for x in 0..rect.width {
            let tx = (((x as f64 + 0.5) * size_w as f64 / rect.width as f64) as usize)
                .min(size_w - 1);
            for c in 0..3 {
                let value = (tensor[[0, c, ty, tx]] * std + mean).round();
                dst[[rect.y1 + y, rect.x1 + x, c]] = value.clamp(0.0, 255.0) as u8;
            }
        }
    }
}
