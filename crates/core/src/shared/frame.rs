use std::path::Path;

use image::RgbImage;
use ndarray::{ArrayView3, ArrayViewMut3};

/// A single video/image frame: contiguous RGB bytes in row-major order.
///
/// Frames live in two places during a run: in memory for face analysis and
/// engine inference, and on disk as indexed frame files inside the temp
/// workspace. Format conversion happens at the I/O boundaries only.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// Decodes an image file into a frame with the given index.
    pub fn load(path: &Path, index: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let img = image::open(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?
            .to_rgb8();
        Ok(Self::from_rgb_image(&img, index))
    }

    /// Encodes the frame to an image file; format chosen by extension.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.to_rgb_image()
            .save(path)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        Ok(())
    }

    pub fn from_rgb_image(img: &RgbImage, index: usize) -> Self {
        Self::new(img.as_raw().clone(), img.width(), img.height(), index)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("Frame data length must match dimensions")
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
