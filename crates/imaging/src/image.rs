//! Owned frame buffers.

use pixel_ops::{ImageDesc, PlaneLayout};

use crate::error::ImagingError;

/// Largest accepted edge length for a frame buffer.
const MAX_DIMENSION: u32 = 1 << 15;

/// A pixel buffer of fixed format and dimensions.
///
/// The buffer is a single contiguous allocation in the canonical packed
/// layout — planes concatenated, rows stride-packed to their natural width —
/// and is zero-initialised. Format and dimensions never change after
/// construction.
#[derive(Debug, Clone)]
pub struct FrameImage {
    desc: ImageDesc,
    data: Vec<u8>,
}

impl FrameImage {
    pub fn new(desc: ImageDesc) -> Result<Self, ImagingError> {
        if desc.width == 0
            || desc.height == 0
            || desc.width > MAX_DIMENSION
            || desc.height > MAX_DIMENSION
        {
            return Err(ImagingError::ImageDimensions { width: desc.width, height: desc.height });
        }
        let data = vec![0u8; desc.byte_size()];
        Ok(Self { desc, data })
    }

    pub fn desc(&self) -> ImageDesc {
        self.desc
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn planes(&self) -> Vec<PlaneLayout> {
        self.desc.planes()
    }

    /// Borrow one plane's bytes.
    pub fn plane(&self, index: usize) -> &[u8] {
        let plane = self.desc.planes()[index];
        &self.data[plane.offset..plane.offset + plane.stride * plane.height as usize]
    }

    /// Zero the whole buffer (opaque black on every plane).
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Copy the frame into `dst` in the canonical contiguous layout.
    ///
    /// The internal storage is already canonical, so this is a straight
    /// copy once the destination size has been checked.
    pub fn copy_packed(&self, dst: &mut [u8]) -> Result<(), ImagingError> {
        if dst.len() != self.data.len() {
            return Err(ImagingError::BufferSize { expected: self.data.len(), actual: dst.len() });
        }
        dst.copy_from_slice(&self.data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pixel_ops::PixelFormat;

    use super::*;

    #[test]
    fn buffer_matches_canonical_size_and_planes_stay_in_bounds() {
        let image = FrameImage::new(ImageDesc::new(PixelFormat::I420, 640, 480)).unwrap();
        assert_eq!(image.byte_size(), 640 * 480 * 3 / 2);

        let total = image.byte_size();
        for plane in image.planes() {
            assert!(plane.offset + plane.stride * plane.height as usize <= total);
        }
        assert_eq!(image.plane(0).len(), 640 * 480);
        assert_eq!(image.plane(2).len(), 320 * 240);
    }

    #[test]
    fn zero_and_oversized_dimensions_are_rejected() {
        let err = FrameImage::new(ImageDesc::new(PixelFormat::Rgb0, 0, 10)).unwrap_err();
        assert_eq!(err, ImagingError::ImageDimensions { width: 0, height: 10 });

        let err = FrameImage::new(ImageDesc::new(PixelFormat::Rgb0, 10, 1 << 16)).unwrap_err();
        assert_eq!(err, ImagingError::ImageDimensions { width: 10, height: 1 << 16 });
    }

    #[test]
    fn new_frames_start_black() {
        let image = FrameImage::new(ImageDesc::new(PixelFormat::Yv12, 16, 16)).unwrap();
        assert!(image.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn packed_copy_round_trips_and_checks_size() {
        let mut image = FrameImage::new(ImageDesc::new(PixelFormat::Uyvy, 8, 4)).unwrap();
        for (i, byte) in image.data_mut().iter_mut().enumerate() {
            *byte = i as u8;
        }

        let mut out = vec![0u8; image.byte_size()];
        image.copy_packed(&mut out).unwrap();
        assert_eq!(out, image.data());

        let mut short = vec![0u8; image.byte_size() - 1];
        let err = image.copy_packed(&mut short).unwrap_err();
        assert_eq!(
            err,
            ImagingError::BufferSize { expected: image.byte_size(), actual: image.byte_size() - 1 }
        );
    }
}
