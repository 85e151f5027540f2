//! The letterbox padding blitter.

use pixel_ops::{DrawColor, DrawContext, DrawError, ImageDesc};

use crate::error::ImagingError;
use crate::image::FrameImage;
use crate::params::Margins;

/// Copies an inner image into an outer image at a fixed offset, filling the
/// margins with opaque black.
///
/// Both images must share a blitter-compatible format and satisfy
/// `outer = inner + margins` exactly.
#[derive(Debug)]
pub struct Padding {
    margins: Margins,
    inner: ImageDesc,
    outer: ImageDesc,
    draw: DrawContext,
}

impl Padding {
    pub fn new(margins: Margins, inner: ImageDesc, outer: ImageDesc) -> Result<Self, ImagingError> {
        if inner.format != outer.format {
            return Err(ImagingError::Draw(DrawError::FormatMismatch {
                expected: outer.format,
                actual: inner.format,
            }));
        }
        let draw = DrawContext::new(outer.format)?;
        if inner.width + margins.horizontal() != outer.width
            || inner.height + margins.vertical() != outer.height
        {
            return Err(ImagingError::PaddingGeometry);
        }
        Ok(Self { margins, inner, outer, draw })
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Fill the four margin bands, then copy the inner image into place.
    pub fn run(&self, inner: &FrameImage, outer: &mut FrameImage) -> Result<(), ImagingError> {
        if inner.desc() != self.inner || outer.desc() != self.outer {
            return Err(ImagingError::Binding);
        }

        let m = self.margins;
        let (outer_w, outer_h) = (self.outer.width, self.outer.height);
        let desc = outer.desc();
        let data = outer.data_mut();
        let bands = [
            (0, 0, outer_w, m.top),
            (0, outer_h - m.bottom, outer_w, m.bottom),
            (0, m.top, m.left, self.inner.height),
            (outer_w - m.right, m.top, m.right, self.inner.height),
        ];
        for (x, y, w, h) in bands {
            if w > 0 && h > 0 {
                self.draw.fill_rectangle(&desc, data, x, y, w, h, DrawColor::BLACK)?;
            }
        }

        self.draw.copy_rectangle(
            &desc,
            data,
            &inner.desc(),
            inner.data(),
            m.left,
            m.top,
            0,
            0,
            self.inner.width,
            self.inner.height,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pixel_ops::PixelFormat;

    use super::*;

    fn margins(left: u32, right: u32, top: u32, bottom: u32) -> Margins {
        Margins { left, right, top, bottom }
    }

    #[test]
    fn geometry_must_add_up() {
        let inner = ImageDesc::new(PixelFormat::I420, 4, 4);
        let outer = ImageDesc::new(PixelFormat::I420, 8, 8);
        Padding::new(margins(2, 2, 2, 2), inner, outer).unwrap();

        let err = Padding::new(margins(2, 2, 2, 0), inner, outer).unwrap_err();
        assert_eq!(err, ImagingError::PaddingGeometry);
    }

    #[test]
    fn packed_formats_are_rejected() {
        let inner = ImageDesc::new(PixelFormat::Uyvy, 4, 4);
        let outer = ImageDesc::new(PixelFormat::Uyvy, 8, 8);
        let err = Padding::new(margins(2, 2, 2, 2), inner, outer).unwrap_err();
        assert!(matches!(err, ImagingError::Draw(_)));
    }

    #[test]
    fn margins_are_black_and_the_inner_lands_centered() {
        let inner_desc = ImageDesc::new(PixelFormat::I420, 4, 2);
        let outer_desc = ImageDesc::new(PixelFormat::I420, 8, 6);
        let padding = Padding::new(margins(2, 2, 2, 2), inner_desc, outer_desc).unwrap();

        let mut inner = FrameImage::new(inner_desc).unwrap();
        inner.data_mut().fill(0x55);
        let mut outer = FrameImage::new(outer_desc).unwrap();
        outer.data_mut().fill(0xEE); // stale bytes that the margins must overwrite
        padding.run(&inner, &mut outer).unwrap();

        for row in 0..6usize {
            let line = &outer.plane(0)[row * 8..][..8];
            if (2..4).contains(&row) {
                assert_eq!(line, &[0, 0, 0x55, 0x55, 0x55, 0x55, 0, 0]);
            } else {
                assert_eq!(line, &[0; 8]);
            }
        }
        // Chroma margins are black too.
        assert_eq!(outer.plane(1)[0], 0);
        assert_eq!(outer.plane(2)[0], 0);
    }

    #[test]
    fn zero_margins_degenerate_to_a_copy() {
        let desc = ImageDesc::new(PixelFormat::I420, 6, 4);
        let padding = Padding::new(Margins::default(), desc, desc).unwrap();

        let mut inner = FrameImage::new(desc).unwrap();
        for (i, byte) in inner.data_mut().iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        let mut outer = FrameImage::new(desc).unwrap();
        padding.run(&inner, &mut outer).unwrap();
        assert_eq!(outer.data(), inner.data());
    }

    #[test]
    fn unbound_images_are_rejected() {
        let inner_desc = ImageDesc::new(PixelFormat::I420, 4, 4);
        let outer_desc = ImageDesc::new(PixelFormat::I420, 8, 8);
        let padding = Padding::new(margins(2, 2, 2, 2), inner_desc, outer_desc).unwrap();

        let inner = FrameImage::new(inner_desc).unwrap();
        let mut wrong = FrameImage::new(ImageDesc::new(PixelFormat::I420, 10, 10)).unwrap();
        assert_eq!(padding.run(&inner, &mut wrong).unwrap_err(), ImagingError::Binding);
    }
}
