//! Rectangle fills and copies on blitter-compatible formats.
//!
//! The blitter works plane by plane, so it only addresses formats whose
//! samples occupy whole bytes per plane (I420, YV12, BGRX). Packed 4:2:2 is
//! rejected at context creation. Rectangles are clamped to the image; chroma
//! coordinates round outward to cover the requested luma rectangle.

use thiserror::Error;

use crate::convert::rgb_to_yuv;
use crate::format::{ImageDesc, PixelFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("format {0:?} is not blitter-compatible")]
    UnsupportedFormat(PixelFormat),

    #[error("image format {actual:?} does not match draw context format {expected:?}")]
    FormatMismatch { expected: PixelFormat, actual: PixelFormat },
}

/// A color resolved to per-plane byte values for one format.
///
/// For 4:2:0 layouts the components follow plane order; for BGRX they are
/// the packed pixel bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawColor {
    comps: [u8; 4],
}

impl DrawColor {
    /// Opaque black: zero bytes on every plane.
    pub const BLACK: DrawColor = DrawColor { comps: [0; 4] };

    /// Resolve an RGBA color for the given format.
    pub fn from_rgba(format: PixelFormat, rgba: [u8; 4]) -> Result<Self, DrawError> {
        let [r, g, b, _a] = rgba;
        match format {
            PixelFormat::Rgb0 => Ok(Self { comps: [b, g, r, 0] }),
            PixelFormat::I420 => {
                let (y, u, v) = rgb_to_yuv(r, g, b);
                Ok(Self { comps: [y, u, v, 0] })
            }
            PixelFormat::Yv12 => {
                let (y, u, v) = rgb_to_yuv(r, g, b);
                Ok(Self { comps: [y, v, u, 0] })
            }
            PixelFormat::Uyvy => Err(DrawError::UnsupportedFormat(format)),
        }
    }
}

/// Blitter bound to one pixel format.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext {
    format: PixelFormat,
}

impl DrawContext {
    pub fn new(format: PixelFormat) -> Result<Self, DrawError> {
        if !format.is_planar() {
            return Err(DrawError::UnsupportedFormat(format));
        }
        Ok(Self { format })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Fill a rectangle (luma coordinates) with `color` on every plane.
    pub fn fill_rectangle(
        &self,
        desc: &ImageDesc,
        data: &mut [u8],
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        color: DrawColor,
    ) -> Result<(), DrawError> {
        self.check_format(desc)?;
        for (index, plane) in desc.planes().iter().enumerate() {
            let (hs, vs) = self.format.chroma_shift(index);
            let x0 = (x >> hs).min(plane.width);
            let y0 = (y >> vs).min(plane.height);
            let x1 = (x + width).div_ceil(1 << hs).min(plane.width);
            let y1 = (y + height).div_ceil(1 << vs).min(plane.height);
            if x1 <= x0 || y1 <= y0 {
                continue;
            }

            let sample = self.format.sample_size(index);
            for row in y0..y1 {
                let offset = plane.offset + row as usize * plane.stride + x0 as usize * sample;
                let span = &mut data[offset..offset + (x1 - x0) as usize * sample];
                match sample {
                    1 => span.fill(color.comps[index]),
                    _ => {
                        for px in span.chunks_exact_mut(sample) {
                            px.copy_from_slice(&color.comps[..sample]);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Copy a rectangle from `src` into `dst` (luma coordinates).
    #[allow(clippy::too_many_arguments)]
    pub fn copy_rectangle(
        &self,
        dst_desc: &ImageDesc,
        dst: &mut [u8],
        src_desc: &ImageDesc,
        src: &[u8],
        dst_x: u32,
        dst_y: u32,
        src_x: u32,
        src_y: u32,
        width: u32,
        height: u32,
    ) -> Result<(), DrawError> {
        self.check_format(dst_desc)?;
        self.check_format(src_desc)?;

        let dst_planes = dst_desc.planes();
        let src_planes = src_desc.planes();
        for (index, (dst_plane, src_plane)) in dst_planes.iter().zip(&src_planes).enumerate() {
            let (hs, vs) = self.format.chroma_shift(index);
            let dx = (dst_x >> hs).min(dst_plane.width);
            let dy = (dst_y >> vs).min(dst_plane.height);
            let sx = (src_x >> hs).min(src_plane.width);
            let sy = (src_y >> vs).min(src_plane.height);

            let copy_w = width
                .div_ceil(1 << hs)
                .min(dst_plane.width - dx)
                .min(src_plane.width - sx);
            let copy_h = height
                .div_ceil(1 << vs)
                .min(dst_plane.height - dy)
                .min(src_plane.height - sy);
            if copy_w == 0 || copy_h == 0 {
                continue;
            }

            let sample = self.format.sample_size(index);
            let row_bytes = copy_w as usize * sample;
            for row in 0..copy_h {
                let dst_offset = dst_plane.offset
                    + (dy + row) as usize * dst_plane.stride
                    + dx as usize * sample;
                let src_offset = src_plane.offset
                    + (sy + row) as usize * src_plane.stride
                    + sx as usize * sample;
                let (from, to) = (src_offset..src_offset + row_bytes, dst_offset);
                dst[to..to + row_bytes].copy_from_slice(&src[from]);
            }
        }
        Ok(())
    }

    fn check_format(&self, desc: &ImageDesc) -> Result<(), DrawError> {
        debug_assert!(!desc.bottom_up, "blitter targets are stored top-down");
        if desc.format != self.format {
            return Err(DrawError::FormatMismatch {
                expected: self.format,
                actual: desc.format,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_422_is_rejected() {
        let err = DrawContext::new(PixelFormat::Uyvy).unwrap_err();
        assert_eq!(err, DrawError::UnsupportedFormat(PixelFormat::Uyvy));
        let err = DrawColor::from_rgba(PixelFormat::Uyvy, [0, 0, 0, 255]).unwrap_err();
        assert_eq!(err, DrawError::UnsupportedFormat(PixelFormat::Uyvy));
    }

    #[test]
    fn full_fill_covers_every_plane() {
        let desc = ImageDesc::new(PixelFormat::I420, 4, 4);
        let mut data = vec![0xAAu8; desc.byte_size()];
        let ctx = DrawContext::new(PixelFormat::I420).unwrap();
        let color = DrawColor::from_rgba(PixelFormat::I420, [0, 0, 255, 255]).unwrap();
        ctx.fill_rectangle(&desc, &mut data, 0, 0, 4, 4, color).unwrap();

        let (y, u, v) = rgb_to_yuv(0, 0, 255);
        assert!(data[..16].iter().all(|&b| b == y));
        assert!(data[16..20].iter().all(|&b| b == u));
        assert!(data[20..24].iter().all(|&b| b == v));
    }

    #[test]
    fn partial_fill_leaves_surroundings_untouched() {
        let desc = ImageDesc::new(PixelFormat::I420, 8, 8);
        let mut data = vec![0u8; desc.byte_size()];
        let ctx = DrawContext::new(PixelFormat::I420).unwrap();
        let color = DrawColor::from_rgba(PixelFormat::I420, [255, 255, 255, 255]).unwrap();
        ctx.fill_rectangle(&desc, &mut data, 2, 2, 4, 4, color).unwrap();

        let y = rgb_to_yuv(255, 255, 255).0;
        // Luma rows 0-1 untouched, rows 2-5 filled in columns 2-5.
        assert!(data[..16].iter().all(|&b| b == 0));
        for row in 2..6 {
            let line = &data[row * 8..][..8];
            assert_eq!(&line[..2], &[0, 0]);
            assert!(line[2..6].iter().all(|&b| b == y));
            assert_eq!(&line[6..], &[0, 0]);
        }
        // Chroma covers exactly the 2x2 block footprint (rows 1-2, cols 1-2).
        let u_plane = &data[64..80];
        assert_eq!(u_plane[0], 0);
        assert_ne!(u_plane[4 + 1], 0);
    }

    #[test]
    fn copy_places_source_at_offset() {
        let ctx = DrawContext::new(PixelFormat::I420).unwrap();
        let inner = ImageDesc::new(PixelFormat::I420, 2, 2);
        let outer = ImageDesc::new(PixelFormat::I420, 6, 6);
        let src = vec![7u8; inner.byte_size()];
        let mut dst = vec![0u8; outer.byte_size()];
        ctx.copy_rectangle(&outer, &mut dst, &inner, &src, 2, 2, 0, 0, 2, 2).unwrap();

        for row in 0..6 {
            let line = &dst[row * 6..][..6];
            if (2..4).contains(&row) {
                assert_eq!(line, &[0, 0, 7, 7, 0, 0]);
            } else {
                assert_eq!(line, &[0; 6]);
            }
        }
        // Chroma landed at (1, 1) in the 3x3 chroma planes.
        let u_plane = &dst[36..45];
        assert_eq!(u_plane[3 + 1], 7);
        assert_eq!(u_plane[0], 0);
    }

    #[test]
    fn bgrx_fill_writes_packed_bytes() {
        let desc = ImageDesc::new(PixelFormat::Rgb0, 2, 1);
        let mut data = vec![0xFFu8; desc.byte_size()];
        let ctx = DrawContext::new(PixelFormat::Rgb0).unwrap();
        let color = DrawColor::from_rgba(PixelFormat::Rgb0, [1, 2, 3, 255]).unwrap();
        ctx.fill_rectangle(&desc, &mut data, 0, 0, 2, 1, color).unwrap();
        assert_eq!(data, vec![3, 2, 1, 0, 3, 2, 1, 0]);
    }

    #[test]
    fn rectangles_are_clamped_to_the_image() {
        let desc = ImageDesc::new(PixelFormat::I420, 4, 4);
        let mut data = vec![0u8; desc.byte_size()];
        let ctx = DrawContext::new(PixelFormat::I420).unwrap();
        ctx.fill_rectangle(&desc, &mut data, 2, 2, 100, 100, DrawColor::BLACK).unwrap();

        let inner = ImageDesc::new(PixelFormat::I420, 2, 2);
        let src = vec![9u8; inner.byte_size()];
        ctx.copy_rectangle(&desc, &mut data, &inner, &src, 3, 3, 0, 0, 2, 2).unwrap();
        assert_eq!(data[3 * 4 + 3], 9);
    }

    #[test]
    fn format_mismatch_is_an_error() {
        let ctx = DrawContext::new(PixelFormat::I420).unwrap();
        let desc = ImageDesc::new(PixelFormat::Rgb0, 2, 2);
        let mut data = vec![0u8; desc.byte_size()];
        let err = ctx
            .fill_rectangle(&desc, &mut data, 0, 0, 2, 2, DrawColor::BLACK)
            .unwrap_err();
        assert_eq!(
            err,
            DrawError::FormatMismatch { expected: PixelFormat::I420, actual: PixelFormat::Rgb0 }
        );
    }
}
