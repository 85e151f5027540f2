//! Pixel format descriptors and plane geometry.
//!
//! Every buffer handled by this crate is described by an [`ImageDesc`]:
//! pixel format, dimensions, and row order. The descriptor derives the
//! canonical byte layout — per-plane offsets, strides, and sample
//! dimensions — that the scaling and drawing kernels operate on.

use serde::{Deserialize, Serialize};

/// Pixel formats understood by the kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Planar 4:2:0 YUV, plane order Y, U, V.
    I420,
    /// Packed 4:2:2 YUV, byte order U0 Y0 V0 Y1.
    Uyvy,
    /// Packed 32bpp BGRX. Stored top-down unless the descriptor says
    /// otherwise (capture buffers may be bottom-up).
    Rgb0,
    /// Planar 4:2:0 YUV, plane order Y, V, U.
    Yv12,
}

impl PixelFormat {
    /// Number of byte planes in the canonical layout.
    pub fn plane_count(self) -> usize {
        match self {
            PixelFormat::I420 | PixelFormat::Yv12 => 3,
            PixelFormat::Uyvy | PixelFormat::Rgb0 => 1,
        }
    }

    /// Whether the rectangle blitter can address this format.
    ///
    /// Packed 4:2:2 interleaves luma and chroma within a byte pair, which
    /// the per-plane blitter cannot write.
    pub fn is_planar(self) -> bool {
        match self {
            PixelFormat::I420 | PixelFormat::Yv12 | PixelFormat::Rgb0 => true,
            PixelFormat::Uyvy => false,
        }
    }

    /// Whether row 0 of an output frame in this format is the top scanline.
    pub fn is_topdown(self) -> bool {
        matches!(self, PixelFormat::Rgb0)
    }

    /// Horizontal and vertical chroma subsampling shifts per plane index.
    pub(crate) fn chroma_shift(self, plane: usize) -> (u32, u32) {
        match self {
            PixelFormat::I420 | PixelFormat::Yv12 if plane > 0 => (1, 1),
            _ => (0, 0),
        }
    }

    /// Bytes per sample in the given plane.
    pub(crate) fn sample_size(self, plane: usize) -> usize {
        match self {
            PixelFormat::Rgb0 => 4,
            PixelFormat::Uyvy => 2,
            PixelFormat::I420 | PixelFormat::Yv12 => {
                debug_assert!(plane < 3);
                1
            }
        }
    }
}

/// Byte layout of one plane inside the contiguous image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Byte offset of the plane from the start of the buffer.
    pub offset: usize,
    /// Bytes per row.
    pub stride: usize,
    /// Samples per row.
    pub width: u32,
    /// Rows in the plane.
    pub height: u32,
}

/// Format, dimensions, and row order of an image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDesc {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Rows stored bottom-to-top. Only ever true for BGRX capture buffers.
    #[serde(default)]
    pub bottom_up: bool,
}

impl ImageDesc {
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        Self { format, width, height, bottom_up: false }
    }

    /// Same descriptor with the row order flipped to bottom-up.
    pub fn bottom_up(mut self) -> Self {
        self.bottom_up = true;
        self
    }

    /// Per-plane layouts, in canonical plane order.
    pub fn planes(&self) -> Vec<PlaneLayout> {
        let (w, h) = (self.width, self.height);
        let chroma_w = w.div_ceil(2);
        let chroma_h = h.div_ceil(2);
        match self.format {
            PixelFormat::Rgb0 => {
                vec![PlaneLayout { offset: 0, stride: w as usize * 4, width: w, height: h }]
            }
            PixelFormat::Uyvy => {
                // Rows are padded to whole UYVY pairs for odd widths.
                vec![PlaneLayout { offset: 0, stride: chroma_w as usize * 4, width: w, height: h }]
            }
            PixelFormat::I420 | PixelFormat::Yv12 => {
                let luma_size = w as usize * h as usize;
                let chroma_stride = chroma_w as usize;
                let chroma_size = chroma_stride * chroma_h as usize;
                vec![
                    PlaneLayout { offset: 0, stride: w as usize, width: w, height: h },
                    PlaneLayout {
                        offset: luma_size,
                        stride: chroma_stride,
                        width: chroma_w,
                        height: chroma_h,
                    },
                    PlaneLayout {
                        offset: luma_size + chroma_size,
                        stride: chroma_stride,
                        width: chroma_w,
                        height: chroma_h,
                    },
                ]
            }
        }
    }

    /// Canonical contiguous byte size: planes concatenated, rows packed.
    pub fn byte_size(&self) -> usize {
        self.planes()
            .iter()
            .map(|plane| plane.stride * plane.height as usize)
            .sum()
    }

    /// Physical row index for logical row `y`, honoring `bottom_up`.
    pub fn physical_row(&self, y: u32) -> u32 {
        if self.bottom_up { self.height - 1 - y } else { y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i420_plane_geometry() {
        let desc = ImageDesc::new(PixelFormat::I420, 640, 480);
        let planes = desc.planes();
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[0].stride, 640);
        assert_eq!(planes[1].offset, 640 * 480);
        assert_eq!(planes[1].width, 320);
        assert_eq!(planes[2].offset, 640 * 480 + 320 * 240);
        assert_eq!(desc.byte_size(), 640 * 480 * 3 / 2);
    }

    #[test]
    fn odd_dimensions_round_chroma_up() {
        let desc = ImageDesc::new(PixelFormat::I420, 5, 3);
        let planes = desc.planes();
        assert_eq!(planes[1].width, 3);
        assert_eq!(planes[1].height, 2);
        assert_eq!(desc.byte_size(), 5 * 3 + 2 * (3 * 2));

        let uyvy = ImageDesc::new(PixelFormat::Uyvy, 5, 3);
        assert_eq!(uyvy.planes()[0].stride, 12);
    }

    #[test]
    fn rgb0_is_the_only_topdown_format() {
        assert!(PixelFormat::Rgb0.is_topdown());
        assert!(!PixelFormat::I420.is_topdown());
        assert!(!PixelFormat::Uyvy.is_topdown());
        assert!(!PixelFormat::Yv12.is_topdown());
    }

    #[test]
    fn uyvy_is_not_blitter_compatible() {
        assert!(PixelFormat::I420.is_planar());
        assert!(PixelFormat::Yv12.is_planar());
        assert!(PixelFormat::Rgb0.is_planar());
        assert!(!PixelFormat::Uyvy.is_planar());
    }

    #[test]
    fn bottom_up_row_mapping() {
        let desc = ImageDesc::new(PixelFormat::Rgb0, 4, 3).bottom_up();
        assert_eq!(desc.physical_row(0), 2);
        assert_eq!(desc.physical_row(2), 0);
    }

    #[test]
    fn descriptor_serializes_with_lowercase_format() {
        let desc = ImageDesc::new(PixelFormat::I420, 320, 240);
        let json = serde_json::to_string(&desc).expect("serializable descriptor");
        assert!(json.contains("\"i420\""));
        let back: ImageDesc = serde_json::from_str(&json).expect("roundtrip");
        assert_eq!(back, desc);
    }
}
