//! Software scale + pixel-format conversion.
//!
//! A [`ScaleContext`] is built once for a fixed source/destination descriptor
//! pair and then run once per frame. Sources are packed BGRX (top-down or
//! bottom-up); destinations may be any supported format and are always
//! written top-down. Sampling is center-aligned 16.16 fixed point, so a 1:1
//! scale reproduces the source bytes exactly with either filter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convert::rgb_to_yuv;
use crate::format::{ImageDesc, PixelFormat};

/// Resampling filter used when dimensions differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleFilter {
    Nearest,
    #[default]
    Bilinear,
}

/// Opaque scaler configuration carried through layout parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub filter: ScaleFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScaleError {
    #[error("no conversion path from {src:?} to {dst:?}")]
    UnsupportedConversion { src: PixelFormat, dst: PixelFormat },

    #[error("image descriptor has empty dimensions ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("destinations must be stored top-down")]
    BottomUpDestination,

    #[error("buffer size {actual} does not match descriptor size {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Conversion context bound to one source/destination descriptor pair.
#[derive(Debug, Clone)]
pub struct ScaleContext {
    src: ImageDesc,
    dst: ImageDesc,
    filter: ScaleFilter,
}

impl ScaleContext {
    /// Validate the descriptor pair and prepare a context.
    ///
    /// Conversion kernels cover BGRX sources only; every capture buffer in
    /// the pipeline is BGRX, so other source formats are rejected here.
    pub fn new(src: ImageDesc, dst: ImageDesc, config: ScaleConfig) -> Result<Self, ScaleError> {
        for desc in [&src, &dst] {
            if desc.width == 0 || desc.height == 0 {
                return Err(ScaleError::EmptyImage { width: desc.width, height: desc.height });
            }
        }
        if src.format != PixelFormat::Rgb0 {
            return Err(ScaleError::UnsupportedConversion { src: src.format, dst: dst.format });
        }
        if dst.bottom_up {
            return Err(ScaleError::BottomUpDestination);
        }
        Ok(Self { src, dst, filter: config.filter })
    }

    pub fn src(&self) -> ImageDesc {
        self.src
    }

    pub fn dst(&self) -> ImageDesc {
        self.dst
    }

    /// Convert one frame from `src` into `dst`.
    pub fn run(&self, src: &[u8], dst: &mut [u8]) -> Result<(), ScaleError> {
        check_len(src.len(), self.src.byte_size())?;
        check_len(dst.len(), self.dst.byte_size())?;

        let reader = BgrxReader { desc: self.src, data: src };
        match self.dst.format {
            PixelFormat::Rgb0 => self.to_bgrx(&reader, dst),
            PixelFormat::I420 | PixelFormat::Yv12 => self.to_planar_yuv(&reader, dst),
            PixelFormat::Uyvy => self.to_uyvy(&reader, dst),
        }
        Ok(())
    }

    fn to_bgrx(&self, reader: &BgrxReader<'_>, dst: &mut [u8]) {
        let stride = self.dst.width as usize * 4;
        for y in 0..self.dst.height {
            let y_fp = src_pos(half_pixels(y), self.src.height, self.dst.height);
            let row = &mut dst[y as usize * stride..][..stride];
            for x in 0..self.dst.width {
                let x_fp = src_pos(half_pixels(x), self.src.width, self.dst.width);
                let (r, g, b) = self.sample(reader, x_fp, y_fp);
                let px = &mut row[x as usize * 4..][..4];
                px[0] = b;
                px[1] = g;
                px[2] = r;
                px[3] = 0;
            }
        }
    }

    fn to_planar_yuv(&self, reader: &BgrxReader<'_>, dst: &mut [u8]) {
        let planes = self.dst.planes();
        // Plane order differs between the two 4:2:0 layouts.
        let (u_plane, v_plane) = match self.dst.format {
            PixelFormat::Yv12 => (2, 1),
            _ => (1, 2),
        };

        for y in 0..self.dst.height {
            let y_fp = src_pos(half_pixels(y), self.src.height, self.dst.height);
            let row_offset = planes[0].offset + y as usize * planes[0].stride;
            for x in 0..self.dst.width {
                let x_fp = src_pos(half_pixels(x), self.src.width, self.dst.width);
                let (r, g, b) = self.sample(reader, x_fp, y_fp);
                dst[row_offset + x as usize] = rgb_to_yuv(r, g, b).0;
            }
        }

        let chroma = planes[1];
        for cy in 0..chroma.height {
            // Chroma samples sit at the center of each 2x2 luma block.
            let y_fp = src_pos(block_center(cy), self.src.height, self.dst.height);
            let u_row = planes[u_plane].offset + cy as usize * planes[u_plane].stride;
            let v_row = planes[v_plane].offset + cy as usize * planes[v_plane].stride;
            for cx in 0..chroma.width {
                let x_fp = src_pos(block_center(cx), self.src.width, self.dst.width);
                let (r, g, b) = self.sample(reader, x_fp, y_fp);
                let (_, u, v) = rgb_to_yuv(r, g, b);
                dst[u_row + cx as usize] = u;
                dst[v_row + cx as usize] = v;
            }
        }
    }

    fn to_uyvy(&self, reader: &BgrxReader<'_>, dst: &mut [u8]) {
        let pairs = self.dst.width.div_ceil(2);
        let stride = pairs as usize * 4;
        for y in 0..self.dst.height {
            let y_fp = src_pos(half_pixels(y), self.src.height, self.dst.height);
            let row = &mut dst[y as usize * stride..][..stride];
            for pair in 0..pairs {
                let x0 = pair * 2;
                let x1 = (x0 + 1).min(self.dst.width - 1);

                let x0_fp = src_pos(half_pixels(x0), self.src.width, self.dst.width);
                let x1_fp = src_pos(half_pixels(x1), self.src.width, self.dst.width);
                let (r0, g0, b0) = self.sample(reader, x0_fp, y_fp);
                let (r1, g1, b1) = self.sample(reader, x1_fp, y_fp);
                let y0 = rgb_to_yuv(r0, g0, b0).0;
                let y1 = rgb_to_yuv(r1, g1, b1).0;

                let mid_fp = src_pos(block_center(pair), self.src.width, self.dst.width);
                let (rm, gm, bm) = self.sample(reader, mid_fp, y_fp);
                let (_, u, v) = rgb_to_yuv(rm, gm, bm);

                let out = &mut row[pair as usize * 4..][..4];
                out[0] = u;
                out[1] = y0;
                out[2] = v;
                out[3] = y1;
            }
        }
    }

    fn sample(&self, reader: &BgrxReader<'_>, x_fp: i64, y_fp: i64) -> (u8, u8, u8) {
        match self.filter {
            ScaleFilter::Nearest => {
                let x = round_fp(x_fp).clamp(0, i64::from(self.src.width) - 1) as u32;
                let y = round_fp(y_fp).clamp(0, i64::from(self.src.height) - 1) as u32;
                reader.read(x, y)
            }
            ScaleFilter::Bilinear => {
                let max_x = (i64::from(self.src.width) - 1) << 16;
                let max_y = (i64::from(self.src.height) - 1) << 16;
                let x_fp = x_fp.clamp(0, max_x);
                let y_fp = y_fp.clamp(0, max_y);
                let (x0, fx) = split_fp(x_fp);
                let (y0, fy) = split_fp(y_fp);
                let x1 = (x0 + 1).min(self.src.width - 1);
                let y1 = (y0 + 1).min(self.src.height - 1);

                let p00 = reader.read(x0, y0);
                let p01 = reader.read(x1, y0);
                let p10 = reader.read(x0, y1);
                let p11 = reader.read(x1, y1);
                (
                    lerp2(p00.0, p01.0, p10.0, p11.0, fx, fy),
                    lerp2(p00.1, p01.1, p10.1, p11.1, fx, fy),
                    lerp2(p00.2, p01.2, p10.2, p11.2, fx, fy),
                )
            }
        }
    }
}

/// Packed BGRX source pixels with row-order handling.
struct BgrxReader<'a> {
    desc: ImageDesc,
    data: &'a [u8],
}

impl BgrxReader<'_> {
    fn read(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let row = self.desc.physical_row(y) as usize;
        let offset = row * self.desc.width as usize * 4 + x as usize * 4;
        (self.data[offset + 2], self.data[offset + 1], self.data[offset])
    }
}

/// Destination sample center in half-pixel units.
fn half_pixels(index: u32) -> i64 {
    i64::from(index) * 2 + 1
}

/// Center of the 2-sample block starting at `2 * index`, in half-pixel units.
fn block_center(index: u32) -> i64 {
    i64::from(index) * 4 + 2
}

/// Map a destination position (half-pixel units) to a 16.16 source position.
fn src_pos(center_halves: i64, src_len: u32, dst_len: u32) -> i64 {
    center_halves * i64::from(src_len) * 65536 / (2 * i64::from(dst_len)) - 32768
}

fn round_fp(fp: i64) -> i64 {
    (fp + 32768) >> 16
}

fn split_fp(fp: i64) -> (u32, i64) {
    ((fp >> 16) as u32, fp & 0xffff)
}

fn lerp2(v00: u8, v01: u8, v10: u8, v11: u8, fx: i64, fy: i64) -> u8 {
    let top = i64::from(v00) * (65536 - fx) + i64::from(v01) * fx;
    let bottom = i64::from(v10) * (65536 - fx) + i64::from(v11) * fx;
    ((top * (65536 - fy) + bottom * fy + (1 << 31)) >> 32) as u8
}

fn check_len(actual: usize, expected: usize) -> Result<(), ScaleError> {
    if actual != expected {
        return Err(ScaleError::BufferSize { expected, actual });
    }
    Ok(())
}
