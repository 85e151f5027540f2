//! The per-element scale/convert operator.

use pixel_ops::{ImageDesc, ScaleConfig, ScaleContext};

use crate::error::ImagingError;
use crate::image::FrameImage;

/// Stateless conversion step bound to one source/destination image pair.
///
/// Construction builds the conversion context for the exact descriptors;
/// `run` performs one synchronous conversion and rejects images that are
/// not the bound pair.
#[derive(Debug)]
pub struct Scaler {
    ctx: ScaleContext,
}

impl Scaler {
    pub fn new(src: ImageDesc, dst: ImageDesc, config: ScaleConfig) -> Result<Self, ImagingError> {
        Ok(Self { ctx: ScaleContext::new(src, dst, config)? })
    }

    pub fn run(&self, src: &FrameImage, dst: &mut FrameImage) -> Result<(), ImagingError> {
        if src.desc() != self.ctx.src() || dst.desc() != self.ctx.dst() {
            return Err(ImagingError::Binding);
        }
        self.ctx.run(src.data(), dst.data_mut())?;
        Ok(())
    }
}
