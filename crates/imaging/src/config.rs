//! Engine output configuration.
//!
//! The output format, dimensions, and frame rate are fixed for the lifetime
//! of an engine; reconfiguring means building a new engine.

use std::time::Duration;

use pixel_ops::{ImageDesc, PixelFormat};
use serde::{Deserialize, Serialize};

use crate::error::ImagingError;

/// Immutable description of the engine's output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Target frames per second for the worker loop.
    pub fps: f64,
}

impl EngineConfig {
    pub fn new(pixel_format: PixelFormat, width: u32, height: u32, fps: f64) -> Self {
        Self { pixel_format, width, height, fps }
    }

    pub fn validate(&self) -> Result<(), ImagingError> {
        if self.width == 0 || self.height == 0 {
            return Err(ImagingError::ImageDimensions { width: self.width, height: self.height });
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ImagingError::InvalidFrameRate);
        }
        Ok(())
    }

    /// Descriptor of the output frame buffers.
    pub fn output_desc(&self) -> ImageDesc {
        ImageDesc::new(self.pixel_format, self.width, self.height)
    }

    /// Target time budget for one frame.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_configurations() {
        let config = EngineConfig::new(PixelFormat::I420, 640, 480, 30.0);
        config.validate().unwrap();
        assert_eq!(config.output_desc().byte_size(), 640 * 480 * 3 / 2);
        assert_eq!(config.frame_period(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn rejects_degenerate_values() {
        let config = EngineConfig::new(PixelFormat::I420, 0, 480, 30.0);
        assert_eq!(
            config.validate().unwrap_err(),
            ImagingError::ImageDimensions { width: 0, height: 480 }
        );

        for fps in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let config = EngineConfig::new(PixelFormat::I420, 640, 480, fps);
            assert_eq!(config.validate().unwrap_err(), ImagingError::InvalidFrameRate);
        }
    }
}
