//! Single-source layout: capture → scale → optional letterbox.

use pixel_ops::{ImageDesc, PixelFormat};
use tracing::debug;

use crate::capture::{CaptureProvider, ScreenCapture};
use crate::error::ImagingError;
use crate::image::FrameImage;
use crate::pad::Padding;
use crate::params::{LayoutParameter, compute_padding};
use crate::scale::Scaler;

/// One-source pipeline filling the whole output frame.
///
/// Letterboxing needs the blitter, so it is only available when the output
/// format is blitter-compatible; with a packed output (UYVY) the scaler
/// writes straight into the output frame and `keep_aspect_ratio` is
/// ignored.
#[derive(Debug)]
pub struct NativeLayout {
    capture: ScreenCapture,
    captured: FrameImage,
    scaler: Scaler,
    /// Letterbox step and its intermediate image, when padding applies.
    padding: Option<(Padding, FrameImage)>,
    error: Option<ImagingError>,
}

impl NativeLayout {
    pub fn new(
        provider: &dyn CaptureProvider,
        output: ImageDesc,
        parameter: LayoutParameter,
    ) -> Result<Self, ImagingError> {
        let flip_vertical = !output.format.is_topdown();
        let captured_desc = {
            let desc =
                ImageDesc::new(PixelFormat::Rgb0, parameter.clipping.width, parameter.clipping.height);
            if flip_vertical { desc.bottom_up() } else { desc }
        };
        let captured = FrameImage::new(captured_desc)?;

        let capture =
            ScreenCapture::new(provider, flip_vertical, std::slice::from_ref(&parameter))?;

        let use_padding = output.format.is_planar();
        let (scaler, padding) = if use_padding {
            let margins = compute_padding(
                output.width,
                output.height,
                parameter.clipping.width,
                parameter.clipping.height,
                parameter.stretch,
                parameter.keep_aspect_ratio,
            );
            let converted_desc = ImageDesc::new(
                output.format,
                output.width - margins.horizontal(),
                output.height - margins.vertical(),
            );
            let converted = FrameImage::new(converted_desc)?;
            let scaler = Scaler::new(captured_desc, converted_desc, parameter.scale_config)?;
            let padding = Padding::new(margins, converted_desc, output)?;
            (scaler, Some((padding, converted)))
        } else {
            (Scaler::new(captured_desc, output, parameter.scale_config)?, None)
        };

        debug!(
            clipping_w = parameter.clipping.width,
            clipping_h = parameter.clipping.height,
            letterboxed = padding.is_some(),
            "native layout ready"
        );
        Ok(Self { capture, captured, scaler, padding, error: None })
    }

    /// Produce one frame. The first failure latches and is returned on
    /// every subsequent call.
    pub fn run(&mut self, output: &mut FrameImage) -> Result<(), ImagingError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let result = self.produce(output);
        if let Err(error) = result {
            self.error = Some(error);
        }
        result
    }

    fn produce(&mut self, output: &mut FrameImage) -> Result<(), ImagingError> {
        self.capture.run(std::slice::from_mut(&mut self.captured))?;
        match &mut self.padding {
            Some((padding, converted)) => {
                self.scaler.run(&self.captured, converted)?;
                padding.run(converted, output)?;
            }
            None => self.scaler.run(&self.captured, output)?,
        }
        Ok(())
    }
}
