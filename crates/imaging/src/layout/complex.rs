//! Multi-source layout: capture all, scale each, compose onto black.

use pixel_ops::{DrawColor, DrawContext, ImageDesc, PixelFormat};
use tracing::debug;

use crate::capture::{CaptureProvider, ScreenCapture};
use crate::error::ImagingError;
use crate::image::FrameImage;
use crate::params::{LayoutParameter, MAX_LAYOUT_ELEMENTS, compute_padding};
use crate::scale::Scaler;

/// One placed source inside the output frame.
#[derive(Debug)]
struct Element {
    converted: FrameImage,
    scaler: Scaler,
    /// Draw origin in output coordinates (bound origin plus virtual
    /// letterbox margins).
    x: u32,
    y: u32,
}

/// N-source pipeline compositing onto a black background.
///
/// Elements draw in parameter order, so later elements overwrite earlier
/// ones where bounds overlap.
#[derive(Debug)]
pub struct ComplexLayout {
    capture: ScreenCapture,
    captured: Vec<FrameImage>,
    elements: Vec<Element>,
    draw: DrawContext,
    background: DrawColor,
    output: ImageDesc,
    error: Option<ImagingError>,
}

impl ComplexLayout {
    pub fn new(
        provider: &dyn CaptureProvider,
        output: ImageDesc,
        parameters: &[LayoutParameter],
    ) -> Result<Self, ImagingError> {
        if !output.format.is_planar() {
            return Err(ImagingError::InvalidPixelFormat(output.format));
        }
        if parameters.is_empty() || parameters.len() > MAX_LAYOUT_ELEMENTS {
            return Err(ImagingError::ElementCount(parameters.len()));
        }

        let flip_vertical = !output.format.is_topdown();
        let mut captured = Vec::with_capacity(parameters.len());
        let mut elements = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            if !parameter.bound.fits_within(output.width, output.height) {
                return Err(ImagingError::Bound);
            }

            let margins = compute_padding(
                parameter.bound.width,
                parameter.bound.height,
                parameter.clipping.width,
                parameter.clipping.height,
                parameter.stretch,
                parameter.keep_aspect_ratio,
            );

            let captured_desc = {
                let desc = ImageDesc::new(
                    PixelFormat::Rgb0,
                    parameter.clipping.width,
                    parameter.clipping.height,
                );
                if flip_vertical { desc.bottom_up() } else { desc }
            };
            let converted_desc = ImageDesc::new(
                output.format,
                parameter.bound.width - margins.horizontal(),
                parameter.bound.height - margins.vertical(),
            );

            captured.push(FrameImage::new(captured_desc)?);
            let scaler = Scaler::new(captured_desc, converted_desc, parameter.scale_config)?;
            elements.push(Element {
                converted: FrameImage::new(converted_desc)?,
                scaler,
                x: parameter.bound.x as u32 + margins.left,
                y: parameter.bound.y as u32 + margins.top,
            });
        }

        let capture = ScreenCapture::new(provider, flip_vertical, parameters)?;
        let draw = DrawContext::new(output.format)?;

        debug!(elements = elements.len(), "complex layout ready");
        Ok(Self {
            capture,
            captured,
            elements,
            draw,
            background: DrawColor::BLACK,
            output,
            error: None,
        })
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
        if output.desc() != self.output {
            return Err(ImagingError::Binding);
        }

        self.capture.run(&mut self.captured)?;

        // Reverse order keeps the most recently captured (and typically
        // smallest) elements warm in cache when they are drawn last.
        for index in (0..self.elements.len()).rev() {
            let Element { converted, scaler, .. } = &mut self.elements[index];
            scaler.run(&self.captured[index], converted)?;
        }

        let desc = output.desc();
        let data = output.data_mut();
        self.draw
            .fill_rectangle(&desc, data, 0, 0, desc.width, desc.height, self.background)?;
        for element in &self.elements {
            let inner = element.converted.desc();
            self.draw.copy_rectangle(
                &desc,
                data,
                &inner,
                element.converted.data(),
                element.x,
                element.y,
                0,
                0,
                inner.width,
                inner.height,
            )?;
        }
        Ok(())
    }
}
