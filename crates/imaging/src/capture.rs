//! Screen capture seam and the multi-region capture operator.
//!
//! The OS capture primitive lives behind [`CaptureProvider`] /
//! [`CaptureBackend`]; the engine receives a provider at construction and
//! each layout opens one session for its region set. [`ScreenCapture`] is
//! the operator in front of the backend: it resolves layout parameters into
//! regions, records the requested row order, and validates the target
//! buffers on every run.

use pixel_ops::{ImageDesc, PixelFormat};

use crate::error::ImagingError;
use crate::image::FrameImage;
use crate::params::{LayoutParameter, Rect, SourceWindow};

/// One desktop region captured per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub window: SourceWindow,
    /// Clipping rectangle in desktop coordinates.
    pub area: Rect,
    pub show_cursor: bool,
    pub show_layered_window: bool,
}

impl CaptureRegion {
    pub fn from_parameter(parameter: &LayoutParameter) -> Self {
        Self {
            window: parameter.window,
            area: parameter.clipping,
            show_cursor: parameter.show_cursor,
            show_layered_window: parameter.show_layered_window,
        }
    }

    /// Descriptor of the BGRX buffer this region is captured into.
    pub fn buffer_desc(&self, bottom_up: bool) -> ImageDesc {
        let desc = ImageDesc::new(PixelFormat::Rgb0, self.area.width, self.area.height);
        if bottom_up { desc.bottom_up() } else { desc }
    }
}

/// A live capture session bound to a fixed region set.
pub trait CaptureBackend: Send {
    /// Capture every region into its buffer, in region order.
    ///
    /// Any region failing leaves all buffer contents undefined and must
    /// return an error.
    fn capture(&mut self, targets: &mut [FrameImage]) -> Result<(), ImagingError>;
}

impl std::fmt::Debug for dyn CaptureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dyn CaptureBackend")
    }
}

/// Factory for capture sessions; injected into the engine at construction.
pub trait CaptureProvider: Send + Sync {
    /// Resolve the source handles and prime any OS-side state.
    ///
    /// `flip_vertical` requests bottom-up row order in the target buffers.
    fn open(
        &self,
        regions: &[CaptureRegion],
        flip_vertical: bool,
    ) -> Result<Box<dyn CaptureBackend>, ImagingError>;
}

/// Captures N regions into N pre-allocated BGRX buffers.
#[derive(Debug)]
pub struct ScreenCapture {
    backend: Box<dyn CaptureBackend>,
    regions: Vec<CaptureRegion>,
    bottom_up: bool,
}

impl ScreenCapture {
    pub fn new(
        provider: &dyn CaptureProvider,
        flip_vertical: bool,
        parameters: &[LayoutParameter],
    ) -> Result<Self, ImagingError> {
        let regions: Vec<CaptureRegion> =
            parameters.iter().map(CaptureRegion::from_parameter).collect();
        let backend = provider.open(&regions, flip_vertical)?;
        Ok(Self { backend, regions, bottom_up: flip_vertical })
    }

    pub fn regions(&self) -> &[CaptureRegion] {
        &self.regions
    }

    /// Capture all regions synchronously.
    pub fn run(&mut self, targets: &mut [FrameImage]) -> Result<(), ImagingError> {
        if targets.len() != self.regions.len() {
            return Err(ImagingError::CaptureTarget);
        }
        for (target, region) in targets.iter().zip(&self.regions) {
            if target.desc() != region.buffer_desc(self.bottom_up) {
                return Err(ImagingError::CaptureTarget);
            }
        }
        self.backend.capture(targets)
    }
}
