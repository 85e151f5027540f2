//! Error codes shared across the pipeline.
//!
//! Every processor latches the first error it sees and keeps returning it;
//! the only reset is destroy-and-recreate. The values are `Copy + PartialEq`
//! so latched codes can be stored and compared cheaply across threads.

use pixel_ops::{DrawError, PixelFormat, ScaleError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ImagingError {
    /// A processor was used before any layout was configured.
    #[error("no layout has been configured")]
    Unconfigured,

    /// Image creation rejected the requested dimensions.
    #[error("cannot create a {width}x{height} image")]
    ImageDimensions { width: u32, height: u32 },

    /// The configured frame rate is not a positive finite number.
    #[error("frame rate must be positive and finite")]
    InvalidFrameRate,

    /// Scaler construction or conversion failed.
    #[error("scaler failed: {0}")]
    Scale(#[from] ScaleError),

    /// Blitter construction or drawing failed.
    #[error("draw failed: {0}")]
    Draw(#[from] DrawError),

    /// The padding geometry does not add up to the outer image.
    #[error("padding margins do not fit the outer image")]
    PaddingGeometry,

    /// An operator ran against images other than the pair it was built for.
    #[error("image does not match the operator's bound descriptor")]
    Binding,

    /// The capture backend could not open the requested regions.
    #[error("capture source failed to open")]
    CaptureOpen,

    /// A capture run failed; buffer contents are undefined.
    #[error("screen capture failed")]
    CaptureFailed,

    /// A capture target buffer does not match its region.
    #[error("capture target does not match the configured region")]
    CaptureTarget,

    /// An element's bound rectangle falls outside the output image.
    #[error("bound rectangle lies outside the output image")]
    Bound,

    /// Composition requires a blitter-compatible output format.
    #[error("output format {0:?} cannot be composed")]
    InvalidPixelFormat(PixelFormat),

    /// The staged element count is outside `1..=MAX_LAYOUT_ELEMENTS`.
    #[error("element count {0} is out of range")]
    ElementCount(usize),

    /// The fallback frame could not be produced.
    #[error("splash frame rendering failed")]
    Splash,

    /// The engine worker thread could not be spawned.
    #[error("failed to spawn the engine worker thread")]
    ThreadSpawn,

    /// The engine worker thread is gone; the engine must be rebuilt.
    #[error("engine worker is unreachable")]
    EngineDown,

    /// The destination buffer does not match the output frame size.
    #[error("destination buffer size {actual} does not match frame size {expected}")]
    BufferSize { expected: usize, actual: usize },
}
