//! Composition layouts.
//!
//! A layout owns everything between the desktop and the output frame:
//! capture buffers, per-element scalers, and intermediate images. The
//! engine installs one layout at a time and drives it once per frame
//! against whichever output buffer is currently writable.

mod complex;
mod native;

pub use complex::ComplexLayout;
pub use native::NativeLayout;

use crate::error::ImagingError;
use crate::image::FrameImage;

/// The two composition strategies.
pub enum Layout {
    /// One source filling the whole output.
    Native(NativeLayout),
    /// Up to [`crate::params::MAX_LAYOUT_ELEMENTS`] sources placed by bound
    /// rectangles.
    Complex(ComplexLayout),
}

impl Layout {
    /// Produce one frame into `output`.
    pub fn run(&mut self, output: &mut FrameImage) -> Result<(), ImagingError> {
        match self {
            Layout::Native(layout) => layout.run(output),
            Layout::Complex(layout) => layout.run(output),
        }
    }
}
