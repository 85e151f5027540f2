//! Double-buffered screen-capture frame engine.
//!
//! The [`Engine`] captures one or more desktop regions at a target rate,
//! scales and converts each, composites them onto an output frame of fixed
//! format and size, and serves the latest completed frame to a consumer:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use imaging::{Engine, EngineConfig, LayoutParameter, PixelFormat, Rect, TestCardProvider};
//!
//! # fn main() -> Result<(), imaging::ImagingError> {
//! let config = EngineConfig::new(PixelFormat::I420, 640, 480, 30.0);
//! let engine = Engine::new(config, Arc::new(TestCardProvider))?;
//!
//! engine.set_layout_parameters(&[LayoutParameter {
//!     bound: Rect::new(0, 0, 640, 480),
//!     clipping: Rect::new(0, 0, 1920, 1080),
//!     keep_aspect_ratio: true,
//!     ..LayoutParameter::default()
//! }]);
//! engine.set_native_layout()?;
//!
//! let mut frame = vec![0u8; engine.frame_size()];
//! engine.copy_front_image(&mut frame)?;
//! # Ok(())
//! # }
//! ```
//!
//! Real deployments plug an OS capture backend in through
//! [`CaptureProvider`]; the bundled [`TestCardProvider`] and
//! [`SolidColorProvider`] are deterministic stand-ins for development and
//! testing.

pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod image;
pub mod layout;
pub mod pad;
pub mod params;
pub mod pattern;
pub mod scale;
pub mod splash;

pub use capture::{CaptureBackend, CaptureProvider, CaptureRegion, ScreenCapture};
pub use config::EngineConfig;
pub use engine::{Engine, LayoutHealth, Request};
pub use error::ImagingError;
pub use image::FrameImage;
pub use layout::{ComplexLayout, Layout, NativeLayout};
pub use params::{LayoutParameter, MAX_LAYOUT_ELEMENTS, Margins, Rect, SourceWindow, compute_padding};
pub use pattern::{SolidColorProvider, TestCardProvider};
pub use splash::SplashScreen;

// Re-export the kernel types that appear in this crate's public API.
pub use pixel_ops::{ImageDesc, PixelFormat, ScaleConfig, ScaleFilter};
