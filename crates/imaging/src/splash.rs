//! The fallback frame shown while no layout is producing.

use pixel_ops::{ImageDesc, PixelFormat, ScaleConfig, ScaleFilter};

use crate::error::ImagingError;
use crate::image::FrameImage;
use crate::scale::Scaler;

/// Renders a deterministic decorative frame in the output format.
///
/// The artwork is drawn once in BGRX — a dimmed vertical gradient with
/// diagonal sheen bands and a centered frame outline — and converted
/// through the same scaler the pipeline uses. Equal inputs produce equal
/// bytes, which the fallback tests rely on.
pub struct SplashScreen {
    art: FrameImage,
    scaler: Scaler,
}

impl SplashScreen {
    pub fn new(output: ImageDesc) -> Result<Self, ImagingError> {
        let art_desc = ImageDesc::new(PixelFormat::Rgb0, output.width, output.height);
        let mut art = FrameImage::new(art_desc)?;
        paint(&mut art);

        let scaler = Scaler::new(
            art_desc,
            output,
            ScaleConfig { filter: ScaleFilter::Nearest },
        )
        .map_err(|_| ImagingError::Splash)?;
        Ok(Self { art, scaler })
    }

    /// Produce the splash into `output`.
    pub fn render(&self, output: &mut FrameImage) -> Result<(), ImagingError> {
        self.scaler.run(&self.art, output).map_err(|_| ImagingError::Splash)
    }
}

fn paint(art: &mut FrameImage) {
    let desc = art.desc();
    let (width, height) = (desc.width, desc.height);
    let frame_x = width / 8;
    let frame_y = height / 8;
    let stride = width as usize * 4;

    let data = art.data_mut();
    for y in 0..height {
        let base = 22 + y * 44 / height.max(1);
        let line = &mut data[y as usize * stride..][..stride];
        for x in 0..width {
            let mut level = base;
            if (x + 2 * y) % 96 < 6 {
                level += 16;
            }
            if on_frame_outline(x, y, frame_x, frame_y, width, height) {
                level = 190;
            }
            let px = &mut line[x as usize * 4..][..4];
            px[0] = (level + 24).min(255) as u8; // blue-leaning tint
            px[1] = level as u8;
            px[2] = level as u8;
            px[3] = 0;
        }
    }
}

fn on_frame_outline(x: u32, y: u32, frame_x: u32, frame_y: u32, width: u32, height: u32) -> bool {
    let inside_x = x >= frame_x && x < width - frame_x;
    let inside_y = y >= frame_y && y < height - frame_y;
    if !inside_x || !inside_y {
        return false;
    }
    let on_vertical = x < frame_x + 2 || x >= width - frame_x - 2;
    let on_horizontal = y < frame_y + 2 || y >= height - frame_y - 2;
    on_vertical || on_horizontal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_is_deterministic() {
        let output = ImageDesc::new(PixelFormat::I420, 320, 240);
        let splash = SplashScreen::new(output).unwrap();

        let mut first = FrameImage::new(output).unwrap();
        let mut second = FrameImage::new(output).unwrap();
        splash.render(&mut first).unwrap();
        splash.render(&mut second).unwrap();
        assert_eq!(first.data(), second.data());

        // Two independent producers agree as well.
        let again = SplashScreen::new(output).unwrap();
        let mut third = FrameImage::new(output).unwrap();
        again.render(&mut third).unwrap();
        assert_eq!(first.data(), third.data());
    }

    #[test]
    fn splash_is_not_a_black_frame() {
        for format in [PixelFormat::I420, PixelFormat::Uyvy, PixelFormat::Rgb0] {
            let output = ImageDesc::new(format, 160, 120);
            let splash = SplashScreen::new(output).unwrap();
            let mut image = FrameImage::new(output).unwrap();
            splash.render(&mut image).unwrap();
            assert!(image.data().iter().any(|&b| b != 0), "{format:?}");
        }
    }

    #[test]
    fn works_at_odd_sizes() {
        let output = ImageDesc::new(PixelFormat::Yv12, 31, 17);
        let splash = SplashScreen::new(output).unwrap();
        let mut image = FrameImage::new(output).unwrap();
        splash.render(&mut image).unwrap();
    }
}
