//! Deterministic synthetic capture sources.
//!
//! These providers stand in for an OS capture backend during development
//! and testing: every pixel is a pure function of desktop coordinates (and,
//! for the solid provider, the region index), so pipeline output is exactly
//! reproducible.

use crate::capture::{CaptureBackend, CaptureProvider, CaptureRegion};
use crate::error::ImagingError;
use crate::image::FrameImage;

/// BGRX value of the virtual desktop at absolute coordinates.
pub fn desktop_pixel(x: i64, y: i64) -> [u8; 4] {
    [(x & 0xff) as u8, (y & 0xff) as u8, ((x + y) & 0xff) as u8, 0]
}

/// A provider whose desktop is a coordinate-derived gradient.
pub struct TestCardProvider;

impl CaptureProvider for TestCardProvider {
    fn open(
        &self,
        regions: &[CaptureRegion],
        flip_vertical: bool,
    ) -> Result<Box<dyn CaptureBackend>, ImagingError> {
        Ok(Box::new(TestCardBackend { regions: regions.to_vec(), flip_vertical }))
    }
}

struct TestCardBackend {
    regions: Vec<CaptureRegion>,
    flip_vertical: bool,
}

impl CaptureBackend for TestCardBackend {
    fn capture(&mut self, targets: &mut [FrameImage]) -> Result<(), ImagingError> {
        for (region, target) in self.regions.iter().zip(targets) {
            let desc = target.desc();
            let stride = desc.width as usize * 4;
            let data = target.data_mut();
            for y in 0..desc.height {
                let row = if self.flip_vertical { desc.height - 1 - y } else { y };
                let line = &mut data[row as usize * stride..][..stride];
                for x in 0..desc.width {
                    let px = desktop_pixel(
                        i64::from(region.area.x) + i64::from(x),
                        i64::from(region.area.y) + i64::from(y),
                    );
                    line[x as usize * 4..][..4].copy_from_slice(&px);
                }
            }
        }
        Ok(())
    }
}

/// A provider that fills each region with one fixed BGRX color.
///
/// Colors are assigned per region index, cycling when there are more
/// regions than colors.
pub struct SolidColorProvider {
    colors: Vec<[u8; 4]>,
}

impl SolidColorProvider {
    pub fn new(colors: Vec<[u8; 4]>) -> Self {
        Self { colors }
    }
}

impl CaptureProvider for SolidColorProvider {
    fn open(
        &self,
        regions: &[CaptureRegion],
        _flip_vertical: bool,
    ) -> Result<Box<dyn CaptureBackend>, ImagingError> {
        if self.colors.is_empty() {
            return Err(ImagingError::CaptureOpen);
        }
        let colors = regions
            .iter()
            .enumerate()
            .map(|(index, _)| self.colors[index % self.colors.len()])
            .collect();
        Ok(Box::new(SolidColorBackend { colors }))
    }
}

struct SolidColorBackend {
    colors: Vec<[u8; 4]>,
}

impl CaptureBackend for SolidColorBackend {
    fn capture(&mut self, targets: &mut [FrameImage]) -> Result<(), ImagingError> {
        for (color, target) in self.colors.iter().zip(targets) {
            for px in target.data_mut().chunks_exact_mut(4) {
                px.copy_from_slice(color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{LayoutParameter, Rect};

    fn open_one(
        provider: &dyn CaptureProvider,
        clipping: Rect,
        flip: bool,
    ) -> (Box<dyn CaptureBackend>, FrameImage) {
        let parameter = LayoutParameter { clipping, ..LayoutParameter::default() };
        let region = CaptureRegion::from_parameter(&parameter);
        let backend = provider.open(std::slice::from_ref(&region), flip).unwrap();
        let image = FrameImage::new(region.buffer_desc(flip)).unwrap();
        (backend, image)
    }

    #[test]
    fn test_card_reflects_desktop_coordinates() {
        let (mut backend, mut image) =
            open_one(&TestCardProvider, Rect::new(10, 20, 4, 3), false);
        backend.capture(std::slice::from_mut(&mut image)).unwrap();

        // Pixel (2, 1) of the buffer is desktop (12, 21).
        let offset = (4 + 2) * 4;
        assert_eq!(&image.data()[offset..offset + 4], &desktop_pixel(12, 21));
    }

    #[test]
    fn test_card_honors_bottom_up_order() {
        let (mut backend, mut image) = open_one(&TestCardProvider, Rect::new(0, 0, 2, 2), true);
        backend.capture(std::slice::from_mut(&mut image)).unwrap();

        // Buffer row 0 holds the bottom scanline (desktop y = 1).
        assert_eq!(&image.data()[..4], &desktop_pixel(0, 1));
        assert_eq!(&image.data()[8..12], &desktop_pixel(0, 0));
    }

    #[test]
    fn solid_colors_cycle_per_region() {
        let provider = SolidColorProvider::new(vec![[1, 2, 3, 0], [9, 9, 9, 0]]);
        let parameter = LayoutParameter {
            clipping: Rect::new(0, 0, 2, 2),
            ..LayoutParameter::default()
        };
        let regions = vec![CaptureRegion::from_parameter(&parameter); 3];
        let mut backend = provider.open(&regions, false).unwrap();

        let mut targets: Vec<FrameImage> = regions
            .iter()
            .map(|region| FrameImage::new(region.buffer_desc(false)).unwrap())
            .collect();
        backend.capture(&mut targets).unwrap();

        assert_eq!(&targets[0].data()[..4], &[1, 2, 3, 0]);
        assert_eq!(&targets[1].data()[..4], &[9, 9, 9, 0]);
        assert_eq!(&targets[2].data()[..4], &[1, 2, 3, 0]);
    }

    #[test]
    fn solid_provider_needs_at_least_one_color() {
        let provider = SolidColorProvider::new(Vec::new());
        let err = provider.open(&[], false).unwrap_err();
        assert_eq!(err, ImagingError::CaptureOpen);
    }

    #[test]
    fn backends_fill_only_the_targets_they_are_given() {
        // The operator layer enforces exact counts; the backend itself just
        // fills what it receives.
        let (mut backend, _) = open_one(&TestCardProvider, Rect::new(0, 0, 2, 2), false);
        backend.capture(&mut []).unwrap();
    }
}
