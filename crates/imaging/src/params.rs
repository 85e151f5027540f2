//! Layout parameters and placement geometry.
//!
//! A [`LayoutParameter`] describes one source: where it comes from on the
//! desktop (clipping rectangle + window), where it lands on the output frame
//! (bound rectangle), and how it is fitted (stretch / keep-aspect flags plus
//! the scaler pass-through config). The padding policy that turns an
//! outer/inner size pair into letterbox margins lives here too; the native
//! layout applies it physically and the complex layout virtually.

use pixel_ops::ScaleConfig;
use serde::{Deserialize, Serialize};

/// Maximum number of sources composed by one layout.
pub const MAX_LAYOUT_ELEMENTS: usize = 8;

/// A rectangle with a signed origin (desktop or output coordinates).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether this rectangle lies fully inside a `width` x `height` area
    /// anchored at the origin.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width >= 1
            && self.height >= 1
            && self.x as u64 + u64::from(self.width) <= u64::from(width)
            && self.y as u64 + u64::from(self.height) <= u64::from(height)
    }
}

/// The desktop region a source reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceWindow {
    /// The whole desktop.
    #[default]
    Desktop,
    /// A specific window, by opaque platform identifier.
    Window(u64),
}

/// Placement and fitting description for one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutParameter {
    /// Placement rectangle in output-image coordinates, `y` from the top.
    pub bound: Rect,
    /// Source rectangle on the desktop, `y` from the top.
    pub clipping: Rect,
    pub window: SourceWindow,
    /// Allow scaling the source up beyond its captured size.
    pub stretch: bool,
    /// Letterbox instead of distorting when aspect ratios differ.
    pub keep_aspect_ratio: bool,
    pub show_cursor: bool,
    pub show_layered_window: bool,
    /// Passed through to the scaler untouched.
    pub scale_config: ScaleConfig,
}

/// Letterbox margins inside an outer rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Margins {
    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}

/// Compute the letterbox margins for fitting `inner` into `outer`.
///
/// With `keep_aspect_ratio` the fitted size is the largest one preserving
/// the inner aspect ratio that fits the outer box; without `stretch` it is
/// additionally capped at the inner's own size. Otherwise the inner fills
/// the outer box and all margins are zero. Odd leftovers go to the right
/// and bottom.
pub fn compute_padding(
    outer_width: u32,
    outer_height: u32,
    inner_width: u32,
    inner_height: u32,
    stretch: bool,
    keep_aspect_ratio: bool,
) -> Margins {
    if !keep_aspect_ratio || inner_width == 0 || inner_height == 0 {
        return Margins::default();
    }

    let (fit_width, fit_height) = if !stretch && inner_width <= outer_width && inner_height <= outer_height
    {
        (inner_width, inner_height)
    } else if u64::from(outer_width) * u64::from(inner_height)
        <= u64::from(outer_height) * u64::from(inner_width)
    {
        // Width-limited: span the outer width, derive the height.
        let height = u64::from(outer_width) * u64::from(inner_height) / u64::from(inner_width);
        (outer_width, (height as u32).max(1))
    } else {
        let width = u64::from(outer_height) * u64::from(inner_width) / u64::from(inner_height);
        ((width as u32).max(1), outer_height)
    };

    let pad_x = outer_width - fit_width.min(outer_width);
    let pad_y = outer_height - fit_height.min(outer_height);
    Margins {
        left: pad_x / 2,
        right: pad_x - pad_x / 2,
        top: pad_y / 2,
        bottom: pad_y - pad_y / 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_aspect_keeping_means_no_margins() {
        let margins = compute_padding(640, 480, 100, 700, false, false);
        assert_eq!(margins, Margins::default());
    }

    #[test]
    fn small_source_without_stretch_keeps_its_size() {
        let margins = compute_padding(640, 480, 320, 240, false, true);
        assert_eq!(margins, Margins { left: 160, right: 160, top: 120, bottom: 120 });
    }

    #[test]
    fn stretch_scales_up_to_the_box() {
        // Same aspect ratio as the box: fills it completely.
        let margins = compute_padding(640, 480, 320, 240, true, true);
        assert_eq!(margins, Margins::default());
    }

    #[test]
    fn oversized_source_is_fitted_down() {
        let margins = compute_padding(640, 480, 1280, 960, false, true);
        assert_eq!(margins, Margins::default());

        // Wide source letterboxes vertically.
        let margins = compute_padding(640, 480, 800, 300, false, true);
        assert_eq!(margins, Margins { left: 0, right: 0, top: 120, bottom: 120 });
    }

    #[test]
    fn margins_account_for_the_full_box_and_split_evenly() {
        for (ow, oh, iw, ih, stretch) in [
            (640u32, 480u32, 320u32, 240u32, false),
            (640, 480, 633, 117, true),
            (1920, 1080, 11, 13, false),
            (101, 77, 50, 50, true),
        ] {
            let m = compute_padding(ow, oh, iw, ih, stretch, true);
            let fit_w = ow - m.horizontal();
            let fit_h = oh - m.vertical();
            assert!(fit_w >= 1 && fit_h >= 1);
            assert!(m.left.abs_diff(m.right) <= 1);
            assert!(m.top.abs_diff(m.bottom) <= 1);
            if !stretch {
                assert!(fit_w <= iw && fit_h <= ih);
            }
            // Aspect preserved up to integer rounding whenever scaling happened.
            if fit_w != iw || fit_h != ih {
                let lhs = u64::from(fit_w) * u64::from(ih);
                let rhs = u64::from(fit_h) * u64::from(iw);
                let tolerance = u64::from(iw.max(ih));
                assert!(lhs.abs_diff(rhs) <= tolerance, "{lhs} vs {rhs}");
            }
        }
    }

    #[test]
    fn degenerate_inner_sizes_fall_back_to_zero_margins() {
        assert_eq!(compute_padding(640, 480, 0, 240, false, true), Margins::default());
    }

    #[test]
    fn parameters_round_trip_through_serde() {
        let parameter = LayoutParameter {
            bound: Rect::new(10, 20, 320, 240),
            clipping: Rect::new(-1920, 0, 1920, 1080),
            window: SourceWindow::Window(0xBEEF),
            stretch: true,
            keep_aspect_ratio: true,
            show_cursor: true,
            ..LayoutParameter::default()
        };
        let json = serde_json::to_string(&parameter).expect("serializable parameter");
        let back: LayoutParameter = serde_json::from_str(&json).expect("roundtrip");
        assert_eq!(back, parameter);
    }

    #[test]
    fn bound_rect_containment() {
        assert!(Rect::new(0, 0, 640, 480).fits_within(640, 480));
        assert!(Rect::new(120, 80, 100, 100).fits_within(640, 480));
        assert!(!Rect::new(-1, 0, 10, 10).fits_within(640, 480));
        assert!(!Rect::new(600, 0, 41, 10).fits_within(640, 480));
        assert!(!Rect::new(0, 0, 0, 10).fits_within(640, 480));
    }
}
