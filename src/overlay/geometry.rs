//! Geometry calculator - size fraction and screen metrics to pixel layout
//!
//! Everything here is pure. Base dimensions are in device-independent units
//! and are multiplied by `density * effective(size_fraction)`.
//!
//! Layout (base units):
//!
//! ```text
//! +- padding ------------------------------------------+
//! | +- housing (48x128) -+  gap  +- badge (56x40) -+   |
//! | |  ( red )           |       |       30        |   |
//! | |  ( yellow )        |       +-----------------+   |
//! | |  ( green )         |                             |
//! | +--------------------+                             |
//! +----------------------------------------------------+
//! ```

use crate::error::OverlayError;
use serde::{Deserialize, Serialize};

const BASE_PADDING: f64 = 8.0;
const BASE_LIGHT_DIAMETER: f64 = 32.0;
const BASE_LIGHT_SPACING: f64 = 8.0;
const BASE_HOUSING_PADDING: f64 = 8.0;
const BASE_GAP: f64 = 12.0;
const BASE_BADGE_WIDTH: f64 = 56.0;
const BASE_BADGE_HEIGHT: f64 = 40.0;
const BASE_TEXT_SIZE: f64 = 20.0;

/// Whole-widget base extents, derived from the element constants above
pub const BASE_WIDGET_WIDTH: f64 = 2.0 * BASE_PADDING
    + (BASE_LIGHT_DIAMETER + 2.0 * BASE_HOUSING_PADDING)
    + BASE_GAP
    + BASE_BADGE_WIDTH;
pub const BASE_WIDGET_HEIGHT: f64 = 2.0 * BASE_PADDING
    + (3.0 * BASE_LIGHT_DIAMETER + 2.0 * BASE_LIGHT_SPACING + 2.0 * BASE_HOUSING_PADDING);

/// Size fractions at or below this use the floor multiplier
pub const CURVE_KNEE: f64 = 0.25;
/// Multiplier used for the low end of the curve
pub const CURVE_FLOOR: f64 = 0.4;
const CURVE_OFFSET: f64 = 0.2;
const CURVE_SLOPE: f64 = 0.8;

/// Primary display extents and pixel density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub width: i32,
    pub height: i32,
    pub density: f64,
}

impl ScreenMetrics {
    pub fn new(width: i32, height: i32, density: f64) -> Self {
        Self {
            width,
            height,
            density,
        }
    }
}

/// Absolute surface placement in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Pixel dimensions of the widget and each of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub padding: i32,
    pub housing_width: i32,
    pub housing_height: i32,
    pub housing_padding: i32,
    pub light_diameter: i32,
    pub light_spacing: i32,
    pub gap: i32,
    pub badge_width: i32,
    pub badge_height: i32,
    pub widget_width: i32,
    pub widget_height: i32,
    pub text_size: f32,
}

/// Effective-size curve.
///
/// Flat at `CURVE_FLOOR` up to `CURVE_KNEE`, then linear `0.2 + 0.8 * s`,
/// which meets the floor at the knee and reaches 1.0 at `s = 1`.
pub fn effective_size(size_fraction: f64) -> f64 {
    if size_fraction <= CURVE_KNEE {
        CURVE_FLOOR
    } else {
        CURVE_OFFSET + size_fraction * CURVE_SLOPE
    }
}

/// Compute the pixel layout for a size fraction on the given screen.
pub fn compute_layout(
    size_fraction: f64,
    screen_width: i32,
    screen_height: i32,
    density: f64,
) -> Result<LayoutSpec, OverlayError> {
    if screen_width <= 0 || screen_height <= 0 {
        return Err(OverlayError::InvalidDimension(format!(
            "screen {screen_width}x{screen_height}"
        )));
    }
    if !(density.is_finite() && density > 0.0) {
        return Err(OverlayError::InvalidDimension(format!("density {density}")));
    }
    // Negated comparison so NaN is rejected too
    if !(size_fraction > 0.0 && size_fraction <= 1.0) {
        return Err(OverlayError::InvalidDimension(format!(
            "size fraction {size_fraction}"
        )));
    }

    let fit =
        (screen_width as f64 / BASE_WIDGET_WIDTH).min(screen_height as f64 / BASE_WIDGET_HEIGHT);
    let unit = (density * effective_size(size_fraction)).min(fit);
    let scale = |base: f64| ((base * unit).floor() as i32).max(1);

    let padding = scale(BASE_PADDING);
    let light_diameter = scale(BASE_LIGHT_DIAMETER);
    let light_spacing = scale(BASE_LIGHT_SPACING);
    let housing_padding = scale(BASE_HOUSING_PADDING);
    let gap = scale(BASE_GAP);
    let badge_width = scale(BASE_BADGE_WIDTH);
    let badge_height = scale(BASE_BADGE_HEIGHT);

    let housing_width = light_diameter + 2 * housing_padding;
    let housing_height = 3 * light_diameter + 2 * light_spacing + 2 * housing_padding;

    let widget_width = (2 * padding + housing_width + gap + badge_width).min(screen_width);
    let widget_height = (2 * padding + housing_height.max(badge_height)).min(screen_height);

    Ok(LayoutSpec {
        padding,
        housing_width,
        housing_height,
        housing_padding,
        light_diameter,
        light_spacing,
        gap,
        badge_width,
        badge_height,
        widget_width,
        widget_height,
        text_size: ((BASE_TEXT_SIZE * unit) as f32).max(1.0),
    })
}

/// Placement range along one axis: screen extent minus widget extent, never negative.
pub fn usable_range(screen_extent: i32, widget_extent: i32) -> i32 {
    (screen_extent - widget_extent).max(0)
}

/// Normalized fraction to absolute pixel offset along one axis.
pub fn to_absolute(fraction: f64, screen_extent: i32, widget_extent: i32) -> i32 {
    let range = usable_range(screen_extent, widget_extent);
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.5
    };
    (fraction * range as f64).round() as i32
}

/// Absolute pixel offset to normalized fraction along one axis.
///
/// A degenerate range (widget fills the axis) maps to 0.5.
pub fn to_fraction(position: i32, screen_extent: i32, widget_extent: i32) -> f64 {
    let range = usable_range(screen_extent, widget_extent);
    if range == 0 {
        return 0.5;
    }
    position.clamp(0, range) as f64 / range as f64
}

/// Clamp a window origin so the whole widget stays on screen.
pub fn clamp_origin(x: i32, y: i32, layout: &LayoutSpec, screen: &ScreenMetrics) -> (i32, i32) {
    (
        x.clamp(0, usable_range(screen.width, layout.widget_width)),
        y.clamp(0, usable_range(screen.height, layout.widget_height)),
    )
}

/// Absolute geometry for a normalized position.
pub fn place(
    position_x: f64,
    position_y: f64,
    layout: &LayoutSpec,
    screen: &ScreenMetrics,
) -> Geometry {
    Geometry {
        x: to_absolute(position_x, screen.width, layout.widget_width),
        y: to_absolute(position_y, screen.height, layout.widget_height),
        width: layout.widget_width,
        height: layout.widget_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(l: &LayoutSpec) -> [i32; 11] {
        [
            l.padding,
            l.housing_width,
            l.housing_height,
            l.housing_padding,
            l.light_diameter,
            l.light_spacing,
            l.gap,
            l.badge_width,
            l.badge_height,
            l.widget_width,
            l.widget_height,
        ]
    }

    #[test]
    fn base_widget_extent() {
        assert_eq!(BASE_WIDGET_WIDTH, 132.0);
        assert_eq!(BASE_WIDGET_HEIGHT, 144.0);
    }

    #[test]
    fn full_size_at_unit_density_uses_base_extent() {
        let layout = compute_layout(1.0, 1000, 2000, 1.0).unwrap();
        assert_eq!(layout.widget_width, 132);
        assert_eq!(layout.widget_height, 144);
        assert_eq!(layout.light_diameter, 32);
        assert_eq!(layout.badge_width, 56);
        assert_eq!(layout.text_size, 20.0);
    }

    #[test]
    fn density_scales_every_element() {
        let layout = compute_layout(1.0, 1080, 2340, 2.625).unwrap();
        assert_eq!(layout.padding, 21);
        assert_eq!(layout.light_diameter, 84);
        assert_eq!(layout.gap, 31);
        assert_eq!(layout.widget_width, 346);
        assert_eq!(layout.widget_height, 378);
    }

    #[test]
    fn curve_is_continuous_at_knee() {
        let below = effective_size(CURVE_KNEE);
        let above = effective_size(CURVE_KNEE + 1e-9);
        assert!((below - above).abs() < 1e-6);
        assert_eq!(effective_size(0.01), CURVE_FLOOR);
        assert!((effective_size(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn curve_is_monotonic() {
        let mut prev = 0.0;
        for i in 1..=1000 {
            let e = effective_size(i as f64 / 1000.0);
            assert!(e >= prev);
            prev = e;
        }
    }

    #[test]
    fn layout_positive_and_monotonic_over_fraction() {
        let screens = [(1000, 2000, 1.0), (1080, 2340, 2.625), (320, 240, 3.0), (50, 60, 1.0)];
        for (w, h, d) in screens {
            let mut prev = [0; 11];
            for i in 1..=100 {
                let layout = compute_layout(i as f64 / 100.0, w, h, d).unwrap();
                let current = sizes(&layout);
                for (c, p) in current.iter().zip(prev.iter()) {
                    assert!(*c > 0, "non-positive size on {w}x{h}@{d}");
                    assert!(c >= p, "size shrank on {w}x{h}@{d} at {i}");
                }
                assert!(layout.widget_width <= w);
                assert!(layout.widget_height <= h);
                prev = current;
            }
        }
    }

    #[test]
    fn widget_never_exceeds_tiny_screen() {
        let layout = compute_layout(1.0, 3, 2, 4.0).unwrap();
        assert!(layout.widget_width >= 1 && layout.widget_width <= 3);
        assert!(layout.widget_height >= 1 && layout.widget_height <= 2);
    }

    #[test]
    fn invalid_dimensions_rejected() {
        assert!(matches!(
            compute_layout(1.0, 0, 100, 1.0),
            Err(OverlayError::InvalidDimension(_))
        ));
        assert!(matches!(
            compute_layout(1.0, 100, -5, 1.0),
            Err(OverlayError::InvalidDimension(_))
        ));
        assert!(compute_layout(0.0, 100, 100, 1.0).is_err());
        assert!(compute_layout(1.01, 100, 100, 1.0).is_err());
        assert!(compute_layout(f64::NAN, 100, 100, 1.0).is_err());
        assert!(compute_layout(0.5, 100, 100, 0.0).is_err());
    }

    #[test]
    fn centered_placement() {
        let screen = ScreenMetrics::new(1000, 2000, 1.0);
        let layout = compute_layout(1.0, 1000, 2000, 1.0).unwrap();
        let g = place(0.5, 0.5, &layout, &screen);
        assert_eq!((g.x, g.y), (434, 928));
    }

    #[test]
    fn fraction_of_degenerate_range_is_half() {
        assert_eq!(to_fraction(0, 100, 100), 0.5);
        assert_eq!(to_fraction(0, 80, 100), 0.5);
    }

    #[test]
    fn fraction_round_trip_within_a_pixel() {
        for i in 0..=20 {
            let f = i as f64 / 20.0;
            let pos = to_absolute(f, 1000, 132);
            let back = to_fraction(pos, 1000, 132);
            assert!((back - f).abs() <= 0.5 / 868.0 + 1e-12);
        }
    }

    #[test]
    fn clamp_origin_keeps_widget_on_screen() {
        let screen = ScreenMetrics::new(1000, 2000, 1.0);
        let layout = compute_layout(1.0, 1000, 2000, 1.0).unwrap();
        assert_eq!(clamp_origin(-50, 5000, &layout, &screen), (0, 1856));
        assert_eq!(clamp_origin(2000, -1, &layout, &screen), (868, 0));
    }
}
