//! Traffic light element - housing with three lights plus a countdown badge
//!
//! Pure element building from a `VisualDescriptor` and `LayoutSpec`. Sizes
//! come straight from the layout so the drawn widget matches the window.
//!
//! Visual design:
//! - Housing: dark translucent rounded column holding the lights
//! - Lights: circles, lit one in signal color, others dim gray
//! - Badge: rounded rect in the active color with white countdown text
//! - Top edge highlight on the housing for depth

use crate::overlay::{LayoutSpec, Light, VisualDescriptor};
use gpui::{Div, ParentElement, Rgba, Styled, div, px, rgb, rgba};

/// Housing corner radius relative to its width
const HOUSING_RADIUS_RATIO: f32 = 0.25;
/// Badge corner radius relative to its height
const BADGE_RADIUS_RATIO: f32 = 0.2;
/// Subtle white line along the housing's top edge
const HIGHLIGHT: u32 = 0xFFFFFF33;

/// `0xRRGGBB` light fill as a gpui color
pub fn fill(light: &Light) -> Rgba {
    rgb(light.fill)
}

pub fn render(visual: &VisualDescriptor, layout: &LayoutSpec, alpha: f32) -> Div {
    let housing_radius = layout.housing_width as f32 * HOUSING_RADIUS_RATIO;
    let badge_radius = layout.badge_height as f32 * BADGE_RADIUS_RATIO;

    let housing = div()
        .relative()
        .w(px(layout.housing_width as f32))
        .h(px(layout.housing_height as f32))
        .p(px(layout.housing_padding as f32))
        .rounded(px(housing_radius))
        .bg(rgba(visual.housing_background))
        .flex()
        .flex_col()
        .items_center()
        .gap(px(layout.light_spacing as f32))
        .child(
            div()
                .absolute()
                .top_0()
                .left(px(housing_radius / 2.0))
                .right(px(housing_radius / 2.0))
                .h(px(1.0))
                .bg(rgba(HIGHLIGHT)),
        )
        .children(visual.lights.iter().map(|light| {
            div()
                .size(px(layout.light_diameter as f32))
                .flex_none()
                .rounded_full()
                .bg(fill(light))
        }));

    let badge = div()
        .w(px(layout.badge_width as f32))
        .h(px(layout.badge_height as f32))
        .flex_none()
        .rounded(px(badge_radius))
        .bg(rgb(visual.badge_color))
        .flex()
        .items_center()
        .justify_center()
        .text_size(px(layout.text_size))
        .text_color(rgb(visual.text_color))
        .child(visual.countdown_text.clone());

    div()
        .size_full()
        .p(px(layout.padding as f32))
        .flex()
        .flex_row()
        .items_start()
        .gap(px(layout.gap as f32))
        .opacity(alpha.clamp(0.0, 1.0))
        .child(housing)
        .child(badge)
}
