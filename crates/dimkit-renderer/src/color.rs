//! Colour correction and selection highlighting

use glam::Vec4;
use uuid::Uuid;

use crate::frame::FrameContext;

/// Raises RGB to `1/2.2`, leaving alpha untouched.
pub fn gamma_correct(raw: [f32; 4]) -> Vec4 {
    let g = 1.0 / 2.2;
    Vec4::new(raw[0].powf(g), raw[1].powf(g), raw[2].powf(g), raw[3])
}

/// Display colour for an item owned by `object`.
///
/// With highlighting on (and not rendering to an image) items on the
/// active object take the theme's active colour. When `only_active` is
/// false, items on any selected object take the selected colour.
pub fn item_color(
    raw: [f32; 4],
    object: Uuid,
    frame: &FrameContext,
    is_active: bool,
    only_active: bool,
) -> Vec4 {
    let mut rgb = gamma_correct(raw);
    if !frame.config.highlight_selected || frame.is_render() || !is_active {
        return rgb;
    }

    let selected = frame.selected.contains(&object);
    let theme = &frame.config.theme;
    if !only_active && selected {
        rgb = Vec4::from_array(theme.object_selected).truncate().extend(1.0);
    }
    if selected && frame.active == Some(object) {
        rgb = Vec4::from_array(theme.object_active).truncate().extend(1.0);
    }
    rgb
}
