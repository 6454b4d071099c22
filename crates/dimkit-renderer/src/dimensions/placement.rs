//! Text placement along dimension lines

use glam::Vec3;

use dimkit_core::dimension::DimensionCommon;
use dimkit_core::style::{Style, TextAlignment, TextPosition};
use dimkit_core::text::{TextCard, TextField, TextSourceContext};

use crate::context::{DrawContext, Owner};
use crate::emit::Output;
use crate::frame::FrameContext;
use crate::text_layout::{CardLayout, draw_text_3d, field_card, update_text};

/// Leader overshoot past the dimension line.
pub fn cap_extension(dir: Vec3, cap_size: f32, cap_angle: f32, scale: f32) -> Vec3 {
    dir.normalize_or_zero() / 1000.0 * cap_size * cap_angle.sin() * scale
}

/// Dimension line overshoot when text sits outside the line.
pub fn dim_line_extension(cap_size: f32, scale: f32) -> f32 {
    cap_size / 750.0 * scale
}

/// The measured span text is placed against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureLine {
    /// Default text anchor (dimension line midpoint).
    pub origin: Vec3,
    /// Measured length.
    pub dist: f32,
    /// Separation vector between the sorted endpoints.
    pub dist_vec: Vec3,
    /// Offset from the measured points to the dimension line.
    pub offset: Vec3,
}

/// Outcome of placing a dimension's text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement {
    /// Caps point outwards.
    pub flip_caps: bool,
    /// Extension added to both dimension line ends.
    pub extension: f32,
    /// Final text anchor.
    pub origin: Vec3,
}

/// Places one field's card against a measure line.
///
/// Left/Right alignment moves the text past the line end; centred text
/// too wide for the line is moved out when autoplacement is on.
pub fn dim_text_placement(
    field: &TextField,
    style: &Style,
    frame: &FrameContext,
    line: &MeasureLine,
    card_index: usize,
) -> (TextCard, TextPlacement) {
    let cap_size = style.endcap_size;
    let norm_dist = line.dist_vec.normalize_or_zero();
    let y_dir = line.offset.normalize_or_zero();
    let mut layout = CardLayout::from_style(style, frame);
    layout.position = TextPosition::Top;

    let mut placement = TextPlacement {
        flip_caps: false,
        extension: 0.0,
        origin: line.origin,
    };

    match style.text_alignment {
        TextAlignment::Left | TextAlignment::Right => {
            layout.position = TextPosition::Middle;
            placement.flip_caps = true;
            placement.extension = dim_line_extension(cap_size, frame.scale);
            let shift = (line.dist / 2.0 + placement.extension * 1.2) * norm_dist;
            if style.text_alignment == TextAlignment::Left {
                placement.origin += shift;
            } else {
                placement.origin -= shift;
            }
        }
        TextAlignment::Center => {}
    }

    let mut card = field_card(field, &layout, placement.origin, norm_dist, y_dir, card_index);
    let card_x = card.x_axis();
    let card_y = card.y_axis();

    if card_x.length() > line.dist
        && frame.config.use_text_autoplacement
        && style.text_alignment == TextAlignment::Center
    {
        placement.flip_caps = true;
        placement.extension = dim_line_extension(cap_size, frame.scale);
        placement.origin += line.dist_vec * -0.5
            - placement.extension * norm_dist
            - card_x / 2.0
            - card_y / 2.0;
        card = field_card(field, &layout, placement.origin, norm_dist, y_dir, 0);
    }
    (card, placement)
}

/// Refreshes, rasterizes, places and draws every text field of a
/// dimension.
///
/// Unless the dimension uses custom text, the first field is set to
/// `measured`. The returned placement is that of the first field.
pub fn setup_dim_text(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    common: &mut DimensionCommon,
    style: &Style,
    measured: String,
    line: &MeasureLine,
) -> TextPlacement {
    common.ensure_text_fields(1);
    if !common.use_custom_text {
        common.text_fields[0].set_text(measured);
    }

    let sources = owner.text_sources(ctx.frame, None, style.all_caps);
    let mut first = TextPlacement {
        flip_caps: false,
        extension: 0.0,
        origin: line.origin,
    };
    for (idx, field) in common.text_fields.iter_mut().enumerate() {
        field.refresh(&sources);
        update_text(field, style, ctx.fonts, ctx.frame.resolution, false);
        let (card, placement) = dim_text_placement(field, style, ctx.frame, line, idx);
        field.card = Some(card);
        if idx == 0 {
            first = placement;
        }
        if ctx.frame.config.show_dim_text {
            draw_text_3d(out, ctx.frame, field);
        }
    }
    first
}

/// Axes and stacking slot of a card placed away from a measure line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardFrame {
    /// Card anchor.
    pub base: Vec3,
    /// Reading direction.
    pub x_dir: Vec3,
    /// Up direction.
    pub y_dir: Vec3,
    /// Stacking slot.
    pub index: usize,
}

/// Refreshes, rasterizes, places and draws one field on a fixed frame.
pub(crate) fn place_field(
    ctx: &mut DrawContext,
    out: &mut Output,
    field: &mut TextField,
    sources: &TextSourceContext<'_>,
    style: &Style,
    layout: &CardLayout,
    at: &CardFrame,
) {
    field.refresh(sources);
    update_text(field, style, ctx.fonts, ctx.frame.resolution, false);
    field.card = Some(field_card(field, layout, at.base, at.x_dir, at.y_dir, at.index));
    if ctx.frame.config.show_dim_text {
        draw_text_3d(out, ctx.frame, field);
    }
}
