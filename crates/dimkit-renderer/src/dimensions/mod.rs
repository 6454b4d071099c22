//! Dimension geometry
//!
//! One module per dimension kind plus the shared pieces they are built
//! from: offset direction selection ([`normal`]), endcaps ([`endcap`]) and
//! text placement ([`placement`]).
//!
//! Every `draw_*` function follows the same pipeline: resolve the style and
//! check visibility, resolve anchor points (a failed lookup is returned as
//! an error so the caller can prune the dimension), build leader, line and
//! cap geometry, place text, then emit to the batch layer and, in vector
//! frames, the drawing surface.

pub mod aligned;
pub mod angle;
pub mod arc;
pub mod area;
pub mod axis;
pub mod bounds;
pub mod endcap;
pub mod normal;
pub mod placement;

pub use aligned::draw_aligned;
pub use angle::{angle_segment_count, draw_angle};
pub use arc::draw_arc;
pub use area::draw_area;
pub use axis::draw_axis;
pub use bounds::draw_bounds;

use glam::{Vec3, Vec4};

use dimkit_core::dimension::DimensionCommon;
use dimkit_core::style::{Style, StyleCategory};
use dimkit_core::text::TextField;

use crate::batch::LineOptions;
use crate::color::item_color;
use crate::context::{DrawContext, Owner};
use crate::emit::{Output, VectorItem};
use crate::frame::FrameContext;
use endcap::{CapStyle, EndcapGeometry, cap_pair};
use placement::{TextPlacement, cap_extension};

/// Resolves a dimension's style and display colour.
///
/// `None` when the dimension or its style is hidden in this frame.
pub(crate) fn prepare(
    ctx: &DrawContext,
    owner: &Owner,
    common: &mut DimensionCommon,
) -> Option<(Style, Vec4)> {
    let style = common
        .binding
        .resolve(&ctx.scene.styles, StyleCategory::Dimension);
    if !ctx.frame.is_visible(common.visible, &style) {
        return None;
    }
    let color = item_color(style.color, owner.id(), ctx.frame, common.is_active, true);
    Some((style, color))
}

pub(crate) fn cap_style(style: &Style, frame: &FrameContext) -> CapStyle {
    CapStyle {
        size: style.endcap_size,
        arrow_angle: style.endcap_arrow_angle,
        scale: frame.scale,
    }
}

/// Offset to the dimension line and the leader stand-off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LeaderOffsets {
    pub offset: Vec3,
    pub geo: Vec3,
}

/// Scales the offset direction by the style's offsets.
///
/// The dimension line never sits closer than the leader stand-off.
pub(crate) fn leader_offsets(user_offset: Vec3, style: &Style) -> LeaderOffsets {
    let mut offset = user_offset * style.dim_offset;
    let geo = offset.normalize_or_zero() * style.dim_leader_offset;
    if offset.length() < geo.length() {
        offset = geo;
    }
    LeaderOffsets { offset, geo }
}

/// Leaders, dimension line and caps of a two-point linear dimension.
///
/// Coordinates are `[leadStartA, leadEndA, leadStartB, leadEndB,
/// lineStart, lineEnd]` followed by cap segments.
pub(crate) fn linear_geometry(
    points: (Vec3, Vec3),
    user_offset: Vec3,
    lead: &LeaderOffsets,
    style: &Style,
    frame: &FrameContext,
    placement: &TextPlacement,
) -> EndcapGeometry {
    let (p1, p2) = points;
    let overshoot = cap_extension(
        lead.offset,
        style.endcap_size,
        style.endcap_arrow_angle,
        frame.scale,
    );
    let dim_start = p1 + lead.offset;
    let dim_end = p2 + lead.offset;
    let line_dir = (dim_start - dim_end).normalize_or_zero();
    let midpoint = (dim_start + dim_end) * 0.5;

    let mut geometry = EndcapGeometry {
        lines: vec![
            p1 + lead.geo,
            p1 + lead.offset + overshoot,
            p2 + lead.geo,
            p2 + lead.offset + overshoot,
            dim_start + line_dir * placement.extension,
            dim_end - line_dir * placement.extension,
        ],
        filled: Vec::new(),
    };
    geometry.extend(cap_pair(
        [style.endcap_a, style.endcap_b],
        &cap_style(style, frame),
        [dim_start, dim_end],
        midpoint,
        user_offset,
        placement.flip_caps,
    ));
    geometry
}

/// Emits a dimension's caps, lines and vector group.
pub(crate) fn emit_dimension(
    out: &mut Output,
    name: &str,
    style: &Style,
    color: Vec4,
    geometry: &EndcapGeometry,
    texts: &[TextField],
    text_origin: Vec3,
) {
    out.batch.draw_filled(&geometry.filled, color, true);
    out.batch.draw_lines(
        style.line_weight,
        color,
        &geometry.lines,
        &LineOptions::two_pass(),
    );
    out.vector_item(&VectorItem {
        name,
        lines: &geometry.lines,
        filled: &geometry.filled,
        weight: style.line_weight,
        color,
        texts,
        text_origin,
        font_size: style.font_size,
    });
}
