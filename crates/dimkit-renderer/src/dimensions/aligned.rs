//! Aligned dimensions: true distance between two anchors

use dimkit_core::dimension::AlignedDimension;
use dimkit_core::error::GeometryError;
use dimkit_core::geometry::{rotate_about, sort_points};

use super::normal::{NormalQuery, plane_axis, select_normal};
use super::placement::{MeasureLine, setup_dim_text};
use super::{emit_dimension, leader_offsets, linear_geometry, prepare};
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::emit::Output;

/// Draws an aligned dimension.
///
/// Anchors may live on other objects; a failed lookup is returned so the
/// caller can prune the dimension.
pub fn draw_aligned(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    dim: &mut AlignedDimension,
) -> Result<DrawOutcome, GeometryError> {
    let Some((style, color)) = prepare(ctx, owner, &mut dim.common) else {
        return Ok(DrawOutcome::Hidden);
    };
    let eval = ctx.eval_mods(&style);
    let a = ctx.anchor_point(owner, &dim.anchor_a, eval)?;
    let b = ctx.anchor_point(owner, &dim.anchor_b, eval)?;

    let (p1, p2) = sort_points(a, b);
    let dist_vec = p1 - p2;
    let dist = dist_vec.length();
    let norm_dist = dist_vec.normalize_or_zero();

    let on_owner = dim.anchor_a.object == owner.id() && dim.anchor_b.object == owner.id();
    let selected = select_normal(&NormalQuery {
        object: owner.object,
        edge: on_owner.then_some([dim.anchor_a.index, dim.anchor_b.index]),
        norm_dist,
        view_axis: plane_axis(dim.common.view_plane.unwrap_or(style.view_plane), ctx.frame),
        flip: dim.common.flip,
        eval,
    });
    let user_offset = rotate_about(selected, norm_dist, style.dim_rotation);
    let lead = leader_offsets(user_offset, &style);

    let text_loc = (p1 + p2) * 0.5 + lead.offset;
    dim.common.gizmo.location = text_loc;
    dim.common.gizmo.rotation_dir = user_offset;

    let measured = ctx.frame.config.units.format_distance(dist);
    let line = MeasureLine {
        origin: text_loc,
        dist,
        dist_vec,
        offset: lead.offset,
    };
    let placement = setup_dim_text(ctx, out, owner, &mut dim.common, &style, measured, &line);

    let geometry = linear_geometry((p1, p2), user_offset, &lead, &style, ctx.frame, &placement);
    emit_dimension(
        out,
        &dim.common.name,
        &style,
        color,
        &geometry,
        &dim.common.text_fields,
        placement.origin,
    );
    Ok(DrawOutcome::Drawn)
}
