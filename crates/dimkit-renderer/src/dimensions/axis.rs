//! Single-axis dimensions
//!
//! The separation between two anchors is projected onto one world axis (or
//! the axis of a reference object) and drawn in the view sector facing the
//! camera. A short connector joins the second anchor to the dimension
//! plane when the anchors differ along the view axis.

use glam::Vec3;

use dimkit_core::dimension::{AxisDimension, MeasureAxis};
use dimkit_core::error::GeometryError;
use dimkit_core::geometry::{dominant_axis, project_onto, rotate_about, sort_points};
use dimkit_core::style::ViewPlane;

use super::endcap::{EndcapGeometry, cap_pair};
use super::normal::{NormalQuery, plane_axis, select_normal, view_direction};
use super::placement::{MeasureLine, cap_extension, setup_dim_text};
use super::{cap_style, emit_dimension, leader_offsets, prepare};
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::emit::Output;

/// View component limits for the X, Y and Z sector tests, per measured
/// axis. Calibration data.
fn sector_thresholds(axis: MeasureAxis) -> Vec3 {
    match axis {
        MeasureAxis::X => Vec3::new(0.95796, 0.22146, 0.197568),
        MeasureAxis::Y => Vec3::new(0.22146, 0.95796, 0.197568),
        MeasureAxis::Z => Vec3::new(0.24681, 0.24681, 0.93800),
    }
}

/// Signed world axis the view looks along, for a dimension measuring
/// `axis`. Later components win; `+Z` when none passes its limit.
pub fn view_sector(view_axis: Vec3, axis: MeasureAxis) -> Vec3 {
    let limits = sector_thresholds(axis);
    let mut sector = Vec3::Z;
    if view_axis.x > limits.x {
        sector = Vec3::X;
    } else if view_axis.x < -limits.x {
        sector = Vec3::NEG_X;
    }
    if view_axis.y > limits.y {
        sector = Vec3::Y;
    } else if view_axis.y < -limits.y {
        sector = Vec3::NEG_Y;
    }
    if view_axis.z > limits.z {
        sector = Vec3::Z;
    } else if view_axis.z < -limits.z {
        sector = Vec3::NEG_Z;
    }
    sector
}

/// Draws a single-axis dimension.
pub fn draw_axis(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    dim: &mut AxisDimension,
) -> Result<DrawOutcome, GeometryError> {
    let Some((style, color)) = prepare(ctx, owner, &mut dim.common) else {
        return Ok(DrawOutcome::Hidden);
    };
    let eval = ctx.eval_mods(&style);
    let a = ctx.anchor_point(owner, &dim.anchor_a, eval)?;
    let b = ctx.anchor_point(owner, &dim.anchor_b, eval)?;
    let (p1, p2) = sort_points(a, b);

    let view_plane = dim.common.view_plane.unwrap_or(style.view_plane);
    let view_axis = match view_plane {
        ViewPlane::Auto => view_direction(ctx.frame),
        plane => plane_axis(plane, ctx.frame),
    };
    let sector = view_sector(view_axis, dim.axis);

    let mut axis_vec = dim.axis.unit();
    if let Some(id) = dim.axis_object
        && let Some(reference) = ctx.scene.object(id)
    {
        axis_vec = reference.rotation() * axis_vec;
    }

    let dist_vec = project_onto(p1 - p2, axis_vec);
    let dist = dist_vec.length();
    let norm_dist = dist_vec.normalize_or_zero();

    let selected = select_normal(&NormalQuery {
        object: owner.object,
        edge: None,
        norm_dist,
        view_axis: plane_axis(view_plane, ctx.frame),
        flip: dim.common.flip,
        eval,
    });
    let mut dir = sector.cross(axis_vec);
    if dir.dot(selected) < 0.0 {
        dir = -dir;
    }
    let direction = dir.try_normalize().unwrap_or(selected);
    let user_offset = rotate_about(direction, norm_dist, style.dim_rotation);
    let lead = leader_offsets(user_offset, &style);
    dim.common.gizmo.rotation_dir = user_offset;

    let p1_dir = p1 * direction;
    let p2_dir = p2 * direction;
    let dom = dominant_axis(p1_dir);
    let (base, second, second_axis, aligned) = if p1_dir[dom] >= p2_dir[dom] {
        (p1, p2, dist_vec, p2 - p1)
    } else {
        (p2, p1, -dist_vec, p1 - p2)
    };

    let diff_axis = match view_plane {
        ViewPlane::Auto => sector.abs(),
        plane => plane_axis(plane, ctx.frame),
    };
    let view_diff = aligned * diff_axis;
    dim.common.gizmo.rotation_axis = aligned;

    let overshoot = cap_extension(
        lead.offset,
        style.endcap_size,
        style.endcap_arrow_angle,
        ctx.frame.scale,
    );
    let lead_start_a = base + lead.geo;
    let lead_end_a = base + lead.offset + overshoot;
    let lead_end_b = lead_end_a - second_axis;
    let lead_start_b = second - view_diff + lead.geo;

    let dim_start = base + lead.offset;
    let dim_end = dim_start - second_axis;
    let text_loc = (dim_start + dim_end) * 0.5;
    dim.common.gizmo.location = text_loc;

    let measured = ctx.frame.config.units.format_distance(dist);
    let line = MeasureLine {
        origin: text_loc,
        dist,
        dist_vec,
        offset: lead.offset,
    };
    let placement = setup_dim_text(ctx, out, owner, &mut dim.common, &style, measured, &line);

    let line_dir = second_axis.normalize_or_zero();
    let mut geometry = EndcapGeometry {
        lines: vec![
            lead_start_a,
            lead_end_a,
            lead_start_b,
            lead_end_b,
            dim_start + line_dir * placement.extension,
            dim_end - line_dir * placement.extension,
            lead_start_b,
            lead_start_b + view_diff,
        ],
        filled: Vec::new(),
    };
    geometry.extend(cap_pair(
        [style.endcap_a, style.endcap_b],
        &cap_style(&style, ctx.frame),
        [dim_start, dim_end],
        text_loc,
        user_offset,
        placement.flip_caps,
    ));

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_sector_classification() {
        assert_eq!(view_sector(Vec3::Z, MeasureAxis::X), Vec3::Z);
        assert_eq!(view_sector(Vec3::NEG_Y, MeasureAxis::X), Vec3::NEG_Y);
        assert_eq!(view_sector(Vec3::new(0.99, 0.1, 0.1), MeasureAxis::X), Vec3::X);
        // A shallow tilt over the Z limit wins over X.
        assert_eq!(view_sector(Vec3::new(0.96, 0.0, 0.25), MeasureAxis::X), Vec3::Z);
        // Nothing passes: default sector.
        assert_eq!(view_sector(Vec3::ZERO, MeasureAxis::Z), Vec3::Z);
        assert_eq!(view_sector(Vec3::new(0.0, 0.0, -1.0), MeasureAxis::Z), Vec3::NEG_Z);
    }
}
