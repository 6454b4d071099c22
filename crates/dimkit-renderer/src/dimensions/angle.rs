//! Angle dimensions
//!
//! Three vertices on the owner: the apex is the middle one. The arc is
//! tessellated at a resolution that depends only on radius and sweep, so
//! the same dimension produces the same polyline in every view.

use glam::Vec3;

use dimkit_core::dimension::AngleDimension;
use dimkit_core::error::GeometryError;
use dimkit_core::geometry::{interpolate, normalize_or, rotate_about};

use super::endcap::{CapPlacement, EndcapGeometry, generate_end_caps};
use super::placement::{CardFrame, place_field};
use super::{cap_style, prepare};
use crate::batch::LineOptions;
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::emit::{Output, VectorItem};
use crate::text_layout::CardLayout;

/// Radius units per extra arc segment.
const RADIUS_PER_SEGMENT: f32 = 0.2;

/// Text sits slightly outside the arc.
const TEXT_RADIUS_FACTOR: f32 = 1.05;

/// Number of arc segments for a sweep of `angle` radians at `radius`.
pub fn angle_segment_count(radius: f32, angle: f32) -> usize {
    (radius / RADIUS_PER_SEGMENT).ceil().max(0.0) as usize + (angle.to_degrees() / 2.0) as usize
}

/// Unit vectors from `start` sweeping `angle` about `axis` in
/// `segments + 1` equal steps, `start` included.
fn sweep(start: Vec3, axis: Vec3, angle: f32, segments: usize) -> Vec<Vec3> {
    let step = angle / (segments + 1) as f32;
    (0..=segments)
        .map(|i| rotate_about(start, axis, step * i as f32))
        .collect()
}

/// Draws an angle dimension.
pub fn draw_angle(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    dim: &mut AngleDimension,
) -> Result<DrawOutcome, GeometryError> {
    let Some((style, color)) = prepare(ctx, owner, &mut dim.common) else {
        return Ok(DrawOutcome::Hidden);
    };
    let eval = ctx.eval_mods(&style);
    let [ia, ib, ic] = dim.points;
    let p1 = ctx.owner_point(owner, ia, eval)?;
    let p2 = ctx.owner_point(owner, ib, eval)?;
    let p3 = ctx.owner_point(owner, ic, eval)?;
    let radius = dim.radius;

    let vec_a = (p1 - p2).normalize_or_zero();
    let vec_b = (p3 - p2).normalize_or_zero();
    let norm = normalize_or(vec_a.cross(vec_b), Vec3::Z);
    let dist = (vec_a - vec_b).length();
    let mut angle = vec_a.dot(vec_b).clamp(-1.0, 1.0).acos();

    let mut start = vec_a;
    let mut end = vec_b;
    let mut mid_vec = normalize_or(
        interpolate(vec_a, vec_b, dist / 2.0),
        norm.cross(vec_a),
    );
    if dim.reflex {
        angle = std::f32::consts::TAU - angle;
        std::mem::swap(&mut start, &mut end);
        mid_vec = rotate_about(mid_vec, norm, std::f32::consts::PI);
    }
    let mid_point = mid_vec * radius * TEXT_RADIUS_FACTOR + p2;

    let segments = angle_segment_count(radius, angle);
    let verts = sweep(start, norm, angle, segments);

    dim.common.gizmo.location = mid_point;
    dim.common.gizmo.rotation_dir = mid_vec;
    dim.common.gizmo.rotation_axis = norm;

    dim.common.ensure_text_fields(1);
    if !dim.common.use_custom_text {
        dim.common.text_fields[0].set_text(ctx.frame.config.units.format_angle(angle));
    }
    let layout = CardLayout::from_style(&style, ctx.frame);
    let sources = owner.text_sources(ctx.frame, None, style.all_caps);
    let x_dir = normalize_or(mid_vec.cross(norm), Vec3::X);
    for (index, field) in dim.common.text_fields.iter_mut().enumerate() {
        let at = CardFrame {
            base: mid_point,
            x_dir,
            y_dir: mid_vec,
            index,
        };
        place_field(ctx, out, field, &sources, &style, &layout, &at);
    }

    let start_point = start * radius + p2;
    let end_point = end * radius + p2;
    let mut point_coords = Vec::with_capacity(verts.len() + 2);
    point_coords.push(start_point);
    point_coords.extend(verts.iter().map(|v| *v * radius + p2));
    point_coords.push(end_point);

    let mut lines = Vec::with_capacity(verts.len() * 2 + 2);
    lines.push(start_point);
    for v in &verts {
        let p = *v * radius + p2;
        lines.push(p);
        lines.push(p);
    }
    lines.push(end_point);

    let arrow_offset = style.endcap_size.clamp(0.0, lines.len() as f32 / 4.0) as usize;
    let mids = [lines[arrow_offset + 1], lines[lines.len() - arrow_offset - 1]];
    let caps = cap_style(&style, ctx.frame);
    let mut geometry = EndcapGeometry {
        lines,
        filled: Vec::new(),
    };
    for (index, (cap, position)) in [style.endcap_a, style.endcap_b]
        .into_iter()
        .zip([start_point, end_point])
        .enumerate()
    {
        geometry.extend(generate_end_caps(
            cap,
            &caps,
            &CapPlacement {
                position,
                midpoint: mids[index],
                user_offset: mid_vec,
                index,
                flip: false,
            },
        ));
    }

    out.batch.draw_filled(&geometry.filled, color, true);
    out.batch.draw_lines(
        style.line_weight,
        color,
        &geometry.lines,
        &LineOptions {
            point_pass: true,
            point_coords: Some(&point_coords),
            ..LineOptions::two_pass()
        },
    );
    out.vector_item(&VectorItem {
        name: &dim.common.name,
        lines: &geometry.lines,
        filled: &geometry.filled,
        weight: style.line_weight,
        color,
        texts: &dim.common.text_fields,
        text_origin: mid_point,
        font_size: style.font_size,
    });
    Ok(DrawOutcome::Drawn)
}
