//! Arc dimensions
//!
//! Three vertices on the owner define a circle. The arc between the first
//! and last vertex is drawn at double weight, with an offset measure arc
//! carrying the caps and the length (or sweep angle) label. Optionally a
//! radius leader with its own cap and label runs from the centre.

use glam::Vec3;

use dimkit_core::dimension::ArcDimension;
use dimkit_core::error::GeometryError;
use dimkit_core::geometry::{arc_data, circumcenter, interpolate, normalize_or, rotate_about};
use dimkit_core::style::TextAlignment;

use super::endcap::{CapPlacement, generate_end_caps};
use super::placement::{CardFrame, place_field};
use super::{cap_style, prepare};
use crate::batch::{DEFAULT_DEPTH_OFFSET, LineOptions, Topology};
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::emit::Output;
use crate::surface::{StrokeStyle, TextStyle};
use crate::text_layout::CardLayout;

/// Radius units per extra arc segment.
const RADIUS_PER_SEGMENT: f32 = 0.2;

/// Radius label stand-off from the leader.
const RADIUS_TEXT_OFFSET: f32 = 0.04;

/// Number of arc vertices for a sweep of `angle` radians at `offset`.
fn arc_vertex_count(offset: f32, angle: f32) -> usize {
    (offset / RADIUS_PER_SEGMENT).ceil().max(0.0) as usize + (angle.to_degrees() / 2.0) as usize + 2
}

/// Segment list along `verts` scaled to `radius`.
fn arc_segments(verts: &[Vec3], radius: f32) -> Vec<Vec3> {
    let mut coords = Vec::with_capacity(verts.len() * 2 + 2);
    if let (Some(first), Some(last)) = (verts.first(), verts.last()) {
        coords.push(*first * radius);
        for v in verts {
            coords.push(*v * radius);
            coords.push(*v * radius);
        }
        coords.push(*last * radius);
    }
    coords
}

/// Draws an arc dimension.
///
/// Collinear vertices have no circle; the dimension is skipped for the
/// frame but kept.
pub fn draw_arc(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    dim: &mut ArcDimension,
) -> Result<DrawOutcome, GeometryError> {
    let Some((style, color)) = prepare(ctx, owner, &mut dim.common) else {
        return Ok(DrawOutcome::Hidden);
    };
    let eval = ctx.eval_mods(&style);
    let [ia, ib, ic] = dim.points;
    let p1 = ctx.owner_point(owner, ia, eval)?;
    let p2 = ctx.owner_point(owner, ib, eval)?;
    let p3 = ctx.owner_point(owner, ic, eval)?;

    let Some(center) = circumcenter(p1, p2, p3) else {
        tracing::debug!("Arc '{}' has collinear points, skipping", dim.common.name);
        dim.center = None;
        return Ok(DrawOutcome::Hidden);
    };
    dim.center = Some(center);

    let norm = normalize_or((p1 - p2).cross(p3 - p2), Vec3::Z);
    let (arc_angle, arc_length) = arc_data(p1, center, p2, p3);

    let a = p1 - center;
    let b = p2 - center;
    let c = p3 - center;

    let offset = style.dim_offset;
    let count = arc_vertex_count(offset, arc_angle);
    let step = arc_angle / (count - 1) as f32;
    let verts: Vec<Vec3> = (0..count)
        .map(|i| rotate_about(a, norm, -step * i as f32).normalize_or_zero())
        .collect();

    let radius = b.length();
    let offset_radius = radius + offset;
    let mut measure = arc_segments(&verts, offset_radius);
    let start = measure[0];
    let end = measure[measure.len() - 1];

    let radius_leader = rotate_about(c, norm, arc_angle / 2.0);
    let radius_mid = interpolate(radius_leader, Vec3::ZERO, radius / 2.0);

    let mut caps = vec![style.endcap_a, style.endcap_b];
    let mut positions = vec![start, end];
    if dim.show_radius {
        caps.push(dim.endcap_c);
        positions.push(radius_leader);
    }
    let arrow_offset =
        3 + (style.endcap_size / 4.0).ceil().clamp(0.0, measure.len() as f32 / 5.0) as usize;
    let mids = [
        measure[arrow_offset.min(measure.len() - 1)],
        measure[measure.len().saturating_sub(arrow_offset)],
        radius_mid,
    ];

    let cap = cap_style(&style, ctx.frame);
    let mut filled = Vec::new();
    for (index, (kind, position)) in caps.into_iter().zip(positions).enumerate() {
        let geometry = generate_end_caps(
            kind,
            &cap,
            &CapPlacement {
                position,
                midpoint: mids[index],
                user_offset: a,
                index,
                flip: false,
            },
        );
        measure.extend(geometry.lines);
        filled.extend(geometry.filled.into_iter().map(|p| p + center));
    }

    let leader_end = offset_radius + arrow_offset as f32 / 1000.0;
    measure.extend([a, a.normalize_or_zero() * leader_end]);
    measure.extend([c, c.normalize_or_zero() * leader_end]);
    if dim.show_radius {
        measure.extend([Vec3::ZERO, radius_leader]);
    }

    // Text: radius label in field 0, arc label in field 1.
    dim.common.ensure_text_fields(2);
    if !dim.common.use_custom_text {
        let units = &ctx.frame.config.units;
        let length_text = if dim.display_as_angle {
            units.format_angle(arc_angle)
        } else {
            units.format_distance(arc_length)
        };
        dim.common.text_fields[1].set_text(length_text);
        if dim.show_radius {
            dim.common.text_fields[0].set_text(format!("r {}", units.format_distance(radius)));
        }
    }

    let sources = owner.text_sources(ctx.frame, None, style.all_caps);
    let layout = CardLayout::from_style(&style, ctx.frame);
    let mut text_origins = [center, center];

    if dim.show_radius {
        let mid = interpolate(Vec3::ZERO, radius_leader, radius / 2.0);
        let y_dir = normalize_or(mid.cross(norm), Vec3::Y);
        let origin = mid + RADIUS_TEXT_OFFSET * y_dir + center;
        let radius_layout = CardLayout {
            alignment: TextAlignment::Center,
            ..layout
        };
        let at = CardFrame {
            base: origin,
            x_dir: mid.normalize_or_zero(),
            y_dir,
            index: 0,
        };
        place_field(
            ctx,
            out,
            &mut dim.common.text_fields[0],
            &sources,
            &style,
            &radius_layout,
            &at,
        );
        text_origins[0] = origin;
    } else {
        dim.common.text_fields[0].card = None;
    }

    let label_mid = radius_leader.normalize_or_zero() * offset_radius;
    let label_origin = label_mid + center;
    let at = CardFrame {
        base: label_origin,
        x_dir: normalize_or(label_mid.cross(norm), Vec3::X),
        y_dir: label_mid.normalize_or_zero(),
        index: 0,
    };
    place_field(
        ctx,
        out,
        &mut dim.common.text_fields[1],
        &sources,
        &style,
        &layout,
        &at,
    );
    text_origins[1] = label_origin;

    dim.common.gizmo.location = label_origin;
    dim.common.gizmo.rotation_dir = radius_leader.normalize_or_zero();
    dim.common.gizmo.rotation_axis = norm;

    let measure: Vec<Vec3> = measure.into_iter().map(|p| p + center).collect();
    let arc: Vec<Vec3> = arc_segments(&verts, radius)
        .into_iter()
        .map(|p| p + center)
        .collect();

    let weight = style.line_weight;
    out.batch.draw_lines(
        weight,
        color,
        &measure,
        &LineOptions {
            point_pass: true,
            ..LineOptions::two_pass()
        },
    );
    out.batch.draw_lines(
        weight * 2.0,
        color,
        &arc,
        &LineOptions {
            point_pass: true,
            ..LineOptions::two_pass()
        },
    );
    if dim.show_radius {
        out.batch
            .draw_points(weight * 5.0, color, &[center], DEFAULT_DEPTH_OFFSET);
    }
    out.batch.draw_filled(&filled, color, true);

    if let Some(surface) = out.surface() {
        surface.begin_group(&dim.common.name);
        surface.add_path(&measure, Topology::Lines, &StrokeStyle::solid(color, weight));
        surface.add_path(&arc, Topology::Lines, &StrokeStyle::solid(color, weight * 2.0));
        if !filled.is_empty() {
            surface.add_fill(&filled, color);
        }
        let text_style = TextStyle {
            color,
            font_size: style.font_size,
        };
        for (field, origin) in dim.common.text_fields.iter().zip(text_origins) {
            if let Some(card) = &field.card {
                surface.add_text(&field.text, origin, card, &text_style);
            }
        }
        if dim.show_radius {
            surface.add_circle(center, weight * 2.5, color);
        }
        surface.end_group();
    }
    Ok(DrawOutcome::Drawn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_count_includes_both_ends() {
        // Half turn at zero offset: 90 interior steps plus the two ends.
        assert_eq!(arc_vertex_count(0.0, std::f32::consts::PI), 92);
        assert_eq!(arc_vertex_count(0.4, 0.0), 4);
    }

    #[test]
    fn test_arc_segments_pair_up() {
        let coords = arc_segments(&[Vec3::X, Vec3::Y], 2.0);
        assert_eq!(coords.len(), 6);
        assert_eq!(coords[0], Vec3::X * 2.0);
        assert_eq!(coords[5], Vec3::Y * 2.0);
        assert!(arc_segments(&[], 1.0).is_empty());
    }
}
