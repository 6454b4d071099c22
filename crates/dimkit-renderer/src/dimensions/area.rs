//! Area dimensions
//!
//! The area of a set of owner faces, filled with a translucent colour and
//! outlined by a set of perimeter edges. Both index lists are maintained
//! by the host.

use glam::{Mat4, Vec3, Vec4};

use dimkit_core::dimension::AreaDimension;
use dimkit_core::error::GeometryError;
use dimkit_core::geometry::{normalize_or, rotate_about, triangle_area};
use dimkit_core::mesh::Mesh;
use dimkit_core::style::{StyleCategory, TextAlignment, TextPosition};

use super::placement::{CardFrame, place_field};
use crate::batch::{LineOptions, Topology};
use crate::color::{gamma_correct, item_color};
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::emit::Output;
use crate::surface::{StrokeStyle, TextStyle};
use crate::text_layout::CardLayout;

/// Lift of the label off the face.
const LABEL_LIFT: f32 = 0.001;

fn face_out_of_range(index: usize, mesh: &Mesh) -> GeometryError {
    GeometryError::IndexOutOfRange {
        index,
        len: mesh.faces.len(),
    }
}

/// World-space triangles of the listed faces and their summed area.
fn face_triangles(
    mesh: &Mesh,
    faces: &[usize],
    world: &Mat4,
) -> Result<(Vec<Vec3>, f32), GeometryError> {
    let mut triangles = Vec::new();
    let mut area = 0.0;
    for &face in faces {
        if face >= mesh.faces.len() {
            return Err(face_out_of_range(face, mesh));
        }
        for [a, b, c] in mesh.triangulate_face(face) {
            let p1 = world.transform_point3(mesh.vertex(a as usize)?);
            let p2 = world.transform_point3(mesh.vertex(b as usize)?);
            let p3 = world.transform_point3(mesh.vertex(c as usize)?);
            area += triangle_area(p1, p2, p3);
            triangles.extend([p1, p2, p3]);
        }
    }
    Ok((triangles, area))
}

/// World-space segment list of the listed edges.
fn perimeter_segments(
    mesh: &Mesh,
    edges: &[usize],
    world: &Mat4,
) -> Result<Vec<Vec3>, GeometryError> {
    let mut coords = Vec::with_capacity(edges.len() * 2);
    for &edge in edges {
        let [a, b] = *mesh.edges.get(edge).ok_or(GeometryError::IndexOutOfRange {
            index: edge,
            len: mesh.edges.len(),
        })?;
        coords.push(world.transform_point3(mesh.vertex(a as usize)?));
        coords.push(world.transform_point3(mesh.vertex(b as usize)?));
    }
    Ok(coords)
}

/// Draws an area dimension.
pub fn draw_area(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    dim: &mut AreaDimension,
) -> Result<DrawOutcome, GeometryError> {
    let style = dim
        .common
        .binding
        .resolve(&ctx.scene.styles, StyleCategory::Dimension);
    if !ctx.frame.is_visible(dim.common.visible, &style) {
        return Ok(DrawOutcome::Hidden);
    }
    let eval = ctx.eval_mods(&style);
    let mesh = owner
        .object
        .mesh_for(eval)
        .ok_or(GeometryError::NoMeshData)?;

    let color = item_color(
        dim.fill_color,
        owner.id(),
        ctx.frame,
        dim.common.is_active,
        true,
    );
    let fill = Vec4::new(color.x, color.y, color.z, dim.fill_alpha);

    let (filled, area) = face_triangles(mesh, &dim.faces, &owner.world)?;
    let perimeter = perimeter_segments(mesh, &dim.perimeter_edges, &owner.world)?;
    if dim.origin_face >= mesh.faces.len() {
        return Err(face_out_of_range(dim.origin_face, mesh));
    }

    let rotation = owner.rotation();
    let normal = normalize_or(rotation * mesh.face_normal(dim.origin_face), Vec3::Z);
    let tangent = rotation * mesh.face_longest_edge(dim.origin_face);
    let local_origin =
        mesh.face_center_bounds(dim.origin_face) + dim.text_offset + normal * LABEL_LIFT;
    let origin = owner.world.transform_point3(local_origin);

    let face_y = normalize_or(normal.cross(tangent), Vec3::Y);
    let face_x = normalize_or(normal.cross(face_y), Vec3::X);
    let y_dir = rotate_about(face_y, normal, style.dim_rotation);
    let x_dir = rotate_about(face_x, normal, style.dim_rotation);

    dim.common.gizmo.location = origin;
    dim.common.gizmo.rotation_dir = y_dir;
    dim.common.gizmo.rotation_axis = normal;

    dim.common.ensure_text_fields(1);
    if !dim.common.use_custom_text {
        dim.common.text_fields[0].set_text(ctx.frame.config.units.format_area(area));
    }
    let layout = CardLayout {
        alignment: TextAlignment::Center,
        position: TextPosition::Middle,
        ..CardLayout::from_style(&style, ctx.frame)
    };
    let sources = owner.text_sources(ctx.frame, None, style.all_caps);
    for (index, field) in dim.common.text_fields.iter_mut().enumerate() {
        let at = CardFrame {
            base: origin,
            x_dir,
            y_dir,
            index,
        };
        place_field(ctx, out, field, &sources, &style, &layout, &at);
    }

    out.batch.draw_filled(&filled, fill, false);
    out.batch.draw_lines(
        style.line_weight,
        color,
        &perimeter,
        &LineOptions {
            point_pass: true,
            ..LineOptions::two_pass()
        },
    );

    if let Some(surface) = out.surface() {
        surface.begin_group(&dim.common.name);
        surface.add_path(
            &perimeter,
            Topology::Lines,
            &StrokeStyle::solid(color, style.line_weight),
        );
        if !filled.is_empty() {
            surface.add_fill(&filled, fill);
        }
        let text_style = TextStyle {
            color: gamma_correct(style.color),
            font_size: style.font_size,
        };
        for field in &dim.common.text_fields {
            if let Some(card) = &field.card {
                surface.add_text(&field.text, origin, card, &text_style);
            }
        }
        surface.end_group();
    }
    Ok(DrawOutcome::Drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dimkit_core::mesh::Face;

    fn quad() -> Mesh {
        Mesh::from_faces(
            vec![
                Vec3::ZERO,
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 3.0, 0.0),
                Vec3::new(0.0, 3.0, 0.0),
            ],
            vec![Face::new(vec![0, 1, 2, 3])],
        )
    }

    #[test]
    fn test_face_triangles_sum_world_area() {
        let mesh = quad();
        let (tris, area) = face_triangles(&mesh, &[0], &Mat4::IDENTITY).unwrap();
        assert_eq!(tris.len(), 6);
        assert_relative_eq!(area, 6.0, epsilon = 1e-5);

        let scaled = Mat4::from_scale(Vec3::splat(2.0));
        let (_, area) = face_triangles(&mesh, &[0], &scaled).unwrap();
        assert_relative_eq!(area, 24.0, epsilon = 1e-4);
    }

    #[test]
    fn test_concave_face_area() {
        // L outline starting at a convex corner next to the notch.
        let vertices = [(2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0), (0.0, 0.0)]
            .map(|(x, y)| Vec3::new(x, y, 0.0))
            .to_vec();
        let mesh = Mesh::from_faces(vertices, vec![Face::new(vec![0, 1, 2, 3, 4, 5])]);
        let (tris, area) = face_triangles(&mesh, &[0], &Mat4::IDENTITY).unwrap();
        assert_eq!(tris.len(), 12);
        assert_relative_eq!(area, 3.0, epsilon = 1e-5);
        // No fill triangle reaches into the notch.
        for t in tris.chunks(3) {
            let centroid = (t[0] + t[1] + t[2]) / 3.0;
            assert!(centroid.x <= 1.0 + 1e-5 || centroid.y <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn test_stale_indices_are_errors() {
        let mesh = quad();
        assert!(matches!(
            face_triangles(&mesh, &[3], &Mat4::IDENTITY),
            Err(GeometryError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(perimeter_segments(&mesh, &[99], &Mat4::IDENTITY).is_err());
        assert_eq!(
            perimeter_segments(&mesh, &[0, 1], &Mat4::IDENTITY)
                .unwrap()
                .len(),
            4
        );
    }
}
