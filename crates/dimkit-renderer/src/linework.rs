//! Linework extraction
//!
//! Line groups turn mesh topology into drawn edges, either from an explicit
//! vertex index buffer or dynamically from creases and silhouettes. The
//! extracted object-space coordinates are cached on the group and only
//! rebuilt when something that could change them happened: an interaction
//! mode switch, modifier evaluation, a render frame or a view change.

use glam::{Quat, Vec3, Vec4};

use dimkit_core::linework::{LineGenerator, LineGroup, LineSource};
use dimkit_core::mesh::Mesh;
use dimkit_core::scene::{InteractionMode, ObjectKind, SceneObject};
use dimkit_core::style::{Style, StyleCategory};

use crate::batch::{BatchKey, Dash, DepthTest, LineOptions, Topology};
use crate::color::{gamma_correct, item_color};
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::emit::Output;
use crate::surface::StrokeStyle;

/// Backend depth offset for a line group.
///
/// Heavier lines are pulled further towards the camera. Orthographic views
/// need far less offset and outlines are pushed behind everything else.
pub fn line_depth_offset(weight: f32, tweak: f32, ortho: bool, outline: bool) -> f32 {
    let mut offset = weight / 2.5 + tweak;
    if ortho {
        offset /= 15.0;
    }
    if outline {
        offset = -10.0 - offset;
    }
    -(offset / 1000.0)
}

/// Coordinates for an explicit index buffer. Indices past the end of the
/// mesh map to the origin.
pub fn explicit_coords(mesh: Option<&Mesh>, indices: &[usize]) -> Vec<Vec3> {
    indices
        .iter()
        .map(|&i| mesh.map_or(Vec3::ZERO, |m| m.vertex_or_origin(i)))
        .collect()
}

/// Inputs for dynamic edge classification.
#[derive(Debug, Clone, Copy)]
pub struct EdgeQuery {
    /// Dihedral angle above which an edge is a crease, radians.
    pub crease_angle: f32,
    /// Also emit edges where the adjacent faces flip facing.
    pub silhouette: bool,
    /// Emit a connected strip rather than segment pairs.
    pub chain: bool,
    /// Camera local `+Z` in world space.
    pub camera_z: Vec3,
    /// Object rotation, applied to face normals for the silhouette test.
    pub rotation: Quat,
}

/// Angle between two face normals, radians.
///
/// The dot product is clamped so rounding past ±1 still yields a fold.
pub fn dihedral_angle(normal_a: Vec3, normal_b: Vec3) -> f32 {
    normal_a.dot(normal_b).clamp(-1.0, 1.0).acos()
}

/// Crease, silhouette and boundary edges of `mesh` in object space.
///
/// Edges with exactly two faces are tested against the crease angle and,
/// when enabled, for a silhouette. Edges with any other face count are
/// boundary or non-manifold edges and always drawn. Never returns an empty
/// list so the backend batch stays valid.
pub fn dynamic_edges(mesh: &Mesh, query: &EdgeQuery) -> Vec<Vec3> {
    let adjacency = mesh.edge_faces();
    let last = mesh.edges.len().saturating_sub(1);
    let mut coords = Vec::new();

    for (index, (edge, faces)) in mesh.edges.iter().zip(&adjacency).enumerate() {
        let point_a = mesh.vertex_or_origin(edge[0] as usize);
        let point_b = mesh.vertex_or_origin(edge[1] as usize);

        if let [face_a, face_b] = faces.as_slice() {
            let normal_a = mesh.face_normal(*face_a).normalize_or_zero();
            let normal_b = mesh.face_normal(*face_b).normalize_or_zero();
            if dihedral_angle(normal_a, normal_b) > query.crease_angle {
                coords.extend([point_a, point_b]);
            }

            if query.silhouette {
                let facing_a = query.camera_z.dot(query.rotation * normal_a).signum();
                let facing_b = query.camera_z.dot(query.rotation * normal_b).signum();
                if facing_a != facing_b {
                    coords.push(point_a);
                    if !query.chain {
                        coords.push(point_b);
                    }
                }
            }
        } else {
            coords.push(point_a);
            if !query.chain || index == last {
                coords.push(point_b);
            }
        }
    }

    if coords.is_empty() {
        coords.extend([Vec3::ZERO, Vec3::ZERO]);
    }
    coords
}

/// Edge-only mesh following each spline of a curve object.
fn curve_mesh(object: &SceneObject) -> Mesh {
    let mut mesh = Mesh::new();
    for spline in &object.splines {
        let start = mesh.vertices.len() as u32;
        mesh.vertices.extend(spline.iter().copied());
        for i in 1..spline.len() as u32 {
            mesh.edges.push([start + i - 1, start + i]);
        }
    }
    mesh
}

fn extract(ctx: &DrawContext, owner: &Owner, group: &LineGroup, eval: bool) -> Option<Vec<Vec3>> {
    match &group.source {
        LineSource::Explicit(indices) => {
            Some(explicit_coords(owner.object.mesh_for(eval), indices))
        }
        LineSource::Dynamic {
            crease_angle,
            silhouette,
        } => {
            if owner.object.mode != InteractionMode::Object {
                return None;
            }
            let query = EdgeQuery {
                crease_angle: *crease_angle,
                silhouette: *silhouette,
                chain: group.chain,
                camera_z: ctx.frame.view_axis(),
                rotation: owner.rotation(),
            };
            match owner.object.kind {
                ObjectKind::Curve => Some(dynamic_edges(&curve_mesh(owner.object), &query)),
                _ => owner
                    .object
                    .mesh_for(eval)
                    .map(|mesh| dynamic_edges(mesh, &query)),
            }
        }
    }
}

fn dash(style: &Style) -> Dash {
    Dash {
        dash_length: style.dash_length,
        gap_length: style.gap_length,
        screen_space: style.screen_space_dashes,
    }
}

/// Draws one line group.
///
/// `mode_changed` reports an interaction mode switch on the owner since
/// the previous frame.
pub fn draw_line_group(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    group: &mut LineGroup,
    mode_changed: bool,
) -> DrawOutcome {
    let style = group
        .binding
        .resolve(&ctx.scene.styles, StyleCategory::LineGroup);
    if !ctx.frame.is_visible(group.visible, &style) {
        return DrawOutcome::Hidden;
    }
    let color = item_color(style.color, owner.id(), ctx.frame, true, false);
    let depth_offset = line_depth_offset(
        style.line_weight,
        style.depth_offset,
        ctx.frame.camera.is_ortho(),
        style.is_outline,
    );

    let eval = ctx.eval_mods(&style);
    let epoch = ctx.frame.batch_epoch;
    let recompute = mode_changed || eval || ctx.frame.is_render() || ctx.frame.view_changed;
    if recompute || group.cache.get(epoch).is_none() {
        match extract(ctx, owner, group, eval) {
            Some(coords) => {
                tracing::debug!(
                    "Rebuilt line group '{}' on '{}': {} vertices",
                    group.name,
                    owner.object.name,
                    coords.len()
                );
                group.cache.store(coords, epoch);
            }
            None => return DrawOutcome::Hidden,
        }
    }
    let Some(coords) = group.cache.get(epoch) else {
        return DrawOutcome::Hidden;
    };

    let key = BatchKey {
        handle: group.handle,
        generation: group.cache.generation,
    };
    let topology = if group.chain {
        Topology::LineStrip
    } else {
        Topology::Lines
    };
    let base = LineOptions {
        depth_offset,
        object_transform: owner.world,
        cache: Some(key),
        ..LineOptions::default()
    };

    if style.draw_hidden {
        out.batch.draw_lines(
            style.hidden_weight,
            gamma_correct(style.hidden_color),
            coords,
            &LineOptions {
                depth_test: DepthTest::Greater,
                dash: Some(dash(&style)),
                ..base
            },
        );
    }

    if style.draw_dashed {
        out.batch.draw_lines(
            style.line_weight,
            color,
            coords,
            &LineOptions {
                topology,
                dash: Some(dash(&style)),
                ..base
            },
        );
    } else {
        let world_points: Vec<Vec3> = if style.point_pass {
            coords
                .iter()
                .map(|p| owner.world.transform_point3(*p))
                .collect()
        } else {
            Vec::new()
        };
        out.batch.draw_lines(
            style.line_weight,
            color,
            coords,
            &LineOptions {
                two_pass: true,
                point_pass: style.point_pass,
                point_coords: Some(&world_points),
                topology,
                extension: group.line_over_extension,
                ..base
            },
        );
    }

    if out.is_vector() {
        emit_vector(out, owner, group, coords, &style, color, topology);
    }
    DrawOutcome::Drawn
}

fn emit_vector(
    out: &mut Output,
    owner: &Owner,
    group: &LineGroup,
    coords: &[Vec3],
    style: &Style,
    color: Vec4,
    topology: Topology,
) {
    let stroke = StrokeStyle {
        color,
        weight: style.line_weight,
        dash: style
            .draw_dashed
            .then_some([style.dash_length, style.gap_length]),
    };
    if let Some(surface) = out.surface() {
        surface.begin_group(&group.name);
    }
    out.vector_path(coords, owner.world, topology, &stroke);
    if let Some(surface) = out.surface() {
        surface.end_group();
    }
}

/// Draws every group of an object's line generator.
///
/// Returns how many groups produced geometry.
pub fn draw_line_groups(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    generator: &mut LineGenerator,
) -> usize {
    let mode = owner.object.mode;
    let mode_changed = generator.last_mode.is_some_and(|last| last != mode);
    generator.last_mode = Some(mode);

    generator
        .groups
        .iter_mut()
        .map(|group| draw_line_group(ctx, out, owner, group, mode_changed))
        .filter(|outcome| *outcome == DrawOutcome::Drawn)
        .count()
}
