//! Bounding box dimensions
//!
//! Measures the X, Y and Z extents of an object, or of a set of objects,
//! along one edge of the box each. Unrotated objects use their stored
//! bounds directly. Rotated meshes get a world-space box computed from
//! their vertices, cached until the object's rotation, location or scale
//! changes.

use glam::{Mat4, Vec3};

use dimkit_core::dimension::{AabbCacheEntry, BoundsCache, BoundsDimension};
use dimkit_core::error::GeometryError;
use dimkit_core::geometry::{BoundingBox, axis_aligned_bounds, rotate_about, sort_points};
use dimkit_core::scene::{ObjectKind, Scene, SceneObject};
use uuid::Uuid;

use super::placement::{MeasureLine, dim_text_placement};
use super::{emit_dimension, leader_offsets, linear_geometry, prepare};
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::emit::Output;
use crate::text_layout::{draw_text_3d, update_text};

/// Box corner pairs measured for X, Y and Z.
const AXIS_PAIRS: [[usize; 2]; 3] = [[2, 6], [1, 2], [0, 1]];

const AXIS_NAMES: [&str; 3] = ["X", "Y", "Z"];

/// Default offset direction per axis.
const PLACEMENT_DIRS: [Vec3; 3] = [Vec3::Y, Vec3::NEG_X, Vec3::NEG_X];

fn object_points(object: &SceneObject, eval: bool) -> Vec<Vec3> {
    match object.kind {
        ObjectKind::Mesh => object
            .mesh_for(eval)
            .map(|m| m.vertices.clone())
            .unwrap_or_default(),
        ObjectKind::Curve => object.splines.iter().flatten().copied().collect(),
        ObjectKind::Empty => Vec::new(),
    }
}

fn raw_corners(object: &SceneObject, world: &Mat4) -> [Vec3; 8] {
    object
        .raw_bounds()
        .corners()
        .map(|c| world.transform_point3(c))
}

/// World-space box of an object's vertices, reusing `cached` when the
/// transform has not changed.
fn world_aabb(
    object: &SceneObject,
    world: &Mat4,
    cached: Option<&AabbCacheEntry>,
    eval: bool,
) -> AabbCacheEntry {
    let (scale, rotation, location) = world.to_scale_rotation_translation();
    if let Some(entry) = cached
        && entry.matches(rotation, location, scale)
    {
        return *entry;
    }

    tracing::debug!("Recomputing world bounds for '{}'", object.name);
    let points = object_points(object, eval)
        .into_iter()
        .map(|p| world.transform_point3(p));
    let bounds = axis_aligned_bounds(points)
        .unwrap_or_else(|| BoundingBox::from_points(raw_corners(object, world)));
    AabbCacheEntry {
        rotation,
        location,
        scale,
        bounds,
    }
}

/// Corners of a single object's box.
fn single_corners(
    owner: &Owner,
    calc_axis_aligned: bool,
    cache: &mut BoundsCache,
    eval: bool,
) -> [Vec3; 8] {
    if !calc_axis_aligned || owner.rotation().is_near_identity() {
        cache.clear();
        return raw_corners(owner.object, &owner.world);
    }
    let entry = world_aabb(owner.object, &owner.world, cache.single.as_ref(), eval);
    cache.single = Some(entry);
    entry.bounds.corners()
}

/// Corners of the box around every object in a collection.
fn collection_corners(
    scene: &Scene,
    owner: &Owner,
    members: &[Uuid],
    cache: &mut BoundsCache,
    eval: bool,
) -> [Vec3; 8] {
    let mut points = Vec::new();
    for id in members {
        let Some(object) = scene.object(*id) else {
            continue;
        };
        let world = owner.anchor_world(object);
        let rotation = world.to_scale_rotation_translation().1;
        if rotation.is_near_identity() || object.kind != ObjectKind::Mesh {
            points.extend(raw_corners(object, &world));
            cache.per_object.remove(id);
            continue;
        }
        let entry = world_aabb(object, &world, cache.per_object.get(id), eval);
        cache.per_object.insert(*id, entry);
        points.push(entry.bounds.max);
        points.push(entry.bounds.min);
    }
    axis_aligned_bounds(points)
        .unwrap_or_else(|| BoundingBox::new(Vec3::ZERO, Vec3::ZERO))
        .corners()
}

/// Draws the enabled axes of a bounding box dimension.
pub fn draw_bounds(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    dim: &mut BoundsDimension,
) -> Result<DrawOutcome, GeometryError> {
    let Some((style, color)) = prepare(ctx, owner, &mut dim.common) else {
        return Ok(DrawOutcome::Hidden);
    };
    let eval = ctx.eval_mods(&style);

    let corners = match &dim.collection {
        Some(members) => collection_corners(ctx.scene, owner, members, &mut dim.cache, eval),
        None => single_corners(owner, dim.calc_axis_aligned, &mut dim.cache, eval),
    };
    let follow_rotation = dim.collection.is_none() && !dim.calc_axis_aligned;
    let sources = owner.text_sources(ctx.frame, None, style.all_caps);
    dim.common.ensure_text_fields(3);

    for axis in 0..3 {
        if !dim.draw_axis[axis] {
            continue;
        }
        let [ia, ib] = AXIS_PAIRS[axis];
        let (p1, p2) = sort_points(corners[ia], corners[ib]);
        let dist_vec = p1 - p2;
        let dist = dist_vec.length();
        let norm_dist = dist_vec.normalize_or_zero();
        let midpoint = (p1 + p2) * 0.5;

        let mut selected = PLACEMENT_DIRS[axis];
        if follow_rotation {
            selected = owner.rotation() * selected;
        }
        let user_offset = rotate_about(selected, norm_dist, style.dim_rotation);
        let lead = leader_offsets(user_offset, &style);
        dim.common.gizmo.location = midpoint + user_offset * style.dim_offset;
        dim.common.gizmo.rotation_dir = user_offset;

        let line = MeasureLine {
            origin: midpoint + lead.offset,
            dist,
            dist_vec,
            offset: lead.offset,
        };
        let field = &mut dim.common.text_fields[axis];
        if !dim.common.use_custom_text {
            field.set_text(ctx.frame.config.units.format_distance(dist));
        }
        field.refresh(&sources);
        update_text(field, &style, ctx.fonts, ctx.frame.resolution, false);
        let (card, placement) = dim_text_placement(field, &style, ctx.frame, &line, 0);
        field.card = Some(card);
        if ctx.frame.config.show_dim_text {
            draw_text_3d(out, ctx.frame, field);
        }

        let geometry = linear_geometry((p1, p2), user_offset, &lead, &style, ctx.frame, &placement);
        emit_dimension(
            out,
            &format!("{}_{}", dim.common.name, AXIS_NAMES[axis]),
            &style,
            color,
            &geometry,
            std::slice::from_ref(&dim.common.text_fields[axis]),
            placement.origin,
        );
    }
    Ok(DrawOutcome::Drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn cube() -> SceneObject {
        SceneObject {
            local_bounds: Some(BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0))),
            mesh: Some(dimkit_core::mesh::Mesh {
                vertices: vec![Vec3::splat(-1.0), Vec3::splat(1.0)],
                ..Default::default()
            }),
            ..SceneObject::new("cube")
        }
    }

    #[test]
    fn test_identity_rotation_skips_cache() {
        let object = cube();
        let owner = Owner::new(&object);
        let mut cache = BoundsCache::default();
        let corners = single_corners(&owner, true, &mut cache, false);
        assert!(cache.is_empty());
        assert_eq!(corners[0], Vec3::splat(-1.0));
        assert_eq!(corners[6], Vec3::splat(1.0));
    }

    #[test]
    fn test_rotated_object_caches_world_box() {
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let object = cube().with_transform(Mat4::from_quat(rotation));
        let owner = Owner::new(&object);
        let mut cache = BoundsCache::default();
        let corners = single_corners(&owner, true, &mut cache, false);
        let entry = cache.single.expect("cached");
        assert!(!entry.rotation.is_near_identity());
        // Rotating the diagonal points about Z keeps their Z extent.
        assert!((corners[6].z - 1.0).abs() < 1e-5);

        let again = single_corners(&owner, true, &mut cache, false);
        assert_eq!(corners, again);
    }

    #[test]
    fn test_collection_prunes_cache_for_unrotated_members() {
        let mut scene = Scene::new();
        let rotated = cube().with_transform(Mat4::from_rotation_z(0.3));
        let plain = cube().with_transform(Mat4::from_translation(Vec3::X * 4.0));
        let rotated_id = scene.add_object(rotated);
        let plain_id = scene.add_object(plain);
        let owner_obj = SceneObject::new("owner");
        let owner = Owner::new(&owner_obj);

        let mut cache = BoundsCache::default();
        cache.per_object.insert(
            plain_id,
            AabbCacheEntry {
                rotation: Quat::IDENTITY,
                location: Vec3::ZERO,
                scale: Vec3::ONE,
                bounds: BoundingBox::new(Vec3::ZERO, Vec3::ZERO),
            },
        );
        let corners =
            collection_corners(&scene, &owner, &[rotated_id, plain_id], &mut cache, false);
        assert!(cache.per_object.contains_key(&rotated_id));
        assert!(!cache.per_object.contains_key(&plain_id));
        assert_eq!(corners[6].x, 5.0);
    }
}
