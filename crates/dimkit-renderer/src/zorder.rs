//! Back-to-front ordering for vector output
//!
//! A drawing surface has no depth buffer, so everything emitted to it is
//! painted farthest first. Items behind the camera are dropped.

use glam::{Mat4, Vec3};

use dimkit_core::mesh::Mesh;

use crate::camera::Camera;

/// Orders `items` by descending camera depth, dropping negative depths.
///
/// Equal depths keep their input order.
pub fn z_order<T>(items: impl IntoIterator<Item = (T, f32)>) -> Vec<T> {
    let mut visible: Vec<(T, f32)> = items
        .into_iter()
        .filter(|(_, depth)| *depth >= 0.0)
        .collect();
    visible.sort_by(|a, b| b.1.total_cmp(&a.1));
    visible.into_iter().map(|(item, _)| item).collect()
}

/// Camera depth of an object's origin.
pub fn object_depth(camera: &Camera, world: &Mat4) -> f32 {
    camera.depth(world.transform_point3(Vec3::ZERO))
}

/// Face indices of `mesh` painted farthest first, measured at each face's
/// centre.
pub fn faces_back_to_front(
    camera: &Camera,
    mesh: &Mesh,
    world: &Mat4,
    faces: impl IntoIterator<Item = usize>,
) -> Vec<usize> {
    z_order(faces.into_iter().map(|face| {
        let center = world.transform_point3(mesh.face_center_median(face));
        (face, camera.depth(center))
    }))
}
