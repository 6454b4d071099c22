//! Offset direction ("selected normal") for linear dimensions

use glam::Vec3;

use dimkit_core::geometry::normalize_or;
use dimkit_core::scene::{ObjectKind, SceneObject};
use dimkit_core::style::ViewPlane;

use crate::frame::FrameContext;

/// A view axis component beyond this snaps the axis to that world axis.
pub const SECTOR_THRESHOLD: f32 = 0.5773;

/// Substituted when every other candidate degenerates.
const CENTER_RAY: Vec3 = Vec3::new(-1.0, 1.0, 1.0);

/// Direction the scene is looked at from.
///
/// Renders use the camera position, interactive frames the view rotation.
pub fn view_direction(frame: &FrameContext) -> Vec3 {
    if frame.is_render() {
        normalize_or(frame.camera.position, Vec3::Z)
    } else {
        frame.view_axis()
    }
}

/// Snaps a view direction to the world axis it leans towards.
///
/// Axes are tested in X, Y, Z order and later matches win.
pub fn snap_to_sector(v: Vec3) -> Vec3 {
    let mut axis = v;
    if v.x.abs() > SECTOR_THRESHOLD {
        axis = Vec3::X;
    }
    if v.y.abs() > SECTOR_THRESHOLD {
        axis = Vec3::Y;
    }
    if v.z.abs() > SECTOR_THRESHOLD {
        axis = Vec3::Z;
    }
    axis
}

/// Normal of the plane a dimension is drawn in.
pub fn plane_axis(plane: ViewPlane, frame: &FrameContext) -> Vec3 {
    match plane {
        ViewPlane::XY => Vec3::Z,
        ViewPlane::XZ => Vec3::Y,
        ViewPlane::YZ => Vec3::X,
        ViewPlane::Auto => snap_to_sector(view_direction(frame)),
    }
}

/// Inputs for [`select_normal`].
#[derive(Debug, Clone, Copy)]
pub struct NormalQuery<'a> {
    /// Owning object.
    pub object: &'a SceneObject,
    /// Vertex pair on the owner whose adjacent faces may be used.
    pub edge: Option<[usize; 2]>,
    /// Unit separation vector.
    pub norm_dist: Vec3,
    /// Result of [`plane_axis`].
    pub view_axis: Vec3,
    /// Negate the final direction.
    pub flip: bool,
    /// Read modifier-evaluated geometry.
    pub eval: bool,
}

/// Picks the direction a linear dimension is offset in.
///
/// In priority order: the object's explicit dimension axis, the plane of
/// the owner's face pair best facing the view, and finally the view axis
/// crossed with the separation. Degenerate results fall back to a fixed
/// diagonal, so the result is always a unit vector.
pub fn select_normal(query: &NormalQuery) -> Vec3 {
    let object = query.object;
    let face_normal = face_pair_normal(query);

    let best = if let Some(axis) = object.dimension_axis {
        axis
    } else if let Some(normal) = face_normal {
        normal
    } else {
        let mut best = query.view_axis.cross(query.norm_dist);
        if best == Vec3::ZERO {
            best = CENTER_RAY;
        }
        if best.dot(CENTER_RAY) < 0.0 {
            best = -best;
        }
        best
    };

    let normal = normalize_or(best, CENTER_RAY.normalize());
    if query.flip { -normal } else { normal }
}

/// Face-based candidate; `None` unless the edge borders exactly two faces.
fn face_pair_normal(query: &NormalQuery) -> Option<Vec3> {
    let object = query.object;
    if object.kind != ObjectKind::Mesh {
        return None;
    }
    let [a, b] = query.edge?;
    let mesh = object.mesh_for(query.eval)?;
    let rotation = object.rotation();
    let normals: Vec<Vec3> = mesh
        .faces_around_edge(a as u32, b as u32)
        .into_iter()
        .map(|n| rotation * n)
        .collect();
    if normals.len() != 2 {
        return None;
    }

    let sum = normals[0] + normals[1];
    let mut check = 0.0f32;
    let mut plane = Vec3::ZERO;
    for candidate in normals.iter().copied().chain([query.view_axis]) {
        let value = query.view_axis.dot(candidate);
        if value.abs() > check.abs() {
            plane = candidate;
            check = value;
        }
    }

    let mut best = plane.cross(query.norm_dist);
    if best == Vec3::ZERO {
        best = sum;
    }
    if best.dot(sum) < 0.0 {
        best = -best;
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dimkit_core::mesh::{Face, Mesh};

    fn query(object: &SceneObject) -> NormalQuery<'_> {
        NormalQuery {
            object,
            edge: None,
            norm_dist: Vec3::X,
            view_axis: Vec3::Z,
            flip: false,
            eval: false,
        }
    }

    #[test]
    fn test_snap_to_sector_later_axes_win() {
        assert_eq!(snap_to_sector(Vec3::new(0.8, 0.0, 0.6)), Vec3::X);
        assert_eq!(snap_to_sector(Vec3::new(0.7, 0.0, 0.7)), Vec3::Z);
        let diagonal = Vec3::splat(0.57);
        assert_eq!(snap_to_sector(diagonal), diagonal);
    }

    #[test]
    fn test_fallback_uses_view_cross() {
        let object = SceneObject::new("empty");
        let n = select_normal(&query(&object));
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-6);

        let flipped = select_normal(&NormalQuery {
            flip: true,
            ..query(&object)
        });
        assert_relative_eq!(flipped.y, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_cross_uses_center_ray() {
        let object = SceneObject::new("empty");
        let n = select_normal(&NormalQuery {
            norm_dist: Vec3::Z,
            ..query(&object)
        });
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-6);
        assert!(n.x < 0.0 && n.y > 0.0 && n.z > 0.0);
    }

    #[test]
    fn test_dimension_axis_override() {
        let mut object = SceneObject::new("cad");
        object.dimension_axis = Some(Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(select_normal(&query(&object)), Vec3::Z);
    }

    #[test]
    fn test_face_pair_prefers_view_facing_plane() {
        // Two faces meeting along the X axis edge (0,1): one flat, one vertical.
        let mesh = Mesh::from_faces(
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(0.0, 0.0, -1.0),
            ],
            vec![Face::new(vec![0, 1, 2, 3]), Face::new(vec![1, 0, 5, 4])],
        );
        let object = SceneObject::with_mesh("fold", mesh);
        let n = select_normal(&NormalQuery {
            edge: Some([0, 1]),
            ..query(&object)
        });
        // The +Z face is most aligned with the view; the offset lies in its plane.
        assert_relative_eq!(n.z, 0.0, epsilon = 1e-6);
        assert_relative_eq!(n.y.abs(), 1.0, epsilon = 1e-6);
    }
}
