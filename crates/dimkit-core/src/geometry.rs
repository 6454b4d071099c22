//! Geometric primitives: point ordering, bounding boxes, circle fitting.
//!
//! Everything here is a pure function over `glam` f32 types.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Index of the axis where `|component|` is strictly greatest.
///
/// Ties resolve to axis 0.
pub fn dominant_axis(v: Vec3) -> usize {
    let a = v.abs();
    if a.x > a.y && a.x > a.z {
        0
    } else if a.y > a.x && a.y > a.z {
        1
    } else if a.z > a.x && a.z > a.y {
        2
    } else {
        0
    }
}

/// Orders two points so the first has the larger (or equal) value on the
/// dominant axis of their separation.
pub fn sort_points(p1: Vec3, p2: Vec3) -> (Vec3, Vec3) {
    let axis = dominant_axis(p1 - p2);
    if p2[axis] > p1[axis] {
        (p2, p1)
    } else {
        (p1, p2)
    }
}

/// Applies an affine transform to a point.
pub fn transform_point(matrix: &Mat4, point: Vec3) -> Vec3 {
    matrix.transform_point3(point)
}

/// Moves `distance` from `from` towards `to`.
///
/// Returns `from` when the two points coincide.
pub fn interpolate(from: Vec3, to: Vec3, distance: f32) -> Vec3 {
    from + (to - from).normalize_or_zero() * distance
}

/// Rotates `v` about `axis` by `angle` radians (right handed).
///
/// A zero-length axis leaves the vector unchanged.
pub fn rotate_about(v: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, angle) * v,
        None => v,
    }
}

/// Rotation from XYZ Euler angles, applied about X first, then Y, then Z.
pub fn euler_xyz(angles: Vec3) -> Quat {
    Quat::from_euler(EulerRot::ZYX, angles.z, angles.y, angles.x)
}

/// Normalizes `v`, substituting `fallback` for a zero-length or non-finite vector.
pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(fallback)
}

/// Projects `v` onto `axis`.
pub fn project_onto(v: Vec3, axis: Vec3) -> Vec3 {
    let len_sq = axis.length_squared();
    if len_sq == 0.0 {
        return Vec3::ZERO;
    }
    axis * (v.dot(axis) / len_sq)
}

/// Area of the triangle `(a, b, c)`.
pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b - a).cross(c - a).length() * 0.5
}

/// Unit normal of the triangle `(a, b, c)`, `+Z` for degenerate triangles.
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    normalize_or((b - a).cross(c - a), Vec3::Z)
}

/// Centre of the circle through three points.
///
/// Uses the barycentric circumscribed-circle weights. Returns `None` when the
/// points are collinear.
pub fn circumcenter(p1: Vec3, p2: Vec3, p3: Vec3) -> Option<Vec3> {
    let p12 = p1 - p2;
    let p13 = p1 - p3;
    let p21 = p2 - p1;
    let p23 = p2 - p3;
    let p31 = p3 - p1;
    let p32 = p3 - p2;

    let denom = 2.0 * p12.cross(p23).length_squared();
    if denom <= f32::EPSILON {
        return None;
    }

    let alpha = p23.length_squared() * p12.dot(p13) / denom;
    let beta = p13.length_squared() * p21.dot(p23) / denom;
    let gamma = p12.length_squared() * p31.dot(p32) / denom;

    let center = alpha * p1 + beta * p2 + gamma * p3;
    center.is_finite().then_some(center)
}

/// Sweep angle and arc length of an arc through `start`, `mid`, `end`
/// around `center`.
///
/// The angle is the sum of the two partial sweeps so arcs wider than a
/// half turn are measured correctly.
pub fn arc_data(start: Vec3, center: Vec3, mid: Vec3, end: Vec3) -> (f32, f32) {
    let v1 = start - center;
    let v2 = mid - center;
    let v3 = end - center;

    let angle = v1.angle_between(v2) + v2.angle_between(v3);
    let length = v2.length() * angle;
    (angle, length)
}

/// Axis-aligned bounds of a point set, `None` for an empty set.
pub fn axis_aligned_bounds(points: impl IntoIterator<Item = Vec3>) -> Option<BoundingBox> {
    let bbox = BoundingBox::from_points(points);
    bbox.is_valid().then_some(bbox)
}

/// Axis-aligned box, inverted (`min > max`) while empty.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::default(), |bbox, p| Self {
            min: bbox.min.min(p),
            max: bbox.max.max(p),
        })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// The eight corners in a fixed order.
    ///
    /// ```text
    ///     2--------6        corner 0 = (min, min, min)
    ///    /|       /|        corner 6 = (max, max, max)
    ///   1--------5 |
    ///   | 3------|-7        z up, y into the page
    ///   |/       |/
    ///   0--------4
    /// ```
    ///
    /// Dimension edge pairs index into this order.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
        ]
    }

    /// False for a box that never received a point.
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }
}

/// Triangulates a planar polygon, concave outlines included.
///
/// `points` are flattened onto the plane with unit `normal` and handed to
/// earcut. Returns triangles as indices into `points`; a polygon earcut
/// rejects is fanned from its first vertex instead.
pub fn triangulate_polygon(points: &[Vec3], normal: Vec3) -> Vec<[usize; 3]> {
    if points.len() < 3 {
        return Vec::new();
    }
    let u = normal.any_orthonormal_vector();
    let v = normal.cross(u);
    let flat: Vec<f64> = points
        .iter()
        .flat_map(|p| [p.dot(u) as f64, p.dot(v) as f64])
        .collect();

    match earcutr::earcut(&flat, &[], 2) {
        Ok(indices) => indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect(),
        Err(err) => {
            tracing::debug!("Polygon triangulation failed ({:?}), fanning instead", err);
            (1..points.len() - 1).map(|i| [0, i, i + 1]).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_euler_xyz_applies_x_first() {
        let q = euler_xyz(Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        let v = q * Vec3::Y;
        assert_relative_eq!(v.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dominant_axis_ties_default_to_x() {
        assert_eq!(dominant_axis(Vec3::new(1.0, 1.0, 0.0)), 0);
        assert_eq!(dominant_axis(Vec3::new(0.0, -3.0, 1.0)), 1);
        assert_eq!(dominant_axis(Vec3::new(0.0, 0.0, 2.0)), 2);
        assert_eq!(dominant_axis(Vec3::ZERO), 0);
    }

    #[test]
    fn test_sort_points_antisymmetric() {
        let pairs = [
            (Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)),
            (Vec3::new(1.0, -4.0, 2.0), Vec3::new(0.5, 3.0, 2.0)),
            (Vec3::new(1.0, 1.0, 5.0), Vec3::new(1.0, 1.0, -5.0)),
            (Vec3::new(2.0, 2.0, 0.0), Vec3::new(0.0, 0.0, 0.0)),
            (Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)),
        ];
        for (p1, p2) in pairs {
            let forward = sort_points(p1, p2);
            let backward = sort_points(p2, p1);
            assert_eq!(forward, (backward.1, backward.0));
            let axis = dominant_axis(p1 - p2);
            assert!(forward.0[axis] >= forward.1[axis]);
        }
    }

    #[test]
    fn test_sort_points_idempotent() {
        let (a, b) = sort_points(Vec3::ZERO, Vec3::new(0.0, 7.0, 1.0));
        assert_eq!(sort_points(a, b), (a, b));
        assert_eq!(a, Vec3::new(0.0, 7.0, 1.0));
    }

    #[test]
    fn test_circumcenter_equidistant() {
        let triangles = [
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(-1.0, 0.0, 0.0)),
            (Vec3::new(3.0, 1.0, 2.0), Vec3::new(-1.0, 4.0, 0.5), Vec3::new(0.0, -2.0, 1.0)),
            (Vec3::new(0.0, 0.0, 5.0), Vec3::new(2.0, 0.0, 5.0), Vec3::new(0.0, 1.0, 5.0)),
        ];
        for (a, b, c) in triangles {
            let center = circumcenter(a, b, c).unwrap();
            let ra = center.distance(a);
            assert_relative_eq!(ra, center.distance(b), epsilon = 1e-4);
            assert_relative_eq!(ra, center.distance(c), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_circumcenter_collinear() {
        assert!(circumcenter(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }

    #[test]
    fn test_arc_data_half_circle() {
        let (angle, length) = arc_data(Vec3::X, Vec3::ZERO, Vec3::Y, -Vec3::X);
        assert_relative_eq!(angle, PI, epsilon = 1e-5);
        assert_relative_eq!(length, PI, epsilon = 1e-5);
    }

    #[test]
    fn test_rotate_about() {
        let v = rotate_about(Vec3::X, Vec3::Z, FRAC_PI_2);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-6);
        assert_eq!(rotate_about(Vec3::X, Vec3::ZERO, 1.0), Vec3::X);
    }

    #[test]
    fn test_project_onto() {
        let p = project_onto(Vec3::new(3.0, 4.0, 5.0), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(p, Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(project_onto(Vec3::ONE, Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_bounding_box_corners_order() {
        let bbox = BoundingBox::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let c = bbox.corners();
        assert_eq!(c[0], bbox.min);
        assert_eq!(c[6], bbox.max);
        assert_eq!(c[1], Vec3::new(-1.0, -2.0, 3.0));
        assert_eq!(c[7], Vec3::new(1.0, 2.0, -3.0));
    }

    fn l_shape() -> Vec<Vec3> {
        // Starts at a convex corner, so a fan from vertex 0 crosses the notch.
        [(2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0), (0.0, 0.0)]
            .map(|(x, y)| Vec3::new(x, y, 0.0))
            .to_vec()
    }

    fn polygon_area(points: &[Vec3], triangles: &[[usize; 3]]) -> f32 {
        triangles
            .iter()
            .map(|t| triangle_area(points[t[0]], points[t[1]], points[t[2]]))
            .sum()
    }

    #[test]
    fn test_triangulate_concave_polygon() {
        let points = l_shape();
        let triangles = triangulate_polygon(&points, Vec3::Z);
        assert_eq!(triangles.len(), 4);
        assert_relative_eq!(polygon_area(&points, &triangles), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_triangulate_tilted_polygon() {
        let tilt = Quat::from_rotation_x(1.0);
        let points: Vec<Vec3> = l_shape().into_iter().map(|p| tilt * p).collect();
        let triangles = triangulate_polygon(&points, tilt * Vec3::Z);
        assert_relative_eq!(polygon_area(&points, &triangles), 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_triangulate_degenerate_inputs() {
        assert!(triangulate_polygon(&[Vec3::ZERO, Vec3::X], Vec3::Z).is_empty());
        let quad = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        assert_eq!(triangulate_polygon(&quad, Vec3::Z).len(), 2);
    }

    #[test]
    fn test_axis_aligned_bounds_empty() {
        assert!(axis_aligned_bounds(std::iter::empty()).is_none());
        let b = axis_aligned_bounds([Vec3::ONE, -Vec3::ONE]).unwrap();
        assert_eq!(b.center(), Vec3::ZERO);
        assert_eq!(b.size(), Vec3::splat(2.0));
    }
}
