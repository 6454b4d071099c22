//! Mesh topology and the geometry provider contract
//!
//! A [`Mesh`] is polygon soup plus an explicit edge list. Everything the
//! drawing algorithms need from topology (edge/face adjacency, face
//! normals, fan tessellation) is derived here on demand.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GeometryError;
use crate::geometry::{normalize_or, triangle_area, triangulate_polygon};

/// A polygon referencing mesh vertices by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Vertex indices in winding order
    pub vertices: Vec<u32>,
    /// Material slot index
    #[serde(default)]
    pub material_index: usize,
}

impl Face {
    pub fn new(vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            material_index: 0,
        }
    }

    pub fn with_material(mut self, material_index: usize) -> Self {
        self.material_index = material_index;
        self
    }
}

/// Polygon mesh with explicit edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub edges: Vec<[u32; 2]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh from vertices and faces, deriving the edge list from
    /// face boundaries in first-seen order.
    pub fn from_faces(vertices: Vec<Vec3>, faces: Vec<Face>) -> Self {
        let mut edges: Vec<[u32; 2]> = Vec::new();
        for face in &faces {
            let n = face.vertices.len();
            for i in 0..n {
                let a = face.vertices[i];
                let b = face.vertices[(i + 1) % n];
                let key = [a.min(b), a.max(b)];
                if !edges.contains(&key) {
                    edges.push(key);
                }
            }
        }
        Self {
            vertices,
            faces,
            edges,
        }
    }

    /// Vertex position by index.
    pub fn vertex(&self, index: usize) -> Result<Vec3, GeometryError> {
        self.vertices
            .get(index)
            .copied()
            .ok_or(GeometryError::IndexOutOfRange {
                index,
                len: self.vertices.len(),
            })
    }

    /// Vertex position by index, origin for indices out of range.
    pub fn vertex_or_origin(&self, index: usize) -> Vec3 {
        self.vertices.get(index).copied().unwrap_or(Vec3::ZERO)
    }

    fn face_points(&self, face: &Face) -> impl Iterator<Item = Vec3> {
        face.vertices
            .iter()
            .map(|&i| self.vertex_or_origin(i as usize))
    }

    /// Unit normal of a face (Newell's method), `+Z` when degenerate.
    pub fn face_normal(&self, face_index: usize) -> Vec3 {
        let Some(face) = self.faces.get(face_index) else {
            return Vec3::Z;
        };
        let points: Vec<Vec3> = self.face_points(face).collect();
        let mut normal = Vec3::ZERO;
        for (i, current) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        normalize_or(normal, Vec3::Z)
    }

    /// Mean of a face's vertex positions.
    pub fn face_center_median(&self, face_index: usize) -> Vec3 {
        let Some(face) = self.faces.get(face_index) else {
            return Vec3::ZERO;
        };
        if face.vertices.is_empty() {
            return Vec3::ZERO;
        }
        self.face_points(face).sum::<Vec3>() / face.vertices.len() as f32
    }

    /// Centre of a face's bounding box.
    pub fn face_center_bounds(&self, face_index: usize) -> Vec3 {
        let Some(face) = self.faces.get(face_index) else {
            return Vec3::ZERO;
        };
        let bbox = crate::geometry::BoundingBox::from_points(self.face_points(face));
        if bbox.is_valid() { bbox.center() } else { Vec3::ZERO }
    }

    /// Tessellates a face into vertex-index triangles.
    ///
    /// Faces above three vertices are triangulated in their own plane, so
    /// concave outlines stay inside the face.
    pub fn triangulate_face(&self, face_index: usize) -> Vec<[u32; 3]> {
        let Some(face) = self.faces.get(face_index) else {
            return Vec::new();
        };
        let v = &face.vertices;
        match v.len() {
            0..=2 => Vec::new(),
            3 => vec![[v[0], v[1], v[2]]],
            _ => {
                let points: Vec<Vec3> = self.face_points(face).collect();
                triangulate_polygon(&points, self.face_normal(face_index))
                    .into_iter()
                    .map(|t| t.map(|i| v[i]))
                    .collect()
            }
        }
    }

    /// Tessellation of every face.
    pub fn tessellated_triangles(&self) -> Vec<[u32; 3]> {
        (0..self.faces.len())
            .flat_map(|i| self.triangulate_face(i))
            .collect()
    }

    /// Surface area of a face.
    pub fn face_area(&self, face_index: usize) -> f32 {
        self.triangulate_face(face_index)
            .iter()
            .map(|t| {
                triangle_area(
                    self.vertex_or_origin(t[0] as usize),
                    self.vertex_or_origin(t[1] as usize),
                    self.vertex_or_origin(t[2] as usize),
                )
            })
            .sum()
    }

    /// Direction of a face's longest boundary edge.
    pub fn face_longest_edge(&self, face_index: usize) -> Vec3 {
        let Some(face) = self.faces.get(face_index) else {
            return Vec3::X;
        };
        let points: Vec<Vec3> = self.face_points(face).collect();
        let mut best = Vec3::ZERO;
        for (i, a) in points.iter().enumerate() {
            let edge = points[(i + 1) % points.len()] - *a;
            if edge.length_squared() > best.length_squared() {
                best = edge;
            }
        }
        normalize_or(best, Vec3::X)
    }

    /// Faces bordering each edge, indexed like [`Mesh::edges`].
    pub fn edge_faces(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.edges.len()];
        for (face_index, face) in self.faces.iter().enumerate() {
            let n = face.vertices.len();
            for i in 0..n {
                let a = face.vertices[i];
                let b = face.vertices[(i + 1) % n];
                if let Some(edge_index) = self.find_edge(a, b) {
                    adjacency[edge_index].push(face_index);
                }
            }
        }
        adjacency
    }

    /// Index of the edge joining two vertices, in either direction.
    pub fn find_edge(&self, a: u32, b: u32) -> Option<usize> {
        self.edges
            .iter()
            .position(|e| (e[0] == a && e[1] == b) || (e[0] == b && e[1] == a))
    }

    /// Normals of every face bordering the edge between two vertices.
    pub fn faces_around_edge(&self, a: u32, b: u32) -> Vec<Vec3> {
        let Some(edge_index) = self.find_edge(a, b) else {
            return Vec::new();
        };
        self.edge_faces()
            .swap_remove(edge_index)
            .into_iter()
            .map(|f| self.face_normal(f))
            .collect()
    }
}

/// Kinds of modifier a host object may carry.
///
/// Only stacks made entirely of allow-listed kinds may use evaluated mesh
/// data; see [`modifiers_allow_evaluation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    DataTransfer,
    NormalEdit,
    WeightedNormal,
    UvProject,
    UvWarp,
    Array,
    EdgeSplit,
    Mask,
    Mirror,
    Multires,
    Screw,
    Solidify,
    Subsurf,
    Triangulate,
    Armature,
    Cast,
    Curve,
    Displace,
    Hook,
    LaplacianDeform,
    Lattice,
    MeshDeform,
    Shrinkwrap,
    SimpleDeform,
    Smooth,
    CorrectiveSmooth,
    LaplacianSmooth,
    SurfaceDeform,
    Warp,
    Wave,
    Cloth,
    Collision,
    DynamicPaint,
    ParticleInstance,
    ParticleSystem,
    Smoke,
    SoftBody,
    Surface,
    Bevel,
    Boolean,
    Decimate,
    Remesh,
    Weld,
    Other(String),
}

impl ModifierKind {
    /// Whether this modifier keeps vertex indices usable for anchoring.
    pub fn is_evaluation_safe(&self) -> bool {
        !matches!(
            self,
            ModifierKind::Bevel
                | ModifierKind::Boolean
                | ModifierKind::Decimate
                | ModifierKind::Remesh
                | ModifierKind::Weld
                | ModifierKind::Other(_)
        )
    }
}

/// True when every modifier in the stack is allow-listed.
pub fn modifiers_allow_evaluation(modifiers: &[ModifierKind]) -> bool {
    modifiers.iter().all(ModifierKind::is_evaluation_safe)
}

/// Read access to host geometry.
///
/// Drawing code resolves every anchor through this trait so hosts can
/// back it with their own mesh storage.
pub trait GeometryProvider {
    /// Local-space position of a vertex (or curve control point when
    /// `spline` is set).
    fn vertex_position(
        &self,
        object: Uuid,
        index: usize,
        spline: Option<usize>,
        eval_modifiers: bool,
    ) -> Result<Vec3, GeometryError>;

    /// Triangles covering every face of the object's mesh.
    fn tessellated_triangles(&self, object: Uuid) -> Result<Vec<[u32; 3]>, GeometryError>;

    /// Mesh to read topology from, evaluated when the modifier stack allows it.
    fn evaluated_mesh(&self, object: Uuid, eval_modifiers: bool) -> Result<&Mesh, GeometryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Mesh {
        Mesh::from_faces(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![Face::new(vec![0, 1, 2, 3])],
        )
    }

    #[test]
    fn test_from_faces_derives_edges() {
        let mesh = quad();
        assert_eq!(mesh.edges, vec![[0, 1], [1, 2], [2, 3], [0, 3]]);
    }

    #[test]
    fn test_vertex_out_of_range() {
        let mesh = quad();
        assert_eq!(
            mesh.vertex(9),
            Err(GeometryError::IndexOutOfRange { index: 9, len: 4 })
        );
        assert_eq!(mesh.vertex_or_origin(9), Vec3::ZERO);
    }

    #[test]
    fn test_face_normal_and_area() {
        let mesh = quad();
        assert_relative_eq!(mesh.face_normal(0).z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.face_area(0), 2.0, epsilon = 1e-6);
        let triangles = mesh.triangulate_face(0);
        assert_eq!(triangles.len(), 2);
        assert!(triangles.iter().flatten().all(|&i| i < 4));
    }

    #[test]
    fn test_face_longest_edge() {
        let mesh = quad();
        assert_relative_eq!(mesh.face_longest_edge(0).x.abs(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_edge_faces_shared_edge() {
        let mesh = Mesh::from_faces(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![Face::new(vec![0, 1, 2]), Face::new(vec![0, 2, 3])],
        );
        let adjacency = mesh.edge_faces();
        let shared = mesh.find_edge(2, 0).unwrap();
        assert_eq!(adjacency[shared], vec![0, 1]);
        assert_eq!(mesh.faces_around_edge(0, 2).len(), 2);
        assert_eq!(mesh.faces_around_edge(0, 1).len(), 1);
    }

    #[test]
    fn test_modifier_allow_list() {
        assert!(modifiers_allow_evaluation(&[]));
        assert!(modifiers_allow_evaluation(&[
            ModifierKind::Mirror,
            ModifierKind::Subsurf
        ]));
        assert!(!modifiers_allow_evaluation(&[
            ModifierKind::Mirror,
            ModifierKind::Boolean
        ]));
        assert!(!modifiers_allow_evaluation(&[ModifierKind::Other(
            "NODES".into()
        )]));
    }
}
