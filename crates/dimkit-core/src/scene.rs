//! Scene objects and the in-memory scene
//!
//! [`Scene`] is the reference [`GeometryProvider`]: hosts with their own
//! storage can mirror objects into it each frame or implement the trait
//! directly.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::annotation::AnnotationGenerator;
use crate::dimension::{AnchorRef, DimensionGenerator, PruneRequest, PruneTarget};
use crate::error::GeometryError;
use crate::geometry::BoundingBox;
use crate::linework::LineGenerator;
use crate::mesh::{GeometryProvider, Mesh, ModifierKind, modifiers_allow_evaluation};
use crate::style::StyleLibrary;
use crate::view::View;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    #[default]
    Mesh,
    Curve,
    Empty,
}

/// Host interaction mode of an object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    Object,
    Edit,
    WeightPaint,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectVisibility {
    pub visible: bool,
    /// Hidden in the viewport
    pub hidden: bool,
    /// Excluded from render-to-image
    pub hide_render: bool,
}

impl Default for ObjectVisibility {
    fn default() -> Self {
        Self {
            visible: true,
            hidden: false,
            hide_render: false,
        }
    }
}

/// Vector-export fill for faces of one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hatch {
    pub visible: bool,
    pub fill_color: [f32; 4],
    pub line_color: [f32; 4],
    pub line_weight: f32,
    /// Pattern identifier declared on the drawing surface
    pub pattern: Option<String>,
    pub pattern_size: f32,
    pub pattern_rotation: f32,
    pub pattern_opacity: f32,
}

impl Default for Hatch {
    fn default() -> Self {
        Self {
            visible: true,
            fill_color: [1.0, 1.0, 1.0, 1.0],
            line_color: [0.0, 0.0, 0.0, 1.0],
            line_weight: 1.0,
            pattern: None,
            pattern_size: 1.0,
            pattern_rotation: 0.0,
            pattern_opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub hatch: Option<Hatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneObject {
    pub id: Uuid,
    pub name: String,
    pub kind: ObjectKind,
    /// World transform
    pub transform: Mat4,
    pub mode: InteractionMode,
    pub visibility: ObjectVisibility,
    pub mesh: Option<Mesh>,
    /// Mesh after the modifier stack, supplied by the host
    pub evaluated_mesh: Option<Mesh>,
    pub modifiers: Vec<ModifierKind>,
    /// Control points per spline for curve objects
    pub splines: Vec<Vec<Vec3>>,
    /// Local bounds overriding the mesh-derived box
    pub local_bounds: Option<BoundingBox>,
    pub materials: Vec<Material>,
    /// Dimension axis supplied by a CAD plugin, overrides normal selection
    pub dimension_axis: Option<Vec3>,
    pub dimensions: DimensionGenerator,
    pub annotations: AnnotationGenerator,
    pub line_groups: LineGenerator,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            kind: ObjectKind::Mesh,
            transform: Mat4::IDENTITY,
            mode: InteractionMode::Object,
            visibility: ObjectVisibility::default(),
            mesh: None,
            evaluated_mesh: None,
            modifiers: Vec::new(),
            splines: Vec::new(),
            local_bounds: None,
            materials: Vec::new(),
            dimension_axis: None,
            dimensions: DimensionGenerator::default(),
            annotations: AnnotationGenerator::default(),
            line_groups: LineGenerator::default(),
        }
    }
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn location(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    pub fn rotation(&self) -> Quat {
        self.transform.to_scale_rotation_translation().1
    }

    /// Mesh to read from: the edit mesh in edit mode, the evaluated mesh
    /// when requested and the modifier stack allows it, else the base mesh.
    pub fn mesh_for(&self, eval_modifiers: bool) -> Option<&Mesh> {
        if self.mode != InteractionMode::Edit
            && eval_modifiers
            && modifiers_allow_evaluation(&self.modifiers)
            && let Some(evaluated) = &self.evaluated_mesh
        {
            return Some(evaluated);
        }
        self.mesh.as_ref()
    }

    /// Local position of a vertex or spline control point.
    pub fn vertex(
        &self,
        index: usize,
        spline: Option<usize>,
        eval_modifiers: bool,
    ) -> Result<Vec3, GeometryError> {
        match self.kind {
            ObjectKind::Mesh => self
                .mesh_for(eval_modifiers)
                .ok_or(GeometryError::NoMeshData)?
                .vertex(index),
            ObjectKind::Curve => {
                let spline_index = spline.unwrap_or(0);
                let points =
                    self.splines
                        .get(spline_index)
                        .ok_or(GeometryError::SplineOutOfRange {
                            index: spline_index,
                            len: self.splines.len(),
                        })?;
                points
                    .get(index)
                    .copied()
                    .ok_or(GeometryError::IndexOutOfRange {
                        index,
                        len: points.len(),
                    })
            }
            ObjectKind::Empty => Err(GeometryError::NoMeshData),
        }
    }

    /// Local bounding box as stored on the object, or derived from its
    /// geometry. Empty objects have a zero-size box at the origin.
    pub fn raw_bounds(&self) -> BoundingBox {
        if let Some(bounds) = self.local_bounds {
            return bounds;
        }
        let points: Vec<Vec3> = match self.kind {
            ObjectKind::Mesh => self
                .mesh
                .as_ref()
                .map(|m| m.vertices.clone())
                .unwrap_or_default(),
            ObjectKind::Curve => self.splines.iter().flatten().copied().collect(),
            ObjectKind::Empty => Vec::new(),
        };
        crate::geometry::axis_aligned_bounds(points)
            .unwrap_or_else(|| BoundingBox::new(Vec3::ZERO, Vec3::ZERO))
    }

    /// Visible in the current frame.
    pub fn is_drawable(&self, render: bool) -> bool {
        if !self.visibility.visible {
            return false;
        }
        if render {
            !self.visibility.hide_render
        } else {
            !self.visibility.hidden
        }
    }
}

/// Instanced copy of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub object: Uuid,
    /// World transform of the instance
    pub transform: Mat4,
    /// Object the instance was spawned by
    pub parent: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub instances: Vec<Instance>,
    pub styles: StyleLibrary,
    pub views: Vec<View>,
    pub active_view: Option<usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, object: SceneObject) -> Uuid {
        let id = object.id;
        tracing::debug!("Scene::add_object '{}' ({})", object.name, id);
        self.objects.push(object);
        id
    }

    pub fn object(&self, id: Uuid) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: Uuid) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn object_index(&self, id: Uuid) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn active_view(&self) -> Option<&View> {
        self.active_view.and_then(|i| self.views.get(i))
    }

    /// Local position of an anchor.
    pub fn anchor_position(&self, anchor: &AnchorRef, eval: bool) -> Result<Vec3, GeometryError> {
        self.vertex_position(anchor.object, anchor.index, anchor.spline, eval)
    }

    /// Applies removals collected during a draw pass.
    ///
    /// Returns how many items were removed.
    pub fn apply_prunes(&mut self, requests: &[PruneRequest]) -> usize {
        let mut removed = 0;
        for object in &mut self.objects {
            let mut dims = Vec::new();
            let mut annotations = Vec::new();
            for request in requests.iter().filter(|r| r.object == object.id) {
                match request.target {
                    PruneTarget::Dimension { kind, item_index } => dims.push((kind, item_index)),
                    PruneTarget::Annotation { index } => annotations.push(index),
                }
            }
            if !dims.is_empty() {
                removed += object.dimensions.remove_many(dims);
            }
            if !annotations.is_empty() {
                removed += object.annotations.remove_many(annotations);
            }
        }
        if removed > 0 {
            tracing::info!("Pruned {} items with stale references", removed);
        }
        removed
    }
}

impl GeometryProvider for Scene {
    fn vertex_position(
        &self,
        object: Uuid,
        index: usize,
        spline: Option<usize>,
        eval_modifiers: bool,
    ) -> Result<Vec3, GeometryError> {
        self.object(object)
            .ok_or(GeometryError::MissingObject(object))?
            .vertex(index, spline, eval_modifiers)
    }

    fn tessellated_triangles(&self, object: Uuid) -> Result<Vec<[u32; 3]>, GeometryError> {
        let object = self
            .object(object)
            .ok_or(GeometryError::MissingObject(object))?;
        let mesh = object.mesh.as_ref().ok_or(GeometryError::NoMeshData)?;
        Ok(mesh.tessellated_triangles())
    }

    fn evaluated_mesh(&self, object: Uuid, eval_modifiers: bool) -> Result<&Mesh, GeometryError> {
        self.object(object)
            .ok_or(GeometryError::MissingObject(object))?
            .mesh_for(eval_modifiers)
            .ok_or(GeometryError::NoMeshData)
    }
}
