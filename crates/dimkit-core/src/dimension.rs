//! Dimension records and the wrapper table
//!
//! Each object owns a [`DimensionGenerator`] holding one typed list per
//! dimension kind plus a wrapper table giving every dimension a single
//! generic slot. Removing a dimension keeps both in sync.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::BoundingBox;
use crate::style::{EndcapType, StyleBinding, ViewPlane};
use crate::text::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DimensionKind {
    Aligned,
    Bounds,
    Axis,
    Angle,
    Arc,
    Area,
}

/// A vertex (or curve control point) on some scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRef {
    pub object: Uuid,
    pub index: usize,
    /// Spline index for curve objects
    pub spline: Option<usize>,
}

impl AnchorRef {
    pub fn vertex(object: Uuid, index: usize) -> Self {
        Self {
            object,
            index,
            spline: None,
        }
    }
}

/// Handle positions for interactive editing, rewritten every draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GizmoState {
    pub location: Vec3,
    pub rotation_dir: Vec3,
    pub rotation_axis: Vec3,
}

/// Fields shared by every dimension kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionCommon {
    pub name: String,
    pub visible: bool,
    /// Highlight with the active colour when the owner is active
    pub is_active: bool,
    pub binding: StyleBinding,
    pub flip: bool,
    /// Overrides the style's view plane when set
    pub view_plane: Option<ViewPlane>,
    /// Keep the user's text instead of the measured value
    pub use_custom_text: bool,
    pub text_fields: Vec<TextField>,
    #[serde(skip)]
    pub gizmo: GizmoState,
}

impl Default for DimensionCommon {
    fn default() -> Self {
        Self {
            name: String::new(),
            visible: true,
            is_active: true,
            binding: StyleBinding::default(),
            flip: false,
            view_plane: None,
            use_custom_text: false,
            text_fields: Vec::new(),
            gizmo: GizmoState::default(),
        }
    }
}

impl DimensionCommon {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Makes sure at least `count` text fields exist.
    pub fn ensure_text_fields(&mut self, count: usize) {
        while self.text_fields.len() < count {
            self.text_fields.push(TextField::default());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedDimension {
    pub common: DimensionCommon,
    pub anchor_a: AnchorRef,
    pub anchor_b: AnchorRef,
}

/// Cached axis-aligned bounds of one object and the transform they were
/// computed under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AabbCacheEntry {
    pub rotation: Quat,
    pub location: Vec3,
    pub scale: Vec3,
    pub bounds: BoundingBox,
}

impl AabbCacheEntry {
    /// True when the entry was computed under this exact transform.
    pub fn matches(&self, rotation: Quat, location: Vec3, scale: Vec3) -> bool {
        self.rotation == rotation && self.location == location && self.scale == scale
    }
}

/// Vertex-derived bounds kept between frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundsCache {
    /// Entry for a single rotated object
    pub single: Option<AabbCacheEntry>,
    /// Entries for each object of a collection
    pub per_object: HashMap<Uuid, AabbCacheEntry>,
}

impl BoundsCache {
    pub fn is_empty(&self) -> bool {
        self.single.is_none() && self.per_object.is_empty()
    }

    pub fn clear(&mut self) {
        self.single = None;
        self.per_object.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsDimension {
    pub common: DimensionCommon,
    /// Measure these objects together instead of the owner
    pub collection: Option<Vec<Uuid>>,
    /// Measure world-axis-aligned bounds of rotated objects
    pub calc_axis_aligned: bool,
    /// Which of X, Y, Z to dimension
    pub draw_axis: [bool; 3],
    #[serde(skip)]
    pub cache: BoundsCache,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureAxis {
    #[default]
    X,
    Y,
    Z,
}

impl MeasureAxis {
    pub fn unit(self) -> Vec3 {
        match self {
            MeasureAxis::X => Vec3::X,
            MeasureAxis::Y => Vec3::Y,
            MeasureAxis::Z => Vec3::Z,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDimension {
    pub common: DimensionCommon,
    pub anchor_a: AnchorRef,
    pub anchor_b: AnchorRef,
    pub axis: MeasureAxis,
    /// Rotate the measuring axis by this object's rotation
    pub axis_object: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleDimension {
    pub common: DimensionCommon,
    /// Ray end, vertex, ray end (vertex indices on the owner)
    pub points: [usize; 3],
    pub radius: f32,
    pub reflex: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcDimension {
    pub common: DimensionCommon,
    /// Start, middle, end of the arc (vertex indices on the owner)
    pub points: [usize; 3],
    pub show_radius: bool,
    /// Label the arc with its sweep angle instead of its length
    pub display_as_angle: bool,
    /// Endcap at the end of the radius leader
    pub endcap_c: EndcapType,
    #[serde(skip)]
    pub center: Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDimension {
    pub common: DimensionCommon,
    /// Faces summed into the area (owner face indices)
    pub faces: Vec<usize>,
    /// Perimeter edges drawn around the area (owner edge indices)
    pub perimeter_edges: Vec<usize>,
    /// Face the label is centred on
    pub origin_face: usize,
    /// Label offset from the origin face centre
    pub text_offset: Vec3,
    pub fill_color: [f32; 4],
    pub fill_alpha: f32,
}

/// Generic slot for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimWrapper {
    pub kind: DimensionKind,
    /// Index into the typed list for `kind`
    pub item_index: usize,
}

/// Everything a [`PruneRequest`] can remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PruneTarget {
    Dimension { kind: DimensionKind, item_index: usize },
    Annotation { index: usize },
}

/// Removal collected during traversal and applied afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PruneRequest {
    pub object: Uuid,
    pub target: PruneTarget,
}

/// All dimensions owned by one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionGenerator {
    pub aligned: Vec<AlignedDimension>,
    pub bounds: Vec<BoundsDimension>,
    pub axis: Vec<AxisDimension>,
    pub angle: Vec<AngleDimension>,
    pub arc: Vec<ArcDimension>,
    pub area: Vec<AreaDimension>,
    pub wrappers: Vec<DimWrapper>,
}

impl DimensionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dimensions of every kind.
    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    fn push_wrapper(&mut self, kind: DimensionKind, item_index: usize) -> usize {
        self.wrappers.push(DimWrapper { kind, item_index });
        self.wrappers.len() - 1
    }

    /// Adds an aligned dimension, returning its wrapper slot.
    pub fn add_aligned(&mut self, dim: AlignedDimension) -> usize {
        self.aligned.push(dim);
        self.push_wrapper(DimensionKind::Aligned, self.aligned.len() - 1)
    }

    pub fn add_bounds(&mut self, dim: BoundsDimension) -> usize {
        self.bounds.push(dim);
        self.push_wrapper(DimensionKind::Bounds, self.bounds.len() - 1)
    }

    pub fn add_axis(&mut self, dim: AxisDimension) -> usize {
        self.axis.push(dim);
        self.push_wrapper(DimensionKind::Axis, self.axis.len() - 1)
    }

    pub fn add_angle(&mut self, dim: AngleDimension) -> usize {
        self.angle.push(dim);
        self.push_wrapper(DimensionKind::Angle, self.angle.len() - 1)
    }

    pub fn add_arc(&mut self, dim: ArcDimension) -> usize {
        self.arc.push(dim);
        self.push_wrapper(DimensionKind::Arc, self.arc.len() - 1)
    }

    pub fn add_area(&mut self, dim: AreaDimension) -> usize {
        self.area.push(dim);
        self.push_wrapper(DimensionKind::Area, self.area.len() - 1)
    }

    /// Length of the typed list for `kind`.
    pub fn count(&self, kind: DimensionKind) -> usize {
        match kind {
            DimensionKind::Aligned => self.aligned.len(),
            DimensionKind::Bounds => self.bounds.len(),
            DimensionKind::Axis => self.axis.len(),
            DimensionKind::Angle => self.angle.len(),
            DimensionKind::Arc => self.arc.len(),
            DimensionKind::Area => self.area.len(),
        }
    }

    /// Wrapper slot of a typed item.
    pub fn wrapper_of(&self, kind: DimensionKind, item_index: usize) -> Option<usize> {
        self.wrappers
            .iter()
            .position(|w| w.kind == kind && w.item_index == item_index)
    }

    /// Removes a typed item and renumbers every later wrapper of its kind.
    ///
    /// Returns false when no such item exists.
    pub fn remove(&mut self, kind: DimensionKind, item_index: usize) -> bool {
        if item_index >= self.count(kind) {
            return false;
        }
        match kind {
            DimensionKind::Aligned => {
                self.aligned.remove(item_index);
            }
            DimensionKind::Bounds => {
                self.bounds.remove(item_index);
            }
            DimensionKind::Axis => {
                self.axis.remove(item_index);
            }
            DimensionKind::Angle => {
                self.angle.remove(item_index);
            }
            DimensionKind::Arc => {
                self.arc.remove(item_index);
            }
            DimensionKind::Area => {
                self.area.remove(item_index);
            }
        }

        if let Some(slot) = self.wrapper_of(kind, item_index) {
            self.wrappers.remove(slot);
        }
        for wrapper in &mut self.wrappers {
            if wrapper.kind == kind && wrapper.item_index > item_index {
                wrapper.item_index -= 1;
            }
        }
        true
    }

    /// Removes the dimension in a wrapper slot.
    pub fn remove_slot(&mut self, slot: usize) -> bool {
        match self.wrappers.get(slot).copied() {
            Some(wrapper) => self.remove(wrapper.kind, wrapper.item_index),
            None => false,
        }
    }

    /// Applies several removals, highest index first so earlier indices
    /// stay valid.
    pub fn remove_many(&mut self, mut targets: Vec<(DimensionKind, usize)>) -> usize {
        targets.sort_unstable();
        targets.dedup();
        targets
            .into_iter()
            .rev()
            .filter(|&(kind, index)| self.remove(kind, index))
            .count()
    }

    /// Drops every cached bounds entry.
    pub fn clear_caches(&mut self) {
        for dim in &mut self.bounds {
            dim.cache.clear();
        }
        for dim in &mut self.arc {
            dim.center = None;
        }
    }

    /// Flags every text field for re-rasterization.
    pub fn mark_text_dirty(&mut self) {
        let commons = self
            .aligned
            .iter_mut()
            .map(|d| &mut d.common)
            .chain(self.bounds.iter_mut().map(|d| &mut d.common))
            .chain(self.axis.iter_mut().map(|d| &mut d.common))
            .chain(self.angle.iter_mut().map(|d| &mut d.common))
            .chain(self.arc.iter_mut().map(|d| &mut d.common))
            .chain(self.area.iter_mut().map(|d| &mut d.common));
        for common in commons {
            common.text_fields.iter_mut().for_each(TextField::mark_dirty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned(name: &str) -> AlignedDimension {
        let id = Uuid::new_v4();
        AlignedDimension {
            common: DimensionCommon::named(name),
            anchor_a: AnchorRef::vertex(id, 0),
            anchor_b: AnchorRef::vertex(id, 1),
        }
    }

    fn angle(name: &str) -> AngleDimension {
        AngleDimension {
            common: DimensionCommon::named(name),
            points: [0, 1, 2],
            radius: 1.0,
            reflex: false,
        }
    }

    #[test]
    fn test_add_builds_wrappers() {
        let mut generator = DimensionGenerator::new();
        assert_eq!(generator.add_aligned(aligned("a0")), 0);
        assert_eq!(generator.add_angle(angle("g0")), 1);
        assert_eq!(generator.add_aligned(aligned("a1")), 2);
        assert_eq!(generator.len(), 3);
        assert_eq!(
            generator.wrappers[2],
            DimWrapper {
                kind: DimensionKind::Aligned,
                item_index: 1
            }
        );
    }

    #[test]
    fn test_remove_renumbers_same_kind_only() {
        let mut generator = DimensionGenerator::new();
        generator.add_aligned(aligned("a0"));
        generator.add_angle(angle("g0"));
        generator.add_aligned(aligned("a1"));
        generator.add_angle(angle("g1"));
        generator.add_aligned(aligned("a2"));

        assert!(generator.remove(DimensionKind::Aligned, 0));
        assert_eq!(generator.len(), 4);
        assert_eq!(generator.aligned[0].common.name, "a1");
        let kinds: Vec<(DimensionKind, usize)> = generator
            .wrappers
            .iter()
            .map(|w| (w.kind, w.item_index))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (DimensionKind::Angle, 0),
                (DimensionKind::Aligned, 0),
                (DimensionKind::Angle, 1),
                (DimensionKind::Aligned, 1),
            ]
        );
    }

    #[test]
    fn test_remove_many_descending() {
        let mut generator = DimensionGenerator::new();
        for i in 0..4 {
            generator.add_aligned(aligned(&format!("a{i}")));
        }
        let removed = generator.remove_many(vec![
            (DimensionKind::Aligned, 1),
            (DimensionKind::Aligned, 3),
            (DimensionKind::Aligned, 1),
        ]);
        assert_eq!(removed, 2);
        let names: Vec<&str> = generator
            .aligned
            .iter()
            .map(|d| d.common.name.as_str())
            .collect();
        assert_eq!(names, vec!["a0", "a2"]);
        assert_eq!(generator.wrapper_of(DimensionKind::Aligned, 1), Some(1));
    }

    #[test]
    fn test_remove_missing() {
        let mut generator = DimensionGenerator::new();
        assert!(!generator.remove(DimensionKind::Arc, 0));
        assert!(!generator.remove_slot(3));
    }
}
