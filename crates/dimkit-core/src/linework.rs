//! Line groups: styled edge sets drawn over an object
//!
//! A group either lists its vertex pairs explicitly or derives them from
//! mesh topology each time its cache is invalidated.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CREASE_ANGLE;
use crate::scene::InteractionMode;
use crate::style::StyleBinding;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Stable identifier for a group's backend batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchHandle(pub u64);

impl BatchHandle {
    /// Allocates a handle unique within this process.
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for BatchHandle {
    fn default() -> Self {
        Self::next()
    }
}

/// Where a group's segments come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineSource {
    /// Flat list of vertex indices, consumed pairwise (or as a strip in chain mode)
    Explicit(Vec<usize>),
    /// Crease and silhouette edges derived from the mesh
    Dynamic {
        /// Dihedral angle above which an edge is a crease, radians
        crease_angle: f32,
        silhouette: bool,
    },
}

impl Default for LineSource {
    fn default() -> Self {
        LineSource::Dynamic {
            crease_angle: DEFAULT_CREASE_ANGLE,
            silhouette: true,
        }
    }
}

/// Object-space coordinates from the last extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineworkCache {
    pub coords: Option<Vec<Vec3>>,
    /// Bumped on every rebuild so backends can drop stale batches
    pub generation: u64,
    /// Global batch epoch the coordinates were built under
    pub epoch: u64,
}

impl LineworkCache {
    /// Stores fresh coordinates under `epoch`.
    pub fn store(&mut self, coords: Vec<Vec3>, epoch: u64) {
        self.coords = Some(coords);
        self.generation += 1;
        self.epoch = epoch;
    }

    pub fn invalidate(&mut self) {
        self.coords = None;
    }

    /// Cached coordinates, if still valid for `epoch`.
    pub fn get(&self, epoch: u64) -> Option<&[Vec3]> {
        if self.epoch != epoch {
            return None;
        }
        self.coords.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineGroup {
    pub name: String,
    pub visible: bool,
    pub binding: StyleBinding,
    pub source: LineSource,
    /// Draw as a connected strip instead of separate segments
    pub chain: bool,
    /// Extension past each segment end, in pixels
    pub line_over_extension: f32,
    #[serde(skip)]
    pub handle: BatchHandle,
    #[serde(skip)]
    pub cache: LineworkCache,
}

impl Default for LineGroup {
    fn default() -> Self {
        Self {
            name: String::new(),
            visible: true,
            binding: StyleBinding::default(),
            source: LineSource::default(),
            chain: false,
            line_over_extension: 0.0,
            handle: BatchHandle::next(),
            cache: LineworkCache::default(),
        }
    }
}

impl LineGroup {
    pub fn new(name: impl Into<String>, source: LineSource) -> Self {
        Self {
            name: name.into(),
            source,
            ..Self::default()
        }
    }
}

/// All line groups owned by one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineGenerator {
    pub groups: Vec<LineGroup>,
    /// Owner interaction mode seen by the last draw
    #[serde(skip)]
    pub last_mode: Option<InteractionMode>,
}

impl LineGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, group: LineGroup) -> usize {
        self.groups.push(group);
        self.groups.len() - 1
    }

    pub fn invalidate(&mut self) {
        for group in &mut self.groups {
            group.cache.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let a = LineGroup::default();
        let b = LineGroup::default();
        assert_ne!(a.handle, b.handle);
    }

    #[test]
    fn test_cache_epoch_and_generation() {
        let mut cache = LineworkCache::default();
        assert!(cache.get(0).is_none());
        cache.store(vec![Vec3::ZERO, Vec3::X], 3);
        assert_eq!(cache.generation, 1);
        assert_eq!(cache.get(3).map(|c| c.len()), Some(2));
        assert!(cache.get(4).is_none());
        cache.invalidate();
        assert!(cache.get(3).is_none());
    }
}
