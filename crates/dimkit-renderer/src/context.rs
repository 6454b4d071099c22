//! Per-item drawing context
//!
//! [`DrawContext`] carries what every drawing pass reads (frame, scene,
//! fonts). [`Owner`] names the object an item belongs to together with the
//! transform it is drawn with, which differs from the object's own world
//! transform for instances and custom shapes.

use glam::{Mat4, Quat, Vec3};
use uuid::Uuid;

use dimkit_core::dimension::AnchorRef;
use dimkit_core::error::GeometryError;
use dimkit_core::scene::{Scene, SceneObject};
use dimkit_core::style::Style;
use dimkit_core::text::TextSourceContext;

use crate::frame::FrameContext;
use crate::text_layout::FontRasterizer;

/// Shared state for drawing one item.
pub struct DrawContext<'a> {
    /// Current frame.
    pub frame: &'a FrameContext,
    /// Scene the item lives in.
    pub scene: &'a Scene,
    /// Font service for text fields.
    pub fonts: &'a mut dyn FontRasterizer,
}

impl<'a> DrawContext<'a> {
    /// Bundles the frame, scene and font service.
    pub fn new(
        frame: &'a FrameContext,
        scene: &'a Scene,
        fonts: &'a mut dyn FontRasterizer,
    ) -> Self {
        Self {
            frame,
            scene,
            fonts,
        }
    }

    /// Whether modifier-evaluated geometry should be used for `style`.
    pub fn eval_mods(&self, style: &Style) -> bool {
        style.eval_mods || self.frame.config.eval_mods
    }

    /// World position of an anchor, resolved through `owner`'s transforms.
    pub fn anchor_point(
        &self,
        owner: &Owner,
        anchor: &AnchorRef,
        eval: bool,
    ) -> Result<Vec3, GeometryError> {
        let object = self
            .scene
            .object(anchor.object)
            .ok_or(GeometryError::MissingObject(anchor.object))?;
        let local = object.vertex(anchor.index, anchor.spline, eval)?;
        Ok(owner.anchor_world(object).transform_point3(local))
    }

    /// World position of a vertex on the owner itself.
    pub fn owner_point(
        &self,
        owner: &Owner,
        index: usize,
        eval: bool,
    ) -> Result<Vec3, GeometryError> {
        let local = owner.object.vertex(index, None, eval)?;
        Ok(owner.world.transform_point3(local))
    }
}

/// The object an item is drawn for.
#[derive(Debug, Clone, Copy)]
pub struct Owner<'a> {
    /// Owning object.
    pub object: &'a SceneObject,
    /// Transform the owner is drawn with.
    pub world: Mat4,
    /// Transform replacing the owner's own world transform, if any.
    pub override_transform: Option<Mat4>,
}

impl<'a> Owner<'a> {
    /// Owner drawn at its own world transform.
    pub fn new(object: &'a SceneObject) -> Self {
        Self {
            object,
            world: object.transform,
            override_transform: None,
        }
    }

    /// Owner drawn at `transform` instead (instances, custom shapes).
    pub fn with_override(object: &'a SceneObject, transform: Mat4) -> Self {
        Self {
            object,
            world: transform,
            override_transform: Some(transform),
        }
    }

    /// Owning object id.
    pub fn id(&self) -> Uuid {
        self.object.id
    }

    /// Rotation part of the draw transform.
    pub fn rotation(&self) -> Quat {
        self.world.to_scale_rotation_translation().1
    }

    /// Inputs for text sources on items of this owner.
    pub fn text_sources<'s>(
        &self,
        frame: &'s FrameContext,
        anchor: Option<Vec3>,
        all_caps: bool,
    ) -> TextSourceContext<'s>
    where
        'a: 's,
    {
        let object: &'a SceneObject = self.object;
        TextSourceContext {
            view: frame.view.as_ref(),
            object_name: &object.name,
            object_transform: self.world,
            anchor,
            units: &frame.config.units,
            all_caps,
        }
    }

    /// World transform for an anchor on `anchor_object`.
    ///
    /// Under an override, other objects keep their placement relative to
    /// the owner.
    pub fn anchor_world(&self, anchor_object: &SceneObject) -> Mat4 {
        match self.override_transform {
            Some(transform) if anchor_object.id == self.object.id => transform,
            Some(transform) => {
                transform * self.object.transform.inverse() * anchor_object.transform
            }
            None => anchor_object.transform,
        }
    }
}

/// Result of drawing one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Geometry was emitted.
    Drawn,
    /// The item or its style is hidden in this frame.
    Hidden,
}
