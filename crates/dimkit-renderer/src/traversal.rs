//! Scene traversal
//!
//! [`Engine::draw_frame`] is the per-frame entry point. It walks the scene
//! objects and then the instance list, drawing for each one its material
//! hatches (vector frames), line groups, annotations and dimensions, in
//! that order. Annotation custom shapes are drawn after their owner with an
//! override transform.
//!
//! Items whose anchors no longer resolve are not removed while the scene is
//! being walked. Their removals are collected and applied once the frame is
//! complete.

use std::time::Instant;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use dimkit_core::config::EngineConfig;
use dimkit_core::dimension::{DimensionGenerator, DimensionKind, PruneRequest, PruneTarget};
use dimkit_core::error::GeometryError;
use dimkit_core::scene::{ObjectKind, Scene};

use crate::annotation::{CustomShapeDraw, draw_annotation};
use crate::batch::RenderBackend;
use crate::camera::Camera;
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::dimensions::{draw_aligned, draw_angle, draw_arc, draw_area, draw_axis, draw_bounds};
use crate::emit::Output;
use crate::frame::{FrameContext, FrameMode};
use crate::hatch::draw_material_hatches;
use crate::linework::draw_line_groups;
use crate::surface::DrawingSurface;
use crate::text_layout::FontRasterizer;
use crate::zorder::{object_depth, z_order};

/// Nesting limit for custom shapes drawing custom shapes.
const MAX_SHAPE_DEPTH: usize = 8;

/// Counters for one drawn frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Scene objects visited.
    pub objects_drawn: usize,
    /// Instances visited.
    pub instances_drawn: usize,
    /// Custom shape objects visited.
    pub shapes_drawn: usize,
    /// Line groups, annotations and dimensions that emitted geometry.
    pub items_drawn: usize,
    /// Items removed for stale references.
    pub pruned: usize,
}

/// Which generators are drawn for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// A scene object at its own transform.
    Object,
    /// An instance; dimensions only when instanced dimensions are enabled.
    Instance,
    /// An object redrawn as part of an annotation's custom shape.
    Shape,
}

/// Mutable state threaded through one frame.
struct FrameState<'f, 'o> {
    frame: &'f FrameContext,
    out: Output<'o>,
    fonts: &'f mut dyn FontRasterizer,
    prunes: Vec<PruneRequest>,
    report: FrameReport,
}

/// Owns configuration and the global batch epoch.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    /// Configuration copied into every frame.
    pub config: EngineConfig,
    epoch: u64,
}

impl Engine {
    /// Engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config, epoch: 0 }
    }

    /// Current batch epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Invalidates every cached backend batch.
    pub fn clear_batches(&mut self) {
        self.epoch += 1;
        tracing::debug!("Batch epoch advanced to {}", self.epoch);
    }

    /// Drops every geometry cache in `scene` and every backend batch, and
    /// flags all text for re-rasterization.
    ///
    /// Call after style or global toggle changes.
    pub fn invalidate(&mut self, scene: &mut Scene) {
        for object in &mut scene.objects {
            object.dimensions.clear_caches();
            object.dimensions.mark_text_dirty();
            object.annotations.mark_text_dirty();
            object.line_groups.invalidate();
        }
        self.clear_batches();
    }

    /// Frame context for `camera`, using the scene's active view.
    pub fn frame_context(&self, mode: FrameMode, camera: Camera, scene: &Scene) -> FrameContext {
        let mut frame = FrameContext::new(
            mode,
            camera,
            self.config.clone(),
            scene.active_view().cloned(),
        );
        frame.batch_epoch = self.epoch;
        frame
    }

    /// Draws every object and instance of `scene`.
    ///
    /// `surface` is only used for vector frames. Dimensions and annotations
    /// with stale references are removed from `scene` before returning.
    pub fn draw_frame(
        &self,
        scene: &mut Scene,
        frame: &FrameContext,
        backend: &mut dyn RenderBackend,
        surface: Option<&mut dyn DrawingSurface>,
        fonts: &mut dyn FontRasterizer,
    ) -> FrameReport {
        backend.begin_frame(&frame.camera.uniform(), frame.viewport);
        let out = match surface {
            Some(surface) if frame.is_vector() => Output::vector(backend, surface),
            Some(_) => {
                tracing::warn!("Drawing surface ignored outside vector frames");
                Output::raster(backend, frame.is_render())
            }
            None => Output::raster(backend, frame.is_render()),
        };
        let mut state = FrameState {
            frame,
            out,
            fonts,
            prunes: Vec::new(),
            report: FrameReport::default(),
        };
        let started = Instant::now();

        let render = frame.is_render();
        let candidates = scene
            .objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.is_drawable(render))
            .map(|(index, object)| (index, object_depth(&frame.camera, &object.transform)));
        let order: Vec<usize> = if frame.is_vector() {
            z_order(candidates)
        } else {
            candidates.map(|(index, _)| index).collect()
        };

        let total = order.len();
        for (position, index) in order.into_iter().enumerate() {
            if render {
                tracing::info!(
                    "Rendering object {} of {}: '{}'",
                    position + 1,
                    total,
                    scene.objects[index].name
                );
            }
            draw_object(scene, &mut state, index, None, Pass::Object, 0);
            state.report.objects_drawn += 1;
        }

        let instances = scene
            .instances
            .iter()
            .enumerate()
            .map(|(i, instance)| (i, object_depth(&frame.camera, &instance.transform)));
        let instance_order: Vec<usize> = if frame.is_vector() {
            z_order(instances)
        } else {
            instances.map(|(i, _)| i).collect()
        };
        let instance_total = instance_order.len();
        for (position, i) in instance_order.into_iter().enumerate() {
            let instance = &scene.instances[i];
            let transform = instance.transform;
            let Some(index) = scene.object_index(instance.object) else {
                tracing::debug!("Instance of missing object {}", instance.object);
                continue;
            };
            if render {
                tracing::info!(
                    "Rendering instance {} of {}: '{}'",
                    position + 1,
                    instance_total,
                    scene.objects[index].name
                );
            }
            draw_object(
                scene,
                &mut state,
                index,
                Some(transform),
                Pass::Instance,
                0,
            );
            state.report.instances_drawn += 1;
        }

        if render {
            tracing::info!("Frame drawn in {:.3}s", started.elapsed().as_secs_f64());
        }

        let mut report = state.report;
        if !state.prunes.is_empty() {
            report.pruned = scene.apply_prunes(&state.prunes);
        }
        report
    }
}

/// Draws one object's generators.
///
/// The generators are moved out of the scene for the duration so the rest
/// of the scene stays readable by anchors on other objects.
fn draw_object(
    scene: &mut Scene,
    state: &mut FrameState,
    index: usize,
    transform: Option<Mat4>,
    pass: Pass,
    depth: usize,
) {
    let (mut dimensions, mut annotations, mut line_groups) = {
        let object = &mut scene.objects[index];
        (
            std::mem::take(&mut object.dimensions),
            std::mem::take(&mut object.annotations),
            std::mem::take(&mut object.line_groups),
        )
    };
    let mut deferred = Vec::new();

    {
        let frame = state.frame;
        let object = &scene.objects[index];
        let owner = match transform {
            Some(transform) => Owner::with_override(object, transform),
            None => Owner::new(object),
        };
        let mut ctx = DrawContext::new(frame, scene, &mut *state.fonts);
        let out = &mut state.out;
        let mut drawn = 0;

        if out.is_vector() && matches!(object.kind, ObjectKind::Mesh | ObjectKind::Curve) {
            draw_material_hatches(frame, out, &owner);
        }

        if !frame.config.hide_linework || frame.is_render() || pass != Pass::Object {
            drawn += draw_line_groups(&mut ctx, out, &owner, &mut line_groups);
        }

        for (i, annotation) in annotations.annotations.iter_mut().enumerate() {
            match draw_annotation(&mut ctx, out, &owner, annotation, &mut deferred) {
                Ok(DrawOutcome::Drawn) => drawn += 1,
                Ok(DrawOutcome::Hidden) => {}
                Err(err) => {
                    tracing::warn!(
                        "Removing annotation '{}' on '{}': {}",
                        annotation.name,
                        object.name,
                        err
                    );
                    state.prunes.push(PruneRequest {
                        object: object.id,
                        target: PruneTarget::Annotation { index: i },
                    });
                }
            }
        }

        let all_kinds = pass != Pass::Instance;
        if all_kinds || frame.config.instance_dims {
            let mut prunes = Vec::new();
            drawn += draw_dimensions(
                &mut ctx,
                out,
                &owner,
                &mut dimensions,
                all_kinds,
                &mut prunes,
            );
            state.prunes.extend(prunes.into_iter().map(|target| PruneRequest {
                object: object.id,
                target,
            }));
        }
        state.report.items_drawn += drawn;
    }

    let object = &mut scene.objects[index];
    object.dimensions = dimensions;
    object.annotations = annotations;
    object.line_groups = line_groups;

    for shape in deferred {
        draw_custom_shape(scene, state, &shape, depth + 1);
    }
}

fn draw_custom_shape(
    scene: &mut Scene,
    state: &mut FrameState,
    shape: &CustomShapeDraw,
    depth: usize,
) {
    if depth > MAX_SHAPE_DEPTH {
        tracing::warn!("Custom shapes nested deeper than {}, skipping", MAX_SHAPE_DEPTH);
        return;
    }
    for id in &shape.objects {
        let Some(index) = scene.object_index(*id) else {
            tracing::debug!("Custom shape object {} is missing", id);
            continue;
        };
        let transform = shape.object_transform(scene.objects[index].transform);
        draw_object(scene, state, index, Some(transform), Pass::Shape, depth);
        state.report.shapes_drawn += 1;
    }
}

/// Runs one dimension kind, recording a prune target for every failure.
fn draw_kind<T>(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    kind: DimensionKind,
    items: &mut [T],
    prunes: &mut Vec<PruneTarget>,
    mut draw: impl FnMut(
        &mut DrawContext,
        &mut Output,
        &Owner,
        &mut T,
    ) -> Result<DrawOutcome, GeometryError>,
) -> usize {
    let mut drawn = 0;
    for (item_index, item) in items.iter_mut().enumerate() {
        match draw(ctx, out, owner, item) {
            Ok(DrawOutcome::Drawn) => drawn += 1,
            Ok(DrawOutcome::Hidden) => {}
            Err(err) => {
                tracing::warn!(
                    "Removing {:?} dimension {} on '{}': {}",
                    kind,
                    item_index,
                    owner.object.name,
                    err
                );
                prunes.push(PruneTarget::Dimension { kind, item_index });
            }
        }
    }
    drawn
}

/// Draws an object's dimensions. Instances without `all_kinds` only draw
/// aligned, angle and axis dimensions.
fn draw_dimensions(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    dims: &mut DimensionGenerator,
    all_kinds: bool,
    prunes: &mut Vec<PruneTarget>,
) -> usize {
    let mut drawn = 0;
    drawn += draw_kind(ctx, out, owner, DimensionKind::Aligned, &mut dims.aligned, prunes, draw_aligned);
    drawn += draw_kind(ctx, out, owner, DimensionKind::Angle, &mut dims.angle, prunes, draw_angle);
    drawn += draw_kind(ctx, out, owner, DimensionKind::Axis, &mut dims.axis, prunes, draw_axis);
    if all_kinds {
        drawn += draw_kind(ctx, out, owner, DimensionKind::Bounds, &mut dims.bounds, prunes, draw_bounds);
        drawn += draw_kind(ctx, out, owner, DimensionKind::Arc, &mut dims.arc, prunes, draw_arc);
        drawn += draw_kind(ctx, out, owner, DimensionKind::Area, &mut dims.area, prunes, draw_area);
    }
    drawn
}
