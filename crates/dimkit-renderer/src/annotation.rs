//! Annotation drawing
//!
//! An annotation is a leader from an anchor vertex to a stacked block of
//! text. The leader bends once: from the anchor along the annotation's
//! offset, then horizontally (in the annotation's own frame, or the
//! camera's when aligned to it) towards the text.
//!
//! Custom shapes are not drawn here. [`draw_annotation`] returns them as
//! [`CustomShapeDraw`] requests that the traversal redraws with the
//! annotation's transform.

use glam::{Mat4, Quat, Vec3};
use uuid::Uuid;

use dimkit_core::annotation::{Annotation, CustomShapeLocation};
use dimkit_core::error::GeometryError;
use dimkit_core::geometry::{euler_xyz, rotate_about};
use dimkit_core::style::{EndcapType, StyleCategory};
use dimkit_core::text::{TextField, TextSource};

use crate::batch::{DEFAULT_DEPTH_OFFSET, LineOptions, Topology};
use crate::color::item_color;
use crate::context::{DrawContext, DrawOutcome, Owner};
use crate::dimensions::placement::{CardFrame, place_field};
use crate::emit::Output;
use crate::surface::{StrokeStyle, TextStyle};
use crate::text_layout::CardLayout;

/// Segments of the triangle endcap cone.
const CONE_SEGMENTS: usize = 12;

/// Cone half angle is the style's arrow angle minus this.
const CONE_ANGLE_TRIM: f32 = 5.0 * std::f32::consts::PI / 180.0;

/// Leader pull-back per point of cap size for triangle caps.
const LEADER_PULLBACK: f32 = 0.005;

/// Deferred redraw of an annotation's custom shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomShapeDraw {
    /// Objects making up the shape.
    pub objects: Vec<Uuid>,
    /// Transform the shape is drawn with.
    pub transform: Mat4,
    /// Multiply each object's own world transform into `transform`.
    pub multiply_local: bool,
}

impl CustomShapeDraw {
    /// Draw transform for one shape object.
    pub fn object_transform(&self, object_world: Mat4) -> Mat4 {
        if self.multiply_local {
            self.transform * object_world
        } else {
            self.transform
        }
    }
}

/// Leader points and text frame of one annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationFrame {
    /// Anchor.
    pub p1: Vec3,
    /// Bend of the leader.
    pub p2: Vec3,
    /// Text end of the leader.
    pub p3: Vec3,
    /// Orientation of the text block.
    pub rotation: Quat,
    /// -1 when the text reads towards the anchor.
    pub mult: f32,
    /// Custom shape transform.
    pub shape_transform: Mat4,
}

/// Inputs to [`annotation_frame`] besides the annotation itself.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs {
    /// Owner draw transform.
    pub world: Mat4,
    /// Anchor in owner space.
    pub anchor_local: Vec3,
    /// Leader length from the style.
    pub leader_length: f32,
    /// Drawing scale.
    pub scale: f32,
    /// Camera orientation when the text follows the camera.
    pub camera: Option<Quat>,
}

/// Computes the leader and text frame.
pub fn annotation_frame(annotation: &Annotation, inputs: &FrameInputs) -> AnnotationFrame {
    let (scale, rotation, location) = inputs.world.to_scale_rotation_translation();
    let anchor_scaled = scale * inputs.anchor_local;
    let p1 = location + rotation * anchor_scaled;
    let p2 = rotation * annotation.offset + p1;

    let shape_offset = match annotation.custom_shape_location {
        CustomShapeLocation::Anchor => anchor_scaled,
        CustomShapeLocation::Text => anchor_scaled + annotation.offset,
    };
    let own_rotation = euler_xyz(annotation.rotation);
    let custom_scale = Mat4::from_scale(Vec3::splat(annotation.custom_scale));
    let no_scale = Mat4::from_rotation_translation(rotation, location);

    let (full_rotation, shape_transform, mult) = match inputs.camera {
        Some(camera) => {
            let camera_x = camera * Vec3::X;
            let mult = if (p1 - p2).dot(camera_x) > 0.0 { -1.0 } else { 1.0 };
            let transform =
                Mat4::from_translation(location) * Mat4::from_quat(camera) * custom_scale;
            (camera, transform, mult)
        }
        None => {
            let transform = no_scale
                * Mat4::from_translation(shape_offset)
                * Mat4::from_quat(own_rotation)
                * custom_scale;
            (rotation * own_rotation, transform, 1.0)
        }
    };

    let p3_dir = (full_rotation * Vec3::X).normalize_or_zero();
    let p3 = p2 + p3_dir * (inputs.leader_length * inputs.scale * 0.5) * mult;

    AnnotationFrame {
        p1,
        p2,
        p3,
        rotation: full_rotation,
        mult,
        shape_transform,
    }
}

/// Filled cone at the anchor, opening towards the leader.
fn cone_cap(p1: Vec3, p2: Vec3, size: f32, arrow_angle: f32) -> Vec<Vec3> {
    let axis = p1 - p2;
    let mut line = axis.normalize_or_zero() * -0.1 * size / 100.0;
    let perp = line.any_orthogonal_vector();
    line = rotate_about(line, perp, arrow_angle - CONE_ANGLE_TRIM);

    let step = std::f32::consts::TAU / CONE_SEGMENTS as f32;
    let mut filled = Vec::with_capacity(CONE_SEGMENTS * 3);
    for _ in 0..CONE_SEGMENTS {
        filled.push(line + p1);
        filled.push(p1);
        line = rotate_about(line, axis, step);
        filled.push(line + p1);
    }
    filled
}

/// Draws one annotation.
///
/// A custom shape request is pushed to `deferred`. A custom shape that
/// contains the owner itself is not drawn; the stored shape is left as is.
pub fn draw_annotation(
    ctx: &mut DrawContext,
    out: &mut Output,
    owner: &Owner,
    annotation: &mut Annotation,
    deferred: &mut Vec<CustomShapeDraw>,
) -> Result<DrawOutcome, GeometryError> {
    let style = annotation
        .binding
        .resolve(&ctx.scene.styles, StyleCategory::Annotation);
    if !ctx.frame.is_visible(annotation.visible, &style) {
        return Ok(DrawOutcome::Hidden);
    }
    let color = item_color(style.color, owner.id(), ctx.frame, annotation.is_active, true);
    let eval = ctx.eval_mods(&style);
    let anchor_local = owner
        .object
        .vertex(annotation.anchor_index, annotation.anchor_spline, eval)?;

    let frame = annotation_frame(
        annotation,
        &FrameInputs {
            world: owner.world,
            anchor_local,
            leader_length: style.leader_length,
            scale: ctx.frame.scale,
            camera: style.align_to_camera.then_some(ctx.frame.camera.rotation),
        },
    );
    annotation.anchor_coord = Some(frame.p1);
    annotation.gizmo_location = frame.p2;

    if let Some(objects) = &annotation.custom_shape {
        if objects.contains(&owner.id()) {
            tracing::warn!(
                "Annotation '{}' cannot contain its own object in its custom shape",
                annotation.name
            );
        } else {
            deferred.push(CustomShapeDraw {
                objects: objects.clone(),
                transform: frame.shape_transform,
                multiply_local: style.custom_local_transforms,
            });
        }
    }

    if annotation.text_fields.is_empty() {
        annotation.text_fields.push(TextField::new(""));
    }
    let spawns_notes = annotation
        .text_fields
        .iter()
        .any(|f| f.source == TextSource::Notes);
    match ctx.frame.view.as_ref() {
        Some(view) if spawns_notes => annotation.sync_notes(&view.notes),
        _ => annotation.note_fields.clear(),
    }

    let sources = owner.text_sources(ctx.frame, Some(frame.p1), style.all_caps);
    let layout = CardLayout::from_style(&style, ctx.frame);
    let x_dir = frame.rotation * Vec3::new(frame.mult, 0.0, 0.0);
    let y_dir = frame.rotation * Vec3::Y;
    let fields = annotation
        .text_fields
        .iter_mut()
        .chain(annotation.note_fields.iter_mut());
    for (index, field) in fields.enumerate() {
        let at = CardFrame {
            base: frame.p3,
            x_dir,
            y_dir,
            index,
        };
        place_field(ctx, out, field, &sources, &style, &layout, &at);
    }

    let cap = style.endcap_a;
    let line_end = if cap == EndcapType::Triangle {
        frame.p1 - (frame.p1 - frame.p2) * LEADER_PULLBACK * style.endcap_size
    } else {
        frame.p1
    };
    let leader = if style.draw_leader {
        vec![line_end, frame.p2, frame.p2, frame.p3]
    } else {
        Vec::new()
    };
    out.batch.draw_lines(
        style.line_weight,
        color,
        &leader,
        &LineOptions {
            point_pass: true,
            ..LineOptions::two_pass()
        },
    );

    let mut dot = None;
    let mut filled = Vec::new();
    match cap {
        EndcapType::Dot => {
            let size = style.endcap_size * ctx.frame.scale / 10.0;
            out.batch
                .draw_points(size, color, &[frame.p1], DEFAULT_DEPTH_OFFSET);
            dot = Some(size);
        }
        EndcapType::Triangle => {
            filled = cone_cap(
                frame.p1,
                frame.p2,
                style.endcap_size * ctx.frame.scale,
                style.endcap_arrow_angle,
            );
            out.batch.draw_filled(&filled, color, false);
        }
        EndcapType::None | EndcapType::Line => {}
    }

    if let Some(surface) = out.surface() {
        surface.begin_group(&annotation.name);
        surface.add_path(
            &leader,
            Topology::Lines,
            &StrokeStyle::solid(color, style.line_weight),
        );
        if let Some(size) = dot {
            surface.add_circle(frame.p1, size, color);
        }
        if !filled.is_empty() {
            surface.add_fill(&filled, color);
        }
        let text_style = TextStyle {
            color,
            font_size: style.font_size,
        };
        for field in annotation.text_fields.iter().chain(&annotation.note_fields) {
            if let Some(card) = &field.card {
                surface.add_text(&field.text, frame.p3, card, &text_style);
            }
        }
        surface.end_group();
    }
    Ok(DrawOutcome::Drawn)
}
