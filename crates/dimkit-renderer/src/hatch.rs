//! Material hatches
//!
//! Vector frames only. Every face whose material carries a visible hatch
//! becomes a filled, outlined polygon, optionally overlaid with the
//! material's line pattern. Faces are painted back to front.

use glam::Vec3;

use dimkit_core::scene::{Hatch, Material};

use crate::color::gamma_correct;
use crate::context::Owner;
use crate::emit::Output;
use crate::frame::FrameContext;
use crate::surface::{PatternDef, StrokeStyle};
use crate::zorder::faces_back_to_front;

/// Surface identifier of a material's hatch pattern.
pub fn pattern_id(material: &Material, hatch: &Hatch) -> Option<String> {
    hatch
        .pattern
        .as_ref()
        .map(|pattern| format!("{}_{}", material.name, pattern))
}

fn pattern_def(id: String, hatch: &Hatch) -> PatternDef {
    PatternDef {
        id,
        color: gamma_correct(hatch.line_color),
        weight: hatch.line_weight,
        size: hatch.pattern_size,
        rotation: hatch.pattern_rotation.to_degrees(),
        opacity: hatch.pattern_opacity,
    }
}

/// Emits the hatched faces of `owner`. Returns how many polygons were
/// written.
pub fn draw_material_hatches(frame: &FrameContext, out: &mut Output, owner: &Owner) -> usize {
    let object = owner.object;
    let hatched = object
        .materials
        .iter()
        .any(|m| m.hatch.as_ref().is_some_and(|h| h.visible));
    if object.visibility.hide_render || !hatched {
        return 0;
    }
    let Some(mesh) = object.mesh_for(false) else {
        return 0;
    };
    let Some(surface) = out.surface() else {
        return 0;
    };

    surface.begin_group(&object.name);
    for material in &object.materials {
        if let Some(hatch) = &material.hatch
            && let Some(id) = pattern_id(material, hatch)
        {
            surface.add_pattern(&pattern_def(id, hatch));
        }
    }

    let mut written = 0;
    for face_index in faces_back_to_front(&frame.camera, mesh, &owner.world, 0..mesh.faces.len())
    {
        let face = &mesh.faces[face_index];
        let Some(material) = object.materials.get(face.material_index) else {
            continue;
        };
        let Some(hatch) = material.hatch.as_ref().filter(|h| h.visible) else {
            continue;
        };

        let points: Vec<Vec3> = face
            .vertices
            .iter()
            .map(|&i| owner.world.transform_point3(mesh.vertex_or_origin(i as usize)))
            .collect();
        let stroke = StrokeStyle::solid(gamma_correct(hatch.line_color), hatch.line_weight);
        let pattern = pattern_id(material, hatch);

        surface.begin_group(&material.name);
        surface.add_polygon(
            &points,
            gamma_correct(hatch.fill_color),
            Some(&stroke),
            pattern.as_deref(),
        );
        surface.end_group();
        written += 1;
    }
    surface.end_group();

    tracing::trace!("Hatched {} faces on '{}'", written, object.name);
    written
}
