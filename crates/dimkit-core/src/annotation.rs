//! Annotation records
//!
//! An annotation is a leader from one anchor vertex to a block of stacked
//! text fields, optionally with a custom shape drawn at its end.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::style::StyleBinding;
use crate::text::TextField;

/// Where a custom shape is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomShapeLocation {
    /// At the anchor point
    #[default]
    Anchor,
    /// At the text end of the leader
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    pub name: String,
    pub visible: bool,
    pub is_active: bool,
    pub binding: StyleBinding,
    /// Anchor vertex (or control point) on the owner
    pub anchor_index: usize,
    pub anchor_spline: Option<usize>,
    /// Leader vector in the owner's local orientation
    pub offset: Vec3,
    /// XYZ Euler rotation of the text block, radians
    pub rotation: Vec3,
    pub text_fields: Vec<TextField>,
    /// Objects redrawn at the annotation
    pub custom_shape: Option<Vec<Uuid>>,
    pub custom_shape_location: CustomShapeLocation,
    pub custom_scale: f32,
    /// View notes stacked under the own fields, mirrored each frame
    #[serde(skip)]
    pub note_fields: Vec<TextField>,
    /// World position of the anchor from the last draw
    #[serde(skip)]
    pub anchor_coord: Option<Vec3>,
    #[serde(skip)]
    pub gizmo_location: Vec3,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            name: String::new(),
            visible: true,
            is_active: true,
            binding: StyleBinding::default(),
            anchor_index: 0,
            anchor_spline: None,
            offset: Vec3::new(0.5, 0.5, 0.5),
            rotation: Vec3::ZERO,
            text_fields: Vec::new(),
            custom_shape: None,
            custom_shape_location: CustomShapeLocation::Anchor,
            custom_scale: 1.0,
            note_fields: Vec::new(),
            anchor_coord: None,
            gizmo_location: Vec3::ZERO,
        }
    }
}

impl Annotation {
    pub fn new(name: impl Into<String>, anchor_index: usize) -> Self {
        Self {
            name: name.into(),
            anchor_index,
            ..Self::default()
        }
    }

    /// Mirrors the view's notes into `note_fields`, keeping rasterized
    /// textures for notes whose text did not change.
    pub fn sync_notes(&mut self, notes: &[TextField]) {
        self.note_fields.truncate(notes.len());
        for (i, note) in notes.iter().enumerate() {
            match self.note_fields.get_mut(i) {
                Some(field) => field.set_text(note.text.clone()),
                None => self.note_fields.push(TextField::new(note.text.clone())),
            }
        }
    }
}

/// All annotations owned by one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationGenerator {
    pub annotations: Vec<Annotation>,
}

impl AnnotationGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, annotation: Annotation) -> usize {
        self.annotations.push(annotation);
        self.annotations.len() - 1
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Flags every text field, notes included, for re-rasterization.
    pub fn mark_text_dirty(&mut self) {
        for annotation in &mut self.annotations {
            annotation
                .text_fields
                .iter_mut()
                .chain(annotation.note_fields.iter_mut())
                .for_each(TextField::mark_dirty);
        }
    }

    /// Removes several annotations, highest index first.
    pub fn remove_many(&mut self, mut indices: Vec<usize>) -> usize {
        indices.sort_unstable();
        indices.dedup();
        let mut removed = 0;
        for index in indices.into_iter().rev() {
            if index < self.annotations.len() {
                self.annotations.remove(index);
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_notes_keeps_unchanged_fields_clean() {
        let mut annotation = Annotation::new("n", 0);
        let notes = vec![TextField::new("first"), TextField::new("second")];
        annotation.sync_notes(&notes);
        assert_eq!(annotation.note_fields.len(), 2);

        for field in &mut annotation.note_fields {
            field.text_updated = false;
        }
        let edited = vec![TextField::new("first"), TextField::new("changed")];
        annotation.sync_notes(&edited);
        assert!(!annotation.note_fields[0].text_updated);
        assert!(annotation.note_fields[1].text_updated);

        annotation.sync_notes(&edited[..1]);
        assert_eq!(annotation.note_fields.len(), 1);
    }

    #[test]
    fn test_remove_many() {
        let mut generator = AnnotationGenerator::new();
        for i in 0..3 {
            generator.add(Annotation::new(format!("a{i}"), i));
        }
        assert_eq!(generator.remove_many(vec![2, 0, 7]), 2);
        assert_eq!(generator.annotations[0].name, "a1");
    }
}
