//! Styles and style resolution
//!
//! Every drawable item carries a [`StyleBinding`]: either its own inline
//! [`Style`] or a reference by name into the shared [`StyleLibrary`]. The
//! per-item offset tweak is layered on top of whichever style wins.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Which shared collection a style lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleCategory {
    Dimension,
    Annotation,
    LineGroup,
}

/// Terminator glyph at the ends of a dimension line or annotation leader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndcapType {
    #[default]
    None,
    /// Open arrow
    Line,
    /// Filled arrowhead
    Triangle,
    /// Oriented square with an over-extension tick
    Dot,
}

/// Horizontal text placement relative to the anchor point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical text placement relative to the anchor point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextPosition {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Plane a dimension's offset is kept in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewPlane {
    /// Follow the current view direction
    #[default]
    Auto,
    XY,
    XZ,
    YZ,
}

/// Named bundle of visual parameters.
///
/// One struct serves all three categories; fields a category does not use
/// are simply ignored by its drawing code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub name: String,
    pub visible: bool,
    /// Only draw in this view layer (empty or `None` means every layer)
    pub visible_in_view: Option<String>,
    /// Linear RGBA
    pub color: [f32; 4],
    pub line_weight: f32,
    /// Evaluate modifiers before reading vertex positions
    pub eval_mods: bool,

    // Dimension
    pub endcap_a: EndcapType,
    pub endcap_b: EndcapType,
    pub endcap_size: f32,
    /// Arrow half angle in radians
    pub endcap_arrow_angle: f32,
    pub dim_offset: f32,
    pub dim_leader_offset: f32,
    /// Rotation of the offset direction about the measured line, radians
    pub dim_rotation: f32,
    pub view_plane: ViewPlane,

    // Text
    pub font: Option<String>,
    pub font_size: f32,
    pub text_alignment: TextAlignment,
    pub text_position: TextPosition,
    pub all_caps: bool,

    // Linework
    pub draw_hidden: bool,
    pub hidden_weight: f32,
    pub hidden_color: [f32; 4],
    pub draw_dashed: bool,
    pub dash_length: f32,
    pub gap_length: f32,
    pub screen_space_dashes: bool,
    pub depth_offset: f32,
    pub is_outline: bool,
    pub point_pass: bool,

    // Annotation
    pub leader_length: f32,
    pub draw_leader: bool,
    pub align_to_camera: bool,
    pub custom_local_transforms: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            name: String::new(),
            visible: true,
            visible_in_view: None,
            color: DEFAULT_COLOR,
            line_weight: DEFAULT_LINE_WEIGHT,
            eval_mods: false,
            endcap_a: EndcapType::None,
            endcap_b: EndcapType::None,
            endcap_size: DEFAULT_ENDCAP_SIZE,
            endcap_arrow_angle: DEFAULT_ARROW_ANGLE,
            dim_offset: DEFAULT_DIM_OFFSET,
            dim_leader_offset: DEFAULT_LEADER_OFFSET,
            dim_rotation: 0.0,
            view_plane: ViewPlane::Auto,
            font: None,
            font_size: DEFAULT_FONT_SIZE,
            text_alignment: TextAlignment::Center,
            text_position: TextPosition::Top,
            all_caps: false,
            draw_hidden: false,
            hidden_weight: DEFAULT_LINE_WEIGHT,
            hidden_color: [0.2, 0.2, 0.2, 1.0],
            draw_dashed: false,
            dash_length: 8.0,
            gap_length: 4.0,
            screen_space_dashes: false,
            depth_offset: 0.0,
            is_outline: false,
            point_pass: false,
            leader_length: 0.5,
            draw_leader: true,
            align_to_camera: false,
            custom_local_transforms: false,
        }
    }
}

impl Style {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Shared style collections, one per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleLibrary {
    pub dimensions: Vec<Style>,
    pub annotations: Vec<Style>,
    pub line_groups: Vec<Style>,
}

impl StyleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styles(&self, category: StyleCategory) -> &[Style] {
        match category {
            StyleCategory::Dimension => &self.dimensions,
            StyleCategory::Annotation => &self.annotations,
            StyleCategory::LineGroup => &self.line_groups,
        }
    }

    pub fn styles_mut(&mut self, category: StyleCategory) -> &mut Vec<Style> {
        match category {
            StyleCategory::Dimension => &mut self.dimensions,
            StyleCategory::Annotation => &mut self.annotations,
            StyleCategory::LineGroup => &mut self.line_groups,
        }
    }

    /// Adds a style and returns its slot.
    pub fn add(&mut self, category: StyleCategory, style: Style) -> usize {
        let styles = self.styles_mut(category);
        styles.push(style);
        styles.len() - 1
    }

    pub fn find(&self, category: StyleCategory, name: &str) -> Option<usize> {
        self.styles(category).iter().position(|s| s.name == name)
    }
}

/// Reference to a shared style by name.
///
/// The resolved slot is cached and revalidated against the name on every
/// lookup, so renaming or reordering the library never serves a wrong style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleRef {
    pub name: String,
    #[serde(skip)]
    slot: Option<usize>,
}

impl StyleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: None,
        }
    }

    /// Looks the style up, reusing the cached slot while it still matches.
    pub fn resolve<'a>(
        &mut self,
        library: &'a StyleLibrary,
        category: StyleCategory,
    ) -> Option<&'a Style> {
        let styles = library.styles(category);
        if let Some(slot) = self.slot
            && let Some(style) = styles.get(slot)
            && style.name == self.name
        {
            return Some(style);
        }

        self.slot = library.find(category, &self.name);
        match self.slot {
            Some(slot) => styles.get(slot),
            None => {
                tracing::warn!("Style '{}' not found, using inline style", self.name);
                None
            }
        }
    }

    /// Cached slot from the last successful lookup.
    pub fn cached_slot(&self) -> Option<usize> {
        self.slot
    }
}

/// How an item picks its effective style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleBinding {
    pub uses_style: bool,
    pub style: StyleRef,
    /// The item's own fields, used when no shared style applies
    pub inline: Style,
    /// Added to the resolved dimension offset when a shared style is used
    pub tweak_offset: f32,
}

impl StyleBinding {
    pub fn inline(style: Style) -> Self {
        Self {
            inline: style,
            ..Self::default()
        }
    }

    pub fn shared(name: impl Into<String>) -> Self {
        Self {
            uses_style: true,
            style: StyleRef::new(name),
            ..Self::default()
        }
    }

    /// Effective style for this frame.
    ///
    /// The tweak offset applies whenever `uses_style` is set, even if the
    /// named style is missing and the inline fields are used instead.
    pub fn resolve(&mut self, library: &StyleLibrary, category: StyleCategory) -> Style {
        if !self.uses_style {
            return self.inline.clone();
        }
        let mut style = match self.style.resolve(library, category) {
            Some(shared) => shared.clone(),
            None => self.inline.clone(),
        };
        style.dim_offset += self.tweak_offset;
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> StyleLibrary {
        let mut lib = StyleLibrary::new();
        lib.add(StyleCategory::Dimension, Style::named("A"));
        let mut b = Style::named("B");
        b.dim_offset = 3.0;
        lib.add(StyleCategory::Dimension, b);
        lib
    }

    #[test]
    fn test_inline_binding_ignores_library() {
        let mut inline = Style::named("own");
        inline.dim_offset = 1.25;
        let mut binding = StyleBinding::inline(inline);
        binding.tweak_offset = 10.0;
        let style = binding.resolve(&library(), StyleCategory::Dimension);
        assert_eq!(style.dim_offset, 1.25);
    }

    #[test]
    fn test_shared_binding_adds_tweak() {
        let mut binding = StyleBinding::shared("B");
        binding.tweak_offset = 0.5;
        let style = binding.resolve(&library(), StyleCategory::Dimension);
        assert_eq!(style.name, "B");
        assert_eq!(style.dim_offset, 3.5);
        assert_eq!(binding.style.cached_slot(), Some(1));
    }

    #[test]
    fn test_missing_style_falls_back_to_inline() {
        let mut binding = StyleBinding::shared("nope");
        binding.inline.dim_offset = 2.0;
        binding.tweak_offset = 1.0;
        let style = binding.resolve(&library(), StyleCategory::Dimension);
        assert_eq!(style.dim_offset, 3.0);
        assert_eq!(binding.style.cached_slot(), None);
    }

    #[test]
    fn test_cached_slot_revalidated_after_reorder() {
        let mut lib = library();
        let mut binding = StyleBinding::shared("B");
        binding.resolve(&lib, StyleCategory::Dimension);
        lib.dimensions.swap(0, 1);
        let style = binding.resolve(&lib, StyleCategory::Dimension);
        assert_eq!(style.name, "B");
        assert_eq!(binding.style.cached_slot(), Some(0));
    }

    #[test]
    fn test_categories_are_separate() {
        let mut binding = StyleBinding::shared("A");
        binding.inline.name = "inline".into();
        let style = binding.resolve(&library(), StyleCategory::LineGroup);
        assert_eq!(style.name, "inline");
    }
}
