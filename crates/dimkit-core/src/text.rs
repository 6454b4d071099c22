//! Text fields, text sources and rasterized text caches

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::units::UnitSettings;
use crate::view::View;

/// Object attributes a text field may display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectProperty {
    Name,
    Location,
    LocationX,
    LocationY,
    LocationZ,
    Scale,
}

/// Where a text field's content comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TextSource {
    /// Literal text set by the user or by the owning dimension
    #[default]
    Manual,
    /// Today's date as `yy/mm/dd`
    Date,
    ViewName,
    /// `paper:model` of the active view
    Scale,
    ViewNumber,
    /// Height of the owning annotation's anchor
    Elevation,
    /// Stack the active view's notes below this field
    Notes,
    Property(ObjectProperty),
}

/// Inputs a texture was rasterized with besides the text itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RasterKey {
    pub font: u32,
    pub font_size: f32,
    pub resolution: u32,
    pub color: [f32; 4],
}

/// RGBA8 texture produced by the font rasterizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextTexture {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes
    pub pixels: Vec<u8>,
    pub key: RasterKey,
}

/// Planar quad text is mapped onto.
///
/// ```text
///   1----------------2
///   |                |
///   0----------------3
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextCard(pub [Vec3; 4]);

impl TextCard {
    pub fn points(&self) -> &[Vec3; 4] {
        &self.0
    }

    /// Bottom edge, left to right.
    pub fn x_axis(&self) -> Vec3 {
        self.0[3] - self.0[0]
    }

    /// Left edge, bottom to top.
    pub fn y_axis(&self) -> Vec3 {
        self.0[1] - self.0[0]
    }

    pub fn center(&self) -> Vec3 {
        (self.0[0] + self.0[2]) * 0.5
    }
}

/// One line of text attached to a dimension or annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextField {
    pub text: String,
    pub source: TextSource,
    /// Content changed since the last rasterization
    #[serde(skip)]
    pub text_updated: bool,
    /// Texture changed since the backend last uploaded it
    #[serde(skip)]
    pub texture_updated: bool,
    #[serde(skip)]
    pub texture: Option<TextTexture>,
    #[serde(skip)]
    pub card: Option<TextCard>,
}

impl TextField {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            text_updated: true,
            ..Self::default()
        }
    }

    pub fn with_source(source: TextSource) -> Self {
        Self {
            source,
            text_updated: true,
            ..Self::default()
        }
    }

    /// Replaces the content, flagging a re-rasterization when it differs.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text != text {
            self.text = text;
            self.text_updated = true;
        }
    }

    /// True when the cached texture is missing or was made with other inputs.
    pub fn needs_raster(&self, key: &RasterKey) -> bool {
        if self.text_updated {
            return true;
        }
        match &self.texture {
            Some(texture) => texture.key != *key,
            None => !self.text.is_empty(),
        }
    }

    /// Forces a re-rasterization on the next draw.
    pub fn mark_dirty(&mut self) {
        self.text_updated = true;
    }

    /// Re-evaluates the field's source and applies capitalization.
    pub fn refresh(&mut self, ctx: &TextSourceContext<'_>) {
        let resolved = match &self.source {
            TextSource::Manual | TextSource::Notes => None,
            TextSource::Date => Some(chrono::Local::now().format("%y/%m/%d").to_string()),
            TextSource::ViewName => ctx.view.map(|v| v.name.clone()),
            TextSource::Scale => ctx.view.map(View::scale_label),
            TextSource::ViewNumber => ctx.view.map(|v| v.view_num.clone()),
            TextSource::Elevation => ctx.anchor.map(|a| ctx.units.format_distance(a.z)),
            TextSource::Property(property) => Some(ctx.property(*property)),
        };

        let mut text = resolved.unwrap_or_else(|| self.text.clone());
        if ctx.all_caps {
            text = text.to_uppercase();
        }
        self.set_text(text);
    }
}

/// Everything text sources may read.
pub struct TextSourceContext<'a> {
    pub view: Option<&'a View>,
    pub object_name: &'a str,
    pub object_transform: Mat4,
    /// World position of the owning annotation's anchor
    pub anchor: Option<Vec3>,
    pub units: &'a UnitSettings,
    pub all_caps: bool,
}

impl TextSourceContext<'_> {
    fn property(&self, property: ObjectProperty) -> String {
        let (scale, _, location) = self.object_transform.to_scale_rotation_translation();
        let d = |v: f32| self.units.format_distance(v);
        match property {
            ObjectProperty::Name => self.object_name.to_string(),
            ObjectProperty::Location => {
                format!("{}, {}, {}", d(location.x), d(location.y), d(location.z))
            }
            ObjectProperty::LocationX => d(location.x),
            ObjectProperty::LocationY => d(location.y),
            ObjectProperty::LocationZ => d(location.z),
            ObjectProperty::Scale => format!("{:.3}, {:.3}, {:.3}", scale.x, scale.y, scale.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(units: &'a UnitSettings, view: Option<&'a View>) -> TextSourceContext<'a> {
        TextSourceContext {
            view,
            object_name: "Wall",
            object_transform: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            anchor: Some(Vec3::new(0.0, 0.0, 2.5)),
            units,
            all_caps: false,
        }
    }

    #[test]
    fn test_set_text_marks_dirty_only_on_change() {
        let mut field = TextField::new("a");
        field.text_updated = false;
        field.set_text("a");
        assert!(!field.text_updated);
        field.set_text("b");
        assert!(field.text_updated);
    }

    #[test]
    fn test_needs_raster_on_key_change() {
        let key = RasterKey {
            resolution: 72,
            ..RasterKey::default()
        };
        let mut field = TextField::new("12");
        assert!(field.needs_raster(&key));

        field.text_updated = false;
        field.texture = Some(TextTexture {
            key,
            ..TextTexture::default()
        });
        assert!(!field.needs_raster(&key));
        assert!(field.needs_raster(&RasterKey {
            resolution: 300,
            ..key
        }));

        field.mark_dirty();
        assert!(field.needs_raster(&key));
    }

    #[test]
    fn test_manual_source_keeps_text() {
        let units = UnitSettings::default();
        let mut field = TextField::new("hello");
        field.refresh(&ctx(&units, None));
        assert_eq!(field.text, "hello");
    }

    #[test]
    fn test_property_and_elevation_sources() {
        let units = UnitSettings::default();
        let mut name = TextField::with_source(TextSource::Property(ObjectProperty::Name));
        name.refresh(&ctx(&units, None));
        assert_eq!(name.text, "Wall");

        let mut x = TextField::with_source(TextSource::Property(ObjectProperty::LocationX));
        x.refresh(&ctx(&units, None));
        assert_eq!(x.text, "1.00 m");

        let mut elevation = TextField::with_source(TextSource::Elevation);
        elevation.refresh(&ctx(&units, None));
        assert_eq!(elevation.text, "2.50 m");
    }

    #[test]
    fn test_view_sources_and_caps() {
        let units = UnitSettings::default();
        let view = View {
            view_num: "A-101".into(),
            ..View::new("Ground floor")
        };
        let mut c = ctx(&units, Some(&view));
        c.all_caps = true;

        let mut name = TextField::with_source(TextSource::ViewName);
        name.refresh(&c);
        assert_eq!(name.text, "GROUND FLOOR");

        let mut number = TextField::with_source(TextSource::ViewNumber);
        number.refresh(&c);
        assert_eq!(number.text, "A-101");
    }

    #[test]
    fn test_date_source_format() {
        let units = UnitSettings::default();
        let mut date = TextField::with_source(TextSource::Date);
        date.refresh(&ctx(&units, None));
        assert_eq!(date.text.len(), 8);
        assert_eq!(date.text.matches('/').count(), 2);
    }

    #[test]
    fn test_card_axes() {
        let card = TextCard([
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ]);
        assert_eq!(card.x_axis(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(card.y_axis(), Vec3::Y);
        assert_eq!(card.center(), Vec3::new(1.0, 0.5, 0.0));
    }
}
