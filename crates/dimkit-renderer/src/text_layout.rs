//! Text layout engine
//!
//! Text is rasterized once per content change into an RGBA texture and
//! mapped onto a [`TextCard`]: a planar quad sized from the texture's pixel
//! dimensions, the font size, the drawing scale and the output resolution.
//! When drawn, the card's texture coordinates are mirrored per axis so the
//! text always reads left to right and upright from the current view.

use glam::{Quat, Vec2, Vec3, Vec4};

use dimkit_core::geometry::euler_xyz;
use dimkit_core::style::{Style, TextAlignment, TextPosition};
use dimkit_core::text::{RasterKey, TextCard, TextField, TextTexture};

use crate::batch::{LineOptions, TexturedVertex};
use crate::color::gamma_correct;
use crate::emit::Output;
use crate::frame::FrameContext;

/// Size text is rasterized at; cards rescale it to the style's font size.
pub const RASTER_FONT_SIZE: f32 = 20.0;

/// Sample with ascender, descender and quote marks, used for line height.
const HEIGHT_SAMPLE: &str = "Tpg\"";

/// Line height headroom over the sampled glyph height.
const LINE_HEIGHT_FACTOR: f32 = 1.3;

/// Converts font points to card units at scale 1.
const POINTS_PER_UNIT: f32 = 803.0;

/// Nudge applied to the view axes before the flip test, radians.
const FLIP_NUDGE: f32 = 0.01 * std::f32::consts::PI / 180.0;

/// Handle of a loaded font.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FontId(pub u32);

impl FontId {
    /// Built-in fallback font.
    pub const DEFAULT: FontId = FontId(0);
}

/// Font measurement and rasterization service.
pub trait FontRasterizer {
    /// Loads a font by name or path.
    fn load_font(&mut self, name: &str) -> Option<FontId>;

    /// Pixel extents of `text`.
    fn measure(&self, text: &str, font: FontId, size: f32, dpi: u32) -> (f32, f32);

    /// Renders `text` into a `width * height` RGBA8 buffer.
    #[allow(clippy::too_many_arguments)]
    fn rasterize(
        &self,
        text: &str,
        font: FontId,
        size: f32,
        dpi: u32,
        width: u32,
        height: u32,
        color: Vec4,
    ) -> Vec<u8>;
}

/// Resolves the style's font, falling back to [`FontId::DEFAULT`].
pub fn resolve_font(fonts: &mut dyn FontRasterizer, style: &Style) -> FontId {
    match style.font.as_deref() {
        None | Some("") => FontId::DEFAULT,
        Some(name) => fonts.load_font(name).unwrap_or_else(|| {
            tracing::warn!("Font '{}' not found, using the default font", name);
            FontId::DEFAULT
        }),
    }
}

/// Rasterizes a field whose content or raster inputs changed (or any
/// field when `force`).
///
/// The texture remembers the font, size, resolution and colour it was made
/// with; a change to any of them re-rasterizes. Empty text produces no
/// texture. Returns true when a texture was written.
pub fn update_text(
    field: &mut TextField,
    style: &Style,
    fonts: &mut dyn FontRasterizer,
    resolution: u32,
    force: bool,
) -> bool {
    let font = resolve_font(fonts, style);
    let color = gamma_correct(style.color);
    let key = RasterKey {
        font: font.0,
        font_size: RASTER_FONT_SIZE,
        resolution,
        color: color.to_array(),
    };
    if !force && !field.needs_raster(&key) {
        return false;
    }

    let (_, sample_height) = fonts.measure(HEIGHT_SAMPLE, font, RASTER_FONT_SIZE, resolution);
    let (text_width, _) = fonts.measure(&field.text, font, RASTER_FONT_SIZE, resolution);
    let width = text_width.ceil().max(0.0) as u32;
    let height = (sample_height * LINE_HEIGHT_FACTOR).ceil().max(0.0) as u32;

    field.text_updated = false;
    if width == 0 || height == 0 {
        field.texture = None;
        return false;
    }

    let pixels = fonts.rasterize(
        &field.text,
        font,
        RASTER_FONT_SIZE,
        resolution,
        width,
        height,
        color,
    );
    tracing::trace!("Rasterized '{}' at {}x{}", field.text, width, height);
    field.texture = Some(TextTexture {
        width,
        height,
        pixels,
        key,
    });
    field.texture_updated = true;
    true
}

/// Everything that sizes and aligns a card besides its placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    /// Font size in points.
    pub font_size: f32,
    /// Horizontal alignment.
    pub alignment: TextAlignment,
    /// Vertical position.
    pub position: TextPosition,
    /// Drawing scale.
    pub scale: f32,
    /// Output resolution in pixels per inch.
    pub resolution: u32,
    /// XYZ Euler rotation about the base point, radians.
    pub rotation: Vec3,
}

impl CardLayout {
    /// Layout from a style and the frame's scale and resolution.
    pub fn from_style(style: &Style, frame: &FrameContext) -> Self {
        Self {
            font_size: style.font_size,
            alignment: style.text_alignment,
            position: style.text_position,
            scale: frame.scale,
            resolution: frame.resolution,
            rotation: Vec3::ZERO,
        }
    }
}

/// Builds the quad a field's texture is mapped onto.
///
/// The quad is centred on `base` along `x_dir`, sits on `base` along
/// `y_dir`, and is then shifted by alignment, position and `card_index`
/// line heights.
pub fn generate_text_card(
    texture_size: (u32, u32),
    layout: &CardLayout,
    base: Vec3,
    x_dir: Vec3,
    y_dir: Vec3,
    card_index: usize,
) -> TextCard {
    let (width, height) = texture_size;
    let resolution = layout.resolution.max(1) as f32;
    let size = layout.font_size / POINTS_PER_UNIT * layout.scale;
    let sx = width as f32 / resolution * size;
    let sy = height as f32 / resolution * size;

    let card_x = x_dir.normalize_or_zero() * sx;
    let card_y = y_dir.normalize_or_zero() * sy;

    let square = [
        base - card_x / 2.0,
        base - card_x / 2.0 + card_y,
        base + card_x / 2.0 + card_y,
        base + card_x / 2.0,
    ];

    let alignment_offset = match layout.alignment {
        TextAlignment::Right => card_x * 0.5,
        TextAlignment::Left => card_x * -0.5,
        TextAlignment::Center => Vec3::ZERO,
    };
    let position_offset = match layout.position {
        TextPosition::Middle => card_y * 0.5,
        TextPosition::Bottom => card_y,
        TextPosition::Top => Vec3::ZERO,
    };
    let stack_offset = card_y * card_index as f32;

    let rotation = euler_xyz(layout.rotation);
    TextCard(square.map(|corner| {
        let shifted = corner - alignment_offset - position_offset - stack_offset;
        rotation * (shifted - base) + base
    }))
}

/// Card a field would get with its current texture.
pub fn field_card(
    field: &TextField,
    layout: &CardLayout,
    base: Vec3,
    x_dir: Vec3,
    y_dir: Vec3,
    card_index: usize,
) -> TextCard {
    let size = field
        .texture
        .as_ref()
        .map(|t| (t.width, t.height))
        .unwrap_or((0, 0));
    generate_text_card(size, layout, base, x_dir, y_dir, card_index)
}

/// Texture coordinates for a card seen with `view_rotation`.
///
/// The view axes are nudged about the view direction, turned onto the
/// card's plane, and compared with the card's own axes; each axis whose
/// directions disagree is mirrored.
pub fn card_uvs(card: &TextCard, view_rotation: Quat) -> [Vec2; 4] {
    let card_x = card.x_axis().normalize_or_zero();
    let card_y = card.y_axis().normalize_or_zero();
    let card_z = card_x.cross(card_y);

    let mut view_x = view_rotation * Vec3::X;
    let mut view_y = view_rotation * Vec3::Y;
    let mut view_z = view_rotation * Vec3::Z;

    let nudge = Quat::from_axis_angle(view_z, FLIP_NUDGE);
    view_x = nudge * view_x;
    view_y = nudge * view_y;

    if card_z.dot(view_z) <= 0.0 {
        view_z = -view_z;
    }
    if card_z != Vec3::ZERO {
        let difference = Quat::from_rotation_arc(view_z, card_z.normalize());
        view_x = difference * view_x;
        view_y = difference * view_y;
    }

    let mut ndc = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(-1.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, -1.0),
    ];
    if card_x.dot(view_x) < 0.0 {
        for uv in &mut ndc {
            uv.x = -uv.x;
        }
    }
    if card_y.dot(view_y) < 0.0 {
        for uv in &mut ndc {
            uv.y = -uv.y;
        }
    }
    ndc.map(|uv| (uv + Vec2::ONE) * 0.5)
}

/// Draws a field's texture on its card.
///
/// Vector frames emit text nodes instead, so nothing is rasterized there.
pub fn draw_text_3d(out: &mut Output, frame: &FrameContext, field: &mut TextField) {
    if frame.is_vector() {
        return;
    }
    let Some(card) = field.card else {
        return;
    };
    let uvs = card_uvs(&card, frame.view_rotation());

    if frame.config.debug.flip_text {
        let view_x = frame.view_rotation() * Vec3::X;
        let view_y = frame.view_rotation() * Vec3::Y;
        let origin = card.points()[0];
        out.batch.draw_lines(
            4.0,
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            &[origin, origin + view_x / 2.0, origin, origin + view_y],
            &LineOptions::default(),
        );
        tracing::debug!(
            "text flip: x dot {:.3}, y dot {:.3}",
            card.x_axis().normalize_or_zero().dot(view_x),
            card.y_axis().normalize_or_zero().dot(view_y)
        );
    }

    if frame.config.debug.show_text_cards {
        let [c0, c1, c2, c3] = *card.points();
        out.batch.draw_lines(
            1.0,
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            &[c0, c1, c1, c2, c2, c3, c3, c0],
            &LineOptions::default(),
        );
    }

    if field.text.is_empty() {
        return;
    }
    let Some(texture) = &field.texture else {
        return;
    };
    let corners = card.points();
    let vertices: [TexturedVertex; 4] = std::array::from_fn(|i| TexturedVertex {
        position: corners[i].to_array(),
        uv: uvs[i].to_array(),
    });
    out.batch
        .draw_textured_quad(&vertices, texture, field.texture_updated);
    field.texture_updated = false;
}
