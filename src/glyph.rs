use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use egui::{Color32, Pos2, Rect, pos2};

use crate::font::FontError;
use crate::surface::Surface;

/// Font entry preferred among egui's embedded fonts.
pub const BUILTIN_FONT: &str = "Ubuntu-Light";

/// Guide opacity used when the difficulty does not override it.
pub const DEFAULT_GUIDE_OPACITY: f32 = 0.15;

/// Reference glyph for ruled-line metrics.
const RULED_REFERENCE: char = 'H';

/// The target glyph and the font settings it is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphStyle {
    pub character: char,
    pub family: String,
    /// CSS pixel size, before device pixel scaling.
    pub size: f32,
    pub weight: u16,
}

impl GlyphStyle {
    pub fn device_size(&self, dpr: f32) -> f32 {
        self.size * dpr
    }
}

/// Vertical ink extent of a glyph, measured from the centered alignment point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkExtent {
    /// Distance from the center up to the top of the ink.
    pub ascent: f32,
    /// Distance from the center down to the bottom of the ink.
    pub descent: f32,
}

/// Something that can paint a single glyph onto a surface.
///
/// Glyphs are aligned the way a canvas draws text with centered alignment
/// and a `middle` baseline: the advance is centered horizontally and the em
/// box vertically, so masks and guides drawn through the same rasterizer
/// line up pixel for pixel.
pub trait GlyphRasterizer {
    /// Paints `ch` around `center` (device pixels) at `px_size`.
    fn draw_centered(&self, surface: &mut Surface, ch: char, center: Pos2, px_size: f32, color: Color32);

    /// Ink extent of `ch`, or `None` when the glyph has no outline.
    fn ink_extent(&self, ch: char, px_size: f32) -> Option<InkExtent>;
}

/// Glyph rasterizer backed by a loaded font face.
#[derive(Clone)]
pub struct FontGlyphs {
    font: FontArc,
}

impl std::fmt::Debug for FontGlyphs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontGlyphs")
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

impl FontGlyphs {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FontError> {
        FontArc::try_from_vec(bytes)
            .map(|font| Self { font })
            .map_err(|_| FontError::InvalidFont)
    }

    /// A face from egui's embedded fonts, so tracing works offline.
    pub fn builtin() -> Option<Self> {
        builtin_font_bytes().and_then(|bytes| Self::from_bytes(bytes).ok())
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.font.glyph_id(ch).0 != 0
    }

    // CSS sizes are em sizes; ab_glyph scales by ascent-to-descent height.
    fn px_scale(&self, px_size: f32) -> PxScale {
        match self.font.units_per_em() {
            Some(units) if units > 0.0 => PxScale::from(px_size * self.font.height_unscaled() / units),
            _ => PxScale::from(px_size),
        }
    }

    fn positioned(&self, ch: char, center: Pos2, px_size: f32) -> Glyph {
        let scale = self.px_scale(px_size);
        let scaled = self.font.as_scaled(scale);
        let id = self.font.glyph_id(ch);
        let x = center.x - scaled.h_advance(id) / 2.0;
        // descent is negative; this puts the em box middle on `center.y`
        let baseline = center.y + (scaled.ascent() + scaled.descent()) / 2.0;
        id.with_scale_and_position(scale, point(x, baseline))
    }
}

impl GlyphRasterizer for FontGlyphs {
    fn draw_centered(&self, surface: &mut Surface, ch: char, center: Pos2, px_size: f32, color: Color32) {
        let glyph = self.positioned(ch, center, px_size);
        let Some(outlined) = self.font.outline_glyph(glyph) else {
            return;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|px, py, coverage| {
            let x = bounds.min.x + px as f32;
            let y = bounds.min.y + py as f32;
            if x >= 0.0 && y >= 0.0 {
                surface.blend_pixel(x as u32, y as u32, color, coverage);
            }
        });
    }

    fn ink_extent(&self, ch: char, px_size: f32) -> Option<InkExtent> {
        let outlined = self.font.outline_glyph(self.positioned(ch, Pos2::ZERO, px_size))?;
        let bounds = outlined.px_bounds();
        Some(InkExtent {
            ascent: -bounds.min.y,
            descent: bounds.max.y,
        })
    }
}

/// Raw bytes of the embedded fallback face.
pub fn builtin_font_bytes() -> Option<Vec<u8>> {
    let definitions = egui::FontDefinitions::default();
    definitions
        .font_data
        .get(BUILTIN_FONT)
        .or_else(|| definitions.font_data.values().next())
        .map(|data| data.font.to_vec())
}

fn surface_center(surface: &Surface) -> Pos2 {
    pos2(surface.width() as f32 / 2.0, surface.height() as f32 / 2.0)
}

/// Draws the styled glyph centered on an unscaled surface.
pub fn render_glyph(
    surface: &mut Surface,
    glyphs: &dyn GlyphRasterizer,
    style: &GlyphStyle,
    dpr: f32,
    color: Color32,
) {
    let center = surface_center(surface);
    glyphs.draw_centered(surface, style.character, center, style.device_size(dpr), color);
}

/// Redraws the faded display copy of the glyph.
///
/// An opacity of zero leaves the guide blank; layouts that show ruled lines
/// instead of the faded glyph use that.
pub fn render_guide(
    surface: &mut Surface,
    glyphs: &dyn GlyphRasterizer,
    style: &GlyphStyle,
    dpr: f32,
    opacity: f32,
) {
    surface.clear();
    if opacity <= 0.0 {
        return;
    }
    let alpha = (opacity.min(1.0) * 255.0).round() as u8;
    render_glyph(surface, glyphs, style, dpr, Color32::from_black_alpha(alpha));
}

/// Draws baseline, midline and cap-height lines measured from the glyph `H`.
///
/// Purely cosmetic; nothing here feeds the mask.
pub fn render_ruled_lines(surface: &mut Surface, glyphs: &dyn GlyphRasterizer, style: &GlyphStyle, dpr: f32) {
    let Some(extent) = glyphs.ink_extent(RULED_REFERENCE, style.device_size(dpr)) else {
        return;
    };
    let center_y = surface.height() as f32 / 2.0;
    let baseline = center_y + extent.descent;
    let cap_height = center_y - extent.ascent;
    let midline = (baseline + cap_height) / 2.0;
    let width = surface.width() as f32;

    let solid = Color32::from_black_alpha(26);
    let faint = Color32::from_black_alpha(20);
    draw_hline(surface, baseline, 2.0 * dpr, width, solid, None);
    let dash = Some((8.0 * dpr, 6.0 * dpr));
    draw_hline(surface, cap_height, 1.5 * dpr, width, faint, dash);
    draw_hline(surface, midline, 1.5 * dpr, width, faint, dash);
}

fn draw_hline(surface: &mut Surface, y: f32, thickness: f32, width: f32, color: Color32, dash: Option<(f32, f32)>) {
    let half = thickness / 2.0;
    match dash {
        None => surface.fill_rect(Rect::from_min_max(pos2(0.0, y - half), pos2(width, y + half)), color),
        Some((on, off)) => {
            let mut x = 0.0;
            while x < width {
                let end = (x + on).min(width);
                surface.fill_rect(Rect::from_min_max(pos2(x, y - half), pos2(end, y + half)), color);
                x += on + off;
            }
        }
    }
}
