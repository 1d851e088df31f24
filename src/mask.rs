use egui::Color32;
use log::debug;

use crate::glyph::{self, GlyphRasterizer, GlyphStyle};
use crate::surface::Surface;

/// Alpha above which a rendered glyph pixel counts as part of the letter.
pub const ALPHA_THRESHOLD: u8 = 10;

/// Binary occupancy of the target glyph, one byte per device pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMask {
    width: u32,
    height: u32,
    bits: Vec<u8>,
    total_pixels: usize,
}

impl GlyphMask {
    /// Thresholds the alpha channel of `surface`.
    pub fn from_surface(surface: &Surface) -> Self {
        let bits: Vec<u8> = surface
            .image()
            .as_raw()
            .chunks_exact(4)
            .map(|px| u8::from(px[3] > ALPHA_THRESHOLD))
            .collect();
        let total_pixels = bits.iter().filter(|&&bit| bit == 1).count();
        Self {
            width: surface.width(),
            height: surface.height(),
            bits,
            total_pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn total_pixels(&self) -> usize {
        self.total_pixels
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize] == 1
    }
}

/// Renders the glyph in solid black on the offscreen `mask_surface` and thresholds it.
pub fn generate_mask(
    mask_surface: &mut Surface,
    glyphs: &dyn GlyphRasterizer,
    style: &GlyphStyle,
    dpr: f32,
) -> GlyphMask {
    mask_surface.clear();
    glyph::render_glyph(mask_surface, glyphs, style, dpr, Color32::BLACK);
    let mask = GlyphMask::from_surface(mask_surface);
    debug!(
        "Mask for {:?} at {}px: {} of {}x{} pixels",
        style.character,
        style.device_size(dpr),
        mask.total_pixels(),
        mask.width(),
        mask.height()
    );
    mask
}
