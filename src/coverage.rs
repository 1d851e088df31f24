use log::debug;

use crate::mask::{ALPHA_THRESHOLD, GlyphMask};
use crate::surface::Surface;

/// Stride used when none is configured.
pub const DEFAULT_STRIDE: u32 = 4;

/// Samples per axis the adaptive stride aims for.
const ADAPTIVE_TARGET_SAMPLES: u32 = 125;

/// Fraction of mask pixels (sampled every `stride` pixels on both axes)
/// that carry ink on the drawing surface.
///
/// Returns 0 for an empty mask, for a surface whose size differs from the
/// mask, or when no sampled pixel falls inside the mask.
pub fn calculate_coverage(surface: &Surface, mask: &GlyphMask, stride: u32) -> f32 {
    if mask.total_pixels() == 0 {
        return 0.0;
    }
    if surface.width() != mask.width() || surface.height() != mask.height() {
        return 0.0;
    }

    let stride = stride.max(1) as usize;
    let width = mask.width() as usize;
    let pixels = surface.image().as_raw();
    let bits = mask.bits();

    let mut total_sampled = 0usize;
    let mut covered_sampled = 0usize;
    for y in (0..mask.height() as usize).step_by(stride) {
        for x in (0..width).step_by(stride) {
            let idx = y * width + x;
            if bits[idx] == 0 {
                continue;
            }
            total_sampled += 1;
            if pixels[idx * 4 + 3] > ALPHA_THRESHOLD {
                covered_sampled += 1;
            }
        }
    }

    if total_sampled == 0 {
        return 0.0;
    }
    covered_sampled as f32 / total_sampled as f32
}

/// How densely coverage is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStride {
    /// Every `n`th pixel on both axes.
    Fixed(u32),
    /// Grows with the surface so high-DPR surfaces cost about the same to check.
    Adaptive,
}

impl Default for SampleStride {
    fn default() -> Self {
        SampleStride::Fixed(DEFAULT_STRIDE)
    }
}

impl SampleStride {
    pub fn resolve(self, width: u32, height: u32) -> u32 {
        match self {
            SampleStride::Fixed(n) => n.max(1),
            SampleStride::Adaptive => width.max(height).div_ceil(ADAPTIVE_TARGET_SAMPLES).max(1),
        }
    }
}

/// Identifies what a mask was generated for.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskKey {
    pub character: char,
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub width: u32,
    pub height: u32,
}

/// Holds the active glyph mask and the last coverage value shown to the user.
#[derive(Debug, Default)]
pub struct CoverageEvaluator {
    active: Option<(MaskKey, GlyphMask)>,
    requested: Option<MaskKey>,
    coverage: f32,
    stride: SampleStride,
}

impl CoverageEvaluator {
    pub fn new(stride: SampleStride) -> Self {
        Self {
            stride,
            ..Default::default()
        }
    }

    pub fn stride(&self) -> SampleStride {
        self.stride
    }

    /// Announces the mask about to be generated. An active mask for a
    /// different key is dropped so stale shapes are never scored.
    pub fn request(&mut self, key: MaskKey) {
        if self.active.as_ref().is_some_and(|(active, _)| *active != key) {
            self.active = None;
            self.coverage = 0.0;
        }
        self.requested = Some(key);
    }

    pub fn is_requested(&self, key: &MaskKey) -> bool {
        self.requested.as_ref() == Some(key)
    }

    /// Installs a generated mask. Returns false (and drops the mask) when a
    /// newer request has superseded `key`.
    pub fn install(&mut self, key: &MaskKey, mask: GlyphMask) -> bool {
        if !self.is_requested(key) {
            debug!("Discarding stale mask for {:?}", key.character);
            return false;
        }
        self.active = Some((key.clone(), mask));
        true
    }

    /// Forgets the mask and any pending request, e.g. after a resize.
    pub fn invalidate(&mut self) {
        self.active = None;
        self.requested = None;
        self.coverage = 0.0;
    }

    pub fn mask(&self) -> Option<&GlyphMask> {
        self.active.as_ref().map(|(_, mask)| mask)
    }

    /// Recomputes coverage of `surface`; 0 while no mask is installed.
    pub fn check(&mut self, surface: &Surface) -> f32 {
        self.coverage = match &self.active {
            Some((_, mask)) => {
                let stride = self.stride.resolve(mask.width(), mask.height());
                calculate_coverage(surface, mask, stride)
            }
            None => 0.0,
        };
        self.coverage
    }

    /// Zeroes the displayed value; the mask stays.
    pub fn reset(&mut self) {
        self.coverage = 0.0;
    }

    pub fn coverage(&self) -> f32 {
        self.coverage
    }
}
