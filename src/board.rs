//! The tracing board: three same-sized surfaces and the flow between them.
//!
//! Rendering a letter is split in two so the font can load in between:
//! [`TracingBoard::begin_render`] reserves a mask key, and
//! [`TracingBoard::finish_render`] draws guide and mask for it unless a newer
//! render has started in the meantime. [`TracingBoard::render_letter`] runs
//! both around a [`FontLoader`].

use egui::{Vec2, vec2};
use log::{debug, info};

use crate::coverage::{CoverageEvaluator, MaskKey, SampleStride};
use crate::font::{FontLoader, FontSource};
use crate::glyph::{self, GlyphRasterizer, GlyphStyle};
use crate::input::InputEvent;
use crate::mask::{self, GlyphMask};
use crate::session::{DrawingSession, StrokeOutcome};
use crate::state::{DifficultyLevel, ProgressStore, RoundResult, TracingSettings};
use crate::stroke::StrokeStyle;
use crate::surface::Surface;

/// Drawing, guide and mask rasters for one board size.
///
/// The drawing surface takes logical coordinates and scales them by the
/// device pixel ratio; guide and mask are addressed in device pixels.
#[derive(Debug, Clone)]
pub struct Surfaces {
    pub drawing: Surface,
    pub guide: Surface,
    pub mask: Surface,
    logical_size: Vec2,
    dpr: f32,
}

impl Surfaces {
    pub fn new(logical_size: Vec2, dpr: f32) -> Self {
        let dpr = if dpr > 0.0 { dpr } else { 1.0 };
        let width = (logical_size.x * dpr).round().max(1.0) as u32;
        let height = (logical_size.y * dpr).round().max(1.0) as u32;
        Self {
            drawing: Surface::with_scale(width, height, dpr),
            guide: Surface::new(width, height),
            mask: Surface::new(width, height),
            logical_size,
            dpr,
        }
    }

    pub fn logical_size(&self) -> Vec2 {
        self.logical_size
    }

    pub fn dpr(&self) -> f32 {
        self.dpr
    }

    pub fn device_size(&self) -> [u32; 2] {
        [self.mask.width(), self.mask.height()]
    }
}

/// A letter render waiting for its font.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub key: MaskKey,
    pub style: GlyphStyle,
    pub dpr: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOutcome {
    pub coverage: f32,
    /// Restored strokes already cover the letter.
    pub already_traced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A round passed and the board was cleared for the next one.
    Round { completed_rounds: u32, rounds: u32 },
    /// The letter is done; the host shows its celebration.
    Letter,
}

/// What one pointer event changed.
#[derive(Debug, Clone, Default)]
pub struct BoardUpdate {
    pub outcome: Option<StrokeOutcome>,
    pub coverage: f32,
    pub completion: Option<Completion>,
}

fn stroke_style(settings: &TracingSettings) -> StrokeStyle {
    StrokeStyle::new(settings.stroke_color, settings.stroke_size)
}

pub struct TracingBoard {
    session: DrawingSession<ProgressStore>,
    surfaces: Option<Surfaces>,
    evaluator: CoverageEvaluator,
    celebrating: bool,
}

impl TracingBoard {
    pub fn new(store: ProgressStore) -> Self {
        Self::with_stride(store, SampleStride::default())
    }

    pub fn with_stride(store: ProgressStore, stride: SampleStride) -> Self {
        let style = stroke_style(store.settings());
        Self {
            session: DrawingSession::new(store, style),
            surfaces: None,
            evaluator: CoverageEvaluator::new(stride),
            celebrating: false,
        }
    }

    pub fn store(&self) -> &ProgressStore {
        self.session.store()
    }

    pub fn session(&self) -> &DrawingSession<ProgressStore> {
        &self.session
    }

    pub fn surfaces(&self) -> Option<&Surfaces> {
        self.surfaces.as_ref()
    }

    pub fn evaluator(&self) -> &CoverageEvaluator {
        &self.evaluator
    }

    pub fn coverage(&self) -> f32 {
        self.evaluator.coverage()
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebrating
    }

    /// Coverage the current round has to reach.
    pub fn threshold(&self) -> f32 {
        let store = self.store();
        store
            .settings()
            .threshold_for_round(store.current_progress().current_round)
    }

    /// Reallocates the surfaces. Guide and mask are invalid until the next
    /// render; returns false when the size did not change.
    pub fn resize(&mut self, logical_size: Vec2, dpr: f32) -> bool {
        if self
            .surfaces
            .as_ref()
            .is_some_and(|s| s.logical_size == logical_size && s.dpr == dpr)
        {
            return false;
        }
        debug!("Resizing board to {logical_size:?} at {dpr}x");
        let mut surfaces = Surfaces::new(logical_size, dpr);
        self.session.cancel();
        self.session.redraw(&mut surfaces.drawing);
        self.surfaces = Some(surfaces);
        self.evaluator.invalidate();
        true
    }

    fn glyph_style(&self) -> Option<GlyphStyle> {
        let character = self.store().current_char()?;
        let settings = self.store().settings();
        Some(GlyphStyle {
            character,
            family: settings.font_family.clone(),
            size: settings.font_size,
            weight: settings.font_weight,
        })
    }

    /// Starts rendering the current letter; `None` without surfaces or a letter.
    pub fn begin_render(&mut self) -> Option<RenderRequest> {
        let style = self.glyph_style()?;
        let surfaces = self.surfaces.as_ref()?;
        let [width, height] = surfaces.device_size();
        let key = MaskKey {
            character: style.character,
            family: style.family.clone(),
            size: style.size,
            weight: style.weight,
            width,
            height,
        };
        let dpr = surfaces.dpr;

        self.celebrating = false;
        self.evaluator.reset();
        self.evaluator.request(key.clone());
        Some(RenderRequest { key, style, dpr })
    }

    /// Draws guide and mask for `request`, then restores the stored strokes.
    ///
    /// Returns `None` when the request has been superseded. Without glyphs
    /// (no font could be loaded) the guide stays blank and the mask empty.
    pub fn finish_render(
        &mut self,
        request: &RenderRequest,
        glyphs: Option<&dyn GlyphRasterizer>,
    ) -> Option<RenderOutcome> {
        if !self.evaluator.is_requested(&request.key) {
            debug!("Dropping superseded render of {:?}", request.style.character);
            return None;
        }
        let config = self.store().settings().difficulty_config();
        let has_strokes = !self.store().current_progress().strokes.is_empty();
        let threshold = self.threshold();
        let surfaces = self.surfaces.as_mut()?;
        if surfaces.device_size() != [request.key.width, request.key.height] {
            return None;
        }

        let mask = match glyphs {
            Some(glyphs) => {
                glyph::render_guide(
                    &mut surfaces.guide,
                    glyphs,
                    &request.style,
                    request.dpr,
                    config.guide_opacity,
                );
                if config.show_ruled_lines {
                    glyph::render_ruled_lines(&mut surfaces.guide, glyphs, &request.style, request.dpr);
                }
                mask::generate_mask(&mut surfaces.mask, glyphs, &request.style, request.dpr)
            }
            None => {
                surfaces.guide.clear();
                surfaces.mask.clear();
                GlyphMask::from_surface(&surfaces.mask)
            }
        };
        self.evaluator.install(&request.key, mask);
        self.session.redraw(&mut surfaces.drawing);

        let mut outcome = RenderOutcome {
            coverage: 0.0,
            already_traced: false,
        };
        if has_strokes {
            outcome.coverage = self.evaluator.check(&surfaces.drawing);
            outcome.already_traced = outcome.coverage >= threshold;
            self.celebrating = outcome.already_traced;
        }
        Some(outcome)
    }

    /// Loads the font and renders the current letter.
    pub async fn render_letter<S: FontSource>(&mut self, fonts: &FontLoader<S>) -> Option<RenderOutcome> {
        let request = self.begin_render()?;
        let glyphs = fonts
            .load(&request.style.family, request.style.weight)
            .await;
        self.finish_render(&request, glyphs.as_ref().map(|g| g as &dyn GlyphRasterizer))
    }

    /// Routes a pointer event and scores the letter after each committed stroke.
    pub fn handle_event(&mut self, event: &InputEvent) -> BoardUpdate {
        let outcome = self
            .session
            .handle_event(event, self.surfaces.as_mut().map(|s| &mut s.drawing));
        let mut update = BoardUpdate {
            outcome,
            coverage: self.evaluator.coverage(),
            completion: None,
        };
        if !matches!(update.outcome, Some(StrokeOutcome::Committed(_))) {
            return update;
        }
        let threshold = self.threshold();
        let rounds = self.store().settings().difficulty_config().rounds;
        let Some(surfaces) = self.surfaces.as_mut() else {
            return update;
        };

        update.coverage = self.evaluator.check(&surfaces.drawing);
        if update.coverage < threshold || self.celebrating {
            return update;
        }

        update.completion = Some(match self.session.store_mut().complete_round() {
            RoundResult::LetterCompleted => {
                info!("Letter traced at {:.0}% coverage", update.coverage * 100.0);
                self.celebrating = true;
                Completion::Letter
            }
            RoundResult::RoundAdvanced { round } => {
                surfaces.drawing.clear();
                self.evaluator.reset();
                Completion::Round {
                    completed_rounds: round,
                    rounds,
                }
            }
        });
        update
    }

    fn reset_drawing(&mut self) {
        self.session.cancel();
        self.celebrating = false;
        self.evaluator.reset();
        if let Some(surfaces) = self.surfaces.as_mut() {
            surfaces.drawing.clear();
        }
    }

    /// Wipes the current letter's strokes.
    pub fn clear(&mut self) {
        self.session.store_mut().clear_current_strokes();
        self.reset_drawing();
    }

    /// Jumps to `ch`; render afterwards.
    pub fn set_character(&mut self, ch: char) {
        self.session.store_mut().set_current_char(ch);
        self.evaluator.invalidate();
        self.reset_drawing();
    }

    /// Moves on to the next character. Returns false once the sequence is finished.
    pub fn next(&mut self) -> bool {
        self.session.store_mut().advance_to_next();
        self.evaluator.invalidate();
        self.reset_drawing();
        !self.store().is_finished()
    }

    /// Applies a settings change. Returns true when the letter has to be
    /// rendered again (font or difficulty changed).
    pub fn update_settings(&mut self, update: impl FnOnce(&mut TracingSettings)) -> bool {
        let before = self.store().settings().clone();
        self.session.store_mut().update_settings(update);
        self.settings_changed(&before)
    }

    pub fn set_difficulty(&mut self, level: DifficultyLevel) -> bool {
        let before = self.store().settings().clone();
        self.session.store_mut().set_difficulty(level);
        self.settings_changed(&before)
    }

    fn settings_changed(&mut self, before: &TracingSettings) -> bool {
        let after = self.store().settings();
        let style = stroke_style(after);
        let glyph_changed = before.font_family != after.font_family
            || before.font_size != after.font_size
            || before.font_weight != after.font_weight;
        let difficulty_changed = before.difficulty != after.difficulty;

        self.session.set_style(style);
        if glyph_changed {
            // the old mask belongs to another glyph; score nothing until the next render
            debug!("Glyph settings changed, dropping mask");
            self.evaluator.invalidate();
            self.celebrating = false;
        }
        glyph_changed || difficulty_changed
    }

    /// Starts over from the first character.
    pub fn reset_progress(&mut self) {
        self.session.store_mut().reset_progress();
        self.reset_drawing();
    }
}

impl Default for TracingBoard {
    fn default() -> Self {
        Self::new(ProgressStore::default())
    }
}

/// Logical size of a square board that fits `available`.
pub fn square_board_size(available: Vec2, min: f32, max: f32) -> Vec2 {
    let side = available.x.min(available.y).clamp(min, max);
    vec2(side, side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::testing::BlockGlyphs;

    fn board() -> TracingBoard {
        let mut store = ProgressStore::default();
        store.update_settings(|s| s.font_size = 100.0);
        let mut board = TracingBoard::new(store);
        board.resize(vec2(200.0, 200.0), 1.0);
        board
    }

    #[test]
    fn nothing_renders_without_surfaces() {
        let mut board = TracingBoard::default();
        assert!(board.begin_render().is_none());
        assert_eq!(board.handle_event(&InputEvent::PointerCancel { pointer_id: 0 }).coverage, 0.0);
    }

    #[test]
    fn render_installs_mask_and_guide() {
        let mut board = board();
        let request = board.begin_render().unwrap();
        let outcome = board.finish_render(&request, Some(&BlockGlyphs)).unwrap();
        assert!(!outcome.already_traced);

        let mask = board.evaluator().mask().unwrap();
        assert_eq!(mask.total_pixels(), 50 * 70);
        assert!(!board.surfaces().unwrap().guide.is_blank());
    }

    #[test]
    fn superseded_render_is_dropped() {
        let mut board = board();
        let first = board.begin_render().unwrap();
        board.set_character('B');
        let second = board.begin_render().unwrap();

        assert!(board.finish_render(&first, Some(&BlockGlyphs)).is_none());
        assert!(board.evaluator().mask().is_none());
        assert!(board.finish_render(&second, Some(&BlockGlyphs)).is_some());
    }

    #[test]
    fn missing_font_leaves_an_empty_mask() {
        let mut board = board();
        let request = board.begin_render().unwrap();
        board.finish_render(&request, None).unwrap();
        assert_eq!(board.evaluator().mask().unwrap().total_pixels(), 0);
        assert!(board.surfaces().unwrap().guide.is_blank());
    }

    #[test]
    fn resize_invalidates_the_mask() {
        let mut board = board();
        let request = board.begin_render().unwrap();
        board.finish_render(&request, Some(&BlockGlyphs));
        board.resize(vec2(300.0, 300.0), 2.0);
        assert!(board.evaluator().mask().is_none());
        assert_eq!(board.surfaces().unwrap().device_size(), [600, 600]);
        assert!(board.finish_render(&request, Some(&BlockGlyphs)).is_none());
    }

    #[test]
    fn settings_that_change_the_glyph_ask_for_a_render() {
        let mut board = board();
        assert!(!board.update_settings(|s| s.stroke_size = 30.0));
        assert_eq!(board.session().style().size, 30.0);
        assert!(board.update_settings(|s| s.font_size = 120.0));
        assert!(board.set_difficulty(DifficultyLevel::Advanced));
        assert_eq!(board.session().style().size, 16.0);
    }

    #[test]
    fn board_fits_the_smaller_side() {
        assert_eq!(square_board_size(vec2(900.0, 500.0), 300.0, 700.0), vec2(500.0, 500.0));
        assert_eq!(square_board_size(vec2(200.0, 500.0), 300.0, 700.0), vec2(300.0, 300.0));
    }
}
