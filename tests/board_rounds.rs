use egui::{Color32, PointerButton, Pos2, Rect, pos2, vec2};
use glyph_trace::board::{Completion, TracingBoard};
use glyph_trace::glyph::{GlyphRasterizer, InkExtent};
use glyph_trace::input::{InputEvent, PointerKind, PointerSample};
use glyph_trace::state::{DifficultyLevel, ProgressStore};
use glyph_trace::{StrokeOutcome, Surface};

/// Every glyph is a solid block half as wide and 0.7 times as tall as the font size.
struct BlockGlyphs;

impl GlyphRasterizer for BlockGlyphs {
    fn draw_centered(&self, surface: &mut Surface, _ch: char, center: Pos2, px_size: f32, color: Color32) {
        surface.fill_rect(Rect::from_center_size(center, vec2(px_size * 0.5, px_size * 0.7)), color);
    }

    fn ink_extent(&self, _ch: char, px_size: f32) -> Option<InkExtent> {
        Some(InkExtent {
            ascent: px_size * 0.35,
            descent: px_size * 0.35,
        })
    }
}

fn pen(x: f32, y: f32, time: f64) -> PointerSample {
    PointerSample {
        pointer_id: 1,
        kind: PointerKind::Pen,
        button: PointerButton::Primary,
        position: pos2(x, y),
        pressure: Some(1.0),
        time,
    }
}

fn create_board(level: DifficultyLevel, dpr: f32) -> TracingBoard {
    let mut store = ProgressStore::default();
    store.set_difficulty(level);
    store.update_settings(|s| {
        s.font_size = 40.0;
        s.stroke_size = 40.0;
    });
    let mut board = TracingBoard::new(store);
    board.resize(vec2(200.0, 200.0), dpr);
    render(&mut board);
    board
}

fn render(board: &mut TracingBoard) -> glyph_trace::board::RenderOutcome {
    let request = board.begin_render().unwrap();
    board.finish_render(&request, Some(&BlockGlyphs)).unwrap()
}

/// A horizontal pen stroke across the board at height `y`.
fn trace_line(board: &mut TracingBoard, y: f32) -> glyph_trace::BoardUpdate {
    board.handle_event(&InputEvent::PointerDown(pen(50.0, y, 0.0)));
    for i in 1..=10 {
        board.handle_event(&InputEvent::PointerMove(pen(50.0 + i as f32 * 10.0, y, i as f64 * 0.02)));
    }
    board.handle_event(&InputEvent::PointerUp(pen(150.0, y, 0.25)))
}

#[test]
fn test_covering_stroke_completes_letter_once() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);

    let update = trace_line(&mut board, 100.0);
    assert!(matches!(update.outcome, Some(StrokeOutcome::Committed(_))));
    assert_eq!(update.coverage, 1.0);
    assert_eq!(update.completion, Some(Completion::Letter));
    assert!(board.is_celebrating());
    assert!(board.store().letter_progress('A').completed);

    // more ink over a completed letter does not complete it again
    let update = trace_line(&mut board, 95.0);
    assert_eq!(update.completion, None);
    assert_eq!(board.store().letter_progress('A').strokes.len(), 2);
}

#[test]
fn test_stroke_away_from_letter_scores_nothing() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);
    let update = trace_line(&mut board, 165.0);
    assert_eq!(update.coverage, 0.0);
    assert_eq!(update.completion, None);
    assert!(!board.is_celebrating());
}

#[test]
fn test_rounds_clear_the_board_between_attempts() {
    let mut board = create_board(DifficultyLevel::Intermediate, 1.0);

    let update = trace_line(&mut board, 100.0);
    assert_eq!(
        update.completion,
        Some(Completion::Round {
            completed_rounds: 1,
            rounds: 2
        })
    );
    assert!(board.surfaces().unwrap().drawing.is_blank());
    assert_eq!(board.coverage(), 0.0);
    assert!(board.store().letter_progress('A').strokes.is_empty());
    assert!(!board.is_celebrating());

    let update = trace_line(&mut board, 100.0);
    assert_eq!(update.completion, Some(Completion::Letter));
    let progress = board.store().letter_progress('A');
    assert!(progress.completed);
    assert_eq!(progress.completed_rounds, 2);
}

#[test]
fn test_advanced_level_draws_ruled_lines_instead_of_glyph() {
    let board = create_board(DifficultyLevel::Advanced, 1.0);
    let guide = &board.surfaces().unwrap().guide;
    // no faded glyph inside the letter box, but a baseline under it
    assert_eq!(guide.alpha_at(100, 95), 0);
    assert!(guide.alpha_at(5, 114) > 0);
    assert_eq!(board.threshold(), 0.85);
}

#[test]
fn test_clear_resets_coverage_and_strokes() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);
    trace_line(&mut board, 100.0);

    board.clear();
    assert_eq!(board.coverage(), 0.0);
    assert!(!board.is_celebrating());
    assert!(board.surfaces().unwrap().drawing.is_blank());
    let progress = board.store().letter_progress('A');
    assert!(progress.strokes.is_empty());
    assert!(!progress.completed);
}

#[test]
fn test_revisiting_a_traced_letter_restores_it() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);
    trace_line(&mut board, 100.0);
    let traced = board.surfaces().unwrap().drawing.image().clone();

    board.set_character('B');
    let outcome = render(&mut board);
    assert!(!outcome.already_traced);
    assert!(board.surfaces().unwrap().drawing.is_blank());

    board.set_character('A');
    let outcome = render(&mut board);
    assert!(outcome.already_traced);
    assert_eq!(outcome.coverage, 1.0);
    assert!(board.is_celebrating());
    assert_eq!(board.surfaces().unwrap().drawing.image(), &traced);
}

#[test]
fn test_font_size_change_regenerates_mask() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);
    assert_eq!(board.evaluator().mask().unwrap().total_pixels(), 20 * 28);

    assert!(board.update_settings(|s| s.font_size = 80.0));
    render(&mut board);
    assert_eq!(board.evaluator().mask().unwrap().total_pixels(), 40 * 56);
}

#[test]
fn test_high_dpi_board_keeps_mask_and_ink_aligned() {
    let mut board = create_board(DifficultyLevel::Beginner, 2.0);
    assert_eq!(board.surfaces().unwrap().device_size(), [400, 400]);
    assert_eq!(board.evaluator().mask().unwrap().total_pixels(), 40 * 56);

    let update = trace_line(&mut board, 100.0);
    assert_eq!(update.coverage, 1.0);
    assert_eq!(update.completion, Some(Completion::Letter));
}

#[test]
fn test_next_walks_to_the_end() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);
    board.set_character('9');
    assert!(!board.next());
    assert!(board.store().is_finished());
    assert!(board.begin_render().is_none());

    board.reset_progress();
    assert_eq!(board.store().current_char(), Some('A'));
}

#[test]
fn test_font_change_drops_the_old_mask_before_rerender() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);
    assert!(board.update_settings(|s| s.font_size = 160.0));
    assert!(board.evaluator().mask().is_none());

    // a stroke that fully covered the old 40px glyph scores nothing yet
    let update = trace_line(&mut board, 100.0);
    assert!(matches!(update.outcome, Some(StrokeOutcome::Committed(_))));
    assert_eq!(update.coverage, 0.0);
    assert_eq!(update.completion, None);
    assert!(!board.is_celebrating());
    assert!(!board.store().letter_progress('A').completed);

    render(&mut board);
    assert_eq!(board.evaluator().mask().unwrap().total_pixels(), 80 * 112);
}

#[test]
fn test_stroke_size_change_keeps_the_mask() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);
    assert!(!board.update_settings(|s| s.stroke_size = 12.0));
    assert!(board.evaluator().mask().is_some());
}

/// A pen stroke straight across the board at height `y`, `size` wide.
fn trace_band(board: &mut TracingBoard, y: f32, size: f32) -> glyph_trace::BoardUpdate {
    board.update_settings(|s| s.stroke_size = size);
    board.handle_event(&InputEvent::PointerDown(pen(0.0, y, 0.0)));
    for i in 1..=10 {
        board.handle_event(&InputEvent::PointerMove(pen(i as f32 * 20.0, y, i as f64 * 0.02)));
    }
    board.handle_event(&InputEvent::PointerUp(pen(200.0, y, 0.25)))
}

#[test]
fn test_completion_fires_once_when_partial_coverage_crosses_threshold() {
    let mut board = create_board(DifficultyLevel::Beginner, 1.0);
    // a 100x140 block from (50, 30) to (150, 170): 25 x 35 samples at stride 4
    board.update_settings(|s| s.font_size = 200.0);
    render(&mut board);
    assert_eq!(board.threshold(), 0.9);

    // a pen at full pressure inks 0.85 * size on each side of the line
    // rows 32..=148 covered: 30 of 35
    let update = trace_band(&mut board, 82.0, 80.0);
    assert_eq!(update.coverage, 30.0 / 35.0);
    assert!(update.coverage < board.threshold());
    assert_eq!(update.completion, None);
    assert!(!board.is_celebrating());

    // rows up to 160 covered: 33 of 35
    let update = trace_band(&mut board, 145.0, 20.0);
    assert_eq!(update.coverage, 33.0 / 35.0);
    assert!(update.coverage < 1.0);
    assert_eq!(update.completion, Some(Completion::Letter));
    assert!(board.is_celebrating());

    // the rest of the letter does not complete it again
    let update = trace_band(&mut board, 160.0, 20.0);
    assert_eq!(update.coverage, 1.0);
    assert_eq!(update.completion, None);
    assert!(board.store().letter_progress('A').completed);
    assert_eq!(board.store().letter_progress('A').completed_rounds, 1);
}
