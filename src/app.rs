use egui::{Color32, ColorImage, Rect, Sense, TextureHandle, TextureOptions, pos2};
use futures::executor::block_on;
use futures::future::{self, LocalBoxFuture};
use log::warn;
use std::time::Duration;

use crate::board::{Completion, TracingBoard, square_board_size};
use crate::font::{BuiltinFontSource, FontLoader};
use crate::glyph::FontGlyphs;
use crate::input::InputHandler;
use crate::state::{self, DifficultyLevel, ProgressStore, STORAGE_KEY};
use crate::surface::Surface;

const MIN_BOARD_SIZE: f32 = 300.0;
const MAX_BOARD_SIZE: f32 = 700.0;

fn blocking_sleep(delay: Duration) -> LocalBoxFuture<'static, ()> {
    std::thread::sleep(delay);
    Box::pin(future::ready(()))
}

fn to_color_image(surface: &Surface) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [surface.width() as usize, surface.height() as usize],
        surface.image().as_raw(),
    )
}

/// Guide and drawing textures, uploaded whenever the surfaces change.
struct BoardTextures {
    guide: TextureHandle,
    drawing: TextureHandle,
}

pub struct TraceApp {
    board: TracingBoard,
    fonts: FontLoader<BuiltinFontSource>,
    input: InputHandler,
    textures: Option<BoardTextures>,
    needs_render: bool,
    dirty: bool,
    status: Option<String>,
}

impl TraceApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let saved = cc
            .storage
            .and_then(|storage| storage.get_string(STORAGE_KEY))
            .and_then(|json| match state::load_json(&json) {
                Ok(state) => Some(state),
                Err(err) => {
                    warn!("Ignoring saved progress: {err}");
                    None
                }
            })
            .unwrap_or_default();

        let mut fonts = FontLoader::new(BuiltinFontSource, blocking_sleep);
        if let Some(glyphs) = FontGlyphs::builtin() {
            fonts = fonts.with_fallback(glyphs);
        }

        Self {
            board: TracingBoard::new(ProgressStore::new(saved)),
            fonts,
            input: InputHandler::new(Rect::NOTHING),
            textures: None,
            needs_render: true,
            dirty: true,
            status: None,
        }
    }

    fn upload_textures(&mut self, ctx: &egui::Context) {
        let Some(surfaces) = self.board.surfaces() else {
            return;
        };
        let guide = to_color_image(&surfaces.guide);
        let drawing = to_color_image(&surfaces.drawing);
        match &mut self.textures {
            Some(textures) => {
                textures.guide.set(guide, TextureOptions::LINEAR);
                textures.drawing.set(drawing, TextureOptions::LINEAR);
            }
            None => {
                self.textures = Some(BoardTextures {
                    guide: ctx.load_texture("guide", guide, TextureOptions::LINEAR),
                    drawing: ctx.load_texture("drawing", drawing, TextureOptions::LINEAR),
                });
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(ch) = self.board.store().current_char() {
                ui.heading(ch.to_string());
            }
            ui.label(format!(
                "{:.0}% of {:.0}%",
                self.board.coverage() * 100.0,
                self.board.threshold() * 100.0
            ));

            if ui.button("Clear").clicked() {
                self.board.clear();
                self.status = None;
                self.dirty = true;
            }
            if ui
                .add_enabled(self.board.is_celebrating(), egui::Button::new("Next"))
                .clicked()
            {
                self.board.next();
                self.status = None;
                self.needs_render = true;
            }

            let mut level = self.board.store().settings().difficulty;
            egui::ComboBox::from_label("Level")
                .selected_text(format!("{level:?}"))
                .show_ui(ui, |ui| {
                    for option in [
                        DifficultyLevel::Beginner,
                        DifficultyLevel::Intermediate,
                        DifficultyLevel::Advanced,
                    ] {
                        ui.selectable_value(&mut level, option, format!("{option:?}"));
                    }
                });
            if level != self.board.store().settings().difficulty && self.board.set_difficulty(level) {
                self.needs_render = true;
            }
        });

        if let Some(status) = &self.status {
            ui.label(status);
        }
    }

    fn finished(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("Every letter traced!");
            if ui.button("Start over").clicked() {
                self.board.reset_progress();
                self.needs_render = true;
            }
        });
    }
}

impl eframe::App for TraceApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match state::save_json(self.board.store().state()) {
            Ok(json) => storage.set_string(STORAGE_KEY, json),
            Err(err) => warn!("Could not save progress: {err}"),
        }
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.board.store().is_finished() {
                self.finished(ui);
                return;
            }
            self.toolbar(ui);

            let size = square_board_size(ui.available_size(), MIN_BOARD_SIZE, MAX_BOARD_SIZE);
            let (rect, _response) = ui.allocate_exact_size(size, Sense::drag());
            if self.board.resize(size, ctx.pixels_per_point()) {
                self.needs_render = true;
            }

            if self.needs_render {
                self.needs_render = false;
                self.dirty = true;
                if let Some(outcome) = block_on(self.board.render_letter(&self.fonts)) {
                    if outcome.already_traced {
                        self.status = Some("Already traced!".to_owned());
                    }
                }
            }

            self.input.set_canvas_rect(rect);
            for event in self.input.process_input(ctx) {
                let update = self.board.handle_event(&event);
                self.dirty = true;
                match update.completion {
                    Some(Completion::Round {
                        completed_rounds,
                        rounds,
                    }) => {
                        self.status = Some(format!("Round {completed_rounds} of {rounds} done"));
                    }
                    Some(Completion::Letter) => self.status = Some("Amazing!".to_owned()),
                    None => {}
                }
            }

            if self.dirty {
                self.dirty = false;
                self.upload_textures(ctx);
            }

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 8.0, Color32::WHITE);
            if let Some(textures) = &self.textures {
                let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                painter.image(textures.guide.id(), rect, uv, Color32::WHITE);
                painter.image(textures.drawing.id(), rect, uv, Color32::WHITE);
            }
        });
    }
}
