#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod board;
pub mod chars;
pub mod color;
pub mod coverage;
pub mod font;
pub mod freehand;
pub mod glyph;
pub mod input;
pub mod mask;
pub mod path;
pub mod renderer;
pub mod session;
pub mod state;
pub mod stroke;
pub mod surface;

pub use app::TraceApp;
pub use board::{BoardUpdate, Completion, TracingBoard};
pub use coverage::{CoverageEvaluator, SampleStride, calculate_coverage};
pub use font::{FontError, FontLoader, FontSource};
pub use glyph::{FontGlyphs, GlyphRasterizer, GlyphStyle};
pub use input::{InputEvent, PointerKind, PointerSample};
pub use mask::{GlyphMask, generate_mask};
pub use session::{DrawingSession, StrokeOutcome, StrokeStore};
pub use state::{PersistedState, ProgressStore, TracingSettings};
pub use stroke::{PressureMode, Stroke, StrokePoint, StrokeRef};
pub use surface::Surface;
