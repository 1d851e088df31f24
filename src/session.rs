//! The pointer lifecycle of one drawing surface.
//!
//! ```text
//!  ┌──────────┐  primary down   ┌─────────────┐
//!  │          ├─────────────────►             │ move: append + live render
//!  │   Idle   │                 │   Drawing   ├──────┐
//!  │          ◄─────────────────┤             ◄──────┘
//!  └──────────┘  up/leave/cancel└─────────────┘
//!                 (commit or filter)
//! ```
//!
//! Only the pointer that started a stroke can extend or end it. Gestures
//! with fewer than [`MIN_STROKE_POINTS`] points or shorter than
//! [`MIN_STROKE_DURATION_SECS`] are treated as accidental taps and dropped.

use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

use crate::input::{InputEvent, PointerKind, PointerSample};
use crate::renderer;
use crate::stroke::{PressureMode, StrokeBuilder, StrokeRef, StrokeStyle};
use crate::surface::Surface;

pub const MIN_STROKE_POINTS: usize = 3;
pub const MIN_STROKE_DURATION_SECS: f64 = 0.050;

/// Storage for the committed strokes of the character being traced.
pub trait StrokeStore {
    fn strokes(&self) -> Vec<StrokeRef>;
    fn add_stroke(&mut self, stroke: StrokeRef);
    fn clear_strokes(&mut self);
}

impl StrokeStore for Vec<StrokeRef> {
    fn strokes(&self) -> Vec<StrokeRef> {
        self.clone()
    }

    fn add_stroke(&mut self, stroke: StrokeRef) {
        self.push(stroke);
    }

    fn clear_strokes(&mut self) {
        self.clear();
    }
}

impl<T: StrokeStore> StrokeStore for Rc<RefCell<T>> {
    fn strokes(&self) -> Vec<StrokeRef> {
        self.borrow().strokes()
    }

    fn add_stroke(&mut self, stroke: StrokeRef) {
        self.borrow_mut().add_stroke(stroke);
    }

    fn clear_strokes(&mut self) {
        self.borrow_mut().clear_strokes();
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Drawing {
        pointer_id: u64,
        kind: PointerKind,
        started_at: f64,
        last_time: f64,
        builder: StrokeBuilder,
    },
}

/// What a finished gesture turned into.
#[derive(Debug, Clone)]
pub enum StrokeOutcome {
    /// Too short; nothing was stored.
    Filtered,
    Committed(StrokeRef),
}

type StrokeCallback = Box<dyn FnMut(&StrokeRef)>;

pub struct DrawingSession<S> {
    store: S,
    style: StrokeStyle,
    state: SessionState,
    on_stroke_end: Option<StrokeCallback>,
}

impl<S: StrokeStore> DrawingSession<S> {
    pub fn new(store: S, style: StrokeStyle) -> Self {
        Self {
            store,
            style,
            state: SessionState::Idle,
            on_stroke_end: None,
        }
    }

    /// Called after every committed stroke, once the surface shows it.
    pub fn on_stroke_end(&mut self, callback: impl FnMut(&StrokeRef) + 'static) {
        self.on_stroke_end = Some(Box::new(callback));
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, SessionState::Drawing { .. })
    }

    /// The pointer that owns the stroke in progress.
    pub fn captured_pointer(&self) -> Option<u64> {
        match &self.state {
            SessionState::Drawing { pointer_id, .. } => Some(*pointer_id),
            SessionState::Idle => None,
        }
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    /// Style for strokes started from now on; a stroke in progress keeps its own.
    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    /// Routes one pointer event. `surface` is `None` while the board has no
    /// surfaces yet; the gesture is still tracked but nothing is painted.
    pub fn handle_event(&mut self, event: &InputEvent, surface: Option<&mut Surface>) -> Option<StrokeOutcome> {
        if self.captured_pointer().is_some_and(|id| id != event.pointer_id()) {
            return None;
        }
        match event {
            InputEvent::PointerDown(sample) => {
                self.pointer_down(sample);
                None
            }
            InputEvent::PointerMove(sample) => {
                self.pointer_move(sample, surface);
                None
            }
            InputEvent::PointerUp(sample) | InputEvent::PointerLeave(sample) => {
                self.pointer_up(sample.pointer_id, sample.time, surface)
            }
            InputEvent::PointerCancel { pointer_id } => {
                // no timestamp on cancel; the last move stands in
                let time = match &self.state {
                    SessionState::Drawing { last_time, .. } => *last_time,
                    SessionState::Idle => return None,
                };
                self.pointer_up(*pointer_id, time, surface)
            }
        }
    }

    pub fn pointer_down(&mut self, sample: &PointerSample) {
        if self.is_drawing() || sample.button != egui::PointerButton::Primary {
            return;
        }
        let pressure = if sample.kind == PointerKind::Pen {
            PressureMode::Real
        } else {
            PressureMode::Simulated
        };
        let mut builder = StrokeBuilder::new(self.style.clone(), pressure);
        builder.add_point(sample.stroke_point());
        self.state = SessionState::Drawing {
            pointer_id: sample.pointer_id,
            kind: sample.kind,
            started_at: sample.time,
            last_time: sample.time,
            builder,
        };
    }

    pub fn pointer_move(&mut self, sample: &PointerSample, surface: Option<&mut Surface>) {
        let SessionState::Drawing {
            pointer_id,
            last_time,
            builder,
            ..
        } = &mut self.state
        else {
            return;
        };
        if *pointer_id != sample.pointer_id {
            return;
        }
        *last_time = sample.time;
        builder.add_point(sample.stroke_point());

        if let Some(surface) = surface {
            renderer::replay(surface, &self.store.strokes());
            renderer::render_live_stroke(surface, builder.points(), builder.style(), builder.pressure_mode());
        }
    }

    /// Ends the gesture of `pointer_id`, committing it unless it is too short.
    pub fn pointer_up(&mut self, pointer_id: u64, time: f64, surface: Option<&mut Surface>) -> Option<StrokeOutcome> {
        if self.captured_pointer() != Some(pointer_id) {
            return None;
        }
        let SessionState::Drawing { started_at, builder, .. } = std::mem::take(&mut self.state) else {
            return None;
        };

        let duration = time - started_at;
        if builder.len() < MIN_STROKE_POINTS || duration < MIN_STROKE_DURATION_SECS {
            debug!(
                "Dropping gesture with {} points over {:.0}ms",
                builder.len(),
                duration * 1000.0
            );
            if let Some(surface) = surface {
                renderer::replay(surface, &self.store.strokes());
            }
            return Some(StrokeOutcome::Filtered);
        }

        let stroke = builder.finish();
        debug!("Committing stroke with {} points", stroke.points().len());
        self.store.add_stroke(stroke.clone());
        if let Some(surface) = surface {
            renderer::replay(surface, &self.store.strokes());
        }
        if let Some(callback) = &mut self.on_stroke_end {
            callback(&stroke);
        }
        Some(StrokeOutcome::Committed(stroke))
    }

    /// Abandons any gesture in progress without touching the store.
    pub fn cancel(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Repaints the committed strokes.
    pub fn redraw(&self, surface: &mut Surface) {
        renderer::replay(surface, &self.store.strokes());
    }
}
