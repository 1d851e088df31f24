use egui::{Context, Event, PointerButton, Pos2, Rect, TouchPhase};

use crate::stroke::{DEFAULT_PRESSURE, StrokePoint};

/// Pointer id used for the mouse; touches are numbered after it.
pub const MOUSE_POINTER_ID: u64 = 0;

/// The kind of device behind a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// One pointer report, in coordinates local to the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: u64,
    pub kind: PointerKind,
    pub button: PointerButton,
    pub position: Pos2,
    /// Device pressure; `None` (or zero) when the device does not report any.
    pub pressure: Option<f32>,
    /// Seconds on a monotonic clock.
    pub time: f64,
}

impl PointerSample {
    pub fn stroke_point(&self) -> StrokePoint {
        let pressure = self
            .pressure
            .filter(|p| *p > 0.0)
            .unwrap_or(DEFAULT_PRESSURE);
        StrokePoint::new(self.position.x, self.position.y, pressure)
    }
}

/// Pointer events as the drawing session consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerSample),
    PointerMove(PointerSample),
    PointerUp(PointerSample),
    /// The pointer left the drawing surface.
    PointerLeave(PointerSample),
    /// The platform took the pointer away (e.g. a cancelled touch).
    PointerCancel { pointer_id: u64 },
}

impl InputEvent {
    pub fn pointer_id(&self) -> u64 {
        match self {
            InputEvent::PointerDown(sample)
            | InputEvent::PointerMove(sample)
            | InputEvent::PointerUp(sample)
            | InputEvent::PointerLeave(sample) => sample.pointer_id,
            InputEvent::PointerCancel { pointer_id } => *pointer_id,
        }
    }
}

/// Turns raw egui input into [`InputEvent`]s for one canvas rectangle.
///
/// egui events do not say whether a touch came from a finger or a stylus, so
/// everything here is reported as [`PointerKind::Mouse`] or
/// [`PointerKind::Touch`] and strokes use simulated pressure. Hosts that know
/// the device is a pen build [`PointerSample`]s with [`PointerKind::Pen`]
/// themselves to get real pressure.
pub struct InputHandler {
    canvas_rect: Rect,
    last_mouse_pos: Option<Pos2>,
    mouse_inside: bool,
}

impl InputHandler {
    pub fn new(canvas_rect: Rect) -> Self {
        Self {
            canvas_rect,
            last_mouse_pos: None,
            mouse_inside: false,
        }
    }

    /// Update the canvas rectangle (e.g. if window is resized)
    pub fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = rect;
    }

    fn local(&self, pos: Pos2) -> Pos2 {
        (pos - self.canvas_rect.min).to_pos2()
    }

    fn mouse_sample(&self, pos: Pos2, button: PointerButton, time: f64) -> PointerSample {
        PointerSample {
            pointer_id: MOUSE_POINTER_ID,
            kind: PointerKind::Mouse,
            button,
            position: self.local(pos),
            pressure: None,
            time,
        }
    }

    /// Process raw egui input and generate our InputEvents
    pub fn process_input(&mut self, ctx: &Context) -> Vec<InputEvent> {
        ctx.input(|input| self.process_events(&input.events, input.time))
    }

    pub fn process_events(&mut self, raw: &[Event], time: f64) -> Vec<InputEvent> {
        let mut events = Vec::new();

        // egui mirrors the first touch as mouse events; use the touch stream when present
        let has_touch = raw.iter().any(|event| matches!(event, Event::Touch { .. }));

        for event in raw {
            match event {
                Event::Touch { id, phase, pos, force, .. } => {
                    let sample = PointerSample {
                        pointer_id: id.0 + 1,
                        kind: PointerKind::Touch,
                        button: PointerButton::Primary,
                        position: self.local(*pos),
                        pressure: *force,
                        time,
                    };
                    match phase {
                        TouchPhase::Start if self.canvas_rect.contains(*pos) => {
                            events.push(InputEvent::PointerDown(sample));
                        }
                        TouchPhase::Start => {}
                        TouchPhase::Move => events.push(InputEvent::PointerMove(sample)),
                        TouchPhase::End => events.push(InputEvent::PointerUp(sample)),
                        TouchPhase::Cancel => events.push(InputEvent::PointerCancel {
                            pointer_id: sample.pointer_id,
                        }),
                    }
                }
                _ if has_touch => {}
                Event::PointerMoved(pos) => {
                    let inside = self.canvas_rect.contains(*pos);
                    let sample = self.mouse_sample(*pos, PointerButton::Primary, time);
                    if inside {
                        events.push(InputEvent::PointerMove(sample));
                    } else if self.mouse_inside {
                        events.push(InputEvent::PointerLeave(sample));
                    }
                    self.mouse_inside = inside;
                    self.last_mouse_pos = Some(*pos);
                }
                Event::PointerButton { pos, button, pressed, .. } => {
                    let sample = self.mouse_sample(*pos, *button, time);
                    if !*pressed {
                        events.push(InputEvent::PointerUp(sample));
                    } else if self.canvas_rect.contains(*pos) {
                        events.push(InputEvent::PointerDown(sample));
                    }
                }
                Event::PointerGone => {
                    if let Some(pos) = self.last_mouse_pos.take() {
                        if self.mouse_inside {
                            events.push(InputEvent::PointerLeave(self.mouse_sample(
                                pos,
                                PointerButton::Primary,
                                time,
                            )));
                        }
                    }
                    self.mouse_inside = false;
                }
                _ => {}
            }
        }

        events
    }
}
