use egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::color;

/// Pressure used when the input device reports none.
pub const DEFAULT_PRESSURE: f32 = 0.5;

/// One pointer sample in surface-local logical pixels.
///
/// Serialized as a `[x, y, pressure]` triple, the shape persisted progress uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
}

impl StrokePoint {
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self {
            x,
            y,
            pressure: pressure.clamp(0.0, 1.0),
        }
    }

    pub fn pos(&self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }

    pub(crate) fn lerp(&self, other: &StrokePoint, t: f32) -> StrokePoint {
        StrokePoint {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            pressure: self.pressure + (other.pressure - self.pressure) * t,
        }
    }
}

impl From<[f32; 3]> for StrokePoint {
    fn from([x, y, pressure]: [f32; 3]) -> Self {
        Self::new(x, y, pressure)
    }
}

impl From<StrokePoint> for [f32; 3] {
    fn from(point: StrokePoint) -> Self {
        [point.x, point.y, point.pressure]
    }
}

/// Where a stroke's width variation comes from.
///
/// Decided once when the stroke is created: pens report genuine pressure,
/// fingers and mice do not, so their pressure is synthesized from point
/// spacing instead. Persisted as the `simulatePressure` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum PressureMode {
    Real,
    Simulated,
}

impl PressureMode {
    pub fn is_simulated(self) -> bool {
        matches!(self, PressureMode::Simulated)
    }
}

impl From<bool> for PressureMode {
    fn from(simulate: bool) -> Self {
        if simulate {
            PressureMode::Simulated
        } else {
            PressureMode::Real
        }
    }
}

impl From<PressureMode> for bool {
    fn from(mode: PressureMode) -> Self {
        mode.is_simulated()
    }
}

/// Rendering parameters captured when a stroke starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    /// Base width in logical pixels.
    pub size: f32,
    /// 0 = uniform width, 1 = widest thin-to-thick range.
    pub thinning: f32,
}

impl StrokeStyle {
    pub const DEFAULT_THINNING: f32 = 0.7;

    pub fn new(color: Color32, size: f32) -> Self {
        Self {
            color,
            size,
            thinning: Self::DEFAULT_THINNING,
        }
    }
}

// Immutable stroke, appended to a character's stroke list once finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    points: Vec<StrokePoint>,
    #[serde(with = "color::css_hex")]
    color: Color32,
    size: f32,
    thinning: f32,
    #[serde(rename = "simulatePressure")]
    pressure: PressureMode,
}

// Strokes are shared between the progress store and replay
pub type StrokeRef = Arc<Stroke>;

impl Stroke {
    pub fn new(points: Vec<StrokePoint>, style: StrokeStyle, pressure: PressureMode) -> Self {
        Self {
            points,
            color: style.color,
            size: style.size,
            thinning: style.thinning,
            pressure,
        }
    }

    pub fn new_ref(points: Vec<StrokePoint>, style: StrokeStyle, pressure: PressureMode) -> StrokeRef {
        Arc::new(Self::new(points, style, pressure))
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn thinning(&self) -> f32 {
        self.thinning
    }

    pub fn pressure_mode(&self) -> PressureMode {
        self.pressure
    }

    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color,
            size: self.size,
            thinning: self.thinning,
        }
    }
}

/// Point buffer for the gesture currently being drawn.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    points: Vec<StrokePoint>,
    style: StrokeStyle,
    pressure: PressureMode,
}

impl StrokeBuilder {
    pub fn new(style: StrokeStyle, pressure: PressureMode) -> Self {
        Self {
            points: Vec::new(),
            style,
            pressure,
        }
    }

    pub fn add_point(&mut self, point: StrokePoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn pressure_mode(&self) -> PressureMode {
        self.pressure
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    pub fn finish(self) -> StrokeRef {
        Arc::new(Stroke::new(self.points, self.style, self.pressure))
    }
}
