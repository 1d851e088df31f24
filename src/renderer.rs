use egui::Color32;

use crate::freehand::{self, StrokeOptions};
use crate::path;
use crate::stroke::{PressureMode, Stroke, StrokePoint, StrokeRef, StrokeStyle};
use crate::surface::Surface;

/// Path smoothing applied to every stroke; not part of a stroke's stored style.
pub const DEFAULT_SMOOTHING: f32 = 0.5;
pub const DEFAULT_STREAMLINE: f32 = 0.4;

/// Outline options for a stroke style.
pub fn stroke_options(style: &StrokeStyle, pressure: PressureMode, last: bool) -> StrokeOptions {
    StrokeOptions {
        size: style.size,
        thinning: style.thinning,
        smoothing: DEFAULT_SMOOTHING,
        streamline: DEFAULT_STREAMLINE,
        pressure,
        last,
        ..Default::default()
    }
}

/// Fills the smoothed outline of `points` in `color`.
///
/// Returns false when there was nothing to paint (fewer than 2 points or a
/// degenerate outline).
pub fn render_points(
    surface: &mut Surface,
    points: &[StrokePoint],
    color: Color32,
    options: &StrokeOptions,
) -> bool {
    if points.len() < 2 {
        return false;
    }
    let outline = freehand::outline(points, options);
    let polygon = path::smooth_closed_path(&outline);
    if polygon.is_empty() {
        return false;
    }
    surface.fill_polygon(&polygon, color);
    true
}

/// Paints a finished stroke.
pub fn render_stroke(surface: &mut Surface, stroke: &Stroke) -> bool {
    let options = stroke_options(&stroke.style(), stroke.pressure_mode(), true);
    render_points(surface, stroke.points(), stroke.color(), &options)
}

/// Paints the in-progress gesture; its end is left open as the path continues.
pub fn render_live_stroke(
    surface: &mut Surface,
    points: &[StrokePoint],
    style: &StrokeStyle,
    pressure: PressureMode,
) -> bool {
    let options = stroke_options(style, pressure, false);
    render_points(surface, points, style.color, &options)
}

/// Clears the surface and paints `strokes` in order.
pub fn replay(surface: &mut Surface, strokes: &[StrokeRef]) {
    surface.clear();
    for stroke in strokes {
        render_stroke(surface, stroke);
    }
}
