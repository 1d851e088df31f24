//! Smooth closed paths from outline polygons.
//!
//! Consecutive outline points become quadratic curves whose control points
//! are the outline points themselves and whose end points are the midpoints
//! between them, so the filled edge shows no polyline facets.

use egui::Pos2;
use std::fmt::Write as _;

/// Flattening tolerance for quadratic segments, in logical pixels.
const FLATTEN_STEP: f32 = 1.0;
const MAX_SEGMENT_STEPS: usize = 16;

fn midpoint(a: Pos2, b: Pos2) -> Pos2 {
    Pos2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Flattens the midpoint-quadratic curve through `outline` into a closed polygon.
///
/// Outlines with fewer than 4 points produce nothing to fill.
pub fn smooth_closed_path(outline: &[Pos2]) -> Vec<Pos2> {
    let len = outline.len();
    if len < 4 {
        return Vec::new();
    }

    let mut polygon = vec![outline[0]];
    let mut current = outline[0];
    for i in 1..len - 1 {
        let end = midpoint(outline[i], outline[i + 1]);
        flatten_quad(current, outline[i], end, &mut polygon);
        current = end;
    }
    polygon
}

fn flatten_quad(start: Pos2, control: Pos2, end: Pos2, out: &mut Vec<Pos2>) {
    let estimate = start.distance(control) + control.distance(end);
    let steps = ((estimate / FLATTEN_STEP).ceil() as usize).clamp(1, MAX_SEGMENT_STEPS);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        let mt = 1.0 - t;
        out.push(Pos2::new(
            mt * mt * start.x + 2.0 * mt * t * control.x + t * t * end.x,
            mt * mt * start.y + 2.0 * mt * t * control.y + t * t * end.y,
        ));
    }
}

/// The same curve as SVG path data, for hosts that fill paths natively.
pub fn svg_path_data(outline: &[Pos2]) -> String {
    let len = outline.len();
    if len < 4 {
        return String::new();
    }

    let (a, b, c) = (outline[0], outline[1], outline[2]);
    let m = midpoint(b, c);
    let mut data = format!(
        "M{:.2},{:.2} Q{:.2},{:.2} {:.2},{:.2} T",
        a.x, a.y, b.x, b.y, m.x, m.y
    );
    for i in 2..len - 1 {
        let m = midpoint(outline[i], outline[i + 1]);
        let _ = write!(data, "{:.2},{:.2} ", m.x, m.y);
    }
    data.push('Z');
    data
}
