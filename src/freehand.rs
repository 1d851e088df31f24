//! Variable-width ink outlines from raw pointer samples.
//!
//! The input path is first streamlined (each sample pulled toward the
//! previous smoothed point), then a radius is derived per point from real
//! or simulated pressure, and finally left/right offsets are collected into
//! a ribbon polygon with caps or tapers at both ends.

use egui::{Pos2, Vec2, vec2};
use std::f32::consts::PI;

use crate::stroke::{PressureMode, StrokePoint};

/// How quickly simulated pressure follows changes in speed.
const RATE_OF_PRESSURE_CHANGE: f32 = 0.275;

/// A hair over PI so half-turn arcs close without a seam.
const FIXED_PI: f32 = PI + 0.0001;

/// Points this close to the end of the path are skipped; they only add noise.
const END_NOISE_LENGTH: f32 = 3.0;

/// Cap or taper settings for one end of a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeEnd {
    /// Distance over which the end narrows to a point; 0 disables tapering.
    pub taper: f32,
    /// Round cap when true, flat cap otherwise. Ignored while tapering.
    pub cap: bool,
}

impl Default for StrokeEnd {
    fn default() -> Self {
        Self { taper: 0.0, cap: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeOptions {
    /// Base diameter in logical pixels.
    pub size: f32,
    pub thinning: f32,
    /// Minimum spacing between outline points, as a fraction of `size`.
    pub smoothing: f32,
    /// How strongly samples are pulled toward the smoothed path.
    pub streamline: f32,
    pub pressure: PressureMode,
    pub start: StrokeEnd,
    pub end: StrokeEnd,
    /// False while the gesture is still in progress.
    pub last: bool,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            size: 20.0,
            thinning: 0.7,
            smoothing: 0.5,
            streamline: 0.4,
            pressure: PressureMode::Simulated,
            start: StrokeEnd::default(),
            end: StrokeEnd::default(),
            last: true,
        }
    }
}

/// A streamlined sample with everything the outline pass needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub point: Pos2,
    pub pressure: f32,
    /// Unit vector pointing back toward the previous point.
    pub vector: Vec2,
    pub distance: f32,
    pub running_length: f32,
}

/// Streamlines raw samples into track points.
pub fn track_points(input: &[StrokePoint], options: &StrokeOptions) -> Vec<TrackPoint> {
    if input.is_empty() {
        return Vec::new();
    }

    let t = 0.15 + (1.0 - options.streamline) * 0.85;
    let mut samples = input.to_vec();

    // Two samples give too little to streamline; interpolate a few more.
    if samples.len() == 2 {
        let last = samples[1];
        samples.truncate(1);
        for i in 1..5 {
            let next = samples[0].lerp(&last, i as f32 / 4.0);
            samples.push(next);
        }
    }
    if samples.len() == 1 {
        let only = samples[0];
        samples.push(StrokePoint::new(only.x + 1.0, only.y + 1.0, only.pressure));
    }

    let mut points = vec![TrackPoint {
        point: samples[0].pos(),
        pressure: samples[0].pressure,
        vector: vec2(1.0, 1.0),
        distance: 0.0,
        running_length: 0.0,
    }];

    let mut reached_minimum_length = false;
    let mut running_length = 0.0;
    let mut prev = points[0];
    let max = samples.len() - 1;

    for (i, sample) in samples.iter().enumerate().skip(1) {
        let point = if options.last && i == max {
            sample.pos()
        } else {
            prev.point + (sample.pos() - prev.point) * t
        };
        if point == prev.point {
            continue;
        }

        let distance = point.distance(prev.point);
        running_length += distance;

        if i < max && !reached_minimum_length {
            if running_length < options.size {
                continue;
            }
            reached_minimum_length = true;
        }

        prev = TrackPoint {
            point,
            pressure: sample.pressure,
            vector: (prev.point - point).normalized(),
            distance,
            running_length,
        };
        points.push(prev);
    }

    points[0].vector = points.get(1).map_or(Vec2::ZERO, |p| p.vector);
    points
}

/// Outline polygon of the stroke through `input`. Empty for fewer than two samples.
pub fn outline(input: &[StrokePoint], options: &StrokeOptions) -> Vec<Pos2> {
    if input.len() < 2 {
        return Vec::new();
    }
    outline_from_track(&track_points(input, options), options)
}

pub fn outline_from_track(points: &[TrackPoint], options: &StrokeOptions) -> Vec<Pos2> {
    let size = options.size;
    let (Some(first), Some(last_track)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    if size <= 0.0 {
        return Vec::new();
    }

    let simulate = options.pressure.is_simulated();
    let total_length = last_track.running_length;
    let taper_start = options.start.taper.max(0.0);
    // A stroke still being drawn has no end yet, so it never tapers out.
    let taper_end = if options.last { options.end.taper.max(0.0) } else { 0.0 };
    let min_distance = (size * options.smoothing).powi(2);

    let mut left: Vec<Pos2> = Vec::new();
    let mut right: Vec<Pos2> = Vec::new();

    let mut prev_pressure = points.iter().take(10).fold(first.pressure, |acc, p| {
        let pressure = if simulate {
            simulated_pressure(acc, p.distance, size)
        } else {
            p.pressure
        };
        (acc + pressure) / 2.0
    });

    let mut radius = stroke_radius(size, options.thinning, last_track.pressure);
    let mut first_radius: Option<f32> = None;
    let mut prev_vector = first.vector;
    let mut pl = first.point;
    let mut pr = first.point;
    let mut prev_was_sharp = false;

    for (i, track) in points.iter().enumerate() {
        let is_last = i == points.len() - 1;
        if !is_last && total_length - track.running_length < END_NOISE_LENGTH {
            continue;
        }

        let mut pressure = track.pressure;
        if options.thinning != 0.0 {
            if simulate {
                pressure = simulated_pressure(prev_pressure, track.distance, size);
            }
            radius = stroke_radius(size, options.thinning, pressure);
        } else {
            radius = size / 2.0;
        }
        if first_radius.is_none() {
            first_radius = Some(radius);
        }

        let ts = if track.running_length < taper_start {
            ease_out_quad(track.running_length / taper_start)
        } else {
            1.0
        };
        let remaining = total_length - track.running_length;
        let te = if remaining < taper_end {
            ease_out_cubic(remaining / taper_end)
        } else {
            1.0
        };
        radius = (radius * ts.min(te)).max(0.01);

        let next_vector = if is_last { track.vector } else { points[i + 1].vector };
        let next_dpr = if is_last { 1.0 } else { track.vector.dot(next_vector) };
        let prev_dpr = track.vector.dot(prev_vector);

        let is_sharp = prev_dpr < 0.0 && !prev_was_sharp;
        let next_is_sharp = next_dpr < 0.0;

        if is_sharp || next_is_sharp {
            // Wrap a half-circle around sharp turns so the ribbon doesn't fold over.
            let offset = perpendicular(prev_vector) * radius;
            for k in 0..=13 {
                let t = k as f32 / 13.0;
                let tl = rotate_around(track.point - offset, track.point, FIXED_PI * t);
                let tr = rotate_around(track.point + offset, track.point, -FIXED_PI * t);
                left.push(tl);
                right.push(tr);
                pl = tl;
                pr = tr;
            }
            if next_is_sharp {
                prev_was_sharp = true;
            }
            continue;
        }
        prev_was_sharp = false;

        if is_last {
            let offset = perpendicular(track.vector) * radius;
            left.push(track.point - offset);
            right.push(track.point + offset);
            continue;
        }

        let blended = next_vector + (track.vector - next_vector) * next_dpr;
        let offset = perpendicular(blended) * radius;

        let tl = track.point - offset;
        if i <= 1 || pl.distance_sq(tl) > min_distance {
            left.push(tl);
            pl = tl;
        }
        let tr = track.point + offset;
        if i <= 1 || pr.distance_sq(tr) > min_distance {
            right.push(tr);
            pr = tr;
        }

        prev_pressure = pressure;
        prev_vector = track.vector;
    }

    let first_point = first.point;
    let last_point = if points.len() > 1 {
        last_track.point
    } else {
        first.point + vec2(1.0, 1.0)
    };

    if points.len() == 1 {
        if (taper_start == 0.0 && taper_end == 0.0) || options.last {
            // A single point renders as a dot.
            let dot_radius = first_radius.unwrap_or(radius);
            let start = first_point
                + perpendicular(first_point - last_point).normalized() * -dot_radius;
            return (1..=13)
                .map(|k| rotate_around(start, first_point, FIXED_PI * 2.0 * k as f32 / 13.0))
                .collect();
        }
        right.reverse();
        left.extend(right);
        return left;
    }

    let mut start_cap = Vec::new();
    if taper_start > 0.0 {
        // tapered to a point, nothing to add
    } else if options.start.cap {
        if let Some(&anchor) = right.first() {
            start_cap.extend(
                (1..=13).map(|k| rotate_around(anchor, first_point, FIXED_PI * k as f32 / 13.0)),
            );
        }
    } else if let (Some(&l), Some(&r)) = (left.first(), right.first()) {
        let corners = l - r;
        let a = corners * 0.5;
        let b = corners * 0.51;
        start_cap.extend([first_point - a, first_point - b, first_point + b, first_point + a]);
    }

    let direction = perpendicular(-last_track.vector);
    let mut end_cap = Vec::new();
    if taper_end > 0.0 {
        end_cap.push(last_point);
    } else if options.end.cap {
        let start = last_point + direction * radius;
        end_cap.extend(
            (1..29).map(|k| rotate_around(start, last_point, FIXED_PI * 3.0 * k as f32 / 29.0)),
        );
    } else {
        end_cap.extend([
            last_point + direction * radius,
            last_point + direction * (radius * 0.99),
            last_point - direction * (radius * 0.99),
            last_point - direction * radius,
        ]);
    }

    right.reverse();
    let mut polygon = left;
    polygon.extend(end_cap);
    polygon.extend(right);
    polygon.extend(start_cap);
    polygon
}

/// Radius at a given pressure; `thinning` scales how much pressure matters.
pub fn stroke_radius(size: f32, thinning: f32, pressure: f32) -> f32 {
    size * (0.5 - thinning * (0.5 - pressure))
}

/// Pressure synthesized from spacing: fast, widely spaced samples press lighter.
fn simulated_pressure(previous: f32, distance: f32, size: f32) -> f32 {
    let speed = (distance / size).min(1.0);
    let rest = (1.0 - speed).min(1.0);
    (previous + (rest - previous) * (speed * RATE_OF_PRESSURE_CHANGE)).min(1.0)
}

fn perpendicular(v: Vec2) -> Vec2 {
    vec2(v.y, -v.x)
}

fn rotate_around(point: Pos2, center: Pos2, angle: f32) -> Pos2 {
    let (sin, cos) = angle.sin_cos();
    let d = point - center;
    Pos2::new(center.x + d.x * cos - d.y * sin, center.y + d.x * sin + d.y * cos)
}

fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

fn ease_out_cubic(t: f32) -> f32 {
    let t = t - 1.0;
    t * t * t + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, step: f32) -> Vec<StrokePoint> {
        (0..n)
            .map(|i| StrokePoint::new(10.0 + i as f32 * step, 50.0, 0.5))
            .collect()
    }

    fn max_half_width(polygon: &[Pos2], center_y: f32) -> f32 {
        polygon.iter().map(|p| (p.y - center_y).abs()).fold(0.0, f32::max)
    }

    #[test]
    fn fewer_than_two_points_is_empty() {
        assert!(outline(&[], &StrokeOptions::default()).is_empty());
        assert!(outline(&line(1, 5.0), &StrokeOptions::default()).is_empty());
    }

    #[test]
    fn straight_line_stays_within_radius() {
        let options = StrokeOptions {
            thinning: 0.0,
            ..Default::default()
        };
        let polygon = outline(&line(30, 4.0), &options);
        assert!(polygon.len() > 4);
        let half = max_half_width(&polygon, 50.0);
        assert!(half <= options.size / 2.0 + 0.01, "half width {half}");
        assert!(half >= options.size / 2.0 - 0.5, "half width {half}");
    }

    #[test]
    fn zero_thinning_is_uniform_width() {
        assert_eq!(stroke_radius(20.0, 0.0, 0.1), 10.0);
        assert_eq!(stroke_radius(20.0, 0.0, 0.9), 10.0);
        assert!(stroke_radius(20.0, 1.0, 0.1) < stroke_radius(20.0, 1.0, 0.9));
    }

    #[test]
    fn real_pressure_narrows_the_stroke() {
        let light: Vec<StrokePoint> = line(30, 4.0)
            .into_iter()
            .map(|p| StrokePoint::new(p.x, p.y, 0.1))
            .collect();
        let heavy: Vec<StrokePoint> = line(30, 4.0)
            .into_iter()
            .map(|p| StrokePoint::new(p.x, p.y, 1.0))
            .collect();
        let options = StrokeOptions {
            pressure: PressureMode::Real,
            thinning: 0.7,
            ..Default::default()
        };
        let thin = max_half_width(&outline(&light, &options), 50.0);
        let thick = max_half_width(&outline(&heavy, &options), 50.0);
        assert!(thin < thick, "thin {thin} thick {thick}");
    }

    #[test]
    fn streamline_pulls_jitter_toward_the_path() {
        let jittery: Vec<StrokePoint> = (0..40)
            .map(|i| {
                let wobble = if i % 2 == 0 { 6.0 } else { -6.0 };
                StrokePoint::new(10.0 + i as f32 * 3.0, 50.0 + wobble, 0.5)
            })
            .collect();
        let spread = |streamline: f32| {
            let options = StrokeOptions {
                streamline,
                last: false,
                ..Default::default()
            };
            track_points(&jittery, &options)
                .iter()
                .skip(3)
                .map(|p| (p.point.y - 50.0).abs())
                .fold(0.0, f32::max)
        };
        assert!(spread(0.9) < spread(0.0));
    }

    #[test]
    fn outline_is_deterministic() {
        let options = StrokeOptions::default();
        let points = line(25, 3.0);
        assert_eq!(outline(&points, &options), outline(&points, &options));
    }

    #[test]
    fn identical_samples_render_as_a_dot() {
        let points = vec![StrokePoint::new(20.0, 20.0, 0.5); 3];
        let polygon = outline(&points, &StrokeOptions::default());
        assert_eq!(polygon.len(), 13);
        for p in polygon {
            let r = p.distance(Pos2::new(20.0, 20.0));
            assert!(r > 0.0 && r <= 10.01);
        }
    }

    #[test]
    fn taper_narrows_the_end() {
        let options = StrokeOptions {
            thinning: 0.0,
            end: StrokeEnd { taper: 40.0, cap: true },
            ..Default::default()
        };
        let polygon = outline(&line(40, 4.0), &options);
        let tail: f32 = polygon
            .iter()
            .filter(|p| p.x > 160.0)
            .map(|p| (p.y - 50.0).abs())
            .fold(0.0, f32::max);
        assert!(tail < options.size / 2.0 - 1.0, "tail half width {tail}");
    }

    #[test]
    fn live_outline_ignores_end_taper() {
        let mut options = StrokeOptions {
            thinning: 0.0,
            end: StrokeEnd { taper: 40.0, cap: true },
            ..Default::default()
        };
        options.last = false;
        let polygon = outline(&line(40, 4.0), &options);
        let tail_points = polygon.iter().filter(|p| p.x > 130.0).count();
        assert!(tail_points > 0);
        let widest_tail = polygon
            .iter()
            .filter(|p| p.x > 130.0)
            .map(|p| (p.y - 50.0).abs())
            .fold(0.0, f32::max);
        assert!(widest_tail > options.size / 2.0 - 0.5);
    }
}
