use egui::{Color32, Pos2, Rect, pos2};
use image::{Rgba, RgbaImage};

/// Vertical samples per pixel row when filling polygons.
const SUBSAMPLES: usize = 4;

/// An RGBA raster the engine paints into and reads back.
///
/// `scale` maps logical coordinates onto device pixels, like a canvas
/// context scaled by the device pixel ratio. The drawing surface uses the
/// ratio; guide and mask surfaces stay at 1 and take device coordinates.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
    scale: f32,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_scale(width, height, 1.0)
    }

    pub fn with_scale(width: u32, height: u32, scale: f32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            scale: if scale > 0.0 { scale } else { 1.0 },
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixels.get_pixel(x, y)[3]
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    /// Source-over composite of `color` at one device pixel, weighted by `coverage`.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color32, coverage: f32) {
        if x >= self.width() || y >= self.height() {
            return;
        }
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        let src_a = a as f32 / 255.0 * coverage.clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }

        let dst = self.pixels.get_pixel_mut(x, y);
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        let mix = |src: u8, dst: u8| -> u8 {
            let value = (src as f32 * src_a + dst as f32 * dst_a * (1.0 - src_a)) / out_a;
            value.round().clamp(0.0, 255.0) as u8
        };
        *dst = Rgba([
            mix(r, dst[0]),
            mix(g, dst[1]),
            mix(b, dst[2]),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ]);
    }

    /// Fills a closed polygon given in logical coordinates (non-zero winding).
    ///
    /// Edges are anti-aliased: horizontal coverage is exact per span,
    /// vertical coverage comes from `SUBSAMPLES` scanlines per pixel row.
    pub fn fill_polygon(&mut self, points: &[Pos2], color: Color32) {
        if points.len() < 3 {
            return;
        }
        let scale = self.scale;
        let points: Vec<Pos2> = points.iter().map(|p| pos2(p.x * scale, p.y * scale)).collect();
        let bounds = Rect::from_points(&points);
        if !bounds.is_finite() {
            return;
        }

        let x0 = bounds.min.x.floor().max(0.0) as u32;
        let x1 = bounds.max.x.ceil().min(self.width() as f32).max(0.0) as u32;
        let y0 = bounds.min.y.floor().max(0.0) as u32;
        let y1 = bounds.max.y.ceil().min(self.height() as f32).max(0.0) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let weight = 1.0 / SUBSAMPLES as f32;
        let mut row = vec![0.0f32; (x1 - x0) as usize];
        let mut crossings: Vec<(f32, i32)> = Vec::new();

        for y in y0..y1 {
            row.iter_mut().for_each(|c| *c = 0.0);

            for sample in 0..SUBSAMPLES {
                let sy = y as f32 + (sample as f32 + 0.5) * weight;
                crossings.clear();
                for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
                    if (a.y <= sy) != (b.y <= sy) {
                        let t = (sy - a.y) / (b.y - a.y);
                        let winding = if b.y > a.y { 1 } else { -1 };
                        crossings.push((a.x + t * (b.x - a.x), winding));
                    }
                }
                crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

                let mut winding = 0;
                for pair in crossings.windows(2) {
                    winding += pair[0].1;
                    if winding != 0 {
                        accumulate_span(&mut row, pair[0].0 - x0 as f32, pair[1].0 - x0 as f32, weight);
                    }
                }
            }

            for (i, coverage) in row.iter().enumerate() {
                if *coverage > 0.0 {
                    self.blend_pixel(x0 + i as u32, y, color, coverage.min(1.0));
                }
            }
        }
    }

    /// Fills an axis-aligned rectangle given in logical coordinates.
    pub fn fill_rect(&mut self, rect: Rect, color: Color32) {
        self.fill_polygon(
            &[rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()],
            color,
        );
    }
}

fn accumulate_span(row: &mut [f32], start: f32, end: f32, weight: f32) {
    let len = row.len() as f32;
    let (start, end) = (start.clamp(0.0, len), end.clamp(0.0, len));
    if end <= start {
        return;
    }
    let first = start.floor() as usize;
    let last = end.floor() as usize;
    if first == last {
        row[first] += (end - start) * weight;
        return;
    }
    row[first] += (first as f32 + 1.0 - start) * weight;
    for cell in &mut row[first + 1..last] {
        *cell += weight;
    }
    if last < row.len() {
        row[last] += (end - last as f32) * weight;
    }
}
