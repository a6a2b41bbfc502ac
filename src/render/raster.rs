use super::{Color, Stroke, Surface, PAGE};

/// CPU raster canvas: an RGBA8 pixel buffer with alpha-blended drawing.
///
/// Strokes are rendered by coverage testing against the segment within its
/// bounding box, so each pixel of an operation is blended exactly once.
/// Curves and arcs are flattened into short segments first.
pub struct RasterCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

const CURVE_SEGMENTS: usize = 16;

impl RasterCanvas {
    /// Create a canvas filled with the page color.
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        for px in pixels.chunks_exact_mut(4) {
            px[0] = PAGE.r;
            px[1] = PAGE.g;
            px[2] = PAGE.b;
            px[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    fn blend(&mut self, x: i32, y: i32, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let a = alpha.clamp(0.0, 1.0);
        let inv_a = 1.0 - a;
        self.pixels[idx] = (color.r as f32 * a + self.pixels[idx] as f32 * inv_a) as u8;
        self.pixels[idx + 1] = (color.g as f32 * a + self.pixels[idx + 1] as f32 * inv_a) as u8;
        self.pixels[idx + 2] = (color.b as f32 * a + self.pixels[idx + 2] as f32 * inv_a) as u8;
        self.pixels[idx + 3] = 255;
    }

    /// Blend every pixel whose center lies within `radius` of the segment.
    fn stamp_segment(&mut self, from: (f32, f32), to: (f32, f32), stroke: Stroke) {
        let radius = (stroke.width * 0.5).max(0.5);
        let min_x = (from.0.min(to.0) - radius).floor() as i32;
        let max_x = (from.0.max(to.0) + radius).ceil() as i32;
        let min_y = (from.1.min(to.1) - radius).floor() as i32;
        let max_y = (from.1.max(to.1) + radius).ceil() as i32;

        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let len_sq = dx * dx + dy * dy;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                // Distance from pixel center to the segment
                let t = if len_sq > 0.0 {
                    (((px - from.0) * dx + (py - from.1) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let cx = from.0 + t * dx;
                let cy = from.1 + t * dy;
                let dist_sq = (px - cx) * (px - cx) + (py - cy) * (py - cy);
                if dist_sq <= radius * radius {
                    self.blend(x, y, stroke.color, stroke.alpha);
                }
            }
        }
    }
}

impl Surface for RasterCanvas {
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), stroke: Stroke) {
        self.stamp_segment(from, to, stroke);
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], stroke: Stroke) {
        for pair in points.windows(2) {
            self.stamp_segment(pair[0], pair[1], stroke);
        }
    }

    fn stroke_quadratic(
        &mut self,
        from: (f32, f32),
        ctrl: (f32, f32),
        to: (f32, f32),
        stroke: Stroke,
    ) {
        let mut prev = from;
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            let u = 1.0 - t;
            let x = u * u * from.0 + 2.0 * u * t * ctrl.0 + t * t * to.0;
            let y = u * u * from.1 + 2.0 * u * t * ctrl.1 + t * t * to.1;
            self.stamp_segment(prev, (x, y), stroke);
            prev = (x, y);
        }
    }

    fn stroke_arc(
        &mut self,
        center: (f32, f32),
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        stroke: Stroke,
    ) {
        let mut prev = (
            center.0 + start_angle.cos() * radius,
            center.1 + start_angle.sin() * radius,
        );
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            let a = start_angle + (end_angle - start_angle) * t;
            let point = (center.0 + a.cos() * radius, center.1 + a.sin() * radius);
            self.stamp_segment(prev, point, stroke);
            prev = point;
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, alpha: f32) {
        let min_x = x.floor() as i32;
        let max_x = (x + w).ceil() as i32;
        let min_y = y.floor() as i32;
        let max_y = (y + h).ceil() as i32;
        for py in min_y..max_y {
            for px in min_x..max_x {
                self.blend(px, py, color, alpha);
            }
        }
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color, alpha: f32) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.1).fold(f32::MAX, f32::min).floor() as i32;
        let max_y = points.iter().map(|p| p.1).fold(f32::MIN, f32::max).ceil() as i32;

        // Scanline fill: collect edge crossings at each row's pixel centers
        let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
        for y in min_y..=max_y {
            let py = y as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (x0, y0) = points[i];
                let (x1, y1) = points[(i + 1) % points.len()];
                if (y0 <= py && py < y1) || (y1 <= py && py < y0) {
                    let t = (py - y0) / (y1 - y0);
                    crossings.push(x0 + t * (x1 - x0));
                }
            }
            crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for span in crossings.chunks_exact(2) {
                let start = span[0].round() as i32;
                let end = span[1].round() as i32;
                for x in start..end {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }

    fn fade(&mut self, color: Color, alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        let inv_a = 1.0 - a;
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = (color.r as f32 * a + px[0] as f32 * inv_a) as u8;
            px[1] = (color.g as f32 * a + px[1] as f32 * inv_a) as u8;
            px[2] = (color.b as f32 * a + px[2] as f32 * inv_a) as u8;
            px[3] = 255;
        }
    }
}
