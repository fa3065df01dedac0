use kurbo::Point;

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `factor`, clamping to the valid range.
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |c: u8| (f64::from(c) * factor).clamp(0.0, 255.0) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }
}

/// One raster frame: `width * height * 3` bytes of row-major RGB8.
///
/// Produced once per step, handed to the sink, then discarded; no state is
/// carried between frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRgb {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgb {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 3) as usize],
        }
    }

    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgb8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx] = color.r;
        self.data[idx + 1] = color.g;
        self.data[idx + 2] = color.b;
    }

    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb8> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb8::new(self.data[idx], self.data[idx + 1], self.data[idx + 2]))
    }

    /// Blend `color` over the pixel at `(x, y)` with opacity `alpha` in [0, 1].
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgb8, alpha: f64) {
        let Some(under) = self.get_pixel(x, y) else {
            return;
        };
        let mix = |o: u8, u: u8| {
            (f64::from(o) * alpha + f64::from(u) * (1.0 - alpha)).clamp(0.0, 255.0) as u8
        };
        self.put_pixel(
            x,
            y,
            Rgb8::new(mix(color.r, under.r), mix(color.g, under.g), mix(color.b, under.b)),
        );
    }

    /// Fill one horizontal row span, clipped to the frame.
    pub fn fill_hspan(&mut self, y: i32, x0: i32, x1: i32, color: Rgb8) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let (lo, hi) = (x0.min(x1).max(0), x0.max(x1).min(self.width as i32 - 1));
        for x in lo..=hi {
            self.put_pixel(x, y, color);
        }
    }

    /// Bresenham line.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb8) {
        let (mut x0, mut y0) = (x0, y0);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Line with pixel `thickness`, drawn as offset parallels.
    pub fn draw_line_thick(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        thickness: i32,
        color: Rgb8,
    ) {
        self.draw_line(x0, y0, x1, y1, color);
        // Offset perpendicular to the dominant axis.
        let horizontal = (x1 - x0).abs() >= (y1 - y0).abs();
        for t in 1..thickness {
            let off = (t + 1) / 2 * if t % 2 == 1 { 1 } else { -1 };
            if horizontal {
                self.draw_line(x0, y0 + off, x1, y1 + off, color);
            } else {
                self.draw_line(x0 + off, y0, x1 + off, y1, color);
            }
        }
    }

    /// Scanline fill of a simple polygon (even-odd rule).
    pub fn fill_polygon(&mut self, pts: &[Point], color: Rgb8) {
        if pts.len() < 3 {
            return;
        }
        let y_min = pts.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let y_max = pts.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let y_lo = (y_min.floor() as i32).max(0);
        let y_hi = (y_max.ceil() as i32).min(self.height as i32 - 1);

        let mut xs: Vec<f64> = Vec::with_capacity(pts.len());
        for y in y_lo..=y_hi {
            let scan = f64::from(y) + 0.5;
            xs.clear();
            for i in 0..pts.len() {
                let a = pts[i];
                let b = pts[(i + 1) % pts.len()];
                if (a.y <= scan && b.y > scan) || (b.y <= scan && a.y > scan) {
                    let t = (scan - a.y) / (b.y - a.y);
                    xs.push(a.x + t * (b.x - a.x));
                }
            }
            xs.sort_by(f64::total_cmp);
            for pair in xs.chunks_exact(2) {
                self.fill_hspan(y, pair[0].round() as i32, pair[1].round() as i32, color);
            }
        }
    }

    /// Closed polygon outline.
    pub fn stroke_polygon(&mut self, pts: &[Point], color: Rgb8) {
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            self.draw_line(
                a.x.round() as i32,
                a.y.round() as i32,
                b.x.round() as i32,
                b.y.round() as i32,
                color,
            );
        }
    }

    /// Solid axis-aligned ellipse.
    pub fn fill_ellipse(&mut self, cx: i32, cy: i32, rx: i32, ry: i32, color: Rgb8) {
        let (rx, ry) = (rx.max(1), ry.max(1));
        let (rxf, ryf) = (f64::from(rx), f64::from(ry));
        for dy in -ry..=ry {
            let frac = 1.0 - (f64::from(dy) / ryf).powi(2);
            if frac < 0.0 {
                continue;
            }
            let half = (rxf * frac.sqrt()).round() as i32;
            self.fill_hspan(cy + dy, cx - half, cx + half, color);
        }
    }

    /// Axis-aligned ellipse outline.
    pub fn stroke_ellipse(&mut self, cx: i32, cy: i32, rx: i32, ry: i32, color: Rgb8) {
        let (rx, ry) = (rx.max(1), ry.max(1));
        let steps = (4 * (rx + ry)).max(16);
        let mut prev: Option<(i32, i32)> = None;
        for i in 0..=steps {
            let a = std::f64::consts::TAU * f64::from(i) / f64::from(steps);
            let x = cx + (f64::from(rx) * a.cos()).round() as i32;
            let y = cy + (f64::from(ry) * a.sin()).round() as i32;
            if let Some((px, py)) = prev {
                self.draw_line(px, py, x, y, color);
            }
            prev = Some((x, y));
        }
    }

    /// Translucent filled rectangle (inclusive corners), used for HUD panels.
    pub fn blend_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb8, alpha: f64) {
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                self.blend_pixel(x, y, color, alpha);
            }
        }
    }

    /// Translucent filled circle.
    pub fn blend_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Rgb8, alpha: f64) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(cx + dx, cy + dy, color, alpha);
                }
            }
        }
    }

    /// Rectangle outline (inclusive corners).
    pub fn stroke_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb8) {
        self.draw_line(x0, y0, x1, y0, color);
        self.draw_line(x1, y0, x1, y1, color);
        self.draw_line(x1, y1, x0, y1, color);
        self.draw_line(x0, y1, x0, y0, color);
    }

    /// Line with an arrow head at `(x1, y1)`.
    pub fn draw_arrow(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb8) {
        self.draw_line_thick(x0, y0, x1, y1, 2, color);
        let angle = (f64::from(y1 - y0)).atan2(f64::from(x1 - x0));
        let head = 6.0;
        for side in [-1.0, 1.0] {
            let a = angle + std::f64::consts::PI - side * 0.5;
            let hx = x1 + (head * a.cos()).round() as i32;
            let hy = y1 + (head * a.sin()).round() as i32;
            self.draw_line_thick(x1, y1, hx, hy, 2, color);
        }
    }

    /// Draw HUD text in the built-in 5x7 font with a one-pixel drop shadow.
    /// Lowercase input is rendered with the uppercase glyph set.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Rgb8) {
        let mut pen_x = x;
        for ch in text.chars() {
            if let Some(rows) = glyph5x7(ch.to_ascii_uppercase()) {
                for (ry, row) in rows.iter().enumerate() {
                    for rx in 0..5i32 {
                        if (*row >> (4 - rx)) & 1 != 0 {
                            self.put_pixel(
                                pen_x + rx + 1,
                                y + ry as i32 + 1,
                                Rgb8::new(0, 0, 0),
                            );
                        }
                    }
                }
                for (ry, row) in rows.iter().enumerate() {
                    for rx in 0..5i32 {
                        if (*row >> (4 - rx)) & 1 != 0 {
                            self.put_pixel(pen_x + rx, y + ry as i32, color);
                        }
                    }
                }
            }
            pen_x += 6;
        }
    }
}

/// 5x7 glyph bitmap for the HUD character set. Each u8 is a row; the low five
/// bits are pixels, bit 4 leftmost.
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g {
        ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
            Some([$a, $b, $c, $d, $e, $f, $g])
        };
    }

    match ch {
        '0' => g!(0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110),
        '1' => g!(0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110),
        '2' => g!(0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111),
        '3' => g!(0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110),
        '4' => g!(0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010),
        '5' => g!(0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110),
        '6' => g!(0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110),
        '7' => g!(0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000),
        '8' => g!(0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110),
        '9' => g!(0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100),

        'A' => g!(0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001),
        'D' => g!(0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100),
        'E' => g!(0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111),
        'G' => g!(0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111),
        'H' => g!(0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001),
        'M' => g!(0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001),
        'N' => g!(0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001),
        'O' => g!(0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110),
        'P' => g!(0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000),
        'R' => g!(0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001),
        'S' => g!(0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110),
        'T' => g!(0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100),
        'V' => g!(0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100),
        'W' => g!(0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010),

        ' ' => g!(0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000),
        ':' => g!(0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000),
        '.' => g!(0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00100, 0b00000),
        ',' => g!(0b00000, 0b00000, 0b00000, 0b00000, 0b00100, 0b00100, 0b01000),
        '-' => g!(0b00000, 0b00000, 0b00000, 0b01110, 0b00000, 0b00000, 0b00000),
        '/' => g!(0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000),
        '(' => g!(0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010),
        ')' => g!(0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_pixel_is_bounds_checked() {
        let mut f = FrameRgb::new(4, 4);
        f.put_pixel(-1, 0, Rgb8::new(255, 0, 0));
        f.put_pixel(0, 4, Rgb8::new(255, 0, 0));
        assert!(f.data.iter().all(|&b| b == 0));

        f.put_pixel(3, 3, Rgb8::new(1, 2, 3));
        assert_eq!(f.get_pixel(3, 3), Some(Rgb8::new(1, 2, 3)));
    }

    #[test]
    fn scaled_clamps_channels() {
        let c = Rgb8::new(200, 10, 0).scaled(2.0);
        assert_eq!(c, Rgb8::new(255, 20, 0));
    }

    #[test]
    fn fill_polygon_covers_interior_not_exterior() {
        let mut f = FrameRgb::new(20, 20);
        let tri = [
            Point::new(2.0, 2.0),
            Point::new(17.0, 2.0),
            Point::new(2.0, 17.0),
        ];
        f.fill_polygon(&tri, Rgb8::new(9, 9, 9));
        assert_eq!(f.get_pixel(4, 4), Some(Rgb8::new(9, 9, 9)));
        assert_eq!(f.get_pixel(18, 18), Some(Rgb8::new(0, 0, 0)));
    }

    #[test]
    fn blend_pixel_mixes_linearly() {
        let mut f = FrameRgb::new(1, 1);
        f.put_pixel(0, 0, Rgb8::new(0, 0, 0));
        f.blend_pixel(0, 0, Rgb8::new(200, 100, 50), 0.5);
        assert_eq!(f.get_pixel(0, 0), Some(Rgb8::new(100, 50, 25)));
    }

    #[test]
    fn ellipse_stays_inside_bounding_box() {
        let mut f = FrameRgb::new(30, 30);
        f.fill_ellipse(15, 15, 5, 3, Rgb8::new(7, 7, 7));
        assert_eq!(f.get_pixel(15, 15), Some(Rgb8::new(7, 7, 7)));
        assert_eq!(f.get_pixel(15, 19), Some(Rgb8::new(0, 0, 0)));
        assert_eq!(f.get_pixel(21, 15), Some(Rgb8::new(0, 0, 0)));
    }

    #[test]
    fn text_renders_known_glyphs_and_skips_unknown() {
        let mut f = FrameRgb::new(32, 10);
        f.draw_text(1, 1, "0", Rgb8::new(255, 255, 255));
        let lit = f.data.iter().filter(|&&b| b == 255).count();
        assert!(lit > 0);

        let mut g = FrameRgb::new(32, 10);
        g.draw_text(1, 1, "~", Rgb8::new(255, 255, 255));
        assert!(g.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn thick_line_alternates_offsets_around_the_center() {
        let mut f = FrameRgb::new(10, 10);
        f.draw_line_thick(0, 5, 9, 5, 3, Rgb8::new(9, 9, 9));
        // Thickness 3 covers the center row plus one row either side.
        for y in 4..=6 {
            assert_eq!(f.get_pixel(5, y), Some(Rgb8::new(9, 9, 9)));
        }
        assert_eq!(f.get_pixel(5, 3), Some(Rgb8::new(0, 0, 0)));
        assert_eq!(f.get_pixel(5, 7), Some(Rgb8::new(0, 0, 0)));
    }

    #[test]
    fn line_connects_endpoints() {
        let mut f = FrameRgb::new(10, 10);
        f.draw_line(0, 0, 9, 9, Rgb8::new(5, 5, 5));
        assert_eq!(f.get_pixel(0, 0), Some(Rgb8::new(5, 5, 5)));
        assert_eq!(f.get_pixel(9, 9), Some(Rgb8::new(5, 5, 5)));
        assert_eq!(f.get_pixel(5, 5), Some(Rgb8::new(5, 5, 5)));
    }
}
