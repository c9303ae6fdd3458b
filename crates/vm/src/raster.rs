//! CPU rasterization of the drawing instructions.
//!
//! Drawing goes through the [`Surface`] trait, which only has to expose its size and per-pixel
//! access. The provided drawing methods clip everything to the surface; implementations backed
//! by other renderers may override them as long as they produce the same pixels.

/// An RGBA color.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// The red channel.
    pub r: u8,
    /// The green channel.
    pub g: u8,
    /// The blue channel.
    pub b: u8,
    /// The alpha channel.
    pub a: u8,
}

impl Color {
    /// Creates a fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Packs the color as `0xAARRGGBB`.
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Unpacks a `0xAARRGGBB` color.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Packs the RGB channels the way `getp` exposes them to programs: `(b << 16) | (g << 8) | r`.
    pub const fn to_g1(self) -> i32 {
        (self.b as i32) << 16 | (self.g as i32) << 8 | self.r as i32
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// The left edge.
    pub x: i64,
    /// The top edge.
    pub y: i64,
    /// The width.
    pub w: i64,
    /// The height.
    pub h: i64,
}

impl Rect {
    /// Creates a new [`Rect`].
    pub const fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the overlap of two rectangles, or `None` if they do not overlap.
    pub fn intersection(self, other: Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let right = (self.x + self.w).min(other.x + other.w);
        let top = self.y.max(other.y);
        let bottom = (self.y + self.h).min(other.y + other.h);

        (left < right && top < bottom).then(|| Rect::new(left, top, right - left, bottom - top))
    }
}

/// A pixel surface of a fixed size that the drawing instructions render to.
pub trait Surface {
    /// Returns the width of the surface, in pixels.
    fn width(&self) -> usize;

    /// Returns the height of the surface, in pixels.
    fn height(&self) -> usize;

    /// Sets a single pixel.
    ///
    /// Callers guarantee that `x < width` and `y < height`.
    fn set_pixel(&mut self, x: usize, y: usize, color: Color);

    /// Returns a single pixel.
    ///
    /// Callers guarantee that `x < width` and `y < height`.
    fn pixel(&self, x: usize, y: usize) -> Color;

    /// Returns the pixel at `(x, y)`, or `None` if it lies outside of the surface.
    fn read_pixel(&self, x: i32, y: i32) -> Option<Color> {
        let (x, y) = pixel_index(self, i64::from(x), i64::from(y))?;
        Some(self.pixel(x, y))
    }

    /// Draws a single pixel, doing nothing if it lies outside of the surface.
    fn draw_point(&mut self, x: i32, y: i32, color: Color) {
        if let Some((x, y)) = pixel_index(self, i64::from(x), i64::from(y)) {
            self.set_pixel(x, y, color);
        }
    }

    /// Fills the part of a rectangle that lies within the surface.
    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let bounds = Rect::new(0, 0, self.width() as i64, self.height() as i64);
        let requested = Rect::new(i64::from(x), i64::from(y), i64::from(w), i64::from(h));
        let Some(rect) = requested.intersection(bounds) else {
            return;
        };

        // The intersection lies within the surface, so none of these casts truncate.
        for py in rect.y as usize..(rect.y + rect.h) as usize {
            for px in rect.x as usize..(rect.x + rect.w) as usize {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Draws a line between two points using Bresenham's algorithm.
    ///
    /// The whole line is walked and every point outside of the surface is skipped, so a line
    /// leaving and re-entering the surface is drawn on both sides.
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        // TODO: clip the segment to the surface before walking it; off-surface stretches of
        // very long lines are currently walked one point at a time.
        let (mut x, mut y) = (i64::from(x1), i64::from(y1));
        let (x2, y2) = (i64::from(x2), i64::from(y2));

        let dx = (x2 - x).abs();
        let dy = (y2 - y).abs();
        let sx = if x < x2 { 1 } else { -1 };
        let sy = if y < y2 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            if let Some((px, py)) = pixel_index(self, x, y) {
                self.set_pixel(px, py, color);
            }

            if x == x2 && y == y2 {
                break;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Converts a coordinate to a pixel index, if it lies within `surface`.
fn pixel_index<S: Surface + ?Sized>(surface: &S, x: i64, y: i64) -> Option<(usize, usize)> {
    let x = usize::try_from(x).ok().filter(|&x| x < surface.width())?;
    let y = usize::try_from(y).ok().filter(|&y| y < surface.height())?;
    Some((x, y))
}

/// A [`Surface`] backed by a linear buffer of `0xAARRGGBB` pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Box<[u32]>,
}

impl Framebuffer {
    /// Creates a new [`Framebuffer`] with every pixel set to zero (transparent black).
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height].into_boxed_slice(),
        }
    }

    /// Returns the pixels, row by row, packed as `0xAARRGGBB`.
    #[inline(always)]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Sets every pixel to `color`.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_argb());
    }
}

impl Surface for Framebuffer {
    #[inline(always)]
    fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        self.pixels[y * self.width + x] = color.to_argb();
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Color {
        Color::from_argb(self.pixels[y * self.width + x])
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    /// Returns the coordinates of every pixel that is not zero.
    fn drawn(fb: &Framebuffer) -> BTreeSet<(usize, usize)> {
        (0..fb.height())
            .flat_map(|y| (0..fb.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y) != Color::default())
            .collect()
    }

    fn square(range: std::ops::Range<usize>) -> BTreeSet<(usize, usize)> {
        range
            .clone()
            .flat_map(|y| range.clone().map(move |x| (x, y)))
            .collect()
    }

    #[test]
    fn color_packing() {
        let c = Color::rgb(0x12, 0x34, 0x56);
        assert_eq!(c.to_argb(), 0xFF12_3456);
        assert_eq!(Color::from_argb(c.to_argb()), c);
        assert_eq!(c.to_g1(), 0x56_3412);
    }

    #[test]
    fn point_clipping() {
        let mut fb = Framebuffer::new(4, 4);
        fb.draw_point(-1, 0, RED);
        fb.draw_point(4, 0, RED);
        fb.draw_point(0, 4, RED);
        assert!(drawn(&fb).is_empty());

        fb.draw_point(3, 3, RED);
        assert_eq!(drawn(&fb), BTreeSet::from([(3, 3)]));
    }

    #[test]
    fn rect_partially_outside() {
        let mut fb = Framebuffer::new(10, 10);
        fb.draw_rect(5, 5, 10, 10, RED);
        assert_eq!(drawn(&fb), square(5..10));
    }

    #[test]
    fn rect_fully_outside() {
        let mut fb = Framebuffer::new(10, 10);
        fb.draw_rect(20, 20, 5, 5, RED);
        fb.draw_rect(-5, 0, 5, 5, RED);
        fb.draw_rect(2, 2, 0, 3, RED);
        fb.draw_rect(2, 2, -3, 3, RED);
        assert!(drawn(&fb).is_empty());
    }

    #[test]
    fn rect_extreme_values() {
        let mut fb = Framebuffer::new(10, 10);
        fb.draw_rect(i32::MIN, i32::MIN, i32::MAX, i32::MAX, RED);
        fb.draw_rect(i32::MAX, i32::MAX, i32::MAX, i32::MAX, RED);
        assert!(drawn(&fb).is_empty());

        fb.draw_rect(-1, -1, i32::MAX, i32::MAX, RED);
        assert_eq!(drawn(&fb), square(0..10));
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersection(Rect::new(5, 5, 10, 10)), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersection(Rect::new(10, 0, 5, 5)), None);
    }

    #[test]
    fn diagonal_line() {
        let mut fb = Framebuffer::new(8, 8);
        fb.draw_line(0, 0, 4, 4, RED);
        assert_eq!(
            drawn(&fb),
            BTreeSet::from([(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)])
        );
    }

    #[test]
    fn line_is_symmetric_for_axis_aligned() {
        let mut fb = Framebuffer::new(8, 8);
        fb.draw_line(6, 2, 1, 2, RED);
        assert_eq!(drawn(&fb), (1..=6).map(|x| (x, 2)).collect::<BTreeSet<_>>());
    }

    #[test]
    fn line_reenters_surface() {
        let mut fb = Framebuffer::new(4, 4);
        fb.draw_line(-3, 1, 6, 1, RED);
        assert_eq!(drawn(&fb), (0..4).map(|x| (x, 1)).collect::<BTreeSet<_>>());
    }

    #[test]
    fn single_point_line() {
        let mut fb = Framebuffer::new(4, 4);
        fb.draw_line(2, 3, 2, 3, RED);
        assert_eq!(drawn(&fb), BTreeSet::from([(2, 3)]));
    }

    #[test]
    fn read_pixel() {
        let mut fb = Framebuffer::new(4, 4);
        fb.draw_point(1, 2, RED);
        assert_eq!(fb.read_pixel(1, 2), Some(RED));
        assert_eq!(fb.read_pixel(0, 0), Some(Color::default()));
        assert_eq!(fb.read_pixel(4, 0), None);
        assert_eq!(fb.read_pixel(0, -1), None);
    }

    proptest! {
        #[test]
        fn rect_stays_within_request_and_surface(
            x in -20i32..20, y in -20i32..20, w in -5i32..30, h in -5i32..30,
        ) {
            let mut fb = Framebuffer::new(10, 10);
            fb.draw_rect(x, y, w, h, RED);
            for (px, py) in drawn(&fb) {
                let (px, py) = (px as i32, py as i32);
                prop_assert!(px >= x && px < x + w && py >= y && py < y + h);
            }
            let expected_w = ((x + w).min(10) - x.max(0)).max(0);
            let expected_h = ((y + h).min(10) - y.max(0)).max(0);
            prop_assert_eq!(drawn(&fb).len() as i32, expected_w * expected_h);
        }

        #[test]
        fn line_endpoints_are_drawn(
            x1 in 0i32..16, y1 in 0i32..16, x2 in 0i32..16, y2 in 0i32..16,
        ) {
            let mut fb = Framebuffer::new(16, 16);
            fb.draw_line(x1, y1, x2, y2, RED);
            let pixels = drawn(&fb);
            prop_assert!(pixels.contains(&(x1 as usize, y1 as usize)));
            prop_assert!(pixels.contains(&(x2 as usize, y2 as usize)));
            let steps = (x2 - x1).abs().max((y2 - y1).abs()) as usize;
            prop_assert_eq!(pixels.len(), steps + 1);
        }
    }
}
