// THEORY:
// The annotator turns the analyzer's two extrema into something a person can see:
// a red ring around the brightest pixel and a blue ring around the darkest one.
// It never touches the caller's grid. It clones it, paints on the clone, and
// returns the clone wrapped as an `AnnotatedImage`.
//
// Rings are anti-aliased by coverage. For each pixel near a marker we measure how
// far its centre sits from the ideal circle; inside half the stroke width the
// pixel takes the marker colour outright, and over the next pixel outwards the
// colour fades into the original. Pixels farther out are left byte-identical,
// which keeps every change confined to the two marker regions.

use crate::core_modules::error::InvariantViolation;
use crate::core_modules::pixel_grid::pixel_grid::{Bgr, PixelGrid, Point};

/// Circle radius of each marker, in pixels.
pub const MARKER_RADIUS: f64 = 10.0;
/// Stroke width of each marker, in pixels.
pub const MARKER_THICKNESS: f64 = 2.0;
/// Red, in B,G,R order.
pub const BRIGHTEST_COLOR: Bgr = [0, 0, 255];
/// Blue, in B,G,R order.
pub const DARKEST_COLOR: Bgr = [255, 0, 0];

/// Distance from a marker centre past which no pixel is ever modified.
pub const MARKER_REACH: f64 = MARKER_RADIUS + MARKER_THICKNESS / 2.0 + 0.5;

/// A copy of the analysed image with both extrema circled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedImage(PixelGrid);

impl AnnotatedImage {
    pub fn grid(&self) -> &PixelGrid {
        &self.0
    }

    pub fn into_grid(self) -> PixelGrid {
        self.0
    }
}

/// Draws the brightest (red) and darkest (blue) markers on a copy of `grid`.
pub fn annotate(
    grid: &PixelGrid,
    brightest: Point,
    darkest: Point,
) -> Result<AnnotatedImage, InvariantViolation> {
    if grid.as_bytes().len() != grid.expected_len() {
        return Err(InvariantViolation::BufferLength {
            expected: grid.expected_len(),
            actual: grid.as_bytes().len(),
        });
    }
    for point in [brightest, darkest] {
        if !grid.contains(point) {
            return Err(InvariantViolation::PointOutOfBounds {
                x: point.x,
                y: point.y,
                width: grid.width(),
                height: grid.height(),
            });
        }
    }

    let mut canvas = grid.clone();
    draw_ring(&mut canvas, brightest, BRIGHTEST_COLOR);
    draw_ring(&mut canvas, darkest, DARKEST_COLOR);
    Ok(AnnotatedImage(canvas))
}

/// How much of the stroke covers a pixel whose centre is `distance` from the ring centre.
fn coverage(distance: f64) -> f64 {
    let half = MARKER_THICKNESS / 2.0;
    (half + 0.5 - (distance - MARKER_RADIUS).abs()).clamp(0.0, 1.0)
}

fn blend(src: Bgr, color: Bgr, alpha: f64) -> Bgr {
    let mix = |s: u8, c: u8| (s as f64 * (1.0 - alpha) + c as f64 * alpha).round() as u8;
    [
        mix(src[0], color[0]),
        mix(src[1], color[1]),
        mix(src[2], color[2]),
    ]
}

fn draw_ring(canvas: &mut PixelGrid, center: Point, color: Bgr) {
    let reach = MARKER_REACH.ceil() as i64;
    let (cx, cy) = (center.x as i64, center.y as i64);
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);

    for y in (cy - reach).max(0)..=(cy + reach).min(height - 1) {
        for x in (cx - reach).max(0)..=(cx + reach).min(width - 1) {
            let dx = (x - cx) as f64;
            let dy = (y - cy) as f64;
            let alpha = coverage((dx * dx + dy * dy).sqrt());
            if alpha <= 0.0 {
                continue;
            }
            let (px, py) = (x as u32, y as u32);
            let blended = blend(canvas.pixel(px, py), color, alpha);
            canvas.put_pixel(px, py, blended);
        }
    }
}
