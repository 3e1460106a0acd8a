// THEORY:
// The intensity analyzer reduces a colour grid to one brightness number per
// pixel and then summarises that plane with three facts: how bright it is on
// average, where it is brightest, and where it is darkest.
//
// Key architectural principles:
// 1.  **Single-pixel luma**: Each grayscale sample depends on its own pixel only
//     (Rec. 601 weights, rounded to the nearest integer). No blurring, no
//     normalisation across the image.
// 2.  **One pass**: The mean and both extrema come out of a single row-major scan.
// 3.  **Deterministic ties**: Comparisons are strict, so when several pixels share
//     the extreme value the first one met in row-major order is kept. Identical
//     bytes give identical statistics on every run and every platform, because
//     the sum is accumulated in integers and divided once at the end.
// 4.  **Stateless**: Nothing is cached between calls. The grayscale plane is
//     returned to the caller and the analyzer forgets it.

use crate::core_modules::error::AnalysisError;
use crate::core_modules::pixel_grid::pixel_grid::{CHANNELS, Channel, PixelGrid, Point};
use serde::{Deserialize, Serialize};

pub type Luminance = f64;

const RED_WEIGHT: f64 = 0.299;
const GREEN_WEIGHT: f64 = 0.587;
const BLUE_WEIGHT: f64 = 0.114;

/// Rec. 601 luma of one pixel, rounded and clamped to a byte.
pub fn luma(blue: Channel, green: Channel, red: Channel) -> Channel {
    let y = RED_WEIGHT * red as f64 + GREEN_WEIGHT * green as f64 + BLUE_WEIGHT * blue as f64;
    y.round().clamp(0.0, 255.0) as Channel
}

/// Single-channel luma plane derived from a `PixelGrid`, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayscaleGrid {
    width: u32,
    height: u32,
    samples: Vec<Channel>,
}

impl GrayscaleGrid {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[Channel] {
        &self.samples
    }

    pub fn get(&self, x: u32, y: u32) -> Channel {
        self.samples[y as usize * self.width as usize + x as usize]
    }
}

/// Brightness summary of one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Arithmetic mean of every luma sample.
    pub average_brightness: Luminance,
    pub brightest_value: Luminance,
    pub darkest_value: Luminance,
    pub brightest_point: Point,
    pub darkest_point: Point,
}

fn check_shape(grid: &PixelGrid) -> Result<(), AnalysisError> {
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return Err(AnalysisError::ZeroDimension { width, height });
    }
    let expected = grid.expected_len();
    let actual = grid.as_bytes().len();
    if expected != actual {
        return Err(AnalysisError::BufferLength { expected, actual });
    }
    Ok(())
}

/// Computes the luma plane of `grid` and its mean and extrema.
pub fn analyze(grid: &PixelGrid) -> Result<(GrayscaleGrid, Statistics), AnalysisError> {
    check_shape(grid)?;

    let width = grid.width();
    let samples: Vec<Channel> = grid
        .as_bytes()
        .chunks_exact(CHANNELS)
        .map(|bgr| luma(bgr[0], bgr[1], bgr[2]))
        .collect();

    let mut sum = 0u64;
    let mut darkest = (samples[0], 0usize);
    let mut brightest = (samples[0], 0usize);
    for (index, &value) in samples.iter().enumerate() {
        sum += value as u64;
        if value < darkest.0 {
            darkest = (value, index);
        }
        if value > brightest.0 {
            brightest = (value, index);
        }
    }

    let to_point = |index: usize| Point {
        x: (index % width as usize) as u32,
        y: (index / width as usize) as u32,
    };

    let statistics = Statistics {
        average_brightness: sum as f64 / samples.len() as f64,
        brightest_value: brightest.0 as f64,
        darkest_value: darkest.0 as f64,
        brightest_point: to_point(brightest.1),
        darkest_point: to_point(darkest.1),
    };

    let gray = GrayscaleGrid {
        width,
        height: grid.height(),
        samples,
    };
    Ok((gray, statistics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_grid(width: u32, height: u32, values: &[u8]) -> PixelGrid {
        let data = values.iter().flat_map(|&v| [v, v, v]).collect();
        PixelGrid::from_bgr_bytes(width, height, data)
    }

    #[test]
    fn luma_uses_rec601_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 255), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(255, 0, 0), 29);
        assert_eq!(luma(128, 128, 128), 128);
    }

    #[test]
    fn two_by_two_checkerboard() {
        let grid = gray_grid(2, 2, &[0, 255, 0, 255]);
        let (gray, stats) = analyze(&grid).unwrap();

        assert_eq!(gray.samples(), &[0, 255, 0, 255]);
        assert_eq!(stats.average_brightness, 127.5);
        assert_eq!(stats.darkest_point, Point::new(0, 0));
        assert_eq!(stats.brightest_point, Point::new(1, 0));
        assert_eq!(stats.darkest_value, 0.0);
        assert_eq!(stats.brightest_value, 255.0);
    }

    #[test]
    fn all_black_image() {
        let grid = PixelGrid::filled(100, 100, [0, 0, 0]);
        let (_, stats) = analyze(&grid).unwrap();

        assert_eq!(stats.average_brightness, 0.0);
        assert_eq!(stats.darkest_value, 0.0);
        assert_eq!(stats.brightest_value, 0.0);
        assert_eq!(stats.darkest_point, Point::new(0, 0));
        assert_eq!(stats.brightest_point, Point::new(0, 0));
    }

    #[test]
    fn uniform_gray_ties_resolve_to_origin() {
        let grid = PixelGrid::filled(17, 9, [128, 128, 128]);
        let (_, stats) = analyze(&grid).unwrap();

        assert_eq!(stats.brightest_point, Point::new(0, 0));
        assert_eq!(stats.darkest_point, Point::new(0, 0));
        assert_eq!(stats.average_brightness, 128.0);
    }

    #[test]
    fn first_extreme_in_row_major_order_wins() {
        #[rustfmt::skip]
        let grid = gray_grid(3, 3, &[
            50, 50, 200,
            10, 200, 10,
            50, 50, 50,
        ]);
        let (_, stats) = analyze(&grid).unwrap();

        assert_eq!(stats.brightest_point, Point::new(2, 0));
        assert_eq!(stats.darkest_point, Point::new(0, 1));
    }

    #[test]
    fn extrema_bound_the_mean_and_stay_in_range() {
        let (width, height) = (13u32, 7u32);
        let values: Vec<u8> = (0..width * height)
            .map(|i| ((i * 37 + 11) % 251) as u8)
            .collect();
        let grid = gray_grid(width, height, &values);
        let (_, stats) = analyze(&grid).unwrap();

        assert!(stats.darkest_value <= stats.average_brightness);
        assert!(stats.average_brightness <= stats.brightest_value);
        for point in [stats.brightest_point, stats.darkest_point] {
            assert!(point.x < width);
            assert!(point.y < height);
        }
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let mut data = Vec::new();
        for i in 0..64u32 {
            data.extend_from_slice(&[(i * 3) as u8, (i * 5) as u8, (i * 7) as u8]);
        }
        let grid = PixelGrid::from_bgr_bytes(8, 8, data);
        let first = analyze(&grid).unwrap();
        let second = analyze(&grid).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn input_grid_is_untouched() {
        let grid = gray_grid(2, 2, &[1, 2, 3, 4]);
        let before = grid.clone();
        analyze(&grid).unwrap();
        assert_eq!(grid, before);
    }

    #[test]
    fn zero_dimension_is_an_analysis_error() {
        let grid = PixelGrid::from_bgr_bytes(0, 4, Vec::new());
        assert_eq!(
            analyze(&grid).unwrap_err(),
            AnalysisError::ZeroDimension {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn wrong_channel_count_is_an_analysis_error() {
        // 2x2 pixels with 4 samples each
        let grid = PixelGrid::from_bgr_bytes(2, 2, vec![0; 16]);
        assert_eq!(
            analyze(&grid).unwrap_err(),
            AnalysisError::BufferLength {
                expected: 12,
                actual: 16
            }
        );
    }
}
