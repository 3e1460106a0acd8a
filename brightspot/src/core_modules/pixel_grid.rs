// THEORY:
// The `PixelGrid` is the "dumb" data container every other stage reads from. It
// holds one decoded still image as a flat, row-major buffer of 8-bit samples,
// three per pixel, in a fixed B,G,R channel order. The marker colours are defined
// in that same order, so nothing downstream ever has to guess which byte is red.
//
// Key architectural principles:
// 1.  **Immutability**: There is no mutating public API. Anything that wants a
//     different image (the annotator) builds a new grid from a copy of the bytes.
// 2.  **Shape lives with the data**: Width and height travel with the buffer. The
//     container does not enforce that they agree; the analyzer checks that before
//     it trusts the grid, which is what lets it report a malformed grid instead
//     of indexing out of bounds.
// 3.  **Bridge to the `image` crate**: Codecs speak RGB, so the only places the
//     channel order is swapped are `from_rgb_image` and `to_rgb_image`.

pub mod pixel_grid {
    use image::RgbImage;
    use serde::{Deserialize, Serialize};

    pub type Byte = u8;
    pub type Bytes = Vec<Byte>;
    pub type Channel = Byte;
    /// One pixel as (blue, green, red).
    pub type Bgr = [Channel; 3];

    pub const CHANNELS: usize = 3;

    /// A coordinate on the pixel grid. `x` is the column, `y` the row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(from = "[u32; 2]", into = "[u32; 2]")]
    pub struct Point {
        pub x: u32,
        pub y: u32,
    }

    impl Point {
        pub fn new(x: u32, y: u32) -> Self {
            Self { x, y }
        }
    }

    impl From<[u32; 2]> for Point {
        fn from([x, y]: [u32; 2]) -> Self {
            Self { x, y }
        }
    }

    impl From<Point> for [u32; 2] {
        fn from(point: Point) -> Self {
            [point.x, point.y]
        }
    }

    /// A decoded image: `height` rows of `width` pixels, 3 samples each, B,G,R order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PixelGrid {
        width: u32,
        height: u32,
        data: Bytes,
    }

    impl PixelGrid {
        /// Wraps a raw B,G,R buffer. The shape is not checked here.
        pub fn from_bgr_bytes(width: u32, height: u32, data: Bytes) -> Self {
            Self {
                width,
                height,
                data,
            }
        }

        /// Builds a grid where every pixel has the same colour.
        pub fn filled(width: u32, height: u32, pixel: Bgr) -> Self {
            let count = width as usize * height as usize;
            let mut data = Vec::with_capacity(count * CHANNELS);
            for _ in 0..count {
                data.extend_from_slice(&pixel);
            }
            Self::from_bgr_bytes(width, height, data)
        }

        pub fn from_rgb_image(image: &RgbImage) -> Self {
            let (width, height) = image.dimensions();
            let mut data = image.as_raw().clone();
            for pixel in data.chunks_exact_mut(CHANNELS) {
                pixel.swap(0, 2);
            }
            Self::from_bgr_bytes(width, height, data)
        }

        /// Converts back to the `image` crate's RGB layout for encoding.
        /// Returns `None` if the buffer does not match the declared shape.
        pub fn to_rgb_image(&self) -> Option<RgbImage> {
            let mut data = self.data.clone();
            for pixel in data.chunks_exact_mut(CHANNELS) {
                pixel.swap(0, 2);
            }
            RgbImage::from_raw(self.width, self.height, data)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn channels(&self) -> usize {
            CHANNELS
        }

        pub fn as_bytes(&self) -> &[Byte] {
            &self.data
        }

        pub fn into_bytes(self) -> Bytes {
            self.data
        }

        /// Number of samples a well-formed grid of this shape would hold.
        pub fn expected_len(&self) -> usize {
            self.width as usize * self.height as usize * CHANNELS
        }

        pub fn contains(&self, point: Point) -> bool {
            point.x < self.width && point.y < self.height
        }

        fn offset(&self, x: u32, y: u32) -> usize {
            (y as usize * self.width as usize + x as usize) * CHANNELS
        }

        /// The (blue, green, red) samples at `(x, y)`.
        ///
        /// Panics if the point is outside the grid.
        pub fn pixel(&self, x: u32, y: u32) -> Bgr {
            let i = self.offset(x, y);
            [self.data[i], self.data[i + 1], self.data[i + 2]]
        }

        /// Crate-internal write access, used by the annotator on its own copy.
        pub(crate) fn put_pixel(&mut self, x: u32, y: u32, pixel: Bgr) {
            let i = self.offset(x, y);
            self.data[i..i + CHANNELS].copy_from_slice(&pixel);
        }
    }
}
