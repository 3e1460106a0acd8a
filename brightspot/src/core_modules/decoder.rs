// THEORY:
// The decoder is the only place raw upload bytes are trusted to mean anything.
// It hands the container sniffing and decompression to the `image` crate, forces
// the result to 8-bit RGB, and reorders it into the engine's B,G,R grid. Alpha
// and higher bit depths are flattened away here so that nothing downstream has to
// care which format was uploaded.

use crate::core_modules::error::DecodeError;
use crate::core_modules::pixel_grid::pixel_grid::PixelGrid;

/// Decodes a JPEG or PNG byte buffer into a B,G,R pixel grid.
pub fn decode(bytes: &[u8]) -> Result<PixelGrid, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroArea { width, height });
    }

    Ok(PixelGrid::from_rgb_image(&rgb))
}
