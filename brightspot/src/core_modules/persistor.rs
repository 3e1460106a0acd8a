// THEORY:
// The persistor is the engine's only side effect. It takes an annotated image,
// picks a file name for it, encodes it in the format that name's extension asks
// for, and writes it under a results directory the caller chose.
//
// Naming is `output_{YYYYmmdd_HHMMSS}_{base}`:
// - `base` is the last path segment of the uploader's file name with whitespace
//   replaced by `_`, so a name like `../../etc/passwd.png` can only ever land
//   directly inside the results directory.
// - the timestamp has whole-second precision and sorts lexically in time order.
//   Two saves of the same base name inside one second produce the same name and
//   the later write replaces the earlier one. That is the documented behaviour;
//   nothing here locks or uniquifies.
//
// The results directory is configuration, not state. It must already exist;
// creating it is the caller's startup job.

use crate::core_modules::annotator::AnnotatedImage;
use crate::core_modules::error::PersistError;
use chrono::{Local, NaiveDateTime};
use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const NAME_PREFIX: &str = "output";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const JPEG_QUALITY: u8 = 95;

/// An annotated image that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// The generated file name, unique per second and base name.
    pub identifier: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

/// Reduces an uploader-supplied name to a single safe path segment.
pub fn sanitize_name(suggested_name: &str) -> Result<String, PersistError> {
    let segment = suggested_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let base: String = segment
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();

    if base.is_empty() || base == "." || base == ".." {
        return Err(PersistError::EmptyName(suggested_name.to_string()));
    }
    Ok(base)
}

/// The file name a save at `timestamp` would produce for `base`.
pub fn artifact_name(base: &str, timestamp: NaiveDateTime) -> String {
    format!("{NAME_PREFIX}_{}_{base}", timestamp.format(TIMESTAMP_FORMAT))
}

/// Encodes `image` and writes it under `destination_root`, stamped with the local time.
pub fn save(
    image: &AnnotatedImage,
    destination_root: &Path,
    suggested_name: &str,
) -> Result<StoredArtifact, PersistError> {
    save_at(
        image,
        destination_root,
        suggested_name,
        Local::now().naive_local(),
    )
}

/// Same as [`save`] with an explicit timestamp.
pub fn save_at(
    image: &AnnotatedImage,
    destination_root: &Path,
    suggested_name: &str,
    timestamp: NaiveDateTime,
) -> Result<StoredArtifact, PersistError> {
    let base = sanitize_name(suggested_name)?;
    let identifier = artifact_name(&base, timestamp);
    let format = OutputFormat::from_name(&identifier)
        .ok_or_else(|| PersistError::UnsupportedFormat(base.clone()))?;
    let path = destination_root.join(&identifier);

    let rgb = image.grid().to_rgb_image().ok_or_else(|| PersistError::Encode {
        path: path.clone(),
        source: image::ImageError::Parameter(image::error::ParameterError::from_kind(
            image::error::ParameterErrorKind::DimensionMismatch,
        )),
    })?;

    // Encode fully in memory; nothing touches the results directory until this succeeds.
    let mut encoded = Vec::new();
    let (width, height) = rgb.dimensions();
    let written = match format {
        OutputFormat::Png => PngEncoder::new(&mut encoded).write_image(
            rgb.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        ),
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY)
            .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8),
    };
    written.map_err(|source| PersistError::Encode {
        path: path.clone(),
        source,
    })?;

    let io_error = |source| PersistError::Io {
        path: path.clone(),
        source,
    };
    let mut file = File::create(&path).map_err(io_error)?;
    file.write_all(&encoded).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;

    Ok(StoredArtifact { identifier, path })
}

/// Maps a stored artifact name back to its file under `destination_root`.
///
/// Rejects anything that is not a single plain path segment. Only names this
/// module could have generated are ever found; other files sharing the
/// directory report `NotFound`.
pub fn locate(destination_root: &Path, name: &str) -> Result<PathBuf, PersistError> {
    let escapes = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if escapes {
        return Err(PersistError::Escapes(name.to_string()));
    }

    let is_artifact = name.starts_with(&format!("{NAME_PREFIX}_"))
        && OutputFormat::from_name(name).is_some();
    if !is_artifact {
        return Err(PersistError::NotFound(name.to_string()));
    }

    let path = destination_root.join(name);
    if !path.is_file() {
        return Err(PersistError::NotFound(name.to_string()));
    }
    Ok(path)
}
