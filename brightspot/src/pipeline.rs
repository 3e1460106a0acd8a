// THEORY:
// The `pipeline` module is the top-level API of the engine. One call takes the
// bytes and file name of a single upload and walks them through every stage,
// returning a typed report instead of a loose map of values. The results
// directory is handed in through `PipelineConfig` rather than created as a side
// effect of loading the module.

use crate::core_modules::annotator::annotate;
use crate::core_modules::decoder::decode;
use crate::core_modules::error::BrightspotError;
use crate::core_modules::intensity::{Luminance, analyze};
use crate::core_modules::persistor::save;
use std::path::PathBuf;

// Re-export key data structures for the public API.
pub use crate::core_modules::annotator::AnnotatedImage;
pub use crate::core_modules::intensity::{GrayscaleGrid, Statistics};
pub use crate::core_modules::persistor::StoredArtifact;
pub use crate::core_modules::pixel_grid::pixel_grid::Point;
pub use crate::core_modules::record::AnalysisRecord;
use serde::{Deserialize, Serialize};

/// Configuration for the AnalysisPipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory annotated images are written to. Must already exist.
    pub results_dir: PathBuf,
}

/// Everything one successful run produced.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub statistics: Statistics,
    pub artifact: StoredArtifact,
    pub record: AnalysisRecord,
}

/// The payload returned to whoever submitted the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub average_brightness: Luminance,
    pub brightest_point: Point,
    pub darkest_point: Point,
    pub brightest_value: Luminance,
    pub darkest_value: Luminance,
    /// Name of the stored annotated image.
    pub processed_image: String,
}

impl AnalysisReport {
    pub fn response(&self) -> AnalysisResponse {
        AnalysisResponse {
            average_brightness: self.statistics.average_brightness,
            brightest_point: self.statistics.brightest_point,
            darkest_point: self.statistics.darkest_point,
            brightest_value: self.statistics.brightest_value,
            darkest_value: self.statistics.darkest_value,
            processed_image: self.artifact.identifier.clone(),
        }
    }
}

/// Runs decode → analyze → annotate → save for one image at a time.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: PipelineConfig,
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn process(&self, bytes: &[u8], filename: &str) -> Result<AnalysisReport, BrightspotError> {
        // Stage 1: Decode
        let grid = decode(bytes)?;

        // Stage 2: Luminance statistics
        let (_gray, statistics) = analyze(&grid)?;

        // Stage 3: Markers on a copy
        let annotated = annotate(&grid, statistics.brightest_point, statistics.darkest_point)?;

        // Stage 4: Persist
        let artifact = save(&annotated, &self.config.results_dir, filename)?;

        let record = AnalysisRecord::new(filename, &statistics);
        Ok(AnalysisReport {
            statistics,
            artifact,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::error::{DecodeError, PersistError};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn pipeline(dir: &TempDir) -> AnalysisPipeline {
        AnalysisPipeline::new(PipelineConfig {
            results_dir: dir.path().to_path_buf(),
        })
    }

    #[test]
    fn process_reports_statistics_and_artifact() {
        let dir = TempDir::new().unwrap();
        let mut image = RgbImage::from_pixel(30, 20, Rgb([100, 100, 100]));
        image.put_pixel(12, 7, Rgb([255, 255, 255]));
        image.put_pixel(3, 15, Rgb([0, 0, 0]));

        let report = pipeline(&dir).process(&png_bytes(&image), "scene.png").unwrap();

        assert_eq!(report.statistics.brightest_point, Point::new(12, 7));
        assert_eq!(report.statistics.darkest_point, Point::new(3, 15));
        assert!(report.artifact.path.starts_with(dir.path()));
        assert!(report.artifact.identifier.ends_with("_scene.png"));
        assert_eq!(report.record.filename, "scene.png");
        assert_eq!(report.record.brightest_value, 255.0);
    }

    #[test]
    fn response_serializes_points_as_pairs() {
        let dir = TempDir::new().unwrap();
        let image = RgbImage::from_pixel(4, 4, Rgb([10, 10, 10]));
        let report = pipeline(&dir).process(&png_bytes(&image), "flat.png").unwrap();

        let value = serde_json::to_value(report.response()).unwrap();
        assert_eq!(value["brightest_point"], serde_json::json!([0, 0]));
        assert_eq!(value["darkest_point"], serde_json::json!([0, 0]));
        assert_eq!(value["processed_image"], report.artifact.identifier.as_str());
    }

    #[test]
    fn decode_failure_stops_before_persisting() {
        let dir = TempDir::new().unwrap();
        let err = pipeline(&dir).process(b"", "empty.png").unwrap_err();

        assert!(matches!(err, BrightspotError::Decode(DecodeError::Empty)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn persist_failure_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let image = RgbImage::from_pixel(4, 4, Rgb([10, 10, 10]));
        let err = pipeline(&dir).process(&png_bytes(&image), "flat.bmp").unwrap_err();
        assert!(matches!(
            err,
            BrightspotError::Persist(PersistError::UnsupportedFormat(_))
        ));
    }
}
