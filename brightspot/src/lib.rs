// THEORY:
// This file is the main entry point for the `brightspot` library crate.
// It exposes the `AnalysisPipeline` and its data structures (`PipelineConfig`,
// `AnalysisReport`, `AnalysisResponse`) as the high-level interface, while the
// individual stages stay reachable under `core_modules` for callers that want
// to run them one at a time.
//
// Stage order: decoder → intensity → annotator → persistor, with `record`
// assembling the metadata row at the end. None of the stages log; reporting is
// left to whoever calls the pipeline.

pub mod core_modules;
pub mod pipeline;

pub use core_modules::error::{
    AnalysisError, BrightspotError, DecodeError, InvariantViolation, PersistError,
};
pub use core_modules::pixel_grid::pixel_grid::{PixelGrid, Point};
pub use pipeline::{AnalysisPipeline, AnalysisReport, AnalysisResponse, PipelineConfig};
