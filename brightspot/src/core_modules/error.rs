// THEORY:
// Every stage of the engine fails for its own reason, and the caller needs to
// tell those reasons apart: bad bytes are the uploader's fault, a malformed grid
// or an out-of-range marker is ours, and a failed write is the disk's. Each
// stage therefore owns a small error enum, and `BrightspotError` folds them
// together so the pipeline can use `?` end to end while the caller still
// matches on the stage that broke.

use std::path::PathBuf;
use thiserror::Error;

/// The input bytes could not be turned into a pixel grid.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("image buffer is empty")]
    Empty,
    #[error("image could not be decoded: {0}")]
    Unreadable(#[from] image::ImageError),
    #[error("decoded image has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },
}

/// A grid reached the analyzer in a shape no decoder should ever produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("grid has a zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },
    #[error("grid buffer holds {actual} samples, expected {expected} for 3 channels")]
    BufferLength { expected: usize, actual: usize },
}

/// An internal contract was broken. Seeing this means a bug, not bad input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("marker point ({x}, {y}) lies outside the {width}x{height} grid")]
    PointOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("grid buffer holds {actual} samples, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
}

/// Writing or locating a stored artifact failed.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("suggested file name {0:?} has no usable base name")]
    EmptyName(String),
    #[error("file extension of {0:?} is not a supported output format")]
    UnsupportedFormat(String),
    #[error("artifact name {0:?} escapes the results directory")]
    Escapes(String),
    #[error("artifact {0:?} does not exist")]
    NotFound(String),
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Any failure of the full decode → analyze → annotate → save run.
#[derive(Error, Debug)]
pub enum BrightspotError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
