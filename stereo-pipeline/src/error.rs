use crate::sink::SinkError;
use crate::source::SourceError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the run configuration, detected before or while setting up the pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid frame range string '{0}'")]
    InvalidRange(String),
    #[error("invalid number token in frame range: '{0}'")]
    InvalidRangeToken(String),
    #[error("frame range step must be at least 1, got {0}")]
    InvalidFrameStep(i64),
    #[error("frame range start must not be negative, got {0}")]
    NegativeRangeStart(i64),
    #[error("invalid input file type specified: '{0}'")]
    InvalidInputType(String),
    #[error("unrecognized input file type; unhandled suffix '{0}'")]
    UnrecognizedSuffix(String),
    #[error("VRMS support not enabled")]
    VrmsUnavailable,
    #[error("no output formats specified; nothing to do")]
    NoOutputs,
    #[error("no frame ranges specified; nothing to do")]
    NoRanges,
    #[error("{0} output requires stereo calibration")]
    CalibrationRequired(&'static str),
    #[error("{0} output requires stereo method")]
    MethodRequired(&'static str),
    #[error("failed to read {what} file '{path}': {source}")]
    Read {
        what: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {what} file '{path}': {source}")]
    Parse {
        what: &'static str,
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid stereo calibration: {0}")]
    InvalidCalibration(String),
    #[error("plugin for stereo method '{0}' not found")]
    UnknownMethod(String),
    #[error("invalid parameters for stereo method '{method}': {reason}")]
    InvalidMethodParameters { method: String, reason: String },
}

/// Any error that aborts a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
