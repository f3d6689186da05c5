use {
    crate::mat::MatError,
    std::{io, path::PathBuf},
    thiserror::Error,
};

/// Errors raised while loading or reconciling gauge data
#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("missing file {path:?}")]
    MissingFile { path: PathBuf },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?} line {line}: {reason}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to decode {path:?}: {source}")]
    Measurement {
        path: PathBuf,
        #[source]
        source: MatError,
    },

    #[error("{path:?} has no variable {name:?}")]
    MissingVariable { path: PathBuf, name: String },

    #[error("invalid series: {0}")]
    InvalidSeries(String),

    #[error("stations {first:?} and {second:?} both resolve to gauge {gauge_no}")]
    StationCollision {
        gauge_no: u32,
        first: String,
        second: String,
    },

    #[error("station {label:?} listed on lines {first} and {second} of {path:?}")]
    DuplicateStation {
        path: PathBuf,
        label: String,
        first: usize,
        second: usize,
    },

    #[error("simulated gauges {first} and {second} are both labelled {label:?}")]
    SimulatedCollision {
        label: String,
        first: u32,
        second: u32,
    },

    #[error("invalid landfall for {source_name}: {reason}")]
    Landfall { source_name: String, reason: String },
}

impl GaugeError {
    /// Classifies an I/O failure on `path`, separating absent files from other read errors
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            GaugeError::MissingFile { path }
        } else {
            GaugeError::Read { path, source }
        }
    }
}
