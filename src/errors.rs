use thiserror::Error;

/// Crate-wide error type.
///
/// Only run-aborting conditions live here. Per-file rejections
/// ([`RejectReason`](crate::directory::RejectReason)) and per-filter statistics
/// failures ([`ComputeFailure`](crate::statistics::ComputeFailure)) are collected
/// into the validation report instead of being raised.
#[derive(Error, Debug)]
pub enum Sg1Error {
    #[error("invalid TIC or TOI identifier: {0} (expected the form \"12345678.01\")")]
    InvalidTargetId(String),

    #[error("planet indices of TIC and TOI must match (TIC .{tic}, TOI .{toi})")]
    PlanetIndexMismatch { tic: String, toi: String },

    #[error("invalid directory: {0}")]
    InvalidDirectory(String),

    #[error("{0}")]
    MissingArgument(String),

    #[error("disallowed file present: {0}")]
    DisallowedFile(String),

    #[error("no recognized files for the given TIC/TOI")]
    NoRecognizedFiles,

    #[error("multiple dates/observatories found: dates={dates:?}, observatories={observatories:?}")]
    MultipleDatesOrObservatories {
        dates: Vec<String>,
        observatories: Vec<String>,
    },

    #[error("unable to perform file operation: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ExoFOP login failed (status {0})")]
    LoginFailed(u16),

    #[error("time series summary submission failed for filter {filter} (status {status})")]
    SummaryUploadFailed { filter: String, status: u16 },

    #[error("file upload failed: {file} (status {status})")]
    FileUploadFailed { file: String, status: u16 },

    #[error("user cancelled before uploads")]
    NotConfirmed,
}
