use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the remote dashboard API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("session token was rejected by {endpoint}; log in again")]
    Unauthorized { endpoint: String },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("{endpoint} rejected the request: {message}")]
    Rejected { endpoint: String, message: String },
    #[error("{endpoint} returned a malformed response: {details}")]
    Malformed { endpoint: String, details: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("row {row_index} could not be serialized: {source}")]
    Serialize {
        row_index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV output was not valid UTF-8")]
    Encoding,
    #[error("could not deliver {path}: {source}")]
    Delivery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("not logged in; run `hafalan-tracker login` first")]
    Missing,
    #[error("account {0} is not linked to a mahasantri record")]
    UnlinkedAccount(i64),
    #[error("this command requires the {required} role (logged in as {actual})")]
    Forbidden {
        required: &'static str,
        actual: &'static str,
    },
}

/// A form field that failed client-side validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("juz must be between 1 and 30, got {0}")]
    JuzOutOfRange(u8),
    #[error("halaman must not be empty")]
    EmptyHalaman,
    #[error("total setoran must be at least 1")]
    EmptySetoran,
    #[error("tanggal must be formatted as YYYY-MM-DD, got '{0}'")]
    InvalidTanggal(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set to the dashboard API base URL")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
