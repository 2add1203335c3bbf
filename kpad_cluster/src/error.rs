//! Error type for cluster access.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status { method: &'static str, url: String, status: u16, body: String },

    #[error("{method} {url} failed: {reason}")]
    Transport { method: &'static str, url: String, reason: String },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("failed to read token file {path}: {source}")]
    TokenFile {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no app at row {0}")]
    NoApp(usize),

    #[error("cluster worker has stopped")]
    WorkerGone,
}

impl Error {
    /// Map a `ureq` error, reading the body of error responses.
    pub(crate) fn from_ureq(method: &'static str, url: &str, err: ureq::Error) -> Error {
        match err {
            ureq::Error::Status(status, response) => Error::Status {
                method,
                url: url.to_string(),
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(t) => Error::Transport {
                method,
                url: url.to_string(),
                reason: t.to_string(),
            },
        }
    }
}
