//! Error type shared by the collectors and the manual extractor.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("fetch {url}: unexpected http status {status}")]
    Status { url: String, status: u16 },

    #[error("term/definition count mismatch: {terms} terms, {definitions} definitions")]
    StructureMismatch { terms: usize, definitions: usize },

    #[error("no version marker found in {0}")]
    MissingVersionMarker(String),

    #[error("S3 listing: {0}")]
    Listing(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CollectError>;
