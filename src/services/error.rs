use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} store is unavailable: lock poisoned")]
    Poisoned(&'static str),
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("campaign analyzer is not configured")]
    Unavailable,
    #[error("analyzer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("analyzer returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed analyzer response: {0}")]
    Malformed(String),
}
