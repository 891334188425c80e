use reqwest::StatusCode;

/// Reasons an upstream fetch is abandoned in favour of the fallback set.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {0}")]
    Status(StatusCode),

    #[error("Provider returned response code {0}")]
    ResponseCode(u8),

    #[error("Provider returned no questions")]
    Empty,

    #[error("Malformed question: {0}")]
    Malformed(String),

    #[error("Running offline")]
    Offline,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("A session needs at least one question")]
    NoQuestions,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to (de)serialize stored value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
}
