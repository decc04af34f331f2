#[derive(Debug, thiserror::Error)]
pub enum RealizeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("response body exceeds {limit_bytes} bytes; narrow the date range or breakdown")]
    PayloadTooLarge { limit_bytes: u64 },

    #[error("page {page} out of range 1..={max}")]
    PageOutOfRange { page: usize, max: usize },

    #[error("request failed: {0}")]
    RequestFailed(String),
}

pub type Result<T> = std::result::Result<T, RealizeError>;
