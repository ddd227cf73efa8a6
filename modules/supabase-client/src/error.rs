use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupabaseError>;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No new rows stored in table {0}; key already present")]
    EmptyUpsert(String),
}

impl From<reqwest::Error> for SupabaseError {
    fn from(err: reqwest::Error) -> Self {
        SupabaseError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SupabaseError {
    fn from(err: serde_json::Error) -> Self {
        SupabaseError::Parse(err.to_string())
    }
}
