//! Error types for the phrase-engine crate.

use std::fmt;

pub type Result<T> = std::result::Result<T, PhraseError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PhraseError {
    IoError(String),
    PatternFile(String),
    StopwordFile(String),
    MalformedRequest(String),
    IndexCorrupted(String),
    IndexFrozen,
    ServerError(String),
}

impl fmt::Display for PhraseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhraseError::IoError(msg) => write!(f, "IO error: {msg}"),
            PhraseError::PatternFile(msg) => write!(f, "Pattern file error: {msg}"),
            PhraseError::StopwordFile(msg) => write!(f, "Stopword file error: {msg}"),
            PhraseError::MalformedRequest(msg) => write!(f, "Malformed request: {msg}"),
            PhraseError::IndexCorrupted(msg) => write!(f, "Index corrupted: {msg}"),
            PhraseError::IndexFrozen => {
                write!(f, "Index is frozen; no mutation after matching begins")
            }
            PhraseError::ServerError(msg) => write!(f, "Server error: {msg}"),
        }
    }
}

impl std::error::Error for PhraseError {}

impl From<std::io::Error> for PhraseError {
    fn from(err: std::io::Error) -> Self {
        PhraseError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PhraseError {
    fn from(err: serde_json::Error) -> Self {
        PhraseError::MalformedRequest(err.to_string())
    }
}
