//! Error types for vpnconfgen

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfgenError {
    /// Connection descriptor violates a structural invariant
    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(String),

    /// Requested format identifier is not registered
    #[error("Unknown format '{requested}' (valid formats: {known})")]
    UnknownFormat { requested: String, known: String },

    /// A renderer-required field is absent from the descriptor
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// Source document could not be deserialized
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::DeError> for ConfgenError {
    fn from(error: quick_xml::DeError) -> Self {
        ConfgenError::ParseError(error.to_string())
    }
}

impl From<serde_json::Error> for ConfgenError {
    fn from(error: serde_json::Error) -> Self {
        ConfgenError::ParseError(error.to_string())
    }
}

pub type ConfgenResult<T> = Result<T, ConfgenError>;
