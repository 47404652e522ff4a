use std::fmt;

use thiserror::Error;

/// The CRL field a decode step was working on when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrlField {
    Issuer,
    ThisUpdate,
    NextUpdate,
}

impl fmt::Display for CrlField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrlField::Issuer => "issuer",
            CrlField::ThisUpdate => "thisUpdate",
            CrlField::NextUpdate => "nextUpdate",
        };
        f.write_str(name)
    }
}

/// Decode failures produced while extracting a single field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("anchor {anchor} not found (needed occurrence #{occurrence})")]
    AnchorNotFound {
        anchor: &'static str,
        occurrence: usize,
    },

    #[error("declared length {declared} exceeds {available} available bytes")]
    MalformedLength { declared: usize, available: usize },

    #[error("invalid UTCTime value {0:?}")]
    InvalidTimeFormat(String),
}

/// A decode failure tagged with the field that could not be extracted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to decode CRL {field}")]
pub struct CrlDecodeError {
    pub field: CrlField,
    #[source]
    pub kind: DecodeError,
}

impl CrlDecodeError {
    pub fn new(field: CrlField, kind: DecodeError) -> Self {
        Self { field, kind }
    }
}

/// Errors raised while retrieving and decoding a CRL
#[derive(Error, Debug)]
pub enum CrlError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("Timeout while fetching CRL from {0}")]
    Timeout(String),

    #[error("HTTP error {status} when fetching CRL from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid CRL URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Decode(#[from] CrlDecodeError),
}

/// Convenient Result type alias
pub type CrlResult<T> = Result<T, CrlError>;
