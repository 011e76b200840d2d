//! 库级错误类型。
//!
//! Every fallible operation in the library returns [`Result`]. Errors are
//! grouped into the three families callers usually branch on (see
//! [`ErrorKind`]); the binary wraps them with `anyhow` context.

use thiserror::Error;

/// Coarse classification of a [`PrepError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or conflicting arguments, fitting twice, empty inputs.
    Configuration,
    /// A name, scheme or symbol that does not exist.
    Lookup,
    /// Data that cannot produce a well-defined result.
    DegenerateData,
    /// Everything else: I/O, parsing, shapes.
    Other,
}

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("missing alleles: {}", .alleles.join(" "))]
    MissingAlleles { alleles: Vec<String> },

    #[error("unknown encoding scheme '{name}' (valid: {})", .legal.join(", "))]
    UnknownScheme { name: String, legal: Vec<String> },

    #[error("encoding table '{scheme}' has no row for symbol '{symbol}'")]
    MissingSymbol { symbol: char, scheme: String },

    #[error("invalid symbol '{symbol}' in sequence '{sequence}'")]
    InvalidSymbol { symbol: char, sequence: String },

    #[error("degenerate data: {message}")]
    DegenerateData { message: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[error("shape mismatch: expected {expected}, got {found}")]
    Shape { expected: String, found: String },

    #[error("malformed input: {message}")]
    Malformed { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, PrepError>;

impl PrepError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateData {
            message: message.into(),
        }
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Shape {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::MissingAlleles { .. }
            | Self::UnknownScheme { .. }
            | Self::MissingSymbol { .. }
            | Self::InvalidSymbol { .. } => ErrorKind::Lookup,
            Self::DegenerateData { .. } => ErrorKind::DegenerateData,
            _ => ErrorKind::Other,
        }
    }
}
