use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

pub type SvlinkResult<T> = std::result::Result<T, SvlinkError>;

#[derive(Debug, Error)]
pub enum SvlinkError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error("Malformed header: {message}")]
    HeaderFormat { message: String },
    #[error("Malformed record: {message}: {line}")]
    MalformedRecord { message: String, line: String },
    #[error("Tag {tag} not found")]
    TagNotFound { tag: String },
    #[error(
        "Input is not coordinate-sorted at {chrom}:{pos} (previous position {previous}). \
         Sort the input and rerun"
    )]
    OrderViolation {
        chrom: String,
        pos: i64,
        previous: i64,
    },
    #[error("Invalid gzip header: {path}")]
    InvalidGzipHeader { path: String },
}

impl SvlinkError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn malformed_record(message: impl Into<String>, line: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
            line: line.into(),
        }
    }

    pub fn header_format(message: impl Into<String>) -> Self {
        Self::HeaderFormat {
            message: message.into(),
        }
    }

    pub fn tag_not_found(tag: impl Into<String>) -> Self {
        Self::TagNotFound { tag: tag.into() }
    }
}

#[macro_export]
macro_rules! svlink_error {
    ($($arg:tt)*) => {
        $crate::error::SvlinkError::message(format!($($arg)*))
    };
}
