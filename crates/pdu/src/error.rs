//! Error types of the pdu crate.
//!
//! Expected failures (a malformed header block, an unknown media type, a value that does not
//! coerce) are reported through these types or through `Option`; nothing in this crate panics
//! on bad wire input.

use std::io;

use thiserror::Error;

use crate::status::StatusCode;

/// Errors produced while parsing a raw header block.
///
/// Every variant maps to a protocol-level status through [`ParseError::status`], so the
/// response layer can answer a malformed message without inspecting the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("header block is empty")]
    EmptyHeader,

    #[error("invalid start line: {reason}")]
    InvalidStartLine { reason: String },

    #[error("mandatory Host header is missing")]
    MissingHost,

    #[error("invalid Host header: {reason}")]
    InvalidHost { reason: String },
}

impl ParseError {
    pub fn invalid_start_line<S: ToString>(str: S) -> Self {
        Self::InvalidStartLine { reason: str.to_string() }
    }

    pub fn invalid_host<S: ToString>(str: S) -> Self {
        Self::InvalidHost { reason: str.to_string() }
    }

    /// The status a server should answer with when it receives this malformed header.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Errors produced while acquiring a message body.
///
/// A read timeout or an early EOF is *not* an error: the body is truncated and reported as
/// incomplete instead.
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("body acquisition cancelled before reading")]
    Cancelled,

    #[error("body acquisition failed earlier, the stream is gone")]
    Failed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl BodyError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// A header field value that does not satisfy its registered value type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid value for header {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl FieldError {
    pub fn invalid_value<S: ToString>(name: &'static str, str: S) -> Self {
        Self::InvalidValue { name, reason: str.to_string() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeError {
    #[error("invalid media type {media_type:?}: {reason}")]
    InvalidMediaType { media_type: String, reason: String },
}

impl ContentTypeError {
    pub fn invalid_media_type<S: ToString>(media_type: &str, reason: S) -> Self {
        Self::InvalidMediaType { media_type: media_type.to_string(), reason: reason.to_string() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    #[error("cookie name must not be empty")]
    EmptyName,

    #[error("invalid cookie name {0:?}")]
    InvalidName(String),
}
