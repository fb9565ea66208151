//! The first line of a message: a request line or a status line.
//!
//! Start lines are validated with `httparse`, which accepts HTTP/1.0 and HTTP/1.1 only.

use std::fmt;

use http::Method;
use httparse::Status;
use tracing::trace;

use crate::error::ParseError;
use crate::path::HttpPath;
use crate::status::StatusCode;
use crate::version::HttpVersion;

/// Whether a header block opens a request or a response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PduKind {
    Request,
    Response,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    /// `<METHOD> <path> HTTP/x.y`
    Request { method: Method, path: HttpPath, version: HttpVersion },
    /// `HTTP/x.y <code> <name>`
    Status { version: HttpVersion, status: StatusCode },
}

impl StartLine {
    pub fn request(method: Method, path: impl Into<HttpPath>) -> Self {
        StartLine::Request { method, path: path.into(), version: HttpVersion::default() }
    }

    pub fn status(status: StatusCode) -> Self {
        StartLine::Status { version: HttpVersion::default(), status }
    }

    pub fn parse(line: &str, kind: PduKind) -> Result<Self, ParseError> {
        // httparse wants a complete head, so terminate the single line
        let head = format!("{}\r\n\r\n", line.trim());

        match kind {
            PduKind::Request => {
                let mut req = httparse::Request::new(&mut []);
                match req.parse(head.as_bytes()).map_err(ParseError::invalid_start_line)? {
                    Status::Complete(_) => {}
                    Status::Partial => return Err(ParseError::invalid_start_line("incomplete request line")),
                }

                let method = req.method.ok_or_else(|| ParseError::invalid_start_line("missing method"))?;
                let method = Method::from_bytes(method.as_bytes()).map_err(ParseError::invalid_start_line)?;
                let path = req.path.ok_or_else(|| ParseError::invalid_start_line("missing request target"))?;
                let version = req.version.ok_or_else(|| ParseError::invalid_start_line("missing version"))?;

                trace!(%method, path, version, "parsed request line");
                Ok(StartLine::Request { method, path: HttpPath::new(path), version: HttpVersion::new(1, version) })
            }
            PduKind::Response => {
                let mut res = httparse::Response::new(&mut []);
                match res.parse(head.as_bytes()).map_err(ParseError::invalid_start_line)? {
                    Status::Complete(_) => {}
                    Status::Partial => return Err(ParseError::invalid_start_line("incomplete status line")),
                }

                let version = res.version.ok_or_else(|| ParseError::invalid_start_line("missing version"))?;
                let code = res.code.ok_or_else(|| ParseError::invalid_start_line("missing status code"))?;

                trace!(code, version, "parsed status line");
                Ok(StartLine::Status { version: HttpVersion::new(1, version), status: StatusCode::from_code(u32::from(code)) })
            }
        }
    }

    pub fn kind(&self) -> PduKind {
        match self {
            StartLine::Request { .. } => PduKind::Request,
            StartLine::Status { .. } => PduKind::Response,
        }
    }

    pub fn version(&self) -> HttpVersion {
        match self {
            StartLine::Request { version, .. } | StartLine::Status { version, .. } => *version,
        }
    }

    pub fn method(&self) -> Option<&Method> {
        match self {
            StartLine::Request { method, .. } => Some(method),
            StartLine::Status { .. } => None,
        }
    }

    pub fn path(&self) -> Option<&HttpPath> {
        match self {
            StartLine::Request { path, .. } => Some(path),
            StartLine::Status { .. } => None,
        }
    }

    pub fn status_code(&self) -> Option<&StatusCode> {
        match self {
            StartLine::Status { status, .. } => Some(status),
            StartLine::Request { .. } => None,
        }
    }
}

impl fmt::Display for StartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartLine::Request { method, path, version } => write!(f, "{method} {path} {version}"),
            StartLine::Status { version, status } => write!(f, "{version} {status}"),
        }
    }
}
