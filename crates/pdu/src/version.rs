//! The HTTP protocol version of a start line.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// An `HTTP/<major>.<minor>` protocol version.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpVersion {
    major: u8,
    minor: u8,
}

impl HttpVersion {
    pub const HTTP_10: HttpVersion = HttpVersion { major: 1, minor: 0 };
    pub const HTTP_11: HttpVersion = HttpVersion { major: 1, minor: 1 };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    #[inline]
    pub fn major(&self) -> u8 {
        self.major
    }

    #[inline]
    pub fn minor(&self) -> u8 {
        self.minor
    }

    /// HTTP/1.1 connections are persistent unless `Connection: close` is sent.
    pub fn is_keep_alive_default(&self) -> bool {
        *self >= Self::HTTP_11
    }
}

impl Default for HttpVersion {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

impl FromStr for HttpVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |cause: &dyn fmt::Display| ParseError::invalid_start_line(format!("invalid http version {s:?}: {cause}"));

        let (major, minor) = s
            .trim()
            .strip_prefix("HTTP/")
            .and_then(|v| v.split_once('.'))
            .ok_or_else(|| invalid(&"expected HTTP/<major>.<minor>"))?;
        let major = major.parse::<u8>().map_err(|e| invalid(&e))?;
        let minor = minor.parse::<u8>().map_err(|e| invalid(&e))?;
        Ok(Self { major, minor })
    }
}

impl From<http::Version> for HttpVersion {
    fn from(version: http::Version) -> Self {
        match version {
            http::Version::HTTP_09 => Self::new(0, 9),
            http::Version::HTTP_10 => Self::HTTP_10,
            http::Version::HTTP_2 => Self::new(2, 0),
            http::Version::HTTP_3 => Self::new(3, 0),
            _ => Self::HTTP_11,
        }
    }
}

impl From<HttpVersion> for http::Version {
    fn from(version: HttpVersion) -> Self {
        match (version.major, version.minor) {
            (0, _) => http::Version::HTTP_09,
            (1, 0) => http::Version::HTTP_10,
            (2, _) => http::Version::HTTP_2,
            (3, _) => http::Version::HTTP_3,
            _ => http::Version::HTTP_11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let version: HttpVersion = "HTTP/1.0".parse().unwrap();
        assert_eq!(version, HttpVersion::HTTP_10);
        assert_eq!(version.to_string(), "HTTP/1.0");
        assert_eq!("HTTP/2.0".parse::<HttpVersion>().unwrap(), HttpVersion::new(2, 0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("HTTP/1".parse::<HttpVersion>().is_err());
        assert!("HTTPS/1.1".parse::<HttpVersion>().is_err());
        assert!("HTTP/x.1".parse::<HttpVersion>().is_err());
    }

    #[test]
    fn parse_error_names_the_cause() {
        let err = "HTTP/1.x".parse::<HttpVersion>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidStartLine { .. }));
        assert!(err.to_string().contains("invalid digit"), "{err}");

        let err = "HTTP/1.300".parse::<HttpVersion>().unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");
    }

    #[test]
    fn keep_alive_default() {
        assert!(HttpVersion::HTTP_11.is_keep_alive_default());
        assert!(!HttpVersion::HTTP_10.is_keep_alive_default());
    }

    #[test]
    fn http_crate_interop() {
        assert_eq!(http::Version::from(HttpVersion::HTTP_10), http::Version::HTTP_10);
        assert_eq!(HttpVersion::from(http::Version::HTTP_11), HttpVersion::HTTP_11);
    }
}
