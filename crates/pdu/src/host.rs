//! The `Host` header value type.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::utils::ensure;

/// A `Host` header value: a host name (or IP literal) and an optional port.
///
/// A missing port is left as `None`; the default port of the scheme is implied and never
/// written back into the header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host {
    host: String,
    port: Option<u16>,
}

impl Host {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self { host: host.into(), port }
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The port, or `default` when the header did not carry one.
    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }
}

impl FromStr for Host {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ensure!(!s.is_empty(), ParseError::invalid_host("empty host"));

        // ip-literal, e.g. `[::1]:8080`
        if let Some(rest) = s.strip_prefix('[') {
            let (literal, tail) = rest.split_once(']').ok_or_else(|| ParseError::invalid_host(format!("unterminated ip literal {s:?}")))?;
            let port = match tail {
                "" => None,
                tail => Some(parse_port(tail.strip_prefix(':').ok_or_else(|| ParseError::invalid_host(format!("unexpected {tail:?} after ip literal")))?)?),
            };
            return Ok(Self { host: format!("[{literal}]"), port });
        }

        match s.rsplit_once(':') {
            Some((host, port)) => {
                ensure!(!host.is_empty(), ParseError::invalid_host(format!("missing host name in {s:?}")));
                Ok(Self { host: host.to_string(), port: Some(parse_port(port)?) })
            }
            None => Ok(Self { host: s.to_string(), port: None }),
        }
    }
}

fn parse_port(port: &str) -> Result<u16, ParseError> {
    port.parse::<u16>().map_err(|e| ParseError::invalid_host(format!("port {port:?} is not a valid u16: {e}")))
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_has_no_port() {
        let host: Host = "example.com".parse().unwrap();
        assert_eq!(host.host(), "example.com");
        assert_eq!(host.port(), None);
        assert_eq!(host.port_or(80), 80);
        assert_eq!(host.to_string(), "example.com");
    }

    #[test]
    fn host_with_port() {
        let host: Host = "example.com:8080".parse().unwrap();
        assert_eq!(host.host(), "example.com");
        assert_eq!(host.port(), Some(8080));
    }

    #[test]
    fn invalid_ports() {
        assert!("example.com:abc".parse::<Host>().is_err());
        assert!("example.com:70000".parse::<Host>().is_err());
        assert!("example.com:".parse::<Host>().is_err());
        assert!(":80".parse::<Host>().is_err());
        assert!("".parse::<Host>().is_err());
    }

    #[test]
    fn ip_literal() {
        let host: Host = "[::1]:8080".parse().unwrap();
        assert_eq!(host.host(), "[::1]");
        assert_eq!(host.port(), Some(8080));

        let host: Host = "[::1]".parse().unwrap();
        assert_eq!(host.port(), None);

        assert!("[::1".parse::<Host>().is_err());
        assert!("[::1]8080".parse::<Host>().is_err());
    }
}
