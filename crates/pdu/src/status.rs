//! HTTP status codes as an open enumeration.
//!
//! A [`StatusCode`] carries its numeric code, a reason phrase and an optional human readable
//! description. The well-known codes are associated constants; arbitrary codes can be wrapped
//! with [`StatusCode::custom`]. Identity (equality, ordering and hashing) is the numeric code
//! alone, so a custom `404` equals [`StatusCode::NOT_FOUND`].
//!
//! Parsing is lenient by contract: a code that is not well-known parses to
//! [`StatusCode::BAD_REQUEST`]. Callers that need to keep an unknown code use
//! [`StatusCode::lookup`] together with [`StatusCode::custom`].

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::debug;

/// The class of a status code, derived from its hundreds digit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
    /// Codes outside `100..=599`
    Unknown,
}

#[derive(Debug, Clone)]
pub struct StatusCode {
    code: u32,
    name: Cow<'static, str>,
    description: Option<Cow<'static, str>>,
}

macro_rules! well_known {
    ($($konst:ident => ($code:expr, $name:expr, $desc:expr);)+) => {
        impl StatusCode {
            $(
                pub const $konst: StatusCode = StatusCode {
                    code: $code,
                    name: Cow::Borrowed($name),
                    description: Some(Cow::Borrowed($desc)),
                };
            )+
        }

        /// All well-known codes, sorted by code.
        static WELL_KNOWN: &[StatusCode] = &[$(StatusCode::$konst),+];
    };
}

well_known! {
    CONTINUE => (100, "Continue", "The client should continue with its request.");
    SWITCHING_PROTOCOLS => (101, "Switching Protocols", "The server is switching protocols as requested by the Upgrade header.");
    PROCESSING => (102, "Processing", "The server has accepted the request but has not completed it yet.");
    OK => (200, "OK", "The request has succeeded.");
    CREATED => (201, "Created", "The request has been fulfilled and resulted in a new resource being created.");
    ACCEPTED => (202, "Accepted", "The request has been accepted for processing, but the processing has not been completed.");
    NON_AUTHORITATIVE_INFORMATION => (203, "Non-Authoritative Information", "The returned metainformation is gathered from a local or third-party copy.");
    NO_CONTENT => (204, "No Content", "The server has fulfilled the request but does not need to return an entity-body.");
    RESET_CONTENT => (205, "Reset Content", "The user agent should reset the document view which caused the request.");
    PARTIAL_CONTENT => (206, "Partial Content", "The server has fulfilled the partial GET request for the resource.");
    MULTIPLE_CHOICES => (300, "Multiple Choices", "The requested resource corresponds to any one of a set of representations.");
    MOVED_PERMANENTLY => (301, "Moved Permanently", "The requested resource has been assigned a new permanent URI.");
    FOUND => (302, "Found", "The requested resource resides temporarily under a different URI.");
    SEE_OTHER => (303, "See Other", "The response to the request can be found under a different URI.");
    NOT_MODIFIED => (304, "Not Modified", "The document has not been modified since the conditional GET.");
    USE_PROXY => (305, "Use Proxy", "The requested resource must be accessed through the proxy given by the Location field.");
    TEMPORARY_REDIRECT => (307, "Temporary Redirect", "The requested resource resides temporarily under a different URI.");
    PERMANENT_REDIRECT => (308, "Permanent Redirect", "The requested resource has been assigned a new permanent URI; the method must not change.");
    BAD_REQUEST => (400, "Bad Request", "The request could not be understood by the server due to malformed syntax.");
    UNAUTHORIZED => (401, "Unauthorized", "The request requires user authentication.");
    PAYMENT_REQUIRED => (402, "Payment Required", "This code is reserved for future use.");
    FORBIDDEN => (403, "Forbidden", "The server understood the request, but is refusing to fulfill it.");
    NOT_FOUND => (404, "Not Found", "The server has not found anything matching the Request-URI.");
    METHOD_NOT_ALLOWED => (405, "Method Not Allowed", "The method is not allowed for the resource identified by the Request-URI.");
    NOT_ACCEPTABLE => (406, "Not Acceptable", "No representation matches the accept headers sent in the request.");
    PROXY_AUTHENTICATION_REQUIRED => (407, "Proxy Authentication Required", "The client must first authenticate itself with the proxy.");
    REQUEST_TIMEOUT => (408, "Request Timeout", "The client did not produce a request within the time the server was prepared to wait.");
    CONFLICT => (409, "Conflict", "The request conflicts with the current state of the resource.");
    GONE => (410, "Gone", "The requested resource is no longer available and no forwarding address is known.");
    LENGTH_REQUIRED => (411, "Length Required", "The server refuses to accept the request without a defined Content-Length.");
    PRECONDITION_FAILED => (412, "Precondition Failed", "A precondition given in the request header fields evaluated to false.");
    PAYLOAD_TOO_LARGE => (413, "Payload Too Large", "The request entity is larger than the server is willing or able to process.");
    URI_TOO_LONG => (414, "URI Too Long", "The Request-URI is longer than the server is willing to interpret.");
    UNSUPPORTED_MEDIA_TYPE => (415, "Unsupported Media Type", "The entity of the request is in a format not supported by the resource.");
    RANGE_NOT_SATISFIABLE => (416, "Range Not Satisfiable", "None of the requested ranges overlap the current extent of the resource.");
    EXPECTATION_FAILED => (417, "Expectation Failed", "The expectation given in the Expect request header could not be met.");
    UPGRADE_REQUIRED => (426, "Upgrade Required", "The client should switch to a different protocol.");
    PRECONDITION_REQUIRED => (428, "Precondition Required", "The origin server requires the request to be conditional.");
    TOO_MANY_REQUESTS => (429, "Too Many Requests", "The user has sent too many requests in a given amount of time.");
    REQUEST_HEADER_FIELDS_TOO_LARGE => (431, "Request Header Fields Too Large", "The header fields of the request are too large.");
    INTERNAL_SERVER_ERROR => (500, "Internal Server Error", "The server encountered an unexpected condition which prevented it from fulfilling the request.");
    NOT_IMPLEMENTED => (501, "Not Implemented", "The server does not support the functionality required to fulfill the request.");
    BAD_GATEWAY => (502, "Bad Gateway", "The server received an invalid response from the upstream server.");
    SERVICE_UNAVAILABLE => (503, "Service Unavailable", "The server is currently unable to handle the request.");
    GATEWAY_TIMEOUT => (504, "Gateway Timeout", "The server did not receive a timely response from the upstream server.");
    HTTP_VERSION_NOT_SUPPORTED => (505, "HTTP Version Not Supported", "The server does not support the HTTP protocol version used in the request.");
}

impl StatusCode {
    /// Wraps an arbitrary code. The result equals any well-known status with the same code.
    pub fn custom(code: u32, name: impl Into<Cow<'static, str>>) -> Self {
        Self { code, name: name.into(), description: None }
    }

    /// Returns the well-known status for `code`, if there is one.
    pub fn lookup(code: u32) -> Option<StatusCode> {
        WELL_KNOWN.binary_search_by(|status| status.code.cmp(&code)).ok().map(|index| WELL_KNOWN[index].clone())
    }

    /// Returns the well-known status for `code`, falling back to `400 Bad Request`.
    pub fn from_code(code: u32) -> StatusCode {
        Self::lookup(code).unwrap_or_else(|| {
            debug!(code, "unknown status code, falling back to 400");
            StatusCode::BAD_REQUEST
        })
    }

    /// Parses a status from its numeric form (`"404"`) or its name (`"Not Found"`,
    /// `"not-found"`, `"NotFound"`), falling back to `400 Bad Request`.
    pub fn parse(text: &str) -> StatusCode {
        let text = text.trim();
        if let Ok(code) = text.parse::<u32>() {
            return Self::from_code(code);
        }

        let wanted = normalize_name(text);
        WELL_KNOWN.iter().find(|status| normalize_name(&status.name) == wanted).cloned().unwrap_or_else(|| {
            debug!(status = text, "unknown status name, falling back to 400");
            StatusCode::BAD_REQUEST
        })
    }

    /// All well-known statuses, ordered by code.
    pub fn well_known() -> &'static [StatusCode] {
        WELL_KNOWN
    }

    #[inline]
    pub fn code(&self) -> u32 {
        self.code
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn class(&self) -> StatusClass {
        match self.code {
            100..=199 => StatusClass::Informational,
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirection,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Unknown,
        }
    }

    pub fn is_informational(&self) -> bool {
        self.class() == StatusClass::Informational
    }

    pub fn is_success(&self) -> bool {
        self.class() == StatusClass::Success
    }

    pub fn is_redirection(&self) -> bool {
        self.class() == StatusClass::Redirection
    }

    pub fn is_client_error(&self) -> bool {
        self.class() == StatusClass::ClientError
    }

    pub fn is_server_error(&self) -> bool {
        self.class() == StatusClass::ServerError
    }

    /// Whether a response with this status may carry a body.
    pub fn allows_body(&self) -> bool {
        !(self.is_informational() || self.code == 204 || self.code == 304)
    }
}

fn normalize_name(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).map(|c| c.to_ascii_lowercase()).collect()
}

impl PartialEq for StatusCode {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for StatusCode {}

impl PartialOrd for StatusCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StatusCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code.cmp(&other.code)
    }
}

impl Hash for StatusCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

/// Formats as `<code> <name>`, the tail of a status line.
impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.name)
    }
}

impl From<http::StatusCode> for StatusCode {
    fn from(status: http::StatusCode) -> Self {
        let code = u32::from(status.as_u16());
        Self::lookup(code).unwrap_or_else(|| Self::custom(code, status.canonical_reason().unwrap_or("Unknown")))
    }
}

impl TryFrom<&StatusCode> for http::StatusCode {
    type Error = http::status::InvalidStatusCode;

    fn try_from(status: &StatusCode) -> Result<Self, Self::Error> {
        let code = u16::try_from(status.code).unwrap_or(u16::MAX);
        http::StatusCode::from_u16(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_is_sorted() {
        assert!(WELL_KNOWN.windows(2).all(|pair| pair[0].code < pair[1].code));
    }

    #[test]
    fn unknown_code_falls_back_to_bad_request() {
        assert_eq!(StatusCode::parse("999"), StatusCode::BAD_REQUEST);
        assert_eq!(StatusCode::parse("999").name(), "Bad Request");
        assert_eq!(StatusCode::from_code(299), StatusCode::BAD_REQUEST);
        assert_eq!(StatusCode::parse("no such status"), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parse_by_code_and_name() {
        assert_eq!(StatusCode::parse(" 404 "), StatusCode::NOT_FOUND);
        assert_eq!(StatusCode::parse("Not Found"), StatusCode::NOT_FOUND);
        assert_eq!(StatusCode::parse("not-found"), StatusCode::NOT_FOUND);
        assert_eq!(StatusCode::parse("InternalServerError"), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(StatusCode::parse("ok"), StatusCode::OK);
    }

    #[test]
    fn identity_is_the_code() {
        let custom = StatusCode::custom(404, "Nothing Here");
        assert_eq!(custom, StatusCode::NOT_FOUND);
        assert_eq!(custom.description(), None);
        assert!(StatusCode::OK < StatusCode::NOT_FOUND);

        let teapot = StatusCode::custom(418, "I'm a teapot");
        assert_eq!(StatusCode::lookup(418), None);
        assert_eq!(teapot.to_string(), "418 I'm a teapot");
    }

    #[test]
    fn classification() {
        assert_eq!(StatusCode::CONTINUE.class(), StatusClass::Informational);
        assert!(StatusCode::CREATED.is_success());
        assert!(StatusCode::FOUND.is_redirection());
        assert!(StatusCode::GONE.is_client_error());
        assert!(StatusCode::BAD_GATEWAY.is_server_error());
        assert_eq!(StatusCode::custom(700, "Odd").class(), StatusClass::Unknown);
        assert!(!StatusCode::NO_CONTENT.allows_body());
        assert!(StatusCode::OK.allows_body());
    }

    #[test]
    fn http_crate_interop() {
        assert_eq!(StatusCode::from(http::StatusCode::NOT_FOUND), StatusCode::NOT_FOUND);

        let teapot = StatusCode::from(http::StatusCode::IM_A_TEAPOT);
        assert_eq!(teapot.code(), 418);
        assert_eq!(teapot.name(), "I'm a teapot");

        assert_eq!(http::StatusCode::try_from(&StatusCode::ACCEPTED).unwrap(), http::StatusCode::ACCEPTED);
        assert!(http::StatusCode::try_from(&StatusCode::custom(5000, "Huge")).is_err());
    }
}
