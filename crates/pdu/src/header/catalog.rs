//! Registry of well-known header fields.
//!
//! Every well-known field is described by a static [`HeaderFieldDescriptor`]: its canonical
//! name, the semantic type of its value, whether it belongs to requests, responses or both, and
//! whether intermediaries forward it (end-to-end) or consume it (hop-by-hop). The descriptor's
//! parser turns raw text into the typed [`HeaderValue`]; its serializer renders the canonical
//! wire form back.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use super::HeaderValue;
use crate::content_type::{AcceptList, ContentType};
use crate::cookie::CookieJar;
use crate::error::FieldError;
use crate::host::Host;

/// The semantic type a field value is parsed into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Text,
    Integer,
    Date,
    Tokens,
    ContentType,
    Accept,
    Cookies,
    Host,
}

impl ValueType {
    const fn parser(self) -> ParseFn {
        match self {
            ValueType::Text => parse_text,
            ValueType::Integer => parse_integer,
            ValueType::Date => parse_date,
            ValueType::Tokens => parse_tokens,
            ValueType::ContentType => parse_content_type,
            ValueType::Accept => parse_accept,
            ValueType::Cookies => parse_cookies,
            ValueType::Host => parse_host,
        }
    }

    /// Whether `value` is already stored in this type's representation.
    pub fn holds(self, value: &HeaderValue) -> bool {
        matches!(
            (self, value),
            (ValueType::Text, HeaderValue::Text(_))
                | (ValueType::Integer, HeaderValue::UInt(_))
                | (ValueType::Date, HeaderValue::Date(_))
                | (ValueType::Tokens, HeaderValue::Tokens(_))
                | (ValueType::ContentType, HeaderValue::ContentType(_))
                | (ValueType::Accept, HeaderValue::Accept(_))
                | (ValueType::Cookies, HeaderValue::Cookies(_))
                | (ValueType::Host, HeaderValue::Host(_))
        )
    }
}

/// Which kind of message a field belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldClass {
    General,
    Request,
    Response,
}

/// Whether a field survives intermediaries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PathSemantic {
    EndToEnd,
    HopToHop,
    Both,
}

pub type ParseFn = fn(&'static str, &str) -> Result<HeaderValue, FieldError>;
pub type SerializeFn = fn(&HeaderValue) -> String;

pub struct HeaderFieldDescriptor {
    name: &'static str,
    value_type: ValueType,
    class: FieldClass,
    path: PathSemantic,
    parse: ParseFn,
    serialize: SerializeFn,
}

impl HeaderFieldDescriptor {
    /// A descriptor using the stock parser of `value_type`.
    pub const fn new(name: &'static str, value_type: ValueType, class: FieldClass, path: PathSemantic) -> Self {
        Self { name, value_type, class, path, parse: value_type.parser(), serialize: serialize_value }
    }

    /// A descriptor with its own parser and serializer, for extension fields.
    pub const fn custom(
        name: &'static str,
        value_type: ValueType,
        class: FieldClass,
        path: PathSemantic,
        parse: ParseFn,
        serialize: SerializeFn,
    ) -> Self {
        Self { name, value_type, class, path, parse, serialize }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[inline]
    pub fn class(&self) -> FieldClass {
        self.class
    }

    #[inline]
    pub fn path_semantic(&self) -> PathSemantic {
        self.path
    }

    pub fn is_hop_by_hop(&self) -> bool {
        self.path == PathSemantic::HopToHop
    }

    pub fn parse(&self, text: &str) -> Result<HeaderValue, FieldError> {
        (self.parse)(self.name, text)
    }

    pub fn serialize(&self, value: &HeaderValue) -> String {
        (self.serialize)(value)
    }

    /// Whether `value` is already in this field's typed representation.
    pub fn accepts(&self, value: &HeaderValue) -> bool {
        self.value_type.holds(value)
    }
}

impl PartialEq for HeaderFieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(other.name)
    }
}

impl Eq for HeaderFieldDescriptor {}

impl fmt::Debug for HeaderFieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderFieldDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("class", &self.class)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn parse_text(_name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
    Ok(HeaderValue::Text(text.trim().to_string()))
}

fn parse_integer(name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
    text.trim().parse::<u64>().map(HeaderValue::UInt).map_err(|e| FieldError::invalid_value(name, e))
}

fn parse_date(name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
    httpdate::parse_http_date(text.trim()).map(HeaderValue::Date).map_err(|e| FieldError::invalid_value(name, e))
}

fn parse_tokens(_name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
    let tokens = text.split(',').map(str::trim).filter(|token| !token.is_empty()).map(str::to_string).collect();
    Ok(HeaderValue::Tokens(tokens))
}

fn parse_content_type(name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
    ContentType::parse(text)
        .map(HeaderValue::ContentType)
        .ok_or_else(|| FieldError::invalid_value(name, format!("unknown content type {:?}", text.trim())))
}

fn parse_accept(name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
    let accept = AcceptList::parse(text);
    if accept.is_empty() && !text.trim().is_empty() {
        return Err(FieldError::invalid_value(name, "no valid media range"));
    }
    Ok(HeaderValue::Accept(accept))
}

fn parse_cookies(_name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
    Ok(HeaderValue::Cookies(CookieJar::parse(text)))
}

fn parse_host(name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
    Host::from_str(text).map(HeaderValue::Host).map_err(|e| FieldError::invalid_value(name, e))
}

fn serialize_value(value: &HeaderValue) -> String {
    value.to_string()
}

macro_rules! fields {
    ($($konst:ident => ($name:expr, $value_type:ident, $class:ident, $path:ident);)+) => {
        $(
            pub static $konst: HeaderFieldDescriptor =
                HeaderFieldDescriptor::new($name, ValueType::$value_type, FieldClass::$class, PathSemantic::$path);
        )+

        static ALL: &[&HeaderFieldDescriptor] = &[$(&$konst),+];
    };
}

fields! {
    // general
    CACHE_CONTROL => ("Cache-Control", Tokens, General, EndToEnd);
    CONNECTION => ("Connection", Tokens, General, HopToHop);
    DATE => ("Date", Date, General, EndToEnd);
    KEEP_ALIVE => ("Keep-Alive", Text, General, HopToHop);
    PRAGMA => ("Pragma", Text, General, EndToEnd);
    TRAILER => ("Trailer", Tokens, General, HopToHop);
    TRANSFER_ENCODING => ("Transfer-Encoding", Tokens, General, HopToHop);
    UPGRADE => ("Upgrade", Tokens, General, HopToHop);
    VIA => ("Via", Text, General, EndToEnd);
    WARNING => ("Warning", Text, General, EndToEnd);
    // entity
    ALLOW => ("Allow", Tokens, General, EndToEnd);
    CONTENT_DISPOSITION => ("Content-Disposition", Text, General, EndToEnd);
    CONTENT_ENCODING => ("Content-Encoding", Tokens, General, EndToEnd);
    CONTENT_LANGUAGE => ("Content-Language", Tokens, General, EndToEnd);
    CONTENT_LENGTH => ("Content-Length", Integer, General, Both);
    CONTENT_LOCATION => ("Content-Location", Text, General, EndToEnd);
    CONTENT_MD5 => ("Content-MD5", Text, General, EndToEnd);
    CONTENT_RANGE => ("Content-Range", Text, General, EndToEnd);
    CONTENT_TYPE => ("Content-Type", ContentType, General, EndToEnd);
    EXPIRES => ("Expires", Date, General, EndToEnd);
    LAST_MODIFIED => ("Last-Modified", Date, General, EndToEnd);
    // request
    ACCEPT => ("Accept", Accept, Request, EndToEnd);
    ACCEPT_CHARSET => ("Accept-Charset", Text, Request, EndToEnd);
    ACCEPT_ENCODING => ("Accept-Encoding", Tokens, Request, EndToEnd);
    ACCEPT_LANGUAGE => ("Accept-Language", Text, Request, EndToEnd);
    AUTHORIZATION => ("Authorization", Text, Request, EndToEnd);
    COOKIE => ("Cookie", Cookies, Request, EndToEnd);
    EXPECT => ("Expect", Text, Request, EndToEnd);
    FROM => ("From", Text, Request, EndToEnd);
    HOST => ("Host", Host, Request, EndToEnd);
    IF_MATCH => ("If-Match", Text, Request, EndToEnd);
    IF_MODIFIED_SINCE => ("If-Modified-Since", Date, Request, EndToEnd);
    IF_NONE_MATCH => ("If-None-Match", Text, Request, EndToEnd);
    IF_RANGE => ("If-Range", Text, Request, EndToEnd);
    IF_UNMODIFIED_SINCE => ("If-Unmodified-Since", Date, Request, EndToEnd);
    MAX_FORWARDS => ("Max-Forwards", Integer, Request, EndToEnd);
    ORIGIN => ("Origin", Text, Request, EndToEnd);
    PROXY_AUTHORIZATION => ("Proxy-Authorization", Text, Request, HopToHop);
    RANGE => ("Range", Text, Request, EndToEnd);
    REFERER => ("Referer", Text, Request, EndToEnd);
    SEC_WEBSOCKET_KEY => ("Sec-WebSocket-Key", Text, Request, EndToEnd);
    SEC_WEBSOCKET_VERSION => ("Sec-WebSocket-Version", Integer, Request, EndToEnd);
    TE => ("TE", Tokens, Request, HopToHop);
    USER_AGENT => ("User-Agent", Text, Request, EndToEnd);
    // response
    ACCEPT_RANGES => ("Accept-Ranges", Tokens, Response, EndToEnd);
    AGE => ("Age", Integer, Response, EndToEnd);
    ETAG => ("ETag", Text, Response, EndToEnd);
    LOCATION => ("Location", Text, Response, EndToEnd);
    PROXY_AUTHENTICATE => ("Proxy-Authenticate", Text, Response, HopToHop);
    RETRY_AFTER => ("Retry-After", Text, Response, EndToEnd);
    SEC_WEBSOCKET_ACCEPT => ("Sec-WebSocket-Accept", Text, Response, EndToEnd);
    SERVER => ("Server", Text, Response, EndToEnd);
    SET_COOKIE => ("Set-Cookie", Text, Response, EndToEnd);
    VARY => ("Vary", Tokens, Response, EndToEnd);
    WWW_AUTHENTICATE => ("WWW-Authenticate", Text, Response, EndToEnd);
}

static BY_NAME: Lazy<HashMap<String, &'static HeaderFieldDescriptor>> =
    Lazy::new(|| ALL.iter().map(|descriptor| (descriptor.name.to_ascii_lowercase(), *descriptor)).collect());

/// Finds the well-known descriptor for a field name, ignoring ASCII case.
pub fn lookup(name: &str) -> Option<&'static HeaderFieldDescriptor> {
    BY_NAME.get(&name.trim().to_ascii_lowercase()).copied()
}

/// All well-known descriptors.
pub fn all() -> &'static [&'static HeaderFieldDescriptor] {
    ALL
}

/// Whether a field must not be forwarded by intermediaries.
pub fn is_hop_by_hop(name: &str) -> bool {
    lookup(name).is_some_and(HeaderFieldDescriptor::is_hop_by_hop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(lookup("content-TYPE"), Some(&CONTENT_TYPE));
        assert_eq!(lookup(" host "), Some(&HOST));
        assert_eq!(lookup("X-Custom"), None);
        assert_eq!(all().len(), BY_NAME.len());
    }

    #[test]
    fn classification() {
        assert_eq!(HOST.class(), FieldClass::Request);
        assert_eq!(SERVER.class(), FieldClass::Response);
        assert_eq!(DATE.class(), FieldClass::General);
        assert!(is_hop_by_hop("Transfer-Encoding"));
        assert!(is_hop_by_hop("connection"));
        assert!(!is_hop_by_hop("Content-Type"));
        assert_eq!(CONTENT_LENGTH.path_semantic(), PathSemantic::Both);
    }

    fn canonical(descriptor: &HeaderFieldDescriptor, text: &str) -> String {
        descriptor.serialize(&descriptor.parse(text).unwrap())
    }

    #[test]
    fn round_trip_every_field() {
        let samples: &[(&HeaderFieldDescriptor, &str)] = &[
            (&CACHE_CONTROL, "no-cache, max-age=0"),
            (&CONNECTION, "keep-alive, Upgrade"),
            (&DATE, "Sun, 06 Nov 1994 08:49:37 GMT"),
            (&CONTENT_LENGTH, "13"),
            (&CONTENT_TYPE, "text/html; charset=utf-8"),
            (&ACCEPT, "text/html, application/xml;q=0.9, */*;q=0.8"),
            (&COOKIE, "Session=abc:Path=/:Secure; theme=dark"),
            (&HOST, "example.com:8080"),
            (&USER_AGENT, "curl/7.79.1"),
            (&VARY, "Accept-Encoding, Origin"),
            (&MAX_FORWARDS, "10"),
        ];
        for (descriptor, text) in samples {
            assert_eq!(canonical(descriptor, &format!("  {text}  ")), *text, "{}", descriptor.name());
        }

        for descriptor in all() {
            let sample = match descriptor.value_type() {
                ValueType::Text => "some value",
                ValueType::Integer => "42",
                ValueType::Date => "Sun, 06 Nov 1994 08:49:37 GMT",
                ValueType::Tokens => "a, b",
                ValueType::ContentType => "application/json",
                ValueType::Accept => "application/json",
                ValueType::Cookies => "a=1",
                ValueType::Host => "localhost",
            };
            assert_eq!(canonical(descriptor, sample), sample, "{}", descriptor.name());
        }
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(canonical(&CONTENT_LENGTH, "013"), "13");
        assert_eq!(canonical(&CONNECTION, "close ,, Upgrade"), "close, Upgrade");
        assert_eq!(canonical(&CONTENT_TYPE, "Text/HTML;Charset=UTF-8"), "text/html; charset=utf-8");
        // obsolete rfc850 dates normalize to IMF-fixdate
        assert_eq!(canonical(&DATE, "Sunday, 06-Nov-94 08:49:37 GMT"), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn invalid_values() {
        assert!(CONTENT_LENGTH.parse("-1").is_err());
        assert!(CONTENT_TYPE.parse("application/x-unknown").is_err());
        assert!(DATE.parse("yesterday").is_err());
        assert!(HOST.parse("example.com:abc").is_err());
        assert!(ACCEPT.parse("nonsense").is_err());
    }

    #[test]
    fn custom_descriptor() {
        fn parse_flag(_name: &'static str, text: &str) -> Result<HeaderValue, FieldError> {
            Ok(HeaderValue::Bool(text.trim() == "?1"))
        }
        fn serialize_flag(value: &HeaderValue) -> String {
            if matches!(value, HeaderValue::Bool(true)) { "?1".into() } else { "?0".into() }
        }

        let descriptor = HeaderFieldDescriptor::custom(
            "Sec-Fetch-User",
            ValueType::Text,
            FieldClass::Request,
            PathSemantic::EndToEnd,
            parse_flag,
            serialize_flag,
        );
        assert_eq!(descriptor.parse("?1"), Ok(HeaderValue::Bool(true)));
        assert_eq!(descriptor.serialize(&HeaderValue::Bool(false)), "?0");
    }
}
