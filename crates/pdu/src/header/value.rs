//! Typed header values.
//!
//! A [`HeaderValue`] is either the raw text received on the wire or a value that has already
//! been coerced into its semantic type. The [`HeaderType`] trait describes which Rust types can
//! be read out of a value and which of them may be parsed from raw text.

use std::fmt;
use std::time::SystemTime;

use crate::content_type::{AcceptList, ContentType};
use crate::cookie::CookieJar;
use crate::host::Host;

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// Raw text, as received or set by the caller
    Text(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
    Date(SystemTime),
    /// A comma separated token list such as `Connection` or `Vary`
    Tokens(Vec<String>),
    ContentType(ContentType),
    Accept(AcceptList),
    Cookies(CookieJar),
    Host(Host),
}

impl HeaderValue {
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, HeaderValue::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether a token list (or raw text read as one) contains `token`, ignoring ASCII case.
    pub fn contains_token(&self, token: &str) -> bool {
        match self {
            HeaderValue::Tokens(tokens) => tokens.iter().any(|t| t.eq_ignore_ascii_case(token)),
            HeaderValue::Text(text) => text.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)),
            _ => false,
        }
    }
}

/// Renders the value as wire text.
impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Text(text) => f.write_str(text),
            HeaderValue::Int(value) => write!(f, "{value}"),
            HeaderValue::UInt(value) => write!(f, "{value}"),
            HeaderValue::Bool(value) => write!(f, "{value}"),
            HeaderValue::Date(time) => f.write_str(&httpdate::fmt_http_date(*time)),
            HeaderValue::Tokens(tokens) => f.write_str(&tokens.join(", ")),
            HeaderValue::ContentType(content_type) => write!(f, "{content_type}"),
            HeaderValue::Accept(accept) => write!(f, "{accept}"),
            HeaderValue::Cookies(jar) => write!(f, "{jar}"),
            HeaderValue::Host(host) => write!(f, "{host}"),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(text: &str) -> Self {
        HeaderValue::Text(text.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(text: String) -> Self {
        HeaderValue::Text(text)
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int(value)
    }
}

impl From<i32> for HeaderValue {
    fn from(value: i32) -> Self {
        HeaderValue::Int(i64::from(value))
    }
}

impl From<u64> for HeaderValue {
    fn from(value: u64) -> Self {
        HeaderValue::UInt(value)
    }
}

impl From<u32> for HeaderValue {
    fn from(value: u32) -> Self {
        HeaderValue::UInt(u64::from(value))
    }
}

impl From<usize> for HeaderValue {
    fn from(value: usize) -> Self {
        HeaderValue::UInt(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Bool(value)
    }
}

impl From<SystemTime> for HeaderValue {
    fn from(time: SystemTime) -> Self {
        HeaderValue::Date(time)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(tokens: Vec<String>) -> Self {
        HeaderValue::Tokens(tokens)
    }
}

impl From<ContentType> for HeaderValue {
    fn from(content_type: ContentType) -> Self {
        HeaderValue::ContentType(content_type)
    }
}

impl From<AcceptList> for HeaderValue {
    fn from(accept: AcceptList) -> Self {
        HeaderValue::Accept(accept)
    }
}

impl From<CookieJar> for HeaderValue {
    fn from(jar: CookieJar) -> Self {
        HeaderValue::Cookies(jar)
    }
}

impl From<Host> for HeaderValue {
    fn from(host: Host) -> Self {
        HeaderValue::Host(host)
    }
}

/// A Rust type that can be read from a [`HeaderValue`].
///
/// `from_value` succeeds when the stored variant already holds (or losslessly converts to) the
/// type. `from_text` is only implemented for the integer types; every other type fails closed
/// on raw text and must be parsed through a
/// [`HeaderFieldDescriptor`](crate::header::HeaderFieldDescriptor) instead.
pub trait HeaderType: Sized {
    fn from_value(value: &HeaderValue) -> Option<Self>;

    fn from_text(_text: &str) -> Option<Self> {
        None
    }

    fn into_value(self) -> HeaderValue;
}

macro_rules! integer_header_type {
    ($($ty:ty),+) => {
        $(
            impl HeaderType for $ty {
                fn from_value(value: &HeaderValue) -> Option<Self> {
                    match value {
                        HeaderValue::Int(value) => <$ty>::try_from(*value).ok(),
                        HeaderValue::UInt(value) => <$ty>::try_from(*value).ok(),
                        _ => None,
                    }
                }

                fn from_text(text: &str) -> Option<Self> {
                    text.trim().parse::<$ty>().ok()
                }

                fn into_value(self) -> HeaderValue {
                    HeaderValue::from(self)
                }
            }
        )+
    };
}

integer_header_type!(i32, u32, i64, u64);

macro_rules! variant_header_type {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl HeaderType for $ty {
                fn from_value(value: &HeaderValue) -> Option<Self> {
                    match value {
                        HeaderValue::$variant(value) => Some(value.clone()),
                        _ => None,
                    }
                }

                fn into_value(self) -> HeaderValue {
                    HeaderValue::$variant(self)
                }
            }
        )+
    };
}

variant_header_type! {
    String => Text,
    bool => Bool,
    SystemTime => Date,
    Vec<String> => Tokens,
    ContentType => ContentType,
    AcceptList => Accept,
    CookieJar => Cookies,
    Host => Host,
}
