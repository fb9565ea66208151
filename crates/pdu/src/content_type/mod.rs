//! Media types and content negotiation.
//!
//! [`ContentType`] models the value of a `Content-Type` header:
//!
//! ```text
//! type/subtype[; charset=X][; boundary=Y][; action=Z]
//! ```
//!
//! Well-known media types live in a process-wide registry which also maps
//! file extensions to media types. Parsing a header value without a boundary returns the
//! registered type, so every `application/json` in the process shares one descriptor.
//! Multipart values carry a per-message boundary and are never interned.
//!
//! Two content types are equal when their media types are equal; charset, boundary and action
//! are ignored:
//!
//! ```
//! use micro_pdu::content_type::ContentType;
//!
//! let a = ContentType::parse("text/html; charset=utf-8").unwrap();
//! let b = ContentType::parse("text/html; charset=iso-8859-1").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(b.charset(), "iso-8859-1");
//! ```

mod accept;
mod registry;

pub use accept::AcceptList;
pub use accept::MediaRange;
pub use accept::QValue;
pub use accept::negotiate;

use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::trace;
use triomphe::Arc;

use crate::error::ContentTypeError;
use crate::utils::ensure;
use registry::{MediaDescriptor, Registry, normalize_extension};

/// Charset reported when a content type does not name one.
pub const DEFAULT_CHARSET: &str = "utf-8";

#[derive(Debug, Clone)]
pub struct ContentType {
    media: Arc<MediaDescriptor>,
    charset: Option<String>,
    boundary: Option<String>,
    action: Option<String>,
}

impl ContentType {
    /// Parses a `Content-Type` header value.
    ///
    /// Returns `None` when the media type is malformed, or when it carries no boundary and is
    /// not registered. Callers usually fall back to [`ContentType::any`] or
    /// [`ContentType::octet_stream`].
    pub fn parse(text: &str) -> Option<ContentType> {
        let mut parts = text.split(';').map(str::trim);
        let media_type = parts.next().filter(|media_type| !media_type.is_empty())?.to_ascii_lowercase();

        let mut charset = None;
        let mut boundary = None;
        let mut action = None;
        for part in parts {
            if let Some(value) = strip_prefix_ignore_ascii_case(part, "charset=") {
                charset = Some(unquote(value).to_ascii_lowercase());
            } else if let Some(value) = strip_prefix_ignore_ascii_case(part, "boundary=") {
                boundary = Some(unquote(value).to_string());
            } else if let Some(value) = strip_prefix_ignore_ascii_case(part, "action=") {
                action = Some(unquote(value).to_string());
            }
        }

        let media = match boundary {
            Some(_) => {
                let essence = validate_media_type(&media_type).ok()?;
                Arc::new(MediaDescriptor::new(essence, Vec::new()))
            }
            None => match Registry::load().by_media_type(&media_type) {
                Some(media) => media,
                None => {
                    trace!(media_type, "unknown media type");
                    return None;
                }
            },
        };

        Some(ContentType { media, charset, boundary, action })
    }

    /// Returns the registered content type for `media_type`.
    pub fn lookup(media_type: &str) -> Option<ContentType> {
        Registry::load().by_media_type(&media_type.trim().to_ascii_lowercase()).map(Self::from_descriptor)
    }

    /// Returns the first content type registered for a file extension (`"json"` or `".json"`).
    pub fn from_extension(extension: &str) -> Option<ContentType> {
        Registry::load().by_extension(&normalize_extension(extension)).first().cloned().map(Self::from_descriptor)
    }

    /// Returns every content type registered for a file extension, in registration order.
    pub fn all_for_extension(extension: &str) -> Vec<ContentType> {
        Registry::load().by_extension(&normalize_extension(extension)).iter().cloned().map(Self::from_descriptor).collect()
    }

    /// Adds a media type to the process-wide registry, or extends the file extensions of an
    /// already registered one.
    pub fn register(media_type: &str, extensions: &[&str]) -> Result<ContentType, ContentTypeError> {
        let essence = validate_media_type(media_type)?;
        Ok(Self::from_descriptor(Registry::register(&essence, extensions)))
    }

    fn from_descriptor(media: Arc<MediaDescriptor>) -> Self {
        Self { media, charset: None, boundary: None, action: None }
    }

    fn well_known(media_type: &'static str) -> Self {
        Self::lookup(media_type).unwrap_or_else(|| Self::from_descriptor(Arc::new(MediaDescriptor::new(media_type, Vec::new()))))
    }

    pub fn any() -> Self {
        Self::well_known("*/*")
    }

    pub fn json() -> Self {
        Self::well_known("application/json")
    }

    pub fn octet_stream() -> Self {
        Self::well_known("application/octet-stream")
    }

    pub fn form_urlencoded() -> Self {
        Self::well_known("application/x-www-form-urlencoded")
    }

    pub fn xml() -> Self {
        Self::well_known("application/xml")
    }

    pub fn plain_text() -> Self {
        Self::well_known("text/plain")
    }

    pub fn html() -> Self {
        Self::well_known("text/html")
    }

    pub fn event_stream() -> Self {
        Self::well_known("text/event-stream")
    }

    /// A `multipart/form-data` type with the given boundary.
    pub fn multipart_form_data(boundary: impl Into<String>) -> Self {
        Self::well_known("multipart/form-data").with_boundary(boundary)
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into().to_ascii_lowercase());
        self
    }

    /// Attaches a boundary. The result no longer shares the registered descriptor.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.media = Arc::new(MediaDescriptor::new(self.media.media_type.clone(), Vec::new()));
        self.boundary = Some(boundary.into());
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// The `type/subtype` essence, lower-cased.
    #[inline]
    pub fn media_type(&self) -> &str {
        &self.media.media_type
    }

    pub fn main_type(&self) -> &str {
        self.media_type().split_once('/').map_or(self.media_type(), |(main, _)| main)
    }

    pub fn sub_type(&self) -> &str {
        self.media_type().split_once('/').map_or("", |(_, sub)| sub)
    }

    /// The charset, defaulting to `utf-8`.
    pub fn charset(&self) -> &str {
        self.charset.as_deref().unwrap_or(DEFAULT_CHARSET)
    }

    /// Whether the charset was given explicitly rather than defaulted.
    pub fn has_explicit_charset(&self) -> bool {
        self.charset.is_some()
    }

    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn file_extensions(&self) -> &[String] {
        &self.media.file_extensions
    }

    pub fn is_multipart(&self) -> bool {
        self.main_type() == "multipart"
    }

    pub fn is_text(&self) -> bool {
        self.main_type() == "text"
    }

    /// Whether this type falls inside a media range such as `*/*`, `text/*` or `text/html`.
    pub fn matches_range(&self, range: &str) -> bool {
        match range.split_once('/') {
            Some(("*", "*")) => true,
            Some((main, "*")) => main.eq_ignore_ascii_case(self.main_type()),
            _ => range.eq_ignore_ascii_case(self.media_type()),
        }
    }

    /// Converts into a [`mime::Mime`] carrying the same parameters.
    pub fn to_mime(&self) -> Option<mime::Mime> {
        self.to_string().parse().ok()
    }
}

impl PartialEq for ContentType {
    fn eq(&self, other: &Self) -> bool {
        self.media.media_type == other.media.media_type
    }
}

impl Eq for ContentType {}

impl Hash for ContentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.media.media_type.hash(state);
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())?;
        if let Some(charset) = &self.charset {
            write!(f, "; charset={charset}")?;
        }
        if let Some(boundary) = &self.boundary {
            write!(f, "; boundary={}", quote_if_needed(boundary))?;
        }
        if let Some(action) = &self.action {
            write!(f, "; action={}", quote_if_needed(action))?;
        }
        Ok(())
    }
}

impl From<&mime::Mime> for ContentType {
    /// Converts a parsed mime; types that are not registered keep their essence but get no
    /// file extensions.
    fn from(mime: &mime::Mime) -> Self {
        let essence = mime.essence_str().to_ascii_lowercase();
        let mut content_type =
            Self::lookup(&essence).unwrap_or_else(|| Self::from_descriptor(Arc::new(MediaDescriptor::new(essence, Vec::new()))));
        if let Some(charset) = mime.get_param(mime::CHARSET) {
            content_type = content_type.with_charset(charset.as_str());
        }
        if let Some(boundary) = mime.get_param(mime::BOUNDARY) {
            content_type = content_type.with_boundary(boundary.as_str());
        }
        content_type
    }
}

/// Validates a bare `type/subtype` with `mime` and returns its lower-cased essence.
fn validate_media_type(media_type: &str) -> Result<String, ContentTypeError> {
    let media_type = media_type.trim();
    ensure!(!media_type.contains(';'), ContentTypeError::invalid_media_type(media_type, "parameters are not allowed"));
    let mime = media_type.parse::<mime::Mime>().map_err(|e| ContentTypeError::invalid_media_type(media_type, e))?;
    Ok(mime.essence_str().to_ascii_lowercase())
}

fn strip_prefix_ignore_ascii_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| text[prefix.len()..].trim())
}

fn unquote(value: &str) -> &str {
    value.strip_prefix('"').and_then(|value| value.strip_suffix('"')).unwrap_or(value)
}

fn quote_if_needed(value: &str) -> String {
    const SPECIALS: &[char] = &['(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', ' ', '\t'];
    if value.contains(SPECIALS) { format!("\"{value}\"") } else { value.to_string() }
}
