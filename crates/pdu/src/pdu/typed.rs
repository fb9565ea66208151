//! Typed accessors for the well-known header fields.

use std::time::SystemTime;

use crate::content_type::{AcceptList, ContentType};
use crate::cookie::CookieJar;
use crate::header::{HeaderStore, HeaderValue, catalog};
use crate::host::Host;
use crate::version::HttpVersion;

/// Typed access to the header fields of a message.
///
/// Implementors only expose their [`HeaderStore`]; every getter reads through the field's
/// catalog descriptor and memoizes the parsed value, every setter stores the typed value.
pub trait TypedHeaders {
    fn header_store(&self) -> &HeaderStore;

    fn header_store_mut(&mut self) -> &mut HeaderStore;

    /// `Content-Length`, or `None` when absent or not a non-negative integer.
    fn content_length(&mut self) -> Option<u64> {
        match self.header_store_mut().get_by_descriptor(&catalog::CONTENT_LENGTH)? {
            HeaderValue::UInt(length) => Some(*length),
            _ => None,
        }
    }

    fn set_content_length(&mut self, length: u64) {
        self.header_store_mut().insert(catalog::CONTENT_LENGTH.name(), length);
    }

    fn content_type(&mut self) -> Option<ContentType> {
        match self.header_store_mut().get_by_descriptor(&catalog::CONTENT_TYPE)? {
            HeaderValue::ContentType(content_type) => Some(content_type.clone()),
            _ => None,
        }
    }

    /// `Content-Type`, falling back to `*/*` when missing or unknown.
    fn content_type_or_any(&mut self) -> ContentType {
        self.content_type().unwrap_or_else(ContentType::any)
    }

    fn set_content_type(&mut self, content_type: ContentType) {
        self.header_store_mut().insert(catalog::CONTENT_TYPE.name(), content_type);
    }

    fn host(&mut self) -> Option<Host> {
        match self.header_store_mut().get_by_descriptor(&catalog::HOST)? {
            HeaderValue::Host(host) => Some(host.clone()),
            _ => None,
        }
    }

    fn set_host(&mut self, host: Host) {
        self.header_store_mut().insert(catalog::HOST.name(), host);
    }

    fn accept(&mut self) -> Option<AcceptList> {
        match self.header_store_mut().get_by_descriptor(&catalog::ACCEPT)? {
            HeaderValue::Accept(accept) => Some(accept.clone()),
            _ => None,
        }
    }

    fn cookies(&mut self) -> Option<CookieJar> {
        match self.header_store_mut().get_by_descriptor(&catalog::COOKIE)? {
            HeaderValue::Cookies(jar) => Some(jar.clone()),
            _ => None,
        }
    }

    fn set_cookies(&mut self, jar: CookieJar) {
        self.header_store_mut().insert(catalog::COOKIE.name(), jar);
    }

    fn date(&mut self) -> Option<SystemTime> {
        match self.header_store_mut().get_by_descriptor(&catalog::DATE)? {
            HeaderValue::Date(time) => Some(*time),
            _ => None,
        }
    }

    fn set_date(&mut self, time: SystemTime) {
        self.header_store_mut().insert(catalog::DATE.name(), time);
    }

    fn connection(&mut self) -> Option<Vec<String>> {
        match self.header_store_mut().get_by_descriptor(&catalog::CONNECTION)? {
            HeaderValue::Tokens(tokens) => Some(tokens.clone()),
            _ => None,
        }
    }

    fn transfer_encoding(&mut self) -> Option<Vec<String>> {
        match self.header_store_mut().get_by_descriptor(&catalog::TRANSFER_ENCODING)? {
            HeaderValue::Tokens(tokens) => Some(tokens.clone()),
            _ => None,
        }
    }

    fn user_agent(&self) -> Option<&str> {
        self.header_store().get(catalog::USER_AGENT.name()).and_then(HeaderValue::as_text)
    }

    fn server(&self) -> Option<&str> {
        self.header_store().get(catalog::SERVER.name()).and_then(HeaderValue::as_text)
    }

    /// Whether the connection stays open after this message, given the message's version.
    fn is_keep_alive(&self, version: HttpVersion) -> bool {
        match self.header_store().get(catalog::CONNECTION.name()) {
            Some(value) if value.contains_token("close") => false,
            Some(value) if value.contains_token("keep-alive") => true,
            _ => version.is_keep_alive_default(),
        }
    }
}

impl TypedHeaders for HeaderStore {
    #[inline]
    fn header_store(&self) -> &HeaderStore {
        self
    }

    #[inline]
    fn header_store_mut(&mut self) -> &mut HeaderStore {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reads_parse_and_memoize() {
        let mut headers = HeaderStore::new();
        headers.insert("content-length", "42");
        headers.insert("content-type", "text/html; charset=ISO-8859-1");
        headers.insert("connection", "keep-alive, Upgrade");
        headers.insert("cookie", "Session=abc:Path=/:Secure; theme=dark");

        assert_eq!(headers.content_length(), Some(42));
        assert_eq!(headers.get("Content-Length"), Some(&HeaderValue::UInt(42)));

        let content_type = headers.content_type().unwrap();
        assert_eq!(content_type, ContentType::html());
        assert_eq!(content_type.charset(), "iso-8859-1");

        assert_eq!(headers.connection(), Some(vec!["keep-alive".to_string(), "Upgrade".to_string()]));

        let jar = headers.cookies().unwrap();
        assert_eq!(jar.get("Session").unwrap().crumb("Path"), Some("/"));
        assert_eq!(jar.get("theme").unwrap().to_string(), "theme=dark");
    }

    #[test]
    fn unparseable_values_read_as_none() {
        let mut headers = HeaderStore::new();
        headers.insert("content-length", "-1");
        headers.insert("content-type", "application/x-unknown-thing");
        headers.insert("date", "yesterday");

        assert_eq!(headers.content_length(), None);
        assert_eq!(headers.content_type(), None);
        assert_eq!(headers.content_type_or_any(), ContentType::any());
        assert_eq!(headers.date(), None);
        assert_eq!(headers.host(), None);
    }

    #[test]
    fn setters_store_typed_values() {
        let mut headers = HeaderStore::new();
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777);
        headers.set_content_length(7);
        headers.set_content_type(ContentType::json());
        headers.set_date(time);
        headers.set_host(Host::new("example.com", Some(8080)));

        assert_eq!(headers.content_length(), Some(7));
        assert_eq!(headers.date(), Some(time));
        assert_eq!(headers.get_text("Date").as_deref(), Some("Sun, 06 Nov 1994 08:49:37 GMT"));
        assert_eq!(headers.get_text("Host").as_deref(), Some("example.com:8080"));
        assert_eq!(headers.header_store().len(), 4);
    }

    #[test]
    fn keep_alive() {
        let mut headers = HeaderStore::new();
        assert!(headers.is_keep_alive(HttpVersion::HTTP_11));
        assert!(!headers.is_keep_alive(HttpVersion::HTTP_10));

        headers.insert("Connection", "Keep-Alive");
        assert!(headers.is_keep_alive(HttpVersion::HTTP_10));

        headers.insert("Connection", "close");
        assert!(!headers.is_keep_alive(HttpVersion::HTTP_11));
    }
}
