//! Cookies with crumb values.
//!
//! A cookie value is a `:` separated list of *crumbs*, each either a bare key or a
//! `key=value` pair:
//!
//! ```text
//! Session=abc:Path=/:Secure
//! ```
//!
//! parses to the cookie `Session` with crumbs `abc → ""`, `Path → "/"` and `Secure → ""`.
//! A `Cookie` header holds several cookies separated by `;`; [`CookieJar`] keeps them in order
//! and lets the last occurrence of a name win.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::CookieError;

/// A case-sensitive, non-empty, immutable cookie name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CookieName(Box<str>);

impl CookieName {
    pub fn new(name: &str) -> Result<Self, CookieError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CookieError::EmptyName);
        }
        if name.chars().any(|c| c.is_ascii_control() || matches!(c, ';' | '=' | ',' | ' ' | '\t')) {
            return Err(CookieError::InvalidName(name.to_string()));
        }
        Ok(Self(name.into()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for CookieName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CookieName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CookieName {
    type Error = CookieError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl fmt::Display for CookieName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single cookie: a name and its ordered crumbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: CookieName,
    crumbs: IndexMap<String, String>,
}

impl Cookie {
    pub fn new(name: CookieName) -> Self {
        Self { name, crumbs: IndexMap::new() }
    }

    /// Parses one `Name=crumb1:crumb2=value2` cookie.
    pub fn parse(text: &str) -> Result<Self, CookieError> {
        let (name, value) = match text.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (text, None),
        };

        let mut cookie = Self::new(CookieName::new(name)?);
        for crumb in value.into_iter().flat_map(|value| value.split(':')) {
            let crumb = crumb.trim();
            if crumb.is_empty() {
                continue;
            }
            match crumb.split_once('=') {
                Some((key, value)) => cookie.set_crumb(key.trim(), value.trim()),
                None => cookie.set_crumb(crumb, ""),
            }
        }
        Ok(cookie)
    }

    #[inline]
    pub fn name(&self) -> &CookieName {
        &self.name
    }

    pub fn crumb(&self, key: &str) -> Option<&str> {
        self.crumbs.get(key).map(String::as_str)
    }

    pub fn has_crumb(&self, key: &str) -> bool {
        self.crumbs.contains_key(key)
    }

    pub fn set_crumb(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.crumbs.insert(key.into(), value.into());
    }

    pub fn remove_crumb(&mut self, key: &str) -> Option<String> {
        self.crumbs.shift_remove(key)
    }

    pub fn crumbs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.crumbs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn crumb_count(&self) -> usize {
        self.crumbs.len()
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (index, (key, value)) in self.crumbs.iter().enumerate() {
            f.write_str(if index == 0 { "=" } else { ":" })?;
            f.write_str(key)?;
            if !value.is_empty() {
                write!(f, "={value}")?;
            }
        }
        Ok(())
    }
}

/// The ordered set of cookies sent in one `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: IndexMap<CookieName, Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `;` separated cookie list. Entries without a usable name are skipped; a
    /// repeated name replaces the earlier cookie.
    pub fn parse(text: &str) -> Self {
        let mut jar = Self::new();
        for part in text.split(';').map(str::trim).filter(|part| !part.is_empty()) {
            match Cookie::parse(part) {
                Ok(cookie) => jar.insert(cookie),
                Err(e) => trace!(cookie = part, cause = %e, "skip unparseable cookie"),
            }
        }
        jar
    }

    pub fn insert(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.name.clone(), cookie);
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Cookie> {
        self.cookies.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Cookie> {
        self.cookies.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl fmt::Display for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, cookie) in self.cookies.values().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{cookie}")?;
        }
        Ok(())
    }
}

impl FromIterator<Cookie> for CookieJar {
    fn from_iter<T: IntoIterator<Item = Cookie>>(iter: T) -> Self {
        let mut jar = Self::new();
        for cookie in iter {
            jar.insert(cookie);
        }
        jar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crumbs_split_on_colon() {
        let cookie = Cookie::parse("Session=abc:Path=/:Secure").unwrap();
        assert_eq!(cookie.name().as_str(), "Session");
        assert_eq!(cookie.crumb_count(), 3);
        assert_eq!(cookie.crumb("abc"), Some(""));
        assert_eq!(cookie.crumb("Path"), Some("/"));
        assert_eq!(cookie.crumb("Secure"), Some(""));
        assert_eq!(cookie.crumbs().map(|(key, _)| key).collect::<Vec<_>>(), vec!["abc", "Path", "Secure"]);
    }

    #[test]
    fn display_restores_wire_syntax() {
        let cookie = Cookie::parse("Session=abc:Path=/:Secure").unwrap();
        assert_eq!(cookie.to_string(), "Session=abc:Path=/:Secure");

        let bare = Cookie::parse("flag").unwrap();
        assert_eq!(bare.crumb_count(), 0);
        assert_eq!(bare.to_string(), "flag");
    }

    #[test]
    fn names_are_case_sensitive_and_non_empty() {
        assert_eq!(CookieName::new(""), Err(CookieError::EmptyName));
        assert_eq!(CookieName::new("  "), Err(CookieError::EmptyName));
        assert!(CookieName::new("a b").is_err());
        assert_ne!(CookieName::new("id").unwrap(), CookieName::new("ID").unwrap());
        assert!(Cookie::parse("=abc").is_err());
    }

    #[test]
    fn jar_last_one_wins() {
        let jar = CookieJar::parse("a=1; b=x:y=z; a=2;; =broken");
        assert_eq!(jar.len(), 2);
        assert!(jar.get("a").unwrap().has_crumb("2"));
        assert!(!jar.get("a").unwrap().has_crumb("1"));
        assert_eq!(jar.get("b").unwrap().crumb("y"), Some("z"));
        assert!(jar.get("A").is_none());
        assert_eq!(jar.to_string(), "a=2; b=x:y=z");
    }

    #[test]
    fn jar_mutation() {
        let mut jar = CookieJar::parse("a=1");
        jar.get_mut("a").unwrap().set_crumb("lang", "en");
        assert_eq!(jar.to_string(), "a=1:lang=en");
        assert!(jar.remove("a").is_some());
        assert!(jar.is_empty());
    }
}
