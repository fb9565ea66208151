//! Request-target path value type.

use std::fmt;

/// A normalized request path.
///
/// The path always starts with `/` and never contains two consecutive slashes. The query
/// string (without `?`) is kept verbatim; decoding it is left to the routing layer. A
/// fragment, which clients should never send, is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpPath {
    path: String,
    query: Option<String>,
}

impl HttpPath {
    pub fn new(target: &str) -> Self {
        let target = target.split_once('#').map_or(target, |(before, _)| before);
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };

        Self { path: normalize(path), query }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Non-empty path segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|segment| !segment.is_empty())
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: &str) -> Self {
        Self { path: normalize(&format!("{}/{}", self.path, segment)), query: None }
    }
}

impl Default for HttpPath {
    fn default() -> Self {
        Self { path: "/".to_string(), query: None }
    }
}

impl From<&str> for HttpPath {
    fn from(target: &str) -> Self {
        Self::new(target)
    }
}

impl fmt::Display for HttpPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    normalized.push('/');
    for c in path.chars() {
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_rooted() {
        assert_eq!(HttpPath::new("").path(), "/");
        assert_eq!(HttpPath::new("index.html").path(), "/index.html");
        assert_eq!(HttpPath::new("/index.html").path(), "/index.html");
    }

    #[test]
    fn collapses_repeated_slashes() {
        assert_eq!(HttpPath::new("//a///b//").path(), "/a/b/");
        assert_eq!(HttpPath::new("/a/b").join("/c").path(), "/a/b/c");
    }

    #[test]
    fn splits_query_and_drops_fragment() {
        let path = HttpPath::new("/index/?a=1&b=2&a=3#top");
        assert_eq!(path.path(), "/index/");
        assert_eq!(path.query(), Some("a=1&b=2&a=3"));
        assert_eq!(path.to_string(), "/index/?a=1&b=2&a=3");
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["index"]);
    }
}
