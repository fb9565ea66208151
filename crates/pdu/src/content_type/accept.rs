//! `Accept` header parsing and server-driven content negotiation.

use std::cmp::Reverse;
use std::fmt;

use tracing::trace;

use super::ContentType;

/// A quality value in thousandths (`0..=1000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QValue(u16);

impl QValue {
    pub const MAX: QValue = QValue(1000);
    pub const ZERO: QValue = QValue(0);

    /// Parses a qvalue: `0`, `1`, or up to three decimals (`0.5`, `1.000`).
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
        if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        match whole {
            "1" if fraction.bytes().all(|b| b == b'0') => Some(Self::MAX),
            "0" => {
                let mut millis = 0u16;
                for (index, digit) in fraction.bytes().enumerate() {
                    millis += u16::from(digit - b'0') * [100, 10, 1][index];
                }
                Some(Self(millis))
            }
            _ => None,
        }
    }

    pub fn from_millis(millis: u16) -> Self {
        Self(millis.min(1000))
    }

    #[inline]
    pub fn millis(&self) -> u16 {
        self.0
    }
}

impl Default for QValue {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for QValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1000 => f.write_str("1"),
            0 => f.write_str("0"),
            millis => {
                let fraction = format!("{millis:03}");
                write!(f, "0.{}", fraction.trim_end_matches('0'))
            }
        }
    }
}

/// One entry of an `Accept` header: a media range, its parameters and its quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    range: String,
    params: Vec<(String, String)>,
    quality: QValue,
}

impl MediaRange {
    pub fn new(range: &str, quality: QValue) -> Self {
        Self { range: range.trim().to_ascii_lowercase(), params: Vec::new(), quality }
    }

    /// Parses one entry such as `text/html;level=1;q=0.7`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(';').map(str::trim);
        let range = parts.next()?.to_ascii_lowercase();
        let (main, sub) = range.split_once('/')?;
        if main.is_empty() || sub.is_empty() || (main == "*" && sub != "*") {
            return None;
        }

        let mut media_range = Self { range, params: Vec::new(), quality: QValue::default() };
        for part in parts.filter(|part| !part.is_empty()) {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            let key = key.trim();
            if key.eq_ignore_ascii_case("q") {
                media_range.quality = QValue::parse(value)?;
            } else {
                media_range.params.push((key.to_ascii_lowercase(), value.trim().to_string()));
            }
        }
        Some(media_range)
    }

    #[inline]
    pub fn range(&self) -> &str {
        &self.range
    }

    #[inline]
    pub fn quality(&self) -> QValue {
        self.quality
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// `type/*` or `*/*`.
    pub fn is_wildcard(&self) -> bool {
        self.range.ends_with("/*")
    }

    pub fn matches(&self, content_type: &ContentType) -> bool {
        content_type.matches_range(&self.range)
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.range)?;
        for (key, value) in &self.params {
            write!(f, ";{key}={value}")?;
        }
        if self.quality != QValue::MAX {
            write!(f, ";q={}", self.quality)?;
        }
        Ok(())
    }
}

/// The parsed value of an `Accept` header, in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptList {
    items: Vec<MediaRange>,
}

impl AcceptList {
    /// Parses a comma separated list, skipping malformed entries.
    pub fn parse(text: &str) -> Self {
        let items = text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .filter_map(|item| {
                let parsed = MediaRange::parse(item);
                if parsed.is_none() {
                    trace!(media_range = item, "skip malformed media range");
                }
                parsed
            })
            .collect();
        Self { items }
    }

    #[inline]
    pub fn items(&self) -> &[MediaRange] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Picks the representation to send; see [`negotiate`].
    pub fn negotiate<'a>(&self, offered: &'a [ContentType]) -> Option<&'a ContentType> {
        negotiate(offered, &self.items)
    }
}

impl From<Vec<MediaRange>> for AcceptList {
    fn from(items: Vec<MediaRange>) -> Self {
        Self { items }
    }
}

impl fmt::Display for AcceptList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, item) in self.items.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// Selects which of the `offered` content types to send for the `accepted` ranges.
///
/// Exact media types are tried first, by descending quality and then declared order. Wildcards
/// (`type/*`, `*/*`) come after every exact entry and are tried in declared order only; their
/// quality is ignored. Entries with `q=0` never match. The first offered type matching the best
/// ranked entry wins.
///
/// When nothing matches, the first offered type is returned so content is still served. Only
/// an empty offer yields `None`.
pub fn negotiate<'a>(offered: &'a [ContentType], accepted: &[MediaRange]) -> Option<&'a ContentType> {
    let first = offered.first()?;

    let mut ranked: Vec<(usize, &MediaRange)> =
        accepted.iter().enumerate().filter(|(_, range)| range.quality > QValue::ZERO).collect();
    ranked.sort_by_key(|(index, range)| match range.is_wildcard() {
        true => (true, Reverse(QValue::ZERO), *index),
        false => (false, Reverse(range.quality), *index),
    });

    let selected = ranked.iter().find_map(|(_, range)| offered.iter().find(|content_type| range.matches(content_type)));
    if selected.is_none() {
        trace!(offered = offered.len(), accepted = accepted.len(), "no acceptable content type, serving the first offered");
    }
    Some(selected.unwrap_or(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qvalue_parse() {
        assert_eq!(QValue::parse("1"), Some(QValue::MAX));
        assert_eq!(QValue::parse("1.000"), Some(QValue::MAX));
        assert_eq!(QValue::parse("0.5"), Some(QValue::from_millis(500)));
        assert_eq!(QValue::parse("0.123"), Some(QValue::from_millis(123)));
        assert_eq!(QValue::parse("0"), Some(QValue::ZERO));
        assert_eq!(QValue::parse("1.5"), None);
        assert_eq!(QValue::parse("0.1234"), None);
        assert_eq!(QValue::parse("2"), None);
        assert_eq!(QValue::parse(""), None);
        assert_eq!(QValue::from_millis(250).to_string(), "0.25");
    }

    #[test]
    fn accept_list_parse_and_display() {
        let accept = AcceptList::parse("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8, bogus, */html");
        assert_eq!(accept.items().len(), 5);
        assert_eq!(accept.items()[2].quality(), QValue::from_millis(900));
        assert!(accept.items()[4].is_wildcard());
        assert_eq!(accept.to_string(), "text/html, application/xhtml+xml, application/xml;q=0.9, image/webp, */*;q=0.8");

        let with_params = AcceptList::parse("text/html;level=1;q=0.7");
        assert_eq!(with_params.items()[0].params().collect::<Vec<_>>(), vec![("level", "1")]);
        assert_eq!(with_params.to_string(), "text/html;level=1;q=0.7");
    }

    #[test]
    fn negotiate_prefers_exact_match() {
        let offered = [ContentType::html(), ContentType::json()];
        let accepted = AcceptList::parse("application/json;q=1.0, text/*;q=0.5");
        assert_eq!(accepted.negotiate(&offered), Some(&ContentType::json()));
    }

    #[test]
    fn wildcard_is_demoted_regardless_of_quality() {
        let offered = [ContentType::html(), ContentType::json()];
        let accepted = AcceptList::parse("text/*;q=1.0, application/json;q=0.1");
        assert_eq!(accepted.negotiate(&offered), Some(&ContentType::json()));
    }

    #[test]
    fn wildcards_keep_declared_order() {
        let offered = [ContentType::json(), ContentType::html()];
        let accepted = AcceptList::parse("text/*;q=0.2, */*;q=0.9");
        assert_eq!(accepted.negotiate(&offered), Some(&ContentType::html()));

        let accepted = AcceptList::parse("*/*;q=0.1, text/*;q=0.9");
        assert_eq!(accepted.negotiate(&offered), Some(&ContentType::json()));
    }

    #[test]
    fn quality_then_declared_order() {
        let offered = [ContentType::html(), ContentType::json(), ContentType::xml()];
        let accepted = AcceptList::parse("application/xml;q=0.5, application/json;q=0.8");
        assert_eq!(accepted.negotiate(&offered), Some(&ContentType::json()));

        let accepted = AcceptList::parse("application/xml, application/json");
        assert_eq!(accepted.negotiate(&offered), Some(&ContentType::xml()));
    }

    #[test]
    fn wildcard_matches_when_nothing_exact() {
        let offered = [ContentType::json(), ContentType::html()];
        let accepted = AcceptList::parse("image/png, text/*;q=0.2");
        assert_eq!(accepted.negotiate(&offered), Some(&ContentType::html()));
    }

    #[test]
    fn fails_open_to_first_offered() {
        let offered = [ContentType::html(), ContentType::json()];
        assert_eq!(AcceptList::parse("image/png").negotiate(&offered), Some(&ContentType::html()));
        assert_eq!(AcceptList::parse("text/html;q=0").negotiate(&offered), Some(&ContentType::html()));
        assert_eq!(AcceptList::default().negotiate(&offered), Some(&ContentType::html()));
        assert_eq!(AcceptList::parse("*/*").negotiate(&[]), None);
    }
}
