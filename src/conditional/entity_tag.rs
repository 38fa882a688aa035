//! Entity-tags and the tag lists carried by `If-Match` / `If-None-Match`.
//!
//! Only strong comparison is implemented: a weak tag in a request never
//! matches, because every tag this service emits is strong.

use std::fmt;

use thiserror::Error;

/// Error returned when an opaque tag contains characters outside `etagc`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid entity-tag: {0:?}")]
pub struct InvalidEntityTag(pub String);

/// A strong entity-tag. Holds the opaque value without surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag(String);

impl EntityTag {
    /// Creates a strong tag from its opaque value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEntityTag`] if the value contains a double quote,
    /// whitespace or a control character.
    pub fn new(opaque: impl Into<String>) -> Result<Self, InvalidEntityTag> {
        let opaque = opaque.into();
        if opaque.chars().all(is_etag_char) {
            Ok(Self(opaque))
        } else {
            Err(InvalidEntityTag(opaque))
        }
    }

    /// Renders a 128-bit digest as a 32 character lowercase hex tag.
    #[must_use]
    pub fn from_digest(digest: u128) -> Self {
        Self(format!("{digest:032x}"))
    }

    #[must_use]
    pub fn opaque(&self) -> &str {
        &self.0
    }
}

/// Formats the tag in its quoted wire form.
impl fmt::Display for EntityTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "\"{}\"", self.0)
    }
}

/// `etagc = %x21 / %x23-7E / obs-text`
const fn is_etag_char(character: char) -> bool {
    matches!(character, '\x21' | '\x23'..='\x7e') || (character as u32) >= 0x80
}

/// One element of a parsed tag list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTag {
    pub opaque: String,
    pub weak: bool,
}

impl CandidateTag {
    /// Strong comparison: both tags strong and opaque values equal.
    #[must_use]
    pub fn strong_matches(&self, current: &EntityTag) -> bool {
        !self.weak && self.opaque == current.opaque()
    }
}

/// Parsed value of `If-Match` or `If-None-Match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCondition {
    /// `*`: matches any current representation.
    Any,
    /// A non-empty list of tags.
    Tags(Vec<CandidateTag>),
}

impl TagCondition {
    /// Parses a comma separated tag list.
    ///
    /// Malformed elements are skipped. Returns `None` when nothing usable
    /// remains, so callers can treat the header as absent.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut scanner = TagScanner::new(raw);
        let mut tags = Vec::new();

        while let Some(element) = scanner.next_element() {
            match element {
                Element::Wildcard => return Some(Self::Any),
                Element::Tag(tag) => tags.push(tag),
                Element::Malformed => {}
            }
        }

        if tags.is_empty() {
            None
        } else {
            Some(Self::Tags(tags))
        }
    }

    /// Returns `true` if the current tag satisfies this condition.
    #[must_use]
    pub fn matches(&self, current: &EntityTag) -> bool {
        match self {
            Self::Any => true,
            Self::Tags(tags) => tags.iter().any(|tag| tag.strong_matches(current)),
        }
    }
}

// =============================================================================
// Scanner
// =============================================================================

enum Element {
    Wildcard,
    Tag(CandidateTag),
    Malformed,
}

/// Walks a tag list. Quoted values may legally contain commas, so the list
/// cannot simply be split on `,`.
struct TagScanner<'a> {
    rest: &'a str,
}

impl<'a> TagScanner<'a> {
    const fn new(raw: &'a str) -> Self {
        Self { rest: raw }
    }

    fn next_element(&mut self) -> Option<Element> {
        let rest: &'a str = self
            .rest
            .trim_start_matches(|character: char| character == ',' || character.is_whitespace());
        self.rest = rest;
        if rest.is_empty() {
            return None;
        }

        if let Some(after) = rest.strip_prefix('*') {
            self.rest = after;
            return Some(self.finish(Element::Wildcard));
        }

        let (weak, quoted) = match rest.strip_prefix("W/") {
            Some(after) => (true, after),
            None => (false, rest),
        };

        let Some(body) = quoted.strip_prefix('"') else {
            return Some(self.skip_malformed());
        };
        let Some(end) = body.find('"') else {
            self.rest = "";
            return Some(Element::Malformed);
        };

        let opaque = &body[..end];
        self.rest = &body[end + 1..];

        if opaque.chars().all(is_etag_char) {
            Some(self.finish(Element::Tag(CandidateTag {
                opaque: opaque.to_string(),
                weak,
            })))
        } else {
            Some(self.skip_malformed())
        }
    }

    /// An element must be followed by optional whitespace and then a comma
    /// or the end of input.
    fn finish(&mut self, element: Element) -> Element {
        let rest: &'a str = self.rest;
        let trimmed = rest.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(',') {
            self.rest = trimmed;
            element
        } else {
            self.skip_malformed()
        }
    }

    fn skip_malformed(&mut self) -> Element {
        let rest: &'a str = self.rest;
        self.rest = rest.find(',').map_or("", |index| &rest[index..]);
        Element::Malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tag(opaque: &str) -> EntityTag {
        EntityTag::new(opaque).unwrap()
    }

    fn strong(opaque: &str) -> CandidateTag {
        CandidateTag {
            opaque: opaque.to_string(),
            weak: false,
        }
    }

    #[rstest]
    fn entity_tag_displays_quoted() {
        assert_eq!(tag("abc").to_string(), "\"abc\"");
    }

    #[rstest]
    #[case("with\"quote")]
    #[case("with space")]
    #[case("tab\there")]
    fn entity_tag_rejects_invalid_characters(#[case] opaque: &str) {
        assert!(EntityTag::new(opaque).is_err());
    }

    #[rstest]
    fn entity_tag_from_digest_is_fixed_width_hex() {
        let entity_tag = EntityTag::from_digest(0xab);
        assert_eq!(entity_tag.opaque().len(), 32);
        assert!(entity_tag.opaque().ends_with("ab"));
    }

    #[rstest]
    #[case("\"abc\"", vec![strong("abc")])]
    #[case("\"abc\", \"xyz\"", vec![strong("abc"), strong("xyz")])]
    #[case("\"abc\",\"xyz\"", vec![strong("abc"), strong("xyz")])]
    #[case(" , \"abc\" ,, ", vec![strong("abc")])]
    #[case("\"a,b\"", vec![strong("a,b")])]
    #[case("\"\"", vec![strong("")])]
    fn parses_tag_lists(#[case] raw: &str, #[case] expected: Vec<CandidateTag>) {
        assert_eq!(TagCondition::parse(raw), Some(TagCondition::Tags(expected)));
    }

    #[rstest]
    fn parses_weak_tags() {
        let parsed = TagCondition::parse("W/\"abc\"").unwrap();
        assert_eq!(
            parsed,
            TagCondition::Tags(vec![CandidateTag {
                opaque: "abc".to_string(),
                weak: true,
            }])
        );
    }

    #[rstest]
    #[case("*")]
    #[case(" * ")]
    #[case("\"abc\", *")]
    fn parses_wildcard(#[case] raw: &str) {
        assert_eq!(TagCondition::parse(raw), Some(TagCondition::Any));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("abc")]
    #[case("\"unterminated")]
    #[case("abc, def")]
    #[case("\"abc\"trailing")]
    fn malformed_lists_are_absent(#[case] raw: &str) {
        assert_eq!(TagCondition::parse(raw), None);
    }

    #[rstest]
    fn malformed_elements_are_skipped() {
        assert_eq!(
            TagCondition::parse("abc, \"xyz\""),
            Some(TagCondition::Tags(vec![strong("xyz")]))
        );
    }

    #[rstest]
    #[case("\"abc\"", true)]
    #[case("\"xyz\"", false)]
    #[case("\"abc\", \"xyz\"", true)]
    #[case("\"xyz\", \"abc\"", true)]
    #[case("W/\"abc\"", false)]
    #[case("*", true)]
    fn matches_with_strong_comparison(#[case] raw: &str, #[case] expected: bool) {
        let condition = TagCondition::parse(raw).unwrap();
        assert_eq!(condition.matches(&tag("abc")), expected);
    }
}
