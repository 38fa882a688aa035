//! The validator pair attached to every representation.

use axum::http::header::{ETAG, HeaderName, LAST_MODIFIED};
use axum::http::{HeaderMap, HeaderValue};

use super::{EntityTag, HttpDate};

/// Current `ETag` and `Last-Modified` values of a resource or collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    pub entity_tag: EntityTag,
    pub last_modified: HttpDate,
}

impl Validators {
    #[must_use]
    pub const fn new(entity_tag: EntityTag, last_modified: HttpDate) -> Self {
        Self {
            entity_tag,
            last_modified,
        }
    }

    /// Header name/value pairs in the order they are written.
    #[must_use]
    pub fn header_pairs(&self) -> [(HeaderName, String); 2] {
        [
            (ETAG, self.entity_tag.to_string()),
            (LAST_MODIFIED, self.last_modified.to_string()),
        ]
    }

    /// Writes `ETag` and `Last-Modified` into `headers`, replacing any
    /// previous values.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (name, value) in self.header_pairs() {
            // Both values are built from visible ASCII.
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(name, value);
            }
        }
    }

    #[must_use]
    pub fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        self.apply_to(&mut headers);
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    #[rstest]
    fn to_headers_writes_both_validators() {
        let validators = Validators::new(
            EntityTag::new("abc").unwrap(),
            HttpDate::from(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        );

        let headers = validators.to_headers();

        assert_eq!(headers.get(ETAG).unwrap(), "\"abc\"");
        assert_eq!(
            headers.get(LAST_MODIFIED).unwrap(),
            "Mon, 01 Jan 2024 00:00:00 GMT"
        );
    }

    #[rstest]
    fn apply_to_replaces_existing_values() {
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("\"stale\""));

        let validators = Validators::new(
            EntityTag::new("fresh").unwrap(),
            HttpDate::from(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        );
        validators.apply_to(&mut headers);

        assert_eq!(headers.get_all(ETAG).iter().count(), 1);
        assert_eq!(headers.get(ETAG).unwrap(), "\"fresh\"");
    }
}
