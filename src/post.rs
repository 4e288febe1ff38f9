//! Defines the [`PostRecord`], [`PageRecord`], and [`Timestamp`] types along
//! with the validation that turns loosely-shaped upstream JSON into them. The
//! upstream content compiler is trusted for nothing: every required field is
//! checked here so the rest of the pipeline never sees a half-formed record.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A publication or revision instant. Keeps the raw ISO-8601 string from the
/// source alongside the parsed instant: ordering uses the instant, while
/// calendar-day identity uses the raw `YYYY-MM-DD` prefix so that no timezone
/// conversion ever moves a post onto a different day.
#[derive(Clone, Debug)]
pub struct Timestamp {
    raw: String,
    instant: DateTime<FixedOffset>,
}

impl Timestamp {
    /// Parses `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]`, or a full RFC 3339
    /// string. Values without an offset are taken to be UTC.
    pub fn parse(raw: &str) -> Option<Timestamp> {
        let raw = raw.trim();
        let utc = FixedOffset::east_opt(0)?;
        let instant = if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            instant
        } else if let Ok(naive) =
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        {
            utc.from_utc_datetime(&naive)
        } else {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?)
        };

        // chrono accepts single-digit months and days, but everything
        // downstream slices the raw `YYYY-MM-DD` prefix.
        if !is_iso_date_prefix(raw) || raw[..10] != instant.format("%Y-%m-%d").to_string() {
            return None;
        }
        Some(Timestamp {
            raw: raw.to_owned(),
            instant,
        })
    }

    /// The string as it appeared in the source.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The `YYYY-MM-DD` prefix of the source string.
    pub fn calendar_day(&self) -> &str {
        &self.raw[..10]
    }

    /// The `YYYY-MM` prefix of the source string.
    pub fn month_key(&self) -> &str {
        &self.raw[..7]
    }

    pub fn instant(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    /// Two timestamps fall on the same day iff their date-only substrings
    /// match exactly.
    pub fn same_day(&self, other: &Timestamp) -> bool {
        self.calendar_day() == other.calendar_day()
    }
}

fn is_iso_date_prefix(raw: &str) -> bool {
    match raw.as_bytes().get(..10) {
        Some(prefix) => prefix.iter().enumerate().all(|(i, &b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        }),
        None => false,
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}
impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One published article. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PostRecord {
    /// Unique, URL-safe identifier, stable across builds.
    pub slug: String,

    pub title: String,

    /// Short description used by listings and feeds. May be empty.
    pub excerpt: String,

    /// Publication instant.
    pub date: Timestamp,

    /// Revision instant, if the post was ever revised.
    pub updated: Option<Timestamp>,

    /// Tag labels. Duplicates within one post are collapsed while keeping the
    /// order in which the labels first appeared.
    pub tags: Vec<String>,

    /// Category labels, usually at most one.
    pub categories: Vec<String>,

    /// Site-relative public path, e.g. `/posts/hello-world`.
    pub path: String,
}

impl PostRecord {
    pub fn has_tag(&self, label: &str) -> bool {
        self.tags.iter().any(|t| t == label)
    }

    pub fn has_category(&self, label: &str) -> bool {
        self.categories.iter().any(|c| c == label)
    }

    /// The instant the post last changed: `updated` when present, otherwise
    /// `date`.
    pub fn last_modified(&self) -> &Timestamp {
        self.updated.as_ref().unwrap_or(&self.date)
    }

    /// Validates a raw upstream object. `index` is the record's position in
    /// its source array and is only used for error messages.
    pub fn from_raw(raw: RawRecord, index: usize, posts_prefix: &str) -> Result<PostRecord> {
        let common = Common::validate(&raw, index)?;
        Ok(PostRecord {
            path: format!("/{}/{}", posts_prefix.trim_matches('/'), common.slug),
            slug: common.slug,
            title: common.title,
            excerpt: common.excerpt,
            date: common.date,
            updated: common.updated,
            tags: dedup_labels(raw.tags.unwrap_or_default()),
            categories: dedup_labels(raw.categories.unwrap_or_default()),
        })
    }
}

/// A static single page such as `about` or `privacy`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageRecord {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub date: Timestamp,
    pub updated: Option<Timestamp>,

    /// Site-relative public path, always `/{slug}`.
    pub path: String,
}

impl PageRecord {
    pub fn last_modified(&self) -> &Timestamp {
        self.updated.as_ref().unwrap_or(&self.date)
    }

    /// Validates a raw upstream object. Tags and categories are ignored for
    /// pages.
    pub fn from_raw(raw: RawRecord, index: usize) -> Result<PageRecord> {
        let common = Common::validate(&raw, index)?;
        Ok(PageRecord {
            path: format!("/{}", common.slug),
            slug: common.slug,
            title: common.title,
            excerpt: common.excerpt,
            date: common.date,
            updated: common.updated,
        })
    }
}

/// The loose shape of one upstream record. Every field is optional here so
/// that a missing field is reported by name rather than as a generic serde
/// message.
#[derive(Debug, Default, Deserialize)]
pub struct RawRecord {
    pub slug: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "description")]
    pub excerpt: Option<String>,
    pub date: Option<String>,
    pub updated: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

struct Common {
    slug: String,
    title: String,
    excerpt: String,
    date: Timestamp,
    updated: Option<Timestamp>,
}

impl Common {
    fn validate(raw: &RawRecord, index: usize) -> Result<Common> {
        let slug = required(index, "slug", &raw.slug)?;
        if slug.contains('/') || slug.chars().any(char::is_whitespace) {
            return Err(Error::InvalidSlug {
                index,
                slug: slug.to_owned(),
            });
        }
        let date = required(index, "date", &raw.date)?;
        let date = Timestamp::parse(date).ok_or_else(|| Error::InvalidDate {
            index,
            field: "date",
            value: date.to_owned(),
        })?;

        // An empty `updated` is the same as no `updated` at all.
        let updated = match raw.updated.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(Timestamp::parse(value).ok_or_else(|| Error::InvalidDate {
                index,
                field: "updated",
                value: value.to_owned(),
            })?),
        };

        Ok(Common {
            slug: slug.to_owned(),
            title: required(index, "title", &raw.title)?.to_owned(),
            excerpt: raw.excerpt.clone().unwrap_or_default(),
            date,
            updated,
        })
    }
}

fn required<'a>(index: usize, field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        None => Err(Error::MissingField { index, field }),
        Some("") => Err(Error::EmptyField { index, field }),
        Some(value) => Ok(value),
    }
}

fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        if !out.contains(&label) {
            out.push(label);
        }
    }
    out
}

/// Represents the result of validating a record.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a record that cannot be admitted into the collection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a required field is absent or `null`.
    #[error("record {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// Returned when a required field is present but blank.
    #[error("record {index}: field `{field}` is empty")]
    EmptyField { index: usize, field: &'static str },

    /// Returned when a slug cannot be used as a single path segment.
    #[error("record {index}: slug `{slug}` is not URL-safe")]
    InvalidSlug { index: usize, slug: String },

    /// Returned when a date field isn't ISO 8601.
    #[error("record {index}: field `{field}` is not an ISO-8601 date: `{value}`")]
    InvalidDate {
        index: usize,
        field: &'static str,
        value: String,
    },

    /// Returned when a slug was already used by an earlier record of the
    /// same collection.
    #[error("record {index}: slug `{slug}` is already used by record {first}")]
    DuplicateSlug {
        index: usize,
        first: usize,
        slug: String,
    },

    /// Returned when the record isn't a JSON object of the expected shape.
    #[error("record {index}: {source}")]
    Shape {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Builds a post with only the fields most tests care about.
    pub(crate) fn post(slug: &str, date: &str, tags: &[&str]) -> PostRecord {
        PostRecord::from_raw(
            RawRecord {
                slug: Some(slug.to_owned()),
                title: Some(format!("Title of {}", slug)),
                excerpt: Some(format!("About {}", slug)),
                date: Some(date.to_owned()),
                tags: Some(tags.iter().map(|t| t.to_string()).collect()),
                ..RawRecord::default()
            },
            0,
            "posts",
        )
        .expect("valid test post")
    }

    pub(crate) fn updated_post(slug: &str, date: &str, updated: &str) -> PostRecord {
        let mut p = post(slug, date, &[]);
        p.updated = Timestamp::parse(updated);
        p
    }

    #[test]
    fn test_timestamp_formats() {
        for raw in &[
            "2024-01-02",
            "2024-01-02T10:11:12",
            "2024-01-02T10:11:12.500",
            "2024-01-02T10:11:12+09:00",
            "2024-01-02T10:11:12Z",
        ] {
            let ts = Timestamp::parse(raw).expect(raw);
            assert_eq!("2024-01-02", ts.calendar_day());
            assert_eq!("2024-01", ts.month_key());
        }
        assert!(Timestamp::parse("yesterday").is_none());
        assert!(Timestamp::parse("2024-13-01").is_none());
        assert!(Timestamp::parse("2024-1-5").is_none());
        assert!(Timestamp::parse("2024-1-05T10:00:00").is_none());
        assert!(Timestamp::parse("2024-01-5T10:00:00Z").is_none());
        assert!(Timestamp::parse("12024-01-01").is_none());
    }

    #[test]
    fn test_short_date_parts_are_rejected_at_load() {
        let result = PostRecord::from_raw(
            RawRecord {
                slug: Some("a".to_owned()),
                title: Some("A".to_owned()),
                date: Some("2024-01-01".to_owned()),
                updated: Some("2024-1-05T10:00:00".to_owned()),
                ..RawRecord::default()
            },
            3,
            "posts",
        );
        assert!(matches!(
            result,
            Err(Error::InvalidDate { index: 3, field: "updated", .. })
        ));
    }

    #[test]
    fn test_same_day_ignores_offsets() {
        // Same instant, different offsets, different calendar days in the
        // source strings: deliberately *not* the same day.
        let a = Timestamp::parse("2024-01-01T23:30:00-01:00").unwrap();
        let b = Timestamp::parse("2024-01-02T00:30:00Z").unwrap();
        assert_eq!(a, b);
        assert!(!a.same_day(&b));
    }

    #[test]
    fn test_missing_slug_is_reported_by_name() {
        let err = PostRecord::from_raw(
            RawRecord {
                title: Some("t".into()),
                date: Some("2024-01-01".into()),
                ..RawRecord::default()
            },
            3,
            "posts",
        )
        .unwrap_err();
        assert_eq!("record 3: missing required field `slug`", err.to_string());
    }

    #[test]
    fn test_blank_updated_is_absent() {
        let p = PostRecord::from_raw(
            RawRecord {
                slug: Some("a".into()),
                title: Some("t".into()),
                date: Some("2024-01-01".into()),
                updated: Some("  ".into()),
                ..RawRecord::default()
            },
            0,
            "posts",
        )
        .unwrap();
        assert!(p.updated.is_none());
        assert_eq!("2024-01-01", p.last_modified().as_str());
    }

    #[test]
    fn test_tags_are_deduplicated_in_order() {
        let p = post("a", "2024-01-01", &["rust", "web", "rust"]);
        assert_eq!(vec!["rust".to_owned(), "web".to_owned()], p.tags);
        assert_eq!("/posts/a", p.path);
    }

    #[test]
    fn test_page_path() {
        let page = PageRecord::from_raw(
            RawRecord {
                slug: Some("about".into()),
                title: Some("About".into()),
                date: Some("2020-05-01".into()),
                tags: Some(vec!["ignored".into()]),
                ..RawRecord::default()
            },
            0,
        )
        .unwrap();
        assert_eq!("/about", page.path);
    }

    #[test]
    fn test_slug_with_slash_is_rejected() {
        let err = PageRecord::from_raw(
            RawRecord {
                slug: Some("a/b".into()),
                title: Some("t".into()),
                date: Some("2020-05-01".into()),
                ..RawRecord::default()
            },
            1,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSlug { index: 1, .. }));
    }
}
