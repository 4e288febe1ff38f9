//! Support for creating syndication feeds (RSS 2.0, Atom 1.0 and JSON Feed
//! 1.1) from a list of posts. Each renderer picks the `limit` most recent
//! posts itself, so callers may pass the collection in any order.
//!
//! Feed-level timestamps are derived from the posts rather than the wall
//! clock, which keeps the output byte-for-byte reproducible across builds of
//! unchanged content.

use crate::config::{Author, Site};
use crate::post::PostRecord;
use crate::ranking::recent;
use crate::url::absolute;
use crate::xml::{self, InvalidChar};
use atom_syndication::{
    Category as AtomCategory, Entry, Error as AtomError, Feed, Link, Person,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::UNIX_EPOCH;
use url::ParseError as UrlParseError;

/// File name of the RSS feed.
pub const RSS_FILE: &str = "rss.xml";

/// File name of the Atom feed.
pub const ATOM_FILE: &str = "atom.xml";

/// File name of the JSON feed.
pub const JSON_FEED_FILE: &str = "feed.json";

/// An item as every feed format sees it: the post plus its absolute link.
struct Item<'a> {
    post: &'a PostRecord,
    link: String,
}

fn items<'a, I>(posts: I, site: &Site, limit: usize) -> Result<Vec<Item<'a>>>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    recent(posts)
        .into_iter()
        .take(limit)
        .map(|post| {
            Ok(Item {
                post,
                link: absolute(&site.url, &post.path)?.to_string(),
            })
        })
        .collect()
}

/// The instant the feed as a whole last changed: the newest publication or
/// revision among its items. An empty feed reports the Unix epoch.
fn feed_updated(items: &[Item]) -> DateTime<FixedOffset> {
    items
        .iter()
        .map(|item| item.post.last_modified().instant())
        .max()
        .unwrap_or_else(|| DateTime::<Utc>::from(UNIX_EPOCH).into())
}

/// Renders an RSS 2.0 document with one `<item>` per post.
pub fn render_rss_feed<'a, I>(posts: I, site: &Site, limit: usize) -> Result<String>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    let items = items(posts, site, limit)?;
    let self_link = absolute(&site.url, RSS_FILE)?;

    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n  <channel>\n",
    );
    xml::element(&mut out, 4, "title", "site.title", &site.title)?;
    xml::element(&mut out, 4, "link", "site.url", site.url.as_str())?;
    xml::element(&mut out, 4, "description", "site.description", &site.description)?;
    if let Some(language) = &site.language {
        xml::element(&mut out, 4, "language", "site.language", language)?;
    }
    let _ = writeln!(
        out,
        "    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>",
        xml::escape("site.url", self_link.as_str())?
    );
    xml::element(&mut out, 4, "lastBuildDate", "lastBuildDate", &feed_updated(&items).to_rfc2822())?;

    for item in &items {
        let post = item.post;
        out.push_str("    <item>\n");
        xml::element(&mut out, 6, "title", "title", &post.title)?;
        xml::element(&mut out, 6, "link", "link", &item.link)?;
        let _ = writeln!(
            out,
            "      <guid isPermaLink=\"true\">{}</guid>",
            xml::escape("link", &item.link)?
        );
        xml::element(&mut out, 6, "description", "excerpt", &post.excerpt)?;
        xml::element(&mut out, 6, "pubDate", "date", &post.date.instant().to_rfc2822())?;
        for tag in &post.tags {
            xml::element(&mut out, 6, "category", "tags", tag)?;
        }
        out.push_str("    </item>\n");
    }

    out.push_str("  </channel>\n</rss>\n");
    Ok(out)
}

/// Renders an Atom 1.0 document with one `<entry>` per post.
pub fn render_atom_feed<'a, I>(posts: I, site: &Site, limit: usize) -> Result<String>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    let items = items(posts, site, limit)?;
    let authors = author_to_people(site.author.as_ref());

    // `atom_syndication` escapes reserved characters but happily writes
    // characters that make the document unparseable, so check first.
    xml::check("site.title", &site.title)?;
    xml::check("site.description", &site.description)?;

    let mut entries: Vec<Entry> = Vec::with_capacity(items.len());
    for item in &items {
        let post = item.post;
        xml::check("title", &post.title)?;
        xml::check("excerpt", &post.excerpt)?;
        let mut categories = Vec::with_capacity(post.tags.len());
        for tag in &post.tags {
            xml::check("tags", tag)?;
            categories.push(AtomCategory {
                term: tag.clone(),
                ..AtomCategory::default()
            });
        }

        entries.push(Entry {
            id: item.link.clone(),
            title: post.title.clone().into(),
            updated: post.last_modified().instant(),
            published: Some(post.date.instant()),
            authors: authors.clone(),
            links: vec![alternate(item.link.clone())],
            summary: Some(post.excerpt.clone().into()),
            categories,
            ..Entry::default()
        });
    }

    let feed = Feed {
        title: site.title.clone().into(),
        id: site.url.to_string(),
        updated: feed_updated(&items),
        authors,
        subtitle: match site.description.is_empty() {
            true => None,
            false => Some(site.description.clone().into()),
        },
        links: vec![
            alternate(site.url.to_string()),
            Link {
                href: absolute(&site.url, ATOM_FILE)?.to_string(),
                rel: "self".to_owned(),
                mime_type: Some("application/atom+xml".to_owned()),
                ..Link::default()
            },
        ],
        entries,
        ..Feed::default()
    };

    let bytes = feed.write_to(Vec::new())?;
    String::from_utf8(bytes).map_err(Error::Utf8)
}

fn alternate(href: String) -> Link {
    Link {
        href,
        rel: "alternate".to_owned(),
        ..Link::default()
    }
}

fn author_to_people(author: Option<&Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![Person {
            name: author.name.clone(),
            email: author.email.clone(),
            uri: author.url.as_ref().map(|u| u.to_string()),
        }],
        None => Vec::new(),
    }
}

#[derive(Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: String,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    authors: Vec<JsonAuthor<'a>>,
    items: Vec<JsonItem<'a>>,
}

#[derive(Serialize)]
struct JsonAuthor<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Serialize)]
struct JsonItem<'a> {
    id: &'a str,
    url: &'a str,
    title: &'a str,
    summary: &'a str,
    content_text: &'a str,
    date_published: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_modified: Option<String>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
}

/// Renders a JSON Feed 1.1 document with the same item selection as the XML
/// feeds.
pub fn render_json_feed<'a, I>(posts: I, site: &Site, limit: usize) -> Result<String>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    let items = items(posts, site, limit)?;
    let feed = JsonFeed {
        version: "https://jsonfeed.org/version/1.1",
        title: &site.title,
        home_page_url: site.url.as_str(),
        feed_url: absolute(&site.url, JSON_FEED_FILE)?.to_string(),
        description: &site.description,
        language: site.language.as_deref(),
        authors: site
            .author
            .iter()
            .map(|a| JsonAuthor {
                name: &a.name,
                url: a.url.as_ref().map(|u| u.to_string()),
            })
            .collect(),
        items: items
            .iter()
            .map(|item| JsonItem {
                id: &item.link,
                url: &item.link,
                title: &item.post.title,
                summary: &item.post.excerpt,
                content_text: &item.post.excerpt,
                date_published: item.post.date.instant().to_rfc3339(),
                date_modified: item.post.updated.as_ref().map(|u| u.instant().to_rfc3339()),
                tags: &item.post.tags,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&feed)?)
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. A failed feed never affects the
/// other artifacts of the build.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a text field can't be represented in XML.
    #[error(transparent)]
    InvalidChar(#[from] InvalidChar),

    /// Returned when a link can't be built from the site URL.
    #[error("building feed link: {0}")]
    Url(#[from] UrlParseError),

    /// Returned when there is an Atom-related error.
    #[error("writing atom feed: {0}")]
    Atom(#[from] AtomError),

    /// Returned when the Atom writer produces invalid UTF-8.
    #[error("atom feed is not valid UTF-8: {0}")]
    Utf8(std::string::FromUtf8Error),

    /// Returned when the JSON feed can't be serialized.
    #[error("writing json feed: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::{post, updated_post};
    use url::Url;

    fn site() -> Site {
        Site {
            title: "Notes & Things".to_owned(),
            description: "A blog".to_owned(),
            url: Url::parse("https://example.org/").expect("valid url"),
            author: Some(Author {
                name: "Jane".to_owned(),
                email: None,
                url: None,
            }),
            language: Some("ja".to_owned()),
        }
    }

    #[test]
    fn test_rss_limits_and_orders_items() -> Result<()> {
        let posts = vec![
            post("old", "2024-01-01", &[]),
            post("new", "2024-03-01", &["rust"]),
            post("mid", "2024-02-01", &[]),
        ];
        let rss = render_rss_feed(&posts, &site(), 2)?;
        let new = rss.find("https://example.org/posts/new").unwrap_or(usize::MAX);
        let mid = rss.find("https://example.org/posts/mid").unwrap_or(usize::MAX);
        assert!(new < mid && mid < usize::MAX);
        assert!(!rss.contains("/posts/old"));
        assert_eq!(2, rss.matches("<item>").count());
        assert!(rss.contains("<pubDate>Fri, 01 Mar 2024 00:00:00 +0000</pubDate>"));
        assert!(rss.contains("<title>Notes &amp; Things</title>"));
        assert!(rss.contains("<category>rust</category>"));
        assert!(rss.contains("<lastBuildDate>Fri, 01 Mar 2024 00:00:00 +0000</lastBuildDate>"));
        Ok(())
    }

    #[test]
    fn test_rss_escapes_text() -> Result<()> {
        let mut p = post("a", "2024-01-01", &[]);
        p.title = "<script>alert('x')</script>".to_owned();
        p.excerpt = "Fish & \"chips\"".to_owned();
        let rss = render_rss_feed(&[p], &site(), 30)?;
        assert!(rss.contains("&lt;script&gt;alert(&apos;x&apos;)&lt;/script&gt;"));
        assert!(rss.contains("Fish &amp; &quot;chips&quot;"));
        assert!(!rss.contains("<script>"));
        Ok(())
    }

    #[test]
    fn test_unencodable_character_fails_the_feed() {
        let mut p = post("a", "2024-01-01", &[]);
        p.excerpt = "bell\u{7}".to_owned();
        let posts = [p];
        assert!(matches!(
            render_rss_feed(&posts, &site(), 30),
            Err(Error::InvalidChar(InvalidChar { field: "excerpt", .. }))
        ));
        assert!(matches!(
            render_atom_feed(&posts, &site(), 30),
            Err(Error::InvalidChar(_))
        ));
        // JSON can carry it.
        assert!(render_json_feed(&posts, &site(), 30).is_ok());
    }

    #[test]
    fn test_atom_round_trip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let posts = vec![
            post("a", "2024-01-01", &["rust"]),
            updated_post("b", "2024-01-02", "2024-02-10T12:00:00+09:00"),
        ];
        let xml = render_atom_feed(&posts, &site(), 30)?;
        let feed: Feed = xml.parse()?;

        assert_eq!("https://example.org/", feed.id);
        assert_eq!(2, feed.entries.len());
        assert_eq!("https://example.org/posts/b", feed.entries[0].links[0].href);
        assert_eq!(
            "2024-02-10T12:00:00+09:00",
            feed.entries[0].updated.to_rfc3339()
        );
        assert_eq!(feed.entries[0].updated, feed.updated);
        assert_eq!("rust", feed.entries[1].categories[0].term);
        assert_eq!(
            Some("2024-01-01T00:00:00+00:00".to_owned()),
            feed.entries[1].published.map(|d| d.to_rfc3339())
        );
        Ok(())
    }

    #[test]
    fn test_empty_atom_feed_is_reproducible() -> Result<()> {
        let posts: Vec<PostRecord> = Vec::new();
        assert_eq!(
            render_atom_feed(&posts, &site(), 30)?,
            render_atom_feed(&posts, &site(), 30)?
        );
        Ok(())
    }

    #[test]
    fn test_json_feed_shape() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let posts = vec![
            post("a", "2024-01-01", &["rust"]),
            updated_post("b", "2024-01-02", "2024-01-05"),
        ];
        let json = render_json_feed(&posts, &site(), 1)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!("https://jsonfeed.org/version/1.1", value["version"]);
        assert_eq!("https://example.org/feed.json", value["feed_url"]);
        assert_eq!(1, value["items"].as_array().map_or(0, Vec::len));
        assert_eq!("https://example.org/posts/b", value["items"][0]["url"]);
        assert_eq!("2024-01-02T00:00:00+00:00", value["items"][0]["date_published"]);
        assert_eq!("2024-01-05T00:00:00+00:00", value["items"][0]["date_modified"]);
        assert!(value["items"][0].get("tags").is_none());
        Ok(())
    }
}
