//! Renders sitemaps (one `<url>` per route) and the sitemap index that
//! points search engines at them.

use crate::post::Timestamp;
use crate::route::RouteParam;
use crate::url::absolute;
use crate::xml::{self, InvalidChar};
use std::fmt::Write as _;
use url::{ParseError as UrlParseError, Url};

/// File name of the sitemap index.
pub const SITEMAP_INDEX_FILE: &str = "sitemap.xml";
pub const POST_SITEMAP_FILE: &str = "post-sitemap.xml";
pub const PAGE_SITEMAP_FILE: &str = "page-sitemap.xml";
pub const TAG_SITEMAP_FILE: &str = "tag-sitemap.xml";
pub const CATEGORY_SITEMAP_FILE: &str = "category-sitemap.xml";

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Renders a `<urlset>` with one `<url>` per route, resolved against `base`.
pub fn render_sitemap_xml(base: &Url, routes: &[RouteParam]) -> Result<String> {
    let mut out = format!("{}<urlset xmlns=\"{}\">\n", HEADER, NAMESPACE);
    for route in routes {
        out.push_str("  <url>\n");
        xml::element(&mut out, 4, "loc", "path", absolute(base, &route.path)?.as_str())?;
        if let Some(lastmod) = &route.lastmod {
            xml::element(&mut out, 4, "lastmod", "lastmod", &w3c_datetime(lastmod))?;
        }
        out.push_str("  </url>\n");
    }
    out.push_str("</urlset>\n");
    Ok(out)
}

/// One child sitemap in the index.
pub struct ChildSitemap<'a> {
    /// File name relative to the site root, e.g. `post-sitemap.xml`.
    pub file: &'a str,

    /// The newest `lastmod` of any route in the child, if any route has one.
    pub lastmod: Option<&'a Timestamp>,
}

impl<'a> ChildSitemap<'a> {
    pub fn new(file: &'a str, routes: &'a [RouteParam]) -> ChildSitemap<'a> {
        ChildSitemap {
            file,
            lastmod: routes.iter().filter_map(|r| r.lastmod.as_ref()).max(),
        }
    }
}

/// Renders a `<sitemapindex>` listing each child sitemap.
pub fn render_sitemap_index(base: &Url, children: &[ChildSitemap]) -> Result<String> {
    let mut out = format!("{}<sitemapindex xmlns=\"{}\">\n", HEADER, NAMESPACE);
    for child in children {
        out.push_str("  <sitemap>\n");
        xml::element(&mut out, 4, "loc", "file", absolute(base, child.file)?.as_str())?;
        if let Some(lastmod) = child.lastmod {
            let _ = writeln!(out, "    <lastmod>{}</lastmod>", w3c_datetime(lastmod));
        }
        out.push_str("  </sitemap>\n");
    }
    out.push_str("</sitemapindex>\n");
    Ok(out)
}

/// Date-only sources stay date-only; anything with a time is written as
/// RFC 3339, which is valid W3C Datetime.
fn w3c_datetime(ts: &Timestamp) -> String {
    if ts.as_str().len() == 10 {
        ts.calendar_day().to_owned()
    } else {
        ts.instant().to_rfc3339()
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem rendering a sitemap.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a route can't be resolved against the site URL.
    #[error("building sitemap location: {0}")]
    Url(#[from] UrlParseError),

    /// Returned when a location can't be represented in XML.
    #[error(transparent)]
    InvalidChar(#[from] InvalidChar),
}
