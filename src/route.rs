//! Enumerates the static routes the site generator must pre-render. Every
//! enumeration is deterministic and total: each post, page, qualifying label
//! and archive month appears exactly once, in collection order. A broken
//! route set would only surface as a 404 after deployment, so anything that
//! would produce an empty or duplicate route fails the build instead.

use crate::post::{PageRecord, PostRecord, Timestamp};
use crate::tag::{ArchiveIndex, LabelIndex};
use crate::url::encode_segment;
use serde::Serialize;
use std::collections::HashSet;

/// One pre-rendered route: the identifier the page generator receives as its
/// parameter, and the site-relative path the route is served at.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteParam {
    /// Post or page slug, tag or category label, or `YYYY-MM` month key.
    pub slug: String,

    /// Site-relative path, starting with `/`.
    pub path: String,

    /// When the content behind the route last changed, if that is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<Timestamp>,
}

/// One route per post, in collection order.
pub fn enumerate_post_routes<'a, I>(posts: I) -> Result<Vec<RouteParam>>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    collect_unique(posts.into_iter().map(|post| RouteParam {
        slug: post.slug.clone(),
        path: post.path.clone(),
        lastmod: Some(post.last_modified().clone()),
    }))
}

/// One route per page, in collection order.
pub fn enumerate_page_routes(pages: &[PageRecord]) -> Result<Vec<RouteParam>> {
    collect_unique(pages.iter().map(|page| RouteParam {
        slug: page.slug.clone(),
        path: page.path.clone(),
        lastmod: Some(page.last_modified().clone()),
    }))
}

/// One route per tag carried by at least `min_count` posts. Tags below the
/// threshold get no standalone page.
pub fn enumerate_tag_routes(tags: &LabelIndex, min_count: usize) -> Result<Vec<RouteParam>> {
    label_routes(tags, "tags", min_count)
}

/// One route per category.
pub fn enumerate_category_routes(categories: &LabelIndex) -> Result<Vec<RouteParam>> {
    label_routes(categories, "categories", 1)
}

/// One route per archive month, newest first, at `/archives/{YYYY}/{MM}`.
pub fn enumerate_archive_routes(archive: &ArchiveIndex) -> Result<Vec<RouteParam>> {
    collect_unique(archive.months().map(|(month, posts)| {
        let (year, mm) = month.split_at(4);
        RouteParam {
            slug: month.to_owned(),
            path: format!("/archives/{}/{}", year, mm.trim_start_matches('-')),
            lastmod: posts.iter().map(|p| p.last_modified()).max().cloned(),
        }
    }))
}

fn label_routes(index: &LabelIndex, prefix: &str, min_count: usize) -> Result<Vec<RouteParam>> {
    collect_unique(
        index
            .entries()
            .iter()
            .filter(|entry| entry.count() >= min_count)
            .map(|entry| RouteParam {
                slug: entry.label.clone(),
                path: format!("/{}/{}", prefix, encode_segment(&entry.label)),
                lastmod: None,
            }),
    )
}

fn collect_unique(routes: impl Iterator<Item = RouteParam>) -> Result<Vec<RouteParam>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for route in routes {
        if route.slug.trim().is_empty() {
            return Err(Error::EmptySlug { path: route.path });
        }
        if !seen.insert(route.path.clone()) {
            return Err(Error::DuplicateRoute { path: route.path });
        }
        out.push(route);
    }
    Ok(out)
}

/// Every route the site generator pre-renders, grouped by kind. Serialized
/// as `routes.json`.
#[derive(Debug, Default, Serialize)]
pub struct RouteManifest {
    pub posts: Vec<RouteParam>,
    pub pages: Vec<RouteParam>,
    pub tags: Vec<RouteParam>,
    pub categories: Vec<RouteParam>,
    pub archives: Vec<RouteParam>,
}

impl RouteManifest {
    /// Every route, in manifest order.
    pub fn all(&self) -> impl Iterator<Item = &RouteParam> {
        self.posts
            .iter()
            .chain(&self.pages)
            .chain(&self.tags)
            .chain(&self.categories)
            .chain(&self.archives)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Represents the result of a route enumeration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an enumeration that would leave the static route set broken.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a record has no usable identifier.
    #[error("route `{path}` has an empty slug")]
    EmptySlug { path: String },

    /// Returned when two records would be rendered at the same path.
    #[error("duplicate route `{path}`")]
    DuplicateRoute { path: String },
}
