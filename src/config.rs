//! Loads the project configuration from a `quillpress.yaml` file. The file is
//! discovered by walking up from a starting directory, so the tool can be run
//! from anywhere inside a project.
//!
//! ```yaml
//! site:
//!   title: My Blog
//!   description: Notes on things
//!   url: https://example.org/
//!   author: { name: Jane Doe, email: jane@example.org }
//!   language: en
//! content:
//!   posts: data/posts.json
//!   pages: data/pages.json
//!   popularity: data/popular.json
//! listing:
//!   feed_limit: 30
//!   popular_limit: 20
//!   tag_min_count: 10
//!   ignore_tags: [diary]
//! ```

use crate::url::normalize_base;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "quillpress.yaml";

/// Author information for feeds.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<Url>,
}

/// Site-wide metadata carried into every feed and sitemap.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Site {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// The public base URL. Always ends in `/` after loading.
    pub url: Url,

    #[serde(default)]
    pub author: Option<Author>,

    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    posts: PathBuf,
    #[serde(default)]
    pages: Option<PathBuf>,
    #[serde(default)]
    popularity: Option<PathBuf>,
}

#[derive(Deserialize)]
struct FeedLimit(usize);
impl Default for FeedLimit {
    fn default() -> Self {
        FeedLimit(30)
    }
}

#[derive(Deserialize)]
struct PopularLimit(usize);
impl Default for PopularLimit {
    fn default() -> Self {
        PopularLimit(20)
    }
}

#[derive(Deserialize)]
struct TagMinCount(usize);
impl Default for TagMinCount {
    fn default() -> Self {
        TagMinCount(10)
    }
}

#[derive(Deserialize)]
struct PostsPrefix(String);
impl Default for PostsPrefix {
    fn default() -> Self {
        PostsPrefix("posts".to_owned())
    }
}

#[derive(Deserialize, Default)]
struct Listing {
    #[serde(default)]
    feed_limit: FeedLimit,
    #[serde(default)]
    popular_limit: PopularLimit,
    #[serde(default)]
    tag_min_count: TagMinCount,
    #[serde(default)]
    ignore_tags: HashSet<String>,
    #[serde(default)]
    posts_prefix: PostsPrefix,
}

#[derive(Deserialize)]
struct Project {
    site: Site,
    content: Content,
    #[serde(default)]
    listing: Listing,
}

/// The static build parameters. None of these are runtime flags.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingConfig {
    /// Maximum number of items in each feed.
    pub feed_limit: usize,

    /// Maximum number of posts in the popular listing.
    pub popular_limit: usize,

    /// Minimum number of posts a tag needs to get its own page.
    pub tag_min_count: usize,

    /// Tags that keep a post out of the recent, updated and popular
    /// listings.
    pub ignore_tags: HashSet<String>,

    /// First path segment of post URLs.
    pub posts_prefix: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        let listing = Listing::default();
        ListingConfig {
            feed_limit: listing.feed_limit.0,
            popular_limit: listing.popular_limit.0,
            tag_min_count: listing.tag_min_count.0,
            ignore_tags: listing.ignore_tags,
            posts_prefix: listing.posts_prefix.0,
        }
    }
}

/// The resolved configuration: every path is absolute or relative to the
/// working directory, never to the project file.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: Site,
    pub posts_file: PathBuf,
    pub pages_file: Option<PathBuf>,
    pub popularity_file: Option<PathBuf>,
    pub listing: ListingConfig,
    pub output_directory: PathBuf,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and each of its ancestors.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads a specific project file. Content paths in the file are resolved
    /// relative to the file's directory.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        Config::from_project(project, project_root, output_directory)
    }

    fn from_project(project: Project, project_root: &Path, output_directory: &Path) -> Result<Config> {
        let Project {
            mut site,
            content,
            listing,
        } = project;

        if site.url.cannot_be_a_base() {
            return Err(Error::InvalidSiteUrl(site.url));
        }
        site.url = normalize_base(site.url);

        if listing.feed_limit.0 == 0 {
            return Err(Error::ZeroLimit("feed_limit"));
        }

        Ok(Config {
            site,
            posts_file: project_root.join(content.posts),
            pages_file: content.pages.map(|p| project_root.join(p)),
            popularity_file: content.popularity.map(|p| project_root.join(p)),
            listing: ListingConfig {
                feed_limit: listing.feed_limit.0,
                popular_limit: listing.popular_limit.0,
                tag_min_count: listing.tag_min_count.0,
                ignore_tags: listing.ignore_tags,
                posts_prefix: listing.posts_prefix.0,
            },
            output_directory: output_directory.to_owned(),
        })
    }
}

/// Represents the result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when no project file exists in the directory or any parent.
    #[error("could not find `{}` in any parent directory", PROJECT_FILE)]
    NotFound,

    /// Returned when the project file can't be opened.
    #[error("opening project file `{}`: {err}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the project file isn't valid YAML of the expected shape.
    #[error("loading project file `{}`: {err}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },

    /// Returned when the site URL can't have paths joined onto it (e.g.
    /// `mailto:`).
    #[error("site url `{0}` cannot be used as a base URL")]
    InvalidSiteUrl(Url),

    /// Returned when a limit that must be positive is zero.
    #[error("`listing.{0}` must be greater than zero")]
    ZeroLimit(&'static str),
}
