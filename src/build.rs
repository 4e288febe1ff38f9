//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: loading the content collections ([`crate::repository`]),
//! deriving every listing and index once ([`crate::context`]), enumerating
//! the static routes ([`crate::route`]), and writing the feeds, sitemaps and
//! manifests to the output directory.
//!
//! Loading and route enumeration are all-or-nothing. Writing is not: each
//! output file is produced independently, and a file that fails to render is
//! logged and skipped without stopping the others.

use crate::config::Config;
use crate::context::BuildContext;
use crate::feed::{self, ATOM_FILE, JSON_FEED_FILE, RSS_FILE};
use crate::popularity::PopularityIndex;
use crate::repository::{self, Repository};
use crate::route::{self, RouteManifest};
use crate::sitemap::{
    self, ChildSitemap, CATEGORY_SITEMAP_FILE, PAGE_SITEMAP_FILE, POST_SITEMAP_FILE,
    SITEMAP_INDEX_FILE, TAG_SITEMAP_FILE,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

/// File name of the route manifest.
pub const ROUTES_FILE: &str = "routes.json";

/// File name of the precomputed listings.
pub const LISTINGS_FILE: &str = "listings.json";

/// What a build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Files written, in the order they were written.
    pub written: Vec<PathBuf>,

    /// Files that could not be produced, with the reason.
    pub failed: Vec<(&'static str, Error)>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn wrote(&self, file: &str) -> bool {
        self.written.iter().any(|p| p.file_name().map_or(false, |n| n == file))
    }
}

/// Builds every output file from a [`Config`].
///
/// Returns `Err` only for failures that make the whole build meaningless
/// (malformed content, a broken route set, an unusable output directory).
/// Failures of individual files are collected in the returned
/// [`BuildReport`].
pub fn build_site(config: &Config) -> Result<BuildReport> {
    let started = Instant::now();

    let repository = Repository::load(
        &config.posts_file,
        config.pages_file.as_deref(),
        &config.listing.posts_prefix,
    )?;
    let popularity = PopularityIndex::load_or_empty(config.popularity_file.as_deref());
    let ctx = BuildContext::new(&repository, &config.listing, popularity);
    info!(
        posts = ctx.posts().len(),
        pages = ctx.pages().len(),
        visible = ctx.visible.len(),
        updated = ctx.listing.updated.len(),
        popular = ctx.popular.len(),
        tags = ctx.tags.len(),
        "derived listings"
    );

    let routes = ctx.routes()?;

    std::fs::create_dir_all(&config.output_directory).map_err(|err| Error::CreateDir {
        path: config.output_directory.clone(),
        err,
    })?;

    let mut writer = ArtifactWriter {
        dir: &config.output_directory,
        report: BuildReport::default(),
    };
    write_artifacts(&mut writer, config, &ctx, &routes);

    let report = writer.report;
    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        elapsed = ?started.elapsed(),
        "build finished"
    );
    Ok(report)
}

fn write_artifacts(writer: &mut ArtifactWriter, config: &Config, ctx: &BuildContext, routes: &RouteManifest) {
    let site = &config.site;
    let feed_limit = config.listing.feed_limit;

    writer.emit(ROUTES_FILE, || routes.to_json().map_err(Error::Json));
    writer.emit(LISTINGS_FILE, || {
        serde_json::to_string_pretty(&ctx.listings()).map_err(Error::Json)
    });

    // Feeds syndicate every post, ignored tags included; the ignore list
    // only shapes the on-site aggregate listings.
    writer.emit(RSS_FILE, || Ok(feed::render_rss_feed(ctx.posts(), site, feed_limit)?));
    writer.emit(ATOM_FILE, || Ok(feed::render_atom_feed(ctx.posts(), site, feed_limit)?));
    writer.emit(JSON_FEED_FILE, || Ok(feed::render_json_feed(ctx.posts(), site, feed_limit)?));

    let children = [
        (POST_SITEMAP_FILE, &routes.posts),
        (PAGE_SITEMAP_FILE, &routes.pages),
        (TAG_SITEMAP_FILE, &routes.tags),
        (CATEGORY_SITEMAP_FILE, &routes.categories),
    ];
    for &(file, child_routes) in children.iter() {
        writer.emit(file, || Ok(sitemap::render_sitemap_xml(&site.url, child_routes)?));
    }

    // The index only points at children that actually exist.
    let written: Vec<ChildSitemap> = children
        .iter()
        .filter(|(file, _)| writer.report.wrote(file))
        .map(|&(file, child_routes)| ChildSitemap::new(file, child_routes))
        .collect();
    writer.emit(SITEMAP_INDEX_FILE, || {
        Ok(sitemap::render_sitemap_index(&site.url, &written)?)
    });
}

struct ArtifactWriter<'a> {
    dir: &'a Path,
    report: BuildReport,
}

impl ArtifactWriter<'_> {
    /// Renders and writes one output file. On failure, any copy left over
    /// from a previous build is removed so the output directory never mixes
    /// builds.
    fn emit(&mut self, file: &'static str, render: impl FnOnce() -> Result<String>) {
        let path = self.dir.join(file);
        let result = render().and_then(|contents| {
            std::fs::write(&path, contents).map_err(|err| Error::Write {
                path: path.clone(),
                err,
            })
        });
        match result {
            Ok(()) => {
                info!(path = %path.display(), "wrote");
                self.report.written.push(path);
            }
            Err(err) => {
                error!(file, error = %err, "failed to produce output file");
                if let Err(rm_err) = rmfile(&path) {
                    error!(path = %path.display(), error = %rm_err, "failed to remove stale output file");
                }
                self.report.failed.push((file, err));
            }
        }
    }
}

fn rmfile(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(e),
        },
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. The first three variants abort the
/// build; the rest are recorded per output file in a [`BuildReport`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the content collections can't be loaded.
    #[error(transparent)]
    Repository(#[from] repository::Error),

    /// Returned when the static route set would be broken.
    #[error(transparent)]
    Route(#[from] route::Error),

    /// Returned when the output directory can't be created.
    #[error("creating output directory `{}`: {err}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for errors rendering a feed.
    #[error(transparent)]
    Feed(#[from] feed::Error),

    /// Returned for errors rendering a sitemap.
    #[error(transparent)]
    Sitemap(#[from] sitemap::Error),

    /// Returned for errors serializing a JSON manifest.
    #[error("serializing json: {0}")]
    Json(#[source] serde_json::Error),

    /// Returned for I/O problems writing an output file.
    #[error("writing `{}`: {err}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

impl fmt::Display for BuildReport {
    /// Summarizes the report for the command line.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "wrote {} file(s)", self.written.len())?;
        for (file, err) in &self.failed {
            write!(f, "\n  failed {}: {}", file, err)?;
        }
        Ok(())
    }
}
