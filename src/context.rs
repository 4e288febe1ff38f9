//! Defines [`BuildContext`], the one place derived state lives during a
//! build. It is constructed once from the loaded [`Repository`], owns every
//! index and listing the later stages need, and is handed to them by
//! reference. Nothing in it outlives the build.

use crate::config::ListingConfig;
use crate::filter::filter_excluding_tags;
use crate::popularity::PopularityIndex;
use crate::post::{PageRecord, PostRecord};
use crate::ranking::{popular, recent_and_updated, Listing};
use crate::repository::Repository;
use crate::route::{self, RouteManifest};
use crate::tag::{ArchiveIndex, LabelIndex};
use serde::Serialize;

pub struct BuildContext<'a> {
    pub repository: &'a Repository,
    pub listing_config: &'a ListingConfig,
    pub tags: LabelIndex<'a>,
    pub categories: LabelIndex<'a>,
    pub archive: ArchiveIndex<'a>,
    pub popularity: PopularityIndex,

    /// Posts that may appear in aggregate listings (no ignored tags).
    pub visible: Vec<&'a PostRecord>,

    /// Recent and updated listings over [`BuildContext::visible`].
    pub listing: Listing<'a>,

    /// Popular listing over [`BuildContext::visible`].
    pub popular: Vec<&'a PostRecord>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        repository: &'a Repository,
        listing_config: &'a ListingConfig,
        popularity: PopularityIndex,
    ) -> BuildContext<'a> {
        let posts = repository.posts();
        let visible = filter_excluding_tags(posts, &listing_config.ignore_tags);
        let listing = recent_and_updated(visible.iter().copied());
        let popular = popular(
            visible.iter().copied(),
            &popularity,
            listing_config.popular_limit,
        );

        BuildContext {
            repository,
            listing_config,
            tags: LabelIndex::tags(posts),
            categories: LabelIndex::categories(posts),
            archive: ArchiveIndex::new(posts),
            popularity,
            visible,
            listing,
            popular,
        }
    }

    pub fn posts(&self) -> &'a [PostRecord] {
        self.repository.posts()
    }

    pub fn pages(&self) -> &'a [PageRecord] {
        self.repository.pages()
    }

    /// Enumerates every static route. Fails on the first empty or duplicate
    /// route.
    pub fn routes(&self) -> route::Result<RouteManifest> {
        Ok(RouteManifest {
            posts: route::enumerate_post_routes(self.posts())?,
            pages: route::enumerate_page_routes(self.pages())?,
            tags: route::enumerate_tag_routes(&self.tags, self.listing_config.tag_min_count)?,
            categories: route::enumerate_category_routes(&self.categories)?,
            archives: route::enumerate_archive_routes(&self.archive)?,
        })
    }

    /// The precomputed listings the page generator reads instead of
    /// recomputing them per page.
    pub fn listings(&self) -> Listings<'_> {
        Listings {
            recent: &self.listing.recent,
            updated: &self.listing.updated,
            popular: &self.popular,
            tags: label_counts(&self.tags),
            categories: label_counts(&self.categories),
            archives: self
                .archive
                .months()
                .map(|(month, posts)| LabelCount {
                    label: month,
                    count: posts.len(),
                })
                .collect(),
        }
    }
}

fn label_counts<'i>(index: &'i LabelIndex) -> Vec<LabelCount<'i>> {
    index
        .entries()
        .iter()
        .map(|entry| LabelCount {
            label: &entry.label,
            count: entry.count(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct LabelCount<'a> {
    pub label: &'a str,
    pub count: usize,
}

/// Serialized as `listings.json`.
#[derive(Debug, Serialize)]
pub struct Listings<'c> {
    pub recent: &'c [&'c PostRecord],
    pub updated: &'c [&'c PostRecord],
    pub popular: &'c [&'c PostRecord],
    pub tags: Vec<LabelCount<'c>>,
    pub categories: Vec<LabelCount<'c>>,
    pub archives: Vec<LabelCount<'c>>,
}
