//! Ranks posts into the recent, updated and popular listings. All sorts are
//! stable, so posts that compare equal keep their input order, and none of
//! the functions assume their input is already sorted.

use crate::popularity::PopularityIndex;
use crate::post::PostRecord;
use serde::Serialize;

/// The two date-driven listings.
#[derive(Debug, Default, Serialize)]
pub struct Listing<'a> {
    /// Every input post, newest publication first.
    pub recent: Vec<&'a PostRecord>,

    /// Posts revised on a later calendar day than they were published,
    /// most recently revised first.
    pub updated: Vec<&'a PostRecord>,
}

/// Orders `posts` into the recent and updated listings.
pub fn recent_and_updated<'a, I>(posts: I) -> Listing<'a>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    let posts: Vec<&'a PostRecord> = posts.into_iter().collect();
    Listing {
        updated: updated(&posts),
        recent: recent(posts),
    }
}

/// Orders `posts` by publication date, newest first.
pub fn recent<'a, I>(posts: I) -> Vec<&'a PostRecord>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    let mut posts: Vec<&'a PostRecord> = posts.into_iter().collect();
    posts.sort_by(|a, b| b.date.cmp(&a.date));
    posts
}

fn updated<'a>(posts: &[&'a PostRecord]) -> Vec<&'a PostRecord> {
    let mut revised: Vec<(&'a PostRecord, &crate::post::Timestamp)> = posts
        .iter()
        .filter_map(|&post| match &post.updated {
            Some(updated) if !updated.same_day(&post.date) => Some((post, updated)),
            _ => None,
        })
        .collect();
    revised.sort_by(|(_, a), (_, b)| b.cmp(a));
    revised.into_iter().map(|(post, _)| post).collect()
}

/// Joins `posts` to `popularity` by slug, drops unscored posts, orders by
/// score (highest first, earlier input winning ties) and keeps at most
/// `limit`.
pub fn popular<'a, I>(posts: I, popularity: &PopularityIndex, limit: usize) -> Vec<&'a PostRecord>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    let mut scored: Vec<(&'a PostRecord, u64)> = posts
        .into_iter()
        .filter_map(|post| popularity.score(&post.slug).map(|score| (post, score)))
        .collect();
    scored.sort_by(|(_, a), (_, b)| b.cmp(a));
    scored.into_iter().take(limit).map(|(post, _)| post).collect()
}
