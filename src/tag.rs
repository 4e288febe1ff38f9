//! Defines [`LabelIndex`], which groups posts by tag or category label, and
//! [`ArchiveIndex`], which groups them by publication month. Both are built
//! once from the full collection and are read-only afterwards.

use crate::post::PostRecord;
use std::collections::{BTreeMap, HashMap};

/// One label together with every post that carries it, in collection order.
#[derive(Debug)]
pub struct LabelEntry<'a> {
    pub label: String,
    pub posts: Vec<&'a PostRecord>,
}

impl LabelEntry<'_> {
    /// The number of posts carrying the label. An entry never exists with a
    /// count of zero.
    pub fn count(&self) -> usize {
        self.posts.len()
    }
}

/// Maps a label to the posts carrying it. Entries are kept in the order in
/// which their labels first appear in the collection so that anything
/// enumerated from the index is deterministic.
#[derive(Debug, Default)]
pub struct LabelIndex<'a> {
    entries: Vec<LabelEntry<'a>>,
    lookup: HashMap<String, usize>,
}

impl<'a> LabelIndex<'a> {
    /// Indexes `posts` by their tags.
    pub fn tags(posts: &'a [PostRecord]) -> LabelIndex<'a> {
        Self::build(posts, |p| &p.tags)
    }

    /// Indexes `posts` by their categories.
    pub fn categories(posts: &'a [PostRecord]) -> LabelIndex<'a> {
        Self::build(posts, |p| &p.categories)
    }

    fn build(posts: &'a [PostRecord], labels: impl Fn(&PostRecord) -> &Vec<String>) -> LabelIndex<'a> {
        let mut index = LabelIndex::default();
        for post in posts {
            for label in labels(post) {
                match index.lookup.get(label) {
                    Some(&i) => index.entries[i].posts.push(post),
                    None => {
                        index.lookup.insert(label.clone(), index.entries.len());
                        index.entries.push(LabelEntry {
                            label: label.clone(),
                            posts: vec![post],
                        });
                    }
                }
            }
        }
        index
    }

    pub fn get(&self, label: &str) -> Option<&LabelEntry<'a>> {
        self.lookup.get(label).map(|&i| &self.entries[i])
    }

    /// The number of posts carrying `label`, zero if no post does.
    pub fn count(&self, label: &str) -> usize {
        self.get(label).map_or(0, LabelEntry::count)
    }

    /// All entries in first-appearance order.
    pub fn entries(&self) -> &[LabelEntry<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps a `YYYY-MM` month key to the posts published that month.
#[derive(Debug, Default)]
pub struct ArchiveIndex<'a> {
    months: BTreeMap<String, Vec<&'a PostRecord>>,
}

impl<'a> ArchiveIndex<'a> {
    pub fn new(posts: &'a [PostRecord]) -> ArchiveIndex<'a> {
        let mut months: BTreeMap<String, Vec<&'a PostRecord>> = BTreeMap::new();
        for post in posts {
            months
                .entry(post.date.month_key().to_owned())
                .or_default()
                .push(post);
        }
        ArchiveIndex { months }
    }

    pub fn get(&self, month: &str) -> Option<&[&'a PostRecord]> {
        self.months.get(month).map(Vec::as_slice)
    }

    /// Months, newest first, with their posts in collection order.
    pub fn months(&self) -> impl Iterator<Item = (&str, &[&'a PostRecord])> + '_ {
        self.months
            .iter()
            .rev()
            .map(|(month, posts)| (month.as_str(), posts.as_slice()))
    }
}
