//! Loads the externally-fetched popularity scores (bookmark counts keyed by
//! slug). The scores are an optional annotation: if they can't be read the
//! build carries on with an empty index and the popular list is simply empty.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Slug to score.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PopularityIndex {
    scores: HashMap<String, u64>,
}

impl PopularityIndex {
    pub fn score(&self, slug: &str) -> Option<u64> {
        self.scores.get(slug).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Reads `path`, degrading to an empty index on any failure. A missing
    /// path is not an error either; the popularity fetch is optional.
    pub fn load_or_empty(path: Option<&Path>) -> PopularityIndex {
        let path = match path {
            Some(path) => path,
            None => return PopularityIndex::default(),
        };
        match Self::load(path) {
            Ok(index) => {
                info!(path = %path.display(), entries = index.len(), "loaded popularity scores");
                index
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "popularity scores unavailable; popular list will be empty"
                );
                PopularityIndex::default()
            }
        }
    }

    /// Reads `path` strictly.
    pub fn load(path: &Path) -> Result<PopularityIndex, Error> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Accepts either `{"slug": score, ...}` or
    /// `[{"slug": "...", "count": n}, ...]`. When a slug repeats in the array
    /// form, the last entry wins.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<PopularityIndex, Error> {
        let scores = match serde_json::from_reader(reader)? {
            Document::Map(scores) => scores,
            Document::List(entries) => entries.into_iter().map(|e| (e.slug, e.count)).collect(),
        };
        Ok(PopularityIndex { scores })
    }
}

impl FromIterator<(String, u64)> for PopularityIndex {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        PopularityIndex {
            scores: iter.into_iter().collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Map(HashMap<String, u64>),
    List(Vec<Entry>),
}

#[derive(Deserialize)]
struct Entry {
    slug: String,
    #[serde(alias = "score")]
    count: u64,
}

/// Represents a failure to read the popularity document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed popularity document: {0}")]
    Json(#[from] serde_json::Error),
}
