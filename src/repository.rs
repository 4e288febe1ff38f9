//! Loads the post and page collections produced by the upstream content
//! compiler. Loading is the only place where records are created; after
//! [`Repository::load`] returns, the collections are never mutated.

use crate::post::{self, PageRecord, PostRecord, RawRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The immutable in-memory post and page collections, in source order, with
/// an O(1) slug lookup for posts.
#[derive(Debug, Default)]
pub struct Repository {
    posts: Vec<PostRecord>,
    pages: Vec<PageRecord>,
    by_slug: HashMap<String, usize>,
}

impl Repository {
    /// Reads and validates `posts_file` and, if given, `pages_file`. Any
    /// malformed record aborts the load.
    pub fn load(
        posts_file: &Path,
        pages_file: Option<&Path>,
        posts_prefix: &str,
    ) -> Result<Repository> {
        let posts = read_records(posts_file)?
            .into_iter()
            .enumerate()
            .map(|(i, raw)| PostRecord::from_raw(raw, i, posts_prefix))
            .collect::<post::Result<Vec<_>>>()
            .map_err(|err| Error::Record {
                path: posts_file.to_owned(),
                err,
            })?;

        let pages = match pages_file {
            None => Vec::new(),
            Some(pages_file) => read_records(pages_file)?
                .into_iter()
                .enumerate()
                .map(|(i, raw)| PageRecord::from_raw(raw, i))
                .collect::<post::Result<Vec<_>>>()
                .map_err(|err| Error::Record {
                    path: pages_file.to_owned(),
                    err,
                })?,
        };

        let by_slug = index_slugs(posts.iter().map(|p| p.slug.as_str())).map_err(|err| {
            Error::Record {
                path: posts_file.to_owned(),
                err,
            }
        })?;
        if let Some(pages_file) = pages_file {
            index_slugs(pages.iter().map(|p| p.slug.as_str())).map_err(|err| Error::Record {
                path: pages_file.to_owned(),
                err,
            })?;
        }

        let repository = Repository {
            posts,
            pages,
            by_slug,
        };
        debug!(
            posts = repository.posts.len(),
            pages = repository.pages.len(),
            "loaded content collections"
        );
        Ok(repository)
    }

    /// Builds a repository from already-validated records, enforcing slug
    /// uniqueness within each collection.
    pub fn new(posts: Vec<PostRecord>, pages: Vec<PageRecord>) -> Result<Repository> {
        let by_slug = index_slugs(posts.iter().map(|p| p.slug.as_str()))
            .map_err(|err| Error::Collection { collection: "posts", err })?;
        index_slugs(pages.iter().map(|p| p.slug.as_str()))
            .map_err(|err| Error::Collection { collection: "pages", err })?;

        Ok(Repository {
            posts,
            pages,
            by_slug,
        })
    }

    /// All posts, in source order.
    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    /// All pages, in source order.
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn post(&self, slug: &str) -> Option<&PostRecord> {
        self.by_slug.get(slug).map(|&i| &self.posts[i])
    }
}

/// Maps each slug to the position of its record, failing on the first slug
/// seen twice.
fn index_slugs<'r>(slugs: impl Iterator<Item = &'r str>) -> post::Result<HashMap<String, usize>> {
    let mut by_slug = HashMap::new();
    for (index, slug) in slugs.enumerate() {
        if let Some(&first) = by_slug.get(slug) {
            return Err(post::Error::DuplicateSlug {
                index,
                first,
                slug: slug.to_owned(),
            });
        }
        by_slug.insert(slug.to_owned(), index);
    }
    Ok(by_slug)
}

/// Reads a JSON array and deserializes each element separately so a bad
/// element can be reported by position.
fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })?;
    let values: Vec<serde_json::Value> = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| Error::Json {
            path: path.to_owned(),
            err,
        })?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|source| Error::Record {
                path: path.to_owned(),
                err: post::Error::Shape { index, source },
            })
        })
        .collect()
}

/// Represents the result of loading a [`Repository`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to load the content collections. All variants are
/// fatal: the build must not continue with holes in its data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a source file can't be opened.
    #[error("opening `{}`: {err}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when a source file isn't a JSON array.
    #[error("parsing `{}`: {err}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        err: serde_json::Error,
    },

    /// Returned when one record in a source file is malformed.
    #[error("in `{}`: {err}", .path.display())]
    Record {
        path: PathBuf,
        #[source]
        err: post::Error,
    },

    /// Returned by [`Repository::new`] when a record of an in-memory
    /// collection is invalid (records read from a file are reported as
    /// [`Error::Record`]).
    #[error("in {collection}: {err}")]
    Collection {
        collection: &'static str,
        #[source]
        err: post::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::post;
    use std::io::Write;

    fn write_json(dir: &Path, name: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        File::create(&path)?.write_all(contents.as_bytes())?;
        Ok(path)
    }

    #[test]
    fn test_load_posts_and_pages() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let posts = write_json(
            dir.path(),
            "posts.json",
            r#"[
                {"slug": "b", "title": "B", "excerpt": "bee", "date": "2024-01-02", "tags": ["rust"]},
                {"slug": "a", "title": "A", "description": "ay", "date": "2024-01-01", "updated": null}
            ]"#,
        )?;
        let pages = write_json(
            dir.path(),
            "pages.json",
            r#"[{"slug": "about", "title": "About", "date": "2020-01-01"}]"#,
        )?;

        let repo = Repository::load(&posts, Some(&pages), "entry")?;
        let slugs: Vec<&str> = repo.posts().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["b", "a"], slugs);
        assert_eq!("ay", repo.post("a").map(|p| p.excerpt.as_str()).unwrap_or_default());
        assert_eq!("/entry/b", repo.post("b").map(|p| p.path.as_str()).unwrap_or_default());
        assert_eq!(1, repo.pages().len());
        assert!(repo.post("missing").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_slug_is_fatal() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let posts = write_json(
            dir.path(),
            "posts.json",
            r#"[{"slug": "ok", "title": "t", "date": "2024-01-01"}, {"title": "t", "date": "2024-01-01"}]"#,
        )?;
        match Repository::load(&posts, None, "posts") {
            Err(Error::Record {
                err: post::Error::MissingField { index: 1, field: "slug" },
                ..
            }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_wrong_field_type_is_fatal() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let posts = write_json(
            dir.path(),
            "posts.json",
            r#"[{"slug": 7, "title": "t", "date": "2024-01-01"}]"#,
        )?;
        assert!(matches!(
            Repository::load(&posts, None, "posts"),
            Err(Error::Record {
                err: post::Error::Shape { index: 0, .. },
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_duplicate_slug_is_fatal() {
        let result = Repository::new(
            vec![post("x", "2024-01-01", &[]), post("x", "2024-01-02", &[])],
            Vec::new(),
        );
        assert!(matches!(
            result,
            Err(Error::Collection {
                collection: "posts",
                err: post::Error::DuplicateSlug { index: 1, first: 0, ref slug },
            }) if slug == "x"
        ));
    }

    #[test]
    fn test_duplicate_slug_names_file_and_records() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let posts = write_json(
            dir.path(),
            "posts.json",
            r#"[{"slug": "a", "title": "t", "date": "2024-01-01"}]"#,
        )?;
        let pages = write_json(
            dir.path(),
            "pages.json",
            r#"[
                {"slug": "about", "title": "t", "date": "2024-01-01"},
                {"slug": "a", "title": "t", "date": "2024-01-01"},
                {"slug": "about", "title": "t", "date": "2024-01-01"}
            ]"#,
        )?;
        match Repository::load(&posts, Some(&pages), "posts") {
            Err(Error::Record {
                path,
                err: post::Error::DuplicateSlug { index: 2, first: 0, slug },
            }) => {
                assert_eq!(pages, path);
                assert_eq!("about", slug);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = Repository::load(Path::new("./does/not/exist.json"), None, "posts");
        assert!(matches!(result, Err(Error::Open { .. })));
    }
}
