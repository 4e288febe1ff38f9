//! Derives sub-views from the post collection. Every function here is pure:
//! the same input always yields the same view, and input order is preserved.

use crate::post::PostRecord;
use crate::tag::{ArchiveIndex, LabelIndex};
use std::collections::HashSet;

/// Returns the posts whose tags don't intersect `ignore_tags`, in their
/// original relative order. A post without tags is never excluded. Labels are
/// compared exactly (case-sensitive).
pub fn filter_excluding_tags<'a, I>(posts: I, ignore_tags: &HashSet<String>) -> Vec<&'a PostRecord>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    posts
        .into_iter()
        .filter(|post| !post.tags.iter().any(|tag| ignore_tags.contains(tag)))
        .collect()
}

/// Posts carrying `label`. An unknown label yields an empty slice.
pub fn by_tag<'i, 'a>(index: &'i LabelIndex<'a>, label: &str) -> &'i [&'a PostRecord] {
    by_label(index, label)
}

/// Posts filed under `label`. An unknown label yields an empty slice.
pub fn by_category<'i, 'a>(index: &'i LabelIndex<'a>, label: &str) -> &'i [&'a PostRecord] {
    by_label(index, label)
}

/// Posts published in `month` (`YYYY-MM`). An unknown month yields an empty
/// slice.
pub fn by_month<'i, 'a>(archive: &'i ArchiveIndex<'a>, month: &str) -> &'i [&'a PostRecord] {
    archive.get(month).unwrap_or(&[])
}

fn by_label<'i, 'a>(index: &'i LabelIndex<'a>, label: &str) -> &'i [&'a PostRecord] {
    index.get(label).map_or(&[], |entry| entry.posts.as_slice())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::post;

    fn ignore(labels: &[&str]) -> HashSet<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    fn slugs(posts: &[&PostRecord]) -> Vec<String> {
        posts.iter().map(|p| p.slug.clone()).collect()
    }

    #[test]
    fn test_filter_excluding_tags_preserves_order() {
        let posts = vec![
            post("a", "2024-01-01", &["rust"]),
            post("b", "2024-01-02", &["diary", "rust"]),
            post("c", "2024-01-03", &[]),
            post("d", "2024-01-04", &["Diary"]),
        ];
        let kept = filter_excluding_tags(&posts, &ignore(&["diary"]));
        assert_eq!(vec!["a", "c", "d"], slugs(&kept));
        for p in &kept {
            assert!(!p.has_tag("diary"));
        }
    }

    #[test]
    fn test_empty_ignore_set_keeps_everything() {
        let posts = vec![post("a", "2024-01-01", &["x"]), post("b", "2024-01-02", &[])];
        assert_eq!(2, filter_excluding_tags(&posts, &HashSet::new()).len());
    }

    #[test]
    fn test_ignored_tag_still_has_its_own_view() {
        let posts = vec![
            post("a", "2024-01-01", &["diary"]),
            post("b", "2024-01-02", &["rust"]),
        ];
        let index = LabelIndex::tags(&posts);
        assert_eq!(vec!["a"], slugs(by_tag(&index, "diary")));
        assert!(by_tag(&index, "nope").is_empty());
        assert!(by_category(&LabelIndex::categories(&posts), "tech").is_empty());
    }

    #[test]
    fn test_by_month() {
        let posts = vec![
            post("a", "2024-01-01", &[]),
            post("b", "2024-02-02", &[]),
            post("c", "2024-01-20", &[]),
        ];
        let archive = ArchiveIndex::new(&posts);
        assert_eq!(vec!["a", "c"], slugs(by_month(&archive, "2024-01")));
        assert!(by_month(&archive, "1999-01").is_empty());
    }
}
