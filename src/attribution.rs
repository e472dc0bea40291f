use crate::cache::LineAttributionCache;
use crate::changeset::FileChange;
use crate::patch::{PatchError, PatchParser, UnifiedDiffParser};
use std::collections::HashMap;
use tracing::debug;

/// Answers whether a line of a file was added by the commits under review
pub struct LineAttribution<P: PatchParser = UnifiedDiffParser> {
    cache: LineAttributionCache<P>,
}

impl LineAttribution<UnifiedDiffParser> {
    pub fn new() -> Self {
        Self::with_cache(LineAttributionCache::new())
    }
}

impl Default for LineAttribution<UnifiedDiffParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PatchParser> LineAttribution<P> {
    pub fn with_cache(cache: LineAttributionCache<P>) -> Self {
        Self { cache }
    }

    /// Number of distinct (file, commit) patches parsed so far
    pub fn parsed_patches(&self) -> usize {
        self.cache.len()
    }

    /// Whether `line` (1-indexed) was added by the commit that produced `file`
    ///
    /// A file without patch text has no attributable lines.
    pub fn was_line_added_in_review(&self, file: &FileChange, line: u32) -> Result<bool, PatchError> {
        let patch = file.patch.as_deref().unwrap_or_default();
        let added = self.cache.get_or_compute(&file.name, &file.commit_id, patch)?;
        Ok(added.contains(line))
    }
}

/// Every file change of a review, indexed by path
///
/// A line counts as added when any reviewed commit touching the path added it.
pub struct ReviewChanges<P: PatchParser = UnifiedDiffParser> {
    by_path: HashMap<String, Vec<FileChange>>,
    attribution: LineAttribution<P>,
}

impl ReviewChanges<UnifiedDiffParser> {
    pub fn new(files: Vec<FileChange>) -> Self {
        Self::with_attribution(files, LineAttribution::new())
    }
}

impl<P: PatchParser> ReviewChanges<P> {
    pub fn with_attribution(files: Vec<FileChange>, attribution: LineAttribution<P>) -> Self {
        let mut by_path: HashMap<String, Vec<FileChange>> = HashMap::new();
        for file in files {
            by_path.entry(file.name.clone()).or_default().push(file);
        }
        debug!("Indexed changes for {} paths", by_path.len());
        Self {
            by_path,
            attribution,
        }
    }

    pub fn is_line_added(&self, path: &str, line: u32) -> Result<bool, PatchError> {
        let Some(changes) = self.by_path.get(path) else {
            return Ok(false);
        };
        for change in changes {
            if self.attribution.was_line_added_in_review(change, line)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether any reviewed commit touched `path`
    pub fn touches(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn attribution(&self) -> &LineAttribution<P> {
        &self.attribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(name: &str, commit_id: &str, patch: Option<&str>) -> FileChange {
        FileChange {
            name: name.into(),
            patch: patch.map(str::to_string),
            commit_id: commit_id.into(),
        }
    }

    #[test]
    fn test_was_line_added_in_review() {
        let attribution = LineAttribution::new();
        let file = change(
            "README.md",
            "a1",
            Some("@@ -1,3 +1,4 @@\n context\n+added one\n context\n+added two\n"),
        );

        let added: Vec<u32> = (1..=5)
            .filter(|&line| attribution.was_line_added_in_review(&file, line).unwrap())
            .collect();
        assert_eq!(added, vec![2, 4]);
    }

    #[test]
    fn test_was_line_added_in_review_without_patch() {
        let attribution = LineAttribution::new();
        for patch in [None, Some("")] {
            let file = change("logo.png", "a1", patch);
            for line in 0..50 {
                assert!(!attribution.was_line_added_in_review(&file, line).unwrap());
            }
        }
    }

    #[test]
    fn test_was_line_added_in_review_keeps_commits_apart() {
        let attribution = LineAttribution::new();
        let first = change("doc.md", "a1", Some("@@ -1,2 +1,3 @@\n a\n+b\n c"));
        let second = change("doc.md", "b2", Some("@@ -5,1 +5,2 @@\n x\n+y"));

        assert!(attribution.was_line_added_in_review(&first, 2).unwrap());
        assert!(!attribution.was_line_added_in_review(&first, 6).unwrap());
        assert!(attribution.was_line_added_in_review(&second, 6).unwrap());
        assert!(!attribution.was_line_added_in_review(&second, 2).unwrap());
    }

    #[test]
    fn test_was_line_added_in_review_malformed_patch() {
        let attribution = LineAttribution::new();
        let file = change("doc.md", "a1", Some("@@ -1,2 +two @@\n+b"));
        assert!(attribution.was_line_added_in_review(&file, 1).is_err());
    }

    #[test]
    fn test_review_changes_union_across_commits() {
        let changes = ReviewChanges::new(vec![
            change("doc.md", "a1", Some("@@ -1,2 +1,3 @@\n a\n+b\n c")),
            change("doc.md", "b2", Some("@@ -5,1 +5,2 @@\n x\n+y")),
            change("other.md", "b2", Some("@@ -1,1 +1,2 @@\n+q\n r")),
        ]);

        assert!(changes.is_line_added("doc.md", 2).unwrap());
        assert!(changes.is_line_added("doc.md", 6).unwrap());
        assert!(!changes.is_line_added("doc.md", 1).unwrap());
        assert!(changes.is_line_added("other.md", 1).unwrap());
        assert!(!changes.is_line_added("missing.md", 1).unwrap());
        assert!(changes.touches("other.md"));
        assert!(!changes.touches("missing.md"));
    }
}
