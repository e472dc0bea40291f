use crate::patch::{AddedLines, PatchError, PatchParser, UnifiedDiffParser};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Cache key: file path and the commit whose patch touched it
type CacheKey = (String, String);

/// Memoizes parsed patches per (file name, commit id)
///
/// A commit's patch for a given file never changes during a run, so the first
/// result stored for a key is served for every later lookup regardless of the
/// patch text passed in. Parse failures are returned and not stored.
pub struct LineAttributionCache<P: PatchParser = UnifiedDiffParser> {
    parser: P,
    entries: Mutex<HashMap<CacheKey, Arc<AddedLines>>>,
}

impl LineAttributionCache<UnifiedDiffParser> {
    pub fn new() -> Self {
        Self::with_parser(UnifiedDiffParser)
    }
}

impl Default for LineAttributionCache<UnifiedDiffParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PatchParser> LineAttributionCache<P> {
    pub fn with_parser(parser: P) -> Self {
        Self {
            parser,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_compute(
        &self,
        name: &str,
        commit_id: &str,
        patch: &str,
    ) -> Result<Arc<AddedLines>, PatchError> {
        // Held across the parse so each key is computed at most once
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let key = (name.to_string(), commit_id.to_string());
        if let Some(lines) = entries.get(&key) {
            trace!("Cache hit for {}@{}", name, commit_id);
            return Ok(Arc::clone(lines));
        }

        trace!("Cache miss for {}@{}, parsing patch", name, commit_id);
        let lines = Arc::new(self.parser.parse(patch)?);
        entries.insert(key, Arc::clone(&lines));
        Ok(lines)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::parse_patch;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingParser {
        calls: AtomicUsize,
    }

    impl PatchParser for &CountingParser {
        fn parse(&self, patch: &str) -> Result<AddedLines, PatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            parse_patch(patch)
        }
    }

    const PATCH: &str = "@@ -1,3 +1,4 @@\n context\n+added one\n context\n+added two\n";

    #[test]
    fn test_get_or_compute_parses_once_per_key() {
        let counter = CountingParser::default();
        let cache = LineAttributionCache::with_parser(&counter);

        let first = cache.get_or_compute("README.md", "a1", PATCH).unwrap();
        let second = cache.get_or_compute("README.md", "a1", PATCH).unwrap();

        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(first.iter().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_get_or_compute_keys_by_commit() {
        let counter = CountingParser::default();
        let cache = LineAttributionCache::with_parser(&counter);

        let a = cache.get_or_compute("doc.md", "a1", "@@ -1,1 +1,2 @@\n x\n+y").unwrap();
        let b = cache.get_or_compute("doc.md", "b2", "@@ -1,1 +1,2 @@\n+w\n x").unwrap();

        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
        assert!(a.contains(2) && !a.contains(1));
        assert!(b.contains(1) && !b.contains(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_or_compute_first_result_wins() {
        let cache = LineAttributionCache::new();
        cache.get_or_compute("a.md", "c1", "@@ -1,1 +1,2 @@\n x\n+y").unwrap();
        let again = cache.get_or_compute("a.md", "c1", "@@ -1,1 +9,2 @@\n+z").unwrap();
        assert_eq!(again.iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_get_or_compute_does_not_cache_errors() {
        let counter = CountingParser::default();
        let cache = LineAttributionCache::with_parser(&counter);

        assert!(cache.get_or_compute("a.md", "c1", "@@ bogus @@").is_err());
        assert!(cache.get_or_compute("a.md", "c1", "@@ bogus @@").is_err());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 0);
    }
}
