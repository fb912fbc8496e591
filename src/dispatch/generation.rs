//! # Generation Cache
//!
//! Last successfully processed generation per resource UID. Entries for
//! different resources are updated independently; there is no global lock.

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct GenerationCache {
    entries: DashMap<String, i64>,
}

impl GenerationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_processed(&self, uid: &str) -> Option<i64> {
        self.entries.get(uid).map(|entry| *entry.value())
    }

    /// Whether `generation` is strictly newer than the last processed one
    ///
    /// Resources never processed are always newer.
    pub fn is_newer(&self, uid: &str, generation: i64) -> bool {
        self.last_processed(uid)
            .is_none_or(|processed| generation > processed)
    }

    pub fn mark_processed(&self, uid: &str, generation: i64) {
        self.entries.insert(uid.to_owned(), generation);
    }

    /// Removes the entry, returning the generation it held
    pub fn purge(&self, uid: &str) -> Option<i64> {
        self.entries.remove(uid).map(|(_, generation)| generation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_generation() {
        let cache = GenerationCache::new();
        assert!(cache.is_newer("uid-1", 1));

        cache.mark_processed("uid-1", 5);
        assert!(!cache.is_newer("uid-1", 4));
        assert!(!cache.is_newer("uid-1", 5));
        assert!(cache.is_newer("uid-1", 6));
        assert!(cache.is_newer("uid-2", 1));
    }

    #[test]
    fn test_purge() {
        let cache = GenerationCache::new();
        cache.mark_processed("uid-1", 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge("uid-1"), Some(3));
        assert_eq!(cache.purge("uid-1"), None);
        assert!(cache.is_empty());
    }
}
