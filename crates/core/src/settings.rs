//! Unit-of-work scoped settings cache using Moka.
//!
//! A cache instance belongs to one repository instance, which belongs to one
//! unit of work or session. It is never shared process-wide, and every write
//! through the owning repository invalidates the written key.

use moka::sync::Cache;

/// Default cache capacity (number of keys).
const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Cache of settings values keyed by setting name.
///
/// `None` values record a known-missing key so repeated lookups of an unset
/// setting do not hit the store either.
#[derive(Clone)]
pub struct SettingsCache {
    cache: Cache<String, Option<String>>,
}

impl SettingsCache {
    /// Creates a cache with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `max_capacity` keys.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Returns the cached lookup result, `None` on a cache miss.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Option<String>> {
        self.cache.get(key)
    }

    /// Records a lookup result.
    pub fn insert(&self, key: &str, value: Option<String>) {
        self.cache.insert(key.to_string(), value);
    }

    /// Drops one key.
    pub fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Drops every key.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Returns true if the key is cached (hit or known-missing).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SettingsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}
