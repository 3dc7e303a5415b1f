//! Report result caching using Moka.
//!
//! Report queries aggregate over a user's whole document set, so results
//! are cached briefly per user and report name, and invalidated whenever
//! one of the user's documents changes.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use uuid::Uuid;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Default time-to-live for cache entries (60 seconds).
const DEFAULT_TTL_SECS: u64 = 60;

/// Report names used as cache key components.
const REPORT_NAMES: [&str; 4] = ["summary", "revenue", "top_customers", "status_breakdown"];

/// Cache for rendered report payloads.
///
/// Keys combine the user ID and report name; values are the serialized
/// JSON payloads returned to clients. Thread-safe.
#[derive(Clone)]
pub struct ReportCache {
    cache: Cache<String, Arc<serde_json::Value>>,
}

impl ReportCache {
    /// Creates a new report cache with default settings.
    ///
    /// Default: 1000 entries max, 60 second TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a new report cache with custom configuration.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    fn key(user_id: Uuid, report: &str, variant: &str) -> String {
        format!("{user_id}:{report}:{variant}")
    }

    /// Looks up a cached report payload.
    #[must_use]
    pub fn get(&self, user_id: Uuid, report: &str, variant: &str) -> Option<Arc<serde_json::Value>> {
        self.cache.get(&Self::key(user_id, report, variant))
    }

    /// Stores a report payload.
    pub fn insert(&self, user_id: Uuid, report: &str, variant: &str, value: serde_json::Value) {
        self.cache
            .insert(Self::key(user_id, report, variant), Arc::new(value));
    }

    /// Invalidates every report for one user.
    ///
    /// Variant-keyed entries (date ranges, limits) expire via TTL; the
    /// default variants are dropped immediately.
    pub fn invalidate_user(&self, user_id: Uuid) {
        for report in REPORT_NAMES {
            self.cache.invalidate(&Self::key(user_id, report, ""));
        }
        // Parameterized variants are left to the short TTL.
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_round_trip() {
        let cache = ReportCache::new();
        let user = Uuid::new_v4();

        assert!(cache.get(user, "summary", "").is_none());

        cache.insert(user, "summary", "", json!({"revenue_paid": "100"}));
        let hit = cache.get(user, "summary", "").unwrap();
        assert_eq!(hit["revenue_paid"], "100");
    }

    #[test]
    fn test_invalidate_user_drops_default_variants() {
        let cache = ReportCache::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        cache.insert(user, "summary", "", json!(1));
        cache.insert(other, "summary", "", json!(2));

        cache.invalidate_user(user);

        assert!(cache.get(user, "summary", "").is_none());
        assert!(cache.get(other, "summary", "").is_some());
    }

    #[test]
    fn test_users_do_not_share_entries() {
        let cache = ReportCache::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        cache.insert(a, "summary", "", json!("a"));
        assert!(cache.get(b, "summary", "").is_none());
    }
}
