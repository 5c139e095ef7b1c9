//! Per-query-type keyed cache with time-based expiration.
//!
//! Each [`CacheClass`] is an independent keyed map; entries are replace-only
//! and evicted lazily when read after expiry or via an explicit clear. There
//! is no size bound: key cardinality is bounded by the teachers, students
//! and courses of one session, not by external input.
//!
//! Concurrent identical misses are not deduplicated; two simultaneous
//! callers for the same uncached key will both hit the store. Known gap,
//! acceptable duplication.
//!
//! The cache is an explicit instance shared by `Arc`, constructed once per
//! application session and handed to whichever service needs it.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::Display;

/// Named, independently-keyed bucket within the query cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "camelCase")]
pub enum CacheClass {
    TeacherCourses,
    StudentsByTeacher,
    CourseStats,
    StudentAssignments,
    ModuleProgress,
}

struct CacheEntry {
    data: Value,
    stored_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.stored_at > self.ttl
    }
}

#[derive(Default)]
pub struct QueryCache {
    inner: RwLock<HashMap<CacheClass, HashMap<String, CacheEntry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The "medium" duration used when callers do not override the TTL.
    pub fn default_ttl() -> Duration {
        Duration::minutes(15)
    }

    /// TTL from the `CACHE_TTL_MINUTES` setting. Requires an initialized
    /// [`common::config::Config`]; application wiring only.
    pub fn configured_ttl() -> Duration {
        Duration::minutes(common::config::Config::get().cache_ttl_minutes as i64)
    }

    pub fn get<T: DeserializeOwned>(&self, class: CacheClass, key: &str) -> Option<T> {
        self.get_at(class, key, Utc::now())
    }

    /// Clock-explicit variant of [`Self::get`]; expired entries are evicted
    /// on the way out.
    pub fn get_at<T: DeserializeOwned>(
        &self,
        class: CacheClass,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let mut inner = self.inner.write().expect("cache lock poisoned");
        let bucket = inner.get_mut(&class)?;
        let entry = bucket.get(key)?;

        if entry.is_expired(now) {
            bucket.remove(key);
            return None;
        }

        match serde_json::from_value(entry.data.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                // Shape drift between writer and reader; treat as a miss.
                warn!("evicting undecodable cache entry {class}/{key}: {e}");
                bucket.remove(key);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, class: CacheClass, key: &str, value: &T, ttl: Duration) {
        self.set_at(class, key, value, ttl, Utc::now());
    }

    pub fn set_at<T: Serialize>(
        &self,
        class: CacheClass,
        key: &str,
        value: &T,
        ttl: Duration,
        now: DateTime<Utc>,
    ) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                warn!("not caching unserializable value for {class}/{key}: {e}");
                return;
            }
        };
        let mut inner = self.inner.write().expect("cache lock poisoned");
        inner.entry(class).or_default().insert(
            key.to_string(),
            CacheEntry {
                data,
                stored_at: now,
                ttl,
            },
        );
    }

    /// Drops every entry of one class.
    pub fn clear(&self, class: CacheClass) {
        let mut inner = self.inner.write().expect("cache lock poisoned");
        inner.remove(&class);
    }

    /// Drops everything. The only global invalidation there is.
    pub fn clear_all(&self) {
        let mut inner = self.inner.write().expect("cache lock poisoned");
        inner.clear();
    }

    /// Whether a key is currently stored (expired or not). Test inspection
    /// hook for eviction behavior.
    pub fn contains_key(&self, class: CacheClass, key: &str) -> bool {
        let inner = self.inner.read().expect("cache lock poisoned");
        inner
            .get(&class)
            .is_some_and(|bucket| bucket.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_within_ttl() {
        let cache = QueryCache::new();
        cache.set(
            CacheClass::TeacherCourses,
            "teacher-t1",
            &vec!["c1".to_string()],
            QueryCache::default_ttl(),
        );
        let hit: Option<Vec<String>> = cache.get(CacheClass::TeacherCourses, "teacher-t1");
        assert_eq!(hit, Some(vec!["c1".to_string()]));
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = QueryCache::new();
        let stored_at = Utc::now();
        cache.set_at(
            CacheClass::CourseStats,
            "c1",
            &42_u32,
            Duration::minutes(15),
            stored_at,
        );

        let later = stored_at + Duration::minutes(16);
        let miss: Option<u32> = cache.get_at(CacheClass::CourseStats, "c1", later);
        assert!(miss.is_none());
        assert!(!cache.contains_key(CacheClass::CourseStats, "c1"));
    }

    #[test]
    fn entry_still_live_at_exact_ttl_boundary() {
        let cache = QueryCache::new();
        let stored_at = Utc::now();
        cache.set_at(CacheClass::CourseStats, "c1", &1_u32, Duration::minutes(15), stored_at);
        let boundary = stored_at + Duration::minutes(15);
        let hit: Option<u32> = cache.get_at(CacheClass::CourseStats, "c1", boundary);
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn clear_is_scoped_to_one_class() {
        let cache = QueryCache::new();
        let ttl = QueryCache::default_ttl();
        cache.set(CacheClass::TeacherCourses, "k", &1_u32, ttl);
        cache.set(CacheClass::ModuleProgress, "k", &2_u32, ttl);

        cache.clear(CacheClass::TeacherCourses);
        assert!(!cache.contains_key(CacheClass::TeacherCourses, "k"));
        assert!(cache.contains_key(CacheClass::ModuleProgress, "k"));

        cache.clear_all();
        assert!(!cache.contains_key(CacheClass::ModuleProgress, "k"));
    }

    #[test]
    fn entries_are_replace_only() {
        let cache = QueryCache::new();
        let ttl = QueryCache::default_ttl();
        cache.set(CacheClass::CourseStats, "c1", &1_u32, ttl);
        cache.set(CacheClass::CourseStats, "c1", &2_u32, ttl);
        let hit: Option<u32> = cache.get(CacheClass::CourseStats, "c1");
        assert_eq!(hit, Some(2));
    }
}
