//! In-memory caches for the user list and the topic catalog.
//!
//! An entry is served while it is younger than the configured TTL. Every
//! mutation of users or topics invalidates the matching entry, so staleness
//! is bounded by the TTL plus changes made from other sessions.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::catalog::Catalog;
use crate::model::User;

/// A cached value with the time it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

impl<T> Cached<T> {
    /// Wraps a value fetched at `now`.
    pub const fn new(value: T, now: DateTime<Utc>) -> Self {
        Self {
            value,
            fetched_at: now,
        }
    }

    /// The cached value.
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// When the value was fetched.
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Whether the entry is still within `ttl` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

/// Which cache entry an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    /// The student list.
    Users,
    /// The volume/topic tree.
    Catalog,
}

/// Explicit store replacing ambient module-level caches.
#[derive(Debug, Clone)]
pub struct CacheStore {
    ttl: Duration,
    users: Option<Cached<Vec<User>>>,
    catalog: Option<Cached<Catalog>>,
}

impl CacheStore {
    /// Creates an empty store with the given TTL in seconds.
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            ttl,
            users: None,
            catalog: None,
        }
    }

    /// Configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh user list, if any.
    #[must_use]
    pub fn users(&self, now: DateTime<Utc>) -> Option<&[User]> {
        self.users
            .as_ref()
            .filter(|c| c.is_fresh(now, self.ttl))
            .map(|c| c.value().as_slice())
    }

    /// Stores a fetched user list.
    pub fn put_users(&mut self, users: Vec<User>, now: DateTime<Utc>) {
        self.users = Some(Cached::new(users, now));
    }

    /// Fresh catalog, if any.
    #[must_use]
    pub fn catalog(&self, now: DateTime<Utc>) -> Option<&Catalog> {
        self.catalog
            .as_ref()
            .filter(|c| c.is_fresh(now, self.ttl))
            .map(Cached::value)
    }

    /// Stores a fetched catalog.
    pub fn put_catalog(&mut self, catalog: Catalog, now: DateTime<Utc>) {
        self.catalog = Some(Cached::new(catalog, now));
    }

    /// Drops an entry after a mutation.
    pub fn invalidate(&mut self, key: CacheKey) {
        debug!(?key, "Cache entry invalidated");
        match key {
            CacheKey::Users => self.users = None,
            CacheKey::Catalog => self.catalog = None,
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.users = None;
        self.catalog = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn users() -> Vec<User> {
        vec![User {
            id: 1,
            telegram_id: 5,
            name: "Анна".to_string(),
        }]
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let mut store = CacheStore::new(300);
        store.put_users(users(), t0());
        assert!(store.users(t0() + Duration::seconds(299)).is_some());
        assert!(store.users(t0() + Duration::seconds(300)).is_none());
    }

    #[test]
    fn test_invalidate_drops_only_matching_entry() {
        let mut store = CacheStore::new(300);
        store.put_users(users(), t0());
        store.put_catalog(Catalog::new(), t0());
        store.invalidate(CacheKey::Users);
        assert!(store.users(t0()).is_none());
        assert!(store.catalog(t0()).is_some());
        store.clear();
        assert!(store.catalog(t0()).is_none());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let store = CacheStore::new(u64::MAX);
        assert_eq!(store.ttl(), Duration::MAX);
    }
}
