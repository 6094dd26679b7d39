use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::SectorAggregate;

/// Default sector aggregate TTL (1 hour)
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// Cache key for a sector name: trimmed and lowercased.
pub fn sector_key(sector: &str) -> String {
    sector.trim().to_lowercase()
}

/// Sector aggregates keyed by sector name, expiring after a fixed TTL.
pub struct SectorCache {
    entries: DashMap<String, CacheEntry<SectorAggregate>>,
    ttl_secs: i64,
}

impl SectorCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Fresh aggregate for `sector`, or `None` if missing or expired.
    pub fn get(&self, sector: &str) -> Option<SectorAggregate> {
        let key = sector_key(sector);
        if let Some(entry) = self.entries.get(&key) {
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < self.ttl_secs {
                return Some(entry.data.clone());
            }
        }
        // Expired entries are dropped on read
        if self.entries.remove_if(&key, |_, e| !self.is_fresh(e)).is_some() {
            tracing::debug!(sector = %key, "sector aggregate expired");
        }
        None
    }

    pub fn insert(&self, aggregate: SectorAggregate) {
        let key = sector_key(&aggregate.sector);
        tracing::debug!(sector = %key, companies = aggregate.company_count, "caching sector aggregate");
        self.entries.insert(
            key,
            CacheEntry {
                data: aggregate,
                cached_at: Utc::now(),
            },
        );
    }

    pub fn invalidate(&self, sector: &str) -> bool {
        self.entries.remove(&sector_key(sector)).is_some()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| self.is_fresh(e));
        before - self.entries.len()
    }

    /// Entries currently held, including ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &CacheEntry<SectorAggregate>) -> bool {
        (Utc::now() - entry.cached_at).num_seconds() < self.ttl_secs
    }
}

impl Default for SectorCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}
