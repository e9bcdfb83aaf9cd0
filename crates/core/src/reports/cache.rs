//! P&L result caching using Moka.
//!
//! Entries are keyed by the tenant's ledger and chart versions, so any posting
//! or chart edit makes older results unreachable and they age out through the
//! TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use ledgerline_shared::types::TenantId;
use moka::sync::Cache;

use super::types::PlSummary;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Cache key for a P&L summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlCacheKey {
    /// Tenant.
    pub tenant_id: TenantId,
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
    /// Ledger version the summary was computed against.
    pub ledger_version: u64,
    /// Chart version the summary was computed against.
    pub chart_version: u64,
}

/// Cache for P&L summaries. Thread-safe and cheap to clone.
#[derive(Clone)]
pub struct PlSummaryCache {
    cache: Cache<PlCacheKey, Arc<PlSummary>>,
}

impl PlSummaryCache {
    /// Creates a cache with default settings: 1000 entries max, 5 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns a cached summary for `key`.
    #[must_use]
    pub fn get(&self, key: &PlCacheKey) -> Option<Arc<PlSummary>> {
        self.cache.get(key)
    }

    /// Stores a summary.
    pub fn insert(&self, key: PlCacheKey, summary: Arc<PlSummary>) {
        self.cache.insert(key, summary);
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the number of cached entries.
    ///
    /// May lag behind recent inserts until pending maintenance runs.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for PlSummaryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ChartOfAccounts;
    use crate::reports::ReportService;
    use crate::tenant::Tenant;

    fn summary(tenant: &Tenant) -> PlSummary {
        let chart = ChartOfAccounts::standard(tenant.id);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ReportService::pl_summary(tenant, &chart, &[], day, day).unwrap()
    }

    #[test]
    fn test_hit_requires_same_versions() {
        let cache = PlSummaryCache::new();
        let tenant = Tenant::new(TenantId::new(), "Acme");
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let key = PlCacheKey {
            tenant_id: tenant.id,
            start: day,
            end: day,
            ledger_version: 3,
            chart_version: 1,
        };
        cache.insert(key, Arc::new(summary(&tenant)));

        assert!(cache.get(&key).is_some());
        assert!(
            cache
                .get(&PlCacheKey {
                    ledger_version: 4,
                    ..key
                })
                .is_none()
        );
        assert!(
            cache
                .get(&PlCacheKey {
                    chart_version: 2,
                    ..key
                })
                .is_none()
        );
    }

    #[test]
    fn test_clear() {
        let cache = PlSummaryCache::with_config(10, 60);
        let tenant = Tenant::new(TenantId::new(), "Acme");
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let key = PlCacheKey {
            tenant_id: tenant.id,
            start: day,
            end: day,
            ledger_version: 0,
            chart_version: 0,
        };
        cache.insert(key, Arc::new(summary(&tenant)));
        cache.clear();
        assert!(cache.get(&key).is_none());
    }
}
