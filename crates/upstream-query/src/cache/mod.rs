mod build;
mod stats;
mod syntax;

use std::{
    borrow::Cow,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use indexmap::IndexMap;

use crate::{Result, config::ensure_positive};

pub use build::{BuildCache, CachedQuery};
pub use stats::CacheStats;
pub use syntax::{SyntaxCache, normalize_query};

use stats::Counters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// When false the cache starts disabled.
    pub enabled: bool,
    /// Maximum number of entries. 1000 by default.
    pub max_size: usize,
    /// Entries older than this are treated as missing. 5 minutes by default.
    #[serde(deserialize_with = "duration_str::deserialize_duration")]
    pub ttl: Duration,
    /// Whether hits and misses are counted.
    pub track_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 1000,
            ttl: Duration::from_secs(300),
            track_stats: true,
        }
    }
}

impl CacheConfig {
    pub(crate) fn validate(&self, key: &str) -> Result<()> {
        if self.enabled {
            ensure_positive(&format!("{key}.max_size"), self.max_size as u64)?;
        }
        Ok(())
    }
}

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    last_accessed_at: Instant,
    access_count: u64,
}

enum CacheState<V> {
    Disabled,
    Enabled {
        config: CacheConfig,
        entries: IndexMap<String, CacheEntry<V>>,
    },
}

struct Inner<V> {
    state: CacheState<V>,
    counters: Counters,
}

/// Bounded, TTL-aware store shared by the syntax and the build caches.
///
/// When full, the entry with the lowest access count is evicted, the least recently accessed one
/// among equals. Keys go through the normalization function before every lookup or insertion.
/// All operations hold a single lock for their whole read-check-write sequence.
pub struct Cache<V> {
    inner: Mutex<Inner<V>>,
    normalize: fn(&str) -> Cow<'_, str>,
    // for testing
    now: Box<dyn Fn() -> Instant + Send + Sync>,
}

impl<V: Clone> Cache<V> {
    /// Fails with [`Error::Configuration`](crate::Error::Configuration) when an enabled
    /// configuration has no room for a single entry.
    pub fn new(config: CacheConfig, normalize: fn(&str) -> Cow<'_, str>) -> Result<Self> {
        config.validate("cache")?;
        Ok(Self::unchecked(config, normalize))
    }

    /// A cache using [`CacheConfig::default`].
    pub(crate) fn with_default_config(normalize: fn(&str) -> Cow<'_, str>) -> Self {
        Self::unchecked(CacheConfig::default(), normalize)
    }

    fn unchecked(config: CacheConfig, normalize: fn(&str) -> Cow<'_, str>) -> Self {
        Cache {
            inner: Mutex::new(Inner {
                state: CacheState::from_config(config),
                counters: Counters::default(),
            }),
            normalize,
            now: Box::new(Instant::now),
        }
    }

    /// Replaces the time source used for TTL checks and access tracking.
    pub fn with_clock(mut self, now: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        self.now = Box::new(now);
        self
    }

    /// Replaces the store and resets the statistics. An invalid configuration leaves the cache
    /// untouched.
    pub fn configure(&self, config: CacheConfig) -> Result<()> {
        config.validate("cache")?;

        let mut inner = self.lock();
        inner.state = CacheState::from_config(config);
        inner.counters = Counters::default();

        tracing::debug!(
            enabled = config.enabled,
            max_size = config.max_size,
            ttl_ms = config.ttl.as_millis() as u64,
            "cache configured"
        );

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let key = (self.normalize)(key);
        let now = (self.now)();
        let mut guard = self.lock();
        let Inner { state, counters } = &mut *guard;

        let CacheState::Enabled { config, entries } = state else {
            return None;
        };

        let mut expired = false;
        let outcome = match entries.get_mut(key.as_ref()) {
            Some(entry) if now.saturating_duration_since(entry.created_at) < config.ttl => {
                entry.last_accessed_at = now;
                entry.access_count += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                expired = true;
                None
            }
            None => None,
        };

        if expired {
            entries.shift_remove(key.as_ref());
            tracing::debug!(key = %key, "cache entry expired");
        }

        if config.track_stats {
            match outcome {
                Some(_) => counters.hits += 1,
                None => counters.misses += 1,
            }
        }

        outcome
    }

    pub fn set(&self, key: &str, value: V) {
        let key = (self.normalize)(key);
        let now = (self.now)();
        let mut inner = self.lock();

        let CacheState::Enabled { config, entries } = &mut inner.state else {
            return;
        };

        if !entries.contains_key(key.as_ref()) {
            while !entries.is_empty() && entries.len() >= config.max_size {
                evict(entries);
            }
        }

        entries.insert(
            key.into_owned(),
            CacheEntry {
                value,
                created_at: now,
                last_accessed_at: now,
                access_count: 1,
            },
        );
    }

    /// Removes all entries. Hit and miss counters are kept.
    pub fn clear(&self) {
        if let CacheState::Enabled { entries, .. } = &mut self.lock().state {
            entries.clear();
        }
        tracing::debug!("cache cleared");
    }

    /// Drops the store: lookups miss and insertions are ignored until the next
    /// [`configure`](Self::configure). Statistics are reset.
    pub fn disable(&self) {
        let mut inner = self.lock();
        inner.state = CacheState::Disabled;
        inner.counters = Counters::default();
        tracing::debug!("cache disabled");
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.lock().state, CacheState::Enabled { .. })
    }

    pub fn len(&self) -> usize {
        self.lock().state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        inner.counters.snapshot(inner.state.len())
    }

    pub(crate) fn record_parse_error(&self) {
        self.lock().counters.parse_errors += 1;
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        // Every critical section leaves the store consistent, a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> CacheState<V> {
    fn from_config(config: CacheConfig) -> Self {
        if config.enabled {
            CacheState::Enabled {
                config,
                entries: IndexMap::with_capacity(config.max_size.min(1024)),
            }
        } else {
            CacheState::Disabled
        }
    }

    fn len(&self) -> usize {
        match self {
            CacheState::Disabled => 0,
            CacheState::Enabled { entries, .. } => entries.len(),
        }
    }
}

/// Removes the least used entry, ties going to the one accessed longest ago, then to the oldest
/// insertion.
fn evict<V>(entries: &mut IndexMap<String, CacheEntry<V>>) {
    let victim = entries
        .iter()
        .enumerate()
        .min_by(|(_, (_, a)), (_, (_, b))| {
            a.access_count
                .cmp(&b.access_count)
                .then(a.last_accessed_at.cmp(&b.last_accessed_at))
        })
        .map(|(index, (_, entry))| (index, entry.access_count));

    let Some((index, access_count)) = victim else {
        return;
    };

    if let Some((key, _)) = entries.shift_remove_index(index) {
        tracing::debug!(key = %key, access_count, "evicting cache entry");
    }
}
