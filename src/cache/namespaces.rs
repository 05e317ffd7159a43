//! Cache Namespaces Module
//!
//! Three independent stores (general, line, position) with their own TTLs
//! and a shared key ceiling.

use std::fmt;

use serde::Serialize;

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::Result;

// == Namespace ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Full active-vehicle set and its stale fallback
    General,
    /// Per-line query results
    Line,
    /// Per-position query results
    Position,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 3] = [
        CacheNamespace::General,
        CacheNamespace::Line,
        CacheNamespace::Position,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheNamespace::General => "general",
            CacheNamespace::Line => "line",
            CacheNamespace::Position => "position",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Namespace Stats ==
/// Counter snapshot for all three namespaces.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceStats {
    pub general: CacheStats,
    pub line: CacheStats,
    pub position: CacheStats,
}

// == Namespaced Cache ==
#[derive(Debug)]
pub struct NamespacedCache<V> {
    general: CacheStore<V>,
    line: CacheStore<V>,
    position: CacheStore<V>,
}

impl<V: Clone> NamespacedCache<V> {
    /// Creates the three stores with their default TTLs (seconds).
    pub fn new(max_keys: usize, general_ttl: u64, line_ttl: u64, position_ttl: u64) -> Self {
        Self {
            general: CacheStore::new(max_keys, general_ttl),
            line: CacheStore::new(max_keys, line_ttl),
            position: CacheStore::new(max_keys, position_ttl),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cache_max_keys,
            config.cache_ttl,
            config.cache_ttl_line,
            config.cache_ttl_position,
        )
    }

    fn store(&self, ns: CacheNamespace) -> &CacheStore<V> {
        match ns {
            CacheNamespace::General => &self.general,
            CacheNamespace::Line => &self.line,
            CacheNamespace::Position => &self.position,
        }
    }

    fn store_mut(&mut self, ns: CacheNamespace) -> &mut CacheStore<V> {
        match ns {
            CacheNamespace::General => &mut self.general,
            CacheNamespace::Line => &mut self.line,
            CacheNamespace::Position => &mut self.position,
        }
    }

    pub fn get(&mut self, ns: CacheNamespace, key: &str) -> Option<V> {
        self.store_mut(ns).get(key)
    }

    /// Stores `value`; `ttl` of `None` uses the namespace default.
    pub fn set(&mut self, ns: CacheNamespace, key: String, value: V, ttl: Option<u64>) -> Result<()> {
        self.store_mut(ns).set(key, value, ttl)
    }

    pub fn delete(&mut self, ns: CacheNamespace, key: &str) -> bool {
        self.store_mut(ns).delete(key)
    }

    /// Clears one namespace, or all of them when `ns` is `None`.
    pub fn clear(&mut self, ns: Option<CacheNamespace>) {
        match ns {
            Some(ns) => self.store_mut(ns).clear(),
            None => {
                for ns in CacheNamespace::ALL {
                    self.store_mut(ns).clear();
                }
            }
        }
    }

    /// Sweeps expired entries from every namespace.
    pub fn cleanup_expired(&mut self) -> usize {
        CacheNamespace::ALL
            .into_iter()
            .map(|ns| self.store_mut(ns).cleanup_expired())
            .sum()
    }

    pub fn len(&self, ns: CacheNamespace) -> usize {
        self.store(ns).len()
    }

    pub fn stats(&self) -> NamespaceStats {
        NamespaceStats {
            general: self.general.stats(),
            line: self.line.stats(),
            position: self.position.stats(),
        }
    }
}
