//! Compiled-template cache.
//!
//! Compiled views are kept per normalized view name for the lifetime of the
//! owning service when caching is enabled. Entries are never evicted
//! automatically.
//!
//! # Cache Invalidation
//!
//! A cached view is never re-read, so view files must not change while the
//! process runs. [`TemplateCache::clear`] drops every entry and is the explicit
//! reload used during development.
//!
//! # Concurrency
//!
//! The map is a [`DashMap`], so lookups from concurrent renders do not share a
//! global lock. There is no single-flight: two first renders of the same view
//! may both compile it, and the last insert wins. Both results are equivalent.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::renderer::CompiledTemplate;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Map from normalized view name to its compiled template.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: DashMap<String, Arc<CompiledTemplate>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl TemplateCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a compiled template, counting the lookup as a hit or a miss
    pub fn get(&self, view: &str) -> Option<Arc<CompiledTemplate>> {
        match self.templates.get(view) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or replace a compiled template
    pub fn insert(&self, view: impl Into<String>, template: Arc<CompiledTemplate>) {
        self.templates.insert(view.into(), template);
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.templates.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.templates.len(),
        }
    }
}
