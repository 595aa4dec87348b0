use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::EngineError;
use crate::Node;

/// Default number of distinct expressions an [`ExpressionCache`] holds.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Concurrent map from expression source text to its compiled AST.
///
/// Lookup-or-insert is atomic per key: an entry becomes visible only once its
/// AST is fully built, and callers racing on the same uncached source wait on
/// the shard lock rather than observing a partial result. Failed compilations
/// are never cached. Once `capacity` entries are held, further expressions
/// are compiled but not inserted.
#[derive(Debug)]
pub struct ExpressionCache {
    entries: DashMap<String, Arc<Node>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ExpressionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached AST for `source`, compiling and inserting it with
    /// `compile` on a miss.
    ///
    /// # Errors
    ///
    /// Propagates whatever `compile` returns; nothing is inserted in that case.
    pub fn get_or_compile<F>(&self, source: &str, compile: F) -> Result<Arc<Node>, EngineError>
    where
        F: FnOnce(&str) -> Result<Node, EngineError>,
    {
        if let Some(hit) = self.entries.get(source) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(source, "expression cache hit");
            return Ok(Arc::clone(hit.value()));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        if self.entries.len() >= self.capacity {
            debug!(source, capacity = self.capacity, "expression cache full, not inserting");
            return compile(source).map(Arc::new);
        }

        // The shard stays locked until the AST is inserted.
        match self.entries.entry(source.to_owned()) {
            Entry::Occupied(existing) => Ok(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                let ast = Arc::new(compile(source)?);
                slot.insert(Arc::clone(&ast));
                debug!(source, "compiled and cached expression");
                Ok(ast)
            }
        }
    }

    /// Insert an already compiled AST, respecting the capacity limit.
    /// Returns whether it was inserted.
    pub fn insert(&self, source: &str, ast: Arc<Node>) -> bool {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(source) {
            return false;
        }
        self.entries.insert(source.to_owned(), ast);
        true
    }

    #[must_use]
    pub fn get(&self, source: &str) -> Option<Arc<Node>> {
        self.entries.get(source).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
