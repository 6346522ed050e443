use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use lru::LruCache;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::ast::ModuleNode;

use super::phase::CompilationPhase;
use super::ContentHash;

pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_TTL: Duration = Duration::from_millis(1_800_000);

/// One cached compile for a source.
///
/// Warnings ride along so a cache hit reproduces them instead of silently
/// clearing previously published findings. Trees with errors are never
/// cached at all.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content_hash: ContentHash,
    pub module: Arc<ModuleNode>,
    pub phase: CompilationPhase,
    pub warnings: Vec<super::CompilerMessage>,
    inserted_at: Instant,
}

impl CacheEntry {
    pub fn new(content_hash: ContentHash, module: Arc<ModuleNode>, phase: CompilationPhase) -> Self {
        Self {
            content_hash,
            module,
            phase,
            warnings: Vec::new(),
            inserted_at: Instant::now(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<super::CompilerMessage>) -> Self {
        self.warnings = warnings;
        self
    }

    fn fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() <= ttl
    }
}

/// Per-source LRU+TTL cache of phase-indexed program trees.
///
/// Readers share the map; writers are exclusive. Recency promotion on a read
/// is opportunistic — it only happens when the write lock is immediately
/// available, so a hit never blocks behind other readers.
pub struct CompilationCache {
    entries: RwLock<LruCache<Url, CacheEntry>>,
    ttl: RwLock<Duration>,
}

impl Default for CompilationCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

impl CompilationCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl: RwLock::new(ttl),
        }
    }

    /// Return the cached compile for `source_id` when it is still valid:
    /// same content hash, compiled at least to `min_phase`, and within the
    /// TTL.
    pub fn get(
        &self,
        source_id: &Url,
        content_hash: ContentHash,
        min_phase: CompilationPhase,
    ) -> Option<CacheEntry> {
        let ttl = self.ttl();
        let expired = {
            let Ok(entries) = self.entries.read() else {
                return None;
            };
            let entry = entries.peek(source_id)?;
            if entry.content_hash != content_hash || entry.phase < min_phase {
                return None;
            }
            if entry.fresh(ttl) {
                let hit = entry.clone();
                drop(entries);
                // Recency bump; skipped when a writer holds the lock.
                if let Ok(mut entries) = self.entries.try_write() {
                    entries.promote(source_id);
                }
                return Some(hit);
            }
            true
        };

        if expired
            && let Ok(mut entries) = self.entries.write()
        {
            // Re-check under the write lock; a writer may have replaced the
            // entry between the read and here.
            if entries
                .peek(source_id)
                .is_some_and(|entry| !entry.fresh(ttl))
            {
                debug!("[compile-cache] expired {source_id}");
                entries.pop(source_id);
            }
        }
        None
    }

    /// Insert a compile result, evicting the least recently used entry when
    /// full. An entry is never downgraded: a cached tree for the same content
    /// at a later phase stays.
    pub fn put(&self, source_id: Url, entry: CacheEntry) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        if let Some(existing) = entries.peek(&source_id)
            && existing.content_hash == entry.content_hash
            && existing.phase >= entry.phase
        {
            entries.promote(&source_id);
            return;
        }
        if let Some((evicted, _)) = entries.push(source_id.clone(), entry)
            && evicted != source_id
        {
            debug!("[compile-cache] evicted {evicted}");
        }
    }

    pub fn invalidate(&self, source_id: &Url) {
        if let Ok(mut entries) = self.entries.write() {
            entries.pop(source_id);
        }
    }

    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply new limits from settings. Shrinking evicts LRU-first.
    pub fn configure(&self, max_entries: usize, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
            entries.resize(capacity);
        }
        if let Ok(mut guard) = self.ttl.write() {
            *guard = ttl;
        }
    }

    fn ttl(&self) -> Duration {
        self.ttl.read().map(|g| *g).unwrap_or(DEFAULT_TTL)
    }
}
