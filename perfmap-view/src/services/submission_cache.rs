//! TTL-keyed submission status cache
//!
//! In-memory store mapping a work item id to its last-known submission
//! summary. Entries are never evicted; every reader checks staleness against
//! the TTL, and a stale entry is simply a miss that the next refresh run
//! refetches. The clock is injected so TTL behavior is testable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use perfmap_common::time::Clock;

use crate::models::{SubmissionSummary, WorkItemId};

/// Validity window of a cache entry
pub const SUBMISSION_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached submission summary with its fetch instant
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: SubmissionSummary,
    pub fetched_at: Instant,
}

/// In-memory TTL cache of submission summaries
pub struct SubmissionCache {
    entries: RwLock<HashMap<WorkItemId, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SubmissionCache {
    /// Create a cache with the standard 5-minute TTL
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(SUBMISSION_TTL, clock)
    }

    /// Create a cache with a custom TTL
    pub fn with_ttl(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Raw entry lookup; the staleness check is the caller's responsibility
    pub async fn get(&self, id: WorkItemId) -> Option<CacheEntry> {
        self.entries.read().await.get(&id).cloned()
    }

    /// Store a summary under the clock's current instant, overwriting any
    /// previous entry
    pub async fn put(&self, id: WorkItemId, summary: SubmissionSummary) {
        let entry = CacheEntry {
            data: summary,
            fetched_at: self.clock.now(),
        };
        self.entries.write().await.insert(id, entry);
    }

    /// Whether `entry` is still within its TTL
    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now().saturating_duration_since(entry.fetched_at) < self.ttl
    }

    /// Summary for `id` if present and fresh; stale entries are misses
    pub async fn fresh(&self, id: WorkItemId) -> Option<SubmissionSummary> {
        let entry = self.get(id).await?;
        if self.is_fresh(&entry) {
            Some(entry.data)
        } else {
            None
        }
    }
}
