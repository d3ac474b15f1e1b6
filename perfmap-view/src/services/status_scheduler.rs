//! Batch submission-status refresh
//!
//! Resolves submission/review existence for the visible page of work items:
//! ids missing or stale in the cache are partitioned into fixed-size chunks,
//! each chunk's items fetched concurrently under per-item deadlines, with a
//! short delay between chunks as backpressure. Results merge into the cache
//! and a page-scoped view map is republished for rendering.
//!
//! A run is guarded two ways:
//! - single-flight: a trigger while a run is active is dropped, not queued,
//!   and issues no network calls
//! - generation counter: chunk results are merged only while their run's
//!   generation is still current; merges tagged with a superseded generation
//!   are discarded

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use perfmap_common::events::{EventBus, ViewEvent};
use perfmap_common::time;

use crate::models::{SubmissionStatus, SubmissionSummary, WorkItemId};
use crate::services::backend_client::{with_deadline, BackendClient, BackendError};
use crate::services::submission_cache::SubmissionCache;
use crate::services::FlightGuard;

use std::time::Duration;

/// Scheduler tuning knobs
///
/// `Default` carries the production values; integration tests compress the
/// deadlines and delay without touching the algorithm.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Ids fetched concurrently per chunk
    pub chunk_size: usize,
    /// Delay between consecutive chunks
    pub chunk_delay: Duration,
    /// Deadline for one submission fetch
    pub submission_deadline: Duration,
    /// Deadline for one review-existence probe (best-effort)
    pub review_deadline: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            chunk_delay: Duration::from_millis(100),
            submission_deadline: Duration::from_secs(5),
            review_deadline: Duration::from_secs(3),
        }
    }
}

/// Result of a refresh trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Run completed; the view map was republished
    Completed {
        generation: u64,
        /// Items fetched and merged into the cache during this run
        resolved: usize,
        /// Items that failed (timeout/network/API error) and stayed misses
        failed: usize,
    },
    /// Run overtaken by a newer generation; its remaining results were
    /// discarded and the view map was left to the newer run
    Superseded { generation: u64 },
    /// Dropped by the single-flight guard; no network calls were issued
    Skipped,
}

/// Batch fetch scheduler for the performance-map page
pub struct StatusScheduler {
    client: Arc<BackendClient>,
    cache: Arc<SubmissionCache>,
    event_bus: EventBus,
    config: SchedulerConfig,
    in_flight: AtomicBool,
    generation: AtomicU64,
    view: RwLock<HashMap<WorkItemId, SubmissionStatus>>,
}

impl StatusScheduler {
    pub fn new(client: Arc<BackendClient>, cache: Arc<SubmissionCache>, event_bus: EventBus) -> Self {
        Self::with_config(client, cache, event_bus, SchedulerConfig::default())
    }

    pub fn with_config(
        client: Arc<BackendClient>,
        cache: Arc<SubmissionCache>,
        event_bus: EventBus,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            client,
            cache,
            event_bus,
            config,
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            view: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of the published page-scoped view map
    pub async fn view(&self) -> HashMap<WorkItemId, SubmissionStatus> {
        self.view.read().await.clone()
    }

    /// Refresh submission status for the visible id set.
    ///
    /// Receives the entire visible set; ids still fresh in the cache are not
    /// refetched but are included in the republished view map.
    pub async fn refresh(&self, visible: &[WorkItemId]) -> RefreshOutcome {
        let _guard = match FlightGuard::acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                tracing::debug!(
                    requested = visible.len(),
                    "Status refresh already in flight, dropping trigger"
                );
                return RefreshOutcome::Skipped;
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.run(generation, visible).await
    }

    async fn run(&self, generation: u64, visible: &[WorkItemId]) -> RefreshOutcome {
        // Distinct ids, first-seen order
        let mut seen = HashSet::new();
        let ids: Vec<WorkItemId> = visible
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        // Still-valid entries are not refetched; they are read back from the
        // cache when the view map is rebuilt below.
        let mut stale = Vec::new();
        for id in &ids {
            if self.cache.fresh(*id).await.is_none() {
                stale.push(*id);
            }
        }

        tracing::debug!(
            generation,
            visible = ids.len(),
            stale = stale.len(),
            "Starting status refresh"
        );

        let _ = self.event_bus.emit(ViewEvent::StatusRefreshStarted {
            generation,
            requested: stale.len(),
            timestamp: time::now(),
        });

        let mut resolved = 0usize;
        let mut failed = 0usize;

        for (index, chunk) in stale.chunks(self.config.chunk_size.max(1)).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.chunk_delay).await;
            }

            let fetches = chunk.iter().map(|id| async move {
                (*id, self.resolve_item(*id).await)
            });
            let results = futures::future::join_all(fetches).await;

            // A newer generation owns the view map now; discard this run's
            // remaining results instead of merging stale data over it.
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "Status refresh superseded, discarding results");
                return RefreshOutcome::Superseded { generation };
            }

            for (id, result) in results {
                match result {
                    Ok(summary) => {
                        self.cache.put(id, summary).await;
                        resolved += 1;
                    }
                    Err(BackendError::NotFound(_)) => {
                        tracing::debug!(work_item_id = id, "No submission yet");
                    }
                    Err(e) => {
                        // Contained at the item level: the id stays a cache
                        // miss, eligible for retry on a future trigger.
                        tracing::warn!(work_item_id = id, error = %e, "Submission fetch failed");
                        failed += 1;
                    }
                }
            }
        }

        self.publish_view(&ids).await;

        tracing::info!(generation, resolved, failed, "Status refresh complete");

        let _ = self.event_bus.emit(ViewEvent::StatusRefreshCompleted {
            generation,
            resolved,
            failed,
            timestamp: time::now(),
        });

        RefreshOutcome::Completed {
            generation,
            resolved,
            failed,
        }
    }

    /// Fetch one item's submission, then probe review existence best-effort
    async fn resolve_item(&self, id: WorkItemId) -> Result<SubmissionSummary, BackendError> {
        let detail = with_deadline(
            self.config.submission_deadline,
            self.client.fetch_submission(id),
        )
        .await?;

        let has_review = match with_deadline(
            self.config.review_deadline,
            self.client.fetch_review(id),
        )
        .await
        {
            Ok(_) => true,
            Err(BackendError::NotFound(_)) => false,
            Err(e) => {
                tracing::debug!(work_item_id = id, error = %e, "Review probe failed, assuming none");
                false
            }
        };

        Ok(SubmissionSummary {
            submission_id: detail.id,
            file_ref: detail.file_ref,
            has_review,
        })
    }

    /// Rebuild the page-scoped view map for every requested id
    async fn publish_view(&self, ids: &[WorkItemId]) {
        let mut map = HashMap::with_capacity(ids.len());
        for id in ids {
            let status = match self.cache.fresh(*id).await {
                Some(summary) => SubmissionStatus::from_summary(&summary),
                None => SubmissionStatus::NotSubmitted,
            };
            map.insert(*id, status);
        }

        *self.view.write().await = map;
    }
}
