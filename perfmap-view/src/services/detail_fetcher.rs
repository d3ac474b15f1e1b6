//! On-demand single-item detail fetch
//!
//! Cache-bypassing fetch of one work item's full submission record plus its
//! review, for the detail view. Guarded by a single in-flight flag: a request
//! while one is outstanding is ignored, not queued. A 404 for the submission
//! is the benign "not submitted yet" state; timeouts and network failures
//! surface to the caller, who suggests a retry (there is no automatic one).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::models::{ReviewRecord, SubmissionDetail, WorkItemId};
use crate::services::backend_client::{with_deadline, BackendClient, BackendError};
use crate::services::FlightGuard;

/// Detail fetch deadlines; `Default` carries the production values
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub submission_deadline: Duration,
    pub review_deadline: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            submission_deadline: Duration::from_secs(10),
            review_deadline: Duration::from_secs(5),
        }
    }
}

/// Result of a detail fetch request
#[derive(Debug, Clone)]
pub enum DetailOutcome {
    /// Detail loaded (review attached when one exists)
    Loaded(Box<SubmissionDetail>),
    /// The item has no submission yet (benign empty state)
    NotSubmitted,
    /// Ignored: another detail fetch is still outstanding
    Busy,
}

/// Single-item detail fetcher
pub struct DetailFetcher {
    client: Arc<BackendClient>,
    config: FetcherConfig,
    in_flight: AtomicBool,
    /// Last successfully loaded detail; the rating submitter decides
    /// create-vs-update from it
    current: RwLock<Option<SubmissionDetail>>,
}

impl DetailFetcher {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self::with_config(client, FetcherConfig::default())
    }

    pub fn with_config(client: Arc<BackendClient>, config: FetcherConfig) -> Self {
        Self {
            client,
            config,
            in_flight: AtomicBool::new(false),
            current: RwLock::new(None),
        }
    }

    /// The currently loaded detail, if any
    pub async fn current(&self) -> Option<SubmissionDetail> {
        self.current.read().await.clone()
    }

    /// Attach `review` to the loaded detail if it belongs to `work_item_id`
    ///
    /// Used by the rating submitter to keep the open detail view consistent
    /// after a save. Returns whether the detail was updated.
    pub async fn apply_review(&self, work_item_id: WorkItemId, review: ReviewRecord) -> bool {
        let mut current = self.current.write().await;
        match current.as_mut() {
            Some(detail) if detail.work_item_id == work_item_id => {
                detail.review = Some(review);
                true
            }
            _ => false,
        }
    }

    /// Fetch the submission detail for `work_item_id`, then its review
    /// best-effort
    pub async fn fetch(&self, work_item_id: WorkItemId) -> Result<DetailOutcome, BackendError> {
        let _guard = match FlightGuard::acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                tracing::debug!(
                    work_item_id,
                    "Detail fetch already in flight, ignoring request"
                );
                return Ok(DetailOutcome::Busy);
            }
        };

        self.run(work_item_id).await
    }

    async fn run(&self, work_item_id: WorkItemId) -> Result<DetailOutcome, BackendError> {
        let mut detail = match with_deadline(
            self.config.submission_deadline,
            self.client.fetch_submission(work_item_id),
        )
        .await
        {
            Ok(detail) => detail,
            Err(BackendError::NotFound(_)) => {
                tracing::debug!(work_item_id, "No submission yet for detail view");
                *self.current.write().await = None;
                return Ok(DetailOutcome::NotSubmitted);
            }
            Err(e) => {
                tracing::warn!(work_item_id, error = %e, "Detail fetch failed");
                return Err(e);
            }
        };

        match with_deadline(
            self.config.review_deadline,
            self.client.fetch_review(work_item_id),
        )
        .await
        {
            Ok(review) => detail.review = Some(review),
            Err(BackendError::NotFound(_)) => detail.review = None,
            Err(e) => {
                // Best-effort: keep whatever the submission record embedded
                tracing::debug!(work_item_id, error = %e, "Review fetch failed, using embedded value");
            }
        }

        *self.current.write().await = Some(detail.clone());
        Ok(DetailOutcome::Loaded(Box::new(detail)))
    }
}
