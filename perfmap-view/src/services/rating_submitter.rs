//! Two-step rating mutation
//!
//! Saves a review for one work item, then marks the item done, and propagates
//! the change into the cache, the in-memory task aggregate, and the open
//! detail view, in that order. The two remote steps are not transactional: a
//! completion-flag failure after a successful review write is logged and
//! tolerated; the rating is still reported saved, and the aggregate's done
//! flag is left matching the remote state.

use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use perfmap_common::events::{EventBus, ViewEvent};
use perfmap_common::time;

use crate::models::{ReviewRecord, SubmissionSummary, Task, WorkItemId};
use crate::services::backend_client::{BackendClient, BackendError};
use crate::services::detail_fetcher::DetailFetcher;
use crate::services::submission_cache::SubmissionCache;
use crate::services::FlightGuard;

/// Rating submission errors
#[derive(Debug, Error)]
pub enum RatingError {
    /// Rating outside the valid range
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    /// Ignored: another submission is still outstanding
    #[error("A rating submission is already in progress")]
    Busy,

    /// No loaded detail to decide create-vs-update against
    #[error("No loaded submission detail for work item {0}")]
    NoDetail(WorkItemId),

    /// The review write itself failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result of a successful rating submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingOutcome {
    pub work_item_id: WorkItemId,
    pub rating: u8,
    /// Whether a new review was created (false: an existing one was updated)
    pub created: bool,
    /// Whether the follow-up completion-flag update succeeded
    pub done_flag_updated: bool,
}

/// Submits review ratings and keeps local state consistent
pub struct RatingSubmitter {
    client: Arc<BackendClient>,
    cache: Arc<SubmissionCache>,
    tasks: Arc<RwLock<Vec<Task>>>,
    detail: Arc<DetailFetcher>,
    event_bus: EventBus,
    /// Identity recorded as the review author
    reviewer: String,
    submitting: AtomicBool,
}

impl RatingSubmitter {
    pub fn new(
        client: Arc<BackendClient>,
        cache: Arc<SubmissionCache>,
        tasks: Arc<RwLock<Vec<Task>>>,
        detail: Arc<DetailFetcher>,
        event_bus: EventBus,
        reviewer: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cache,
            tasks,
            detail,
            event_bus,
            reviewer: reviewer.into(),
            submitting: AtomicBool::new(false),
        }
    }

    /// Save `rating` for `work_item_id` and mark the item done
    pub async fn submit(
        &self,
        work_item_id: WorkItemId,
        rating: u8,
    ) -> Result<RatingOutcome, RatingError> {
        if !(1..=5).contains(&rating) {
            return Err(RatingError::InvalidRating(rating));
        }

        let _guard = match FlightGuard::acquire(&self.submitting) {
            Some(guard) => guard,
            None => {
                tracing::debug!(
                    work_item_id,
                    "Rating submission already in progress, ignoring"
                );
                return Err(RatingError::Busy);
            }
        };

        self.run(work_item_id, rating).await
    }

    async fn run(
        &self,
        work_item_id: WorkItemId,
        rating: u8,
    ) -> Result<RatingOutcome, RatingError> {
        let current = self
            .detail
            .current()
            .await
            .filter(|detail| detail.work_item_id == work_item_id)
            .ok_or(RatingError::NoDetail(work_item_id))?;

        // Step 1: create-vs-update from the loaded detail
        let created = current.review.is_none();
        if created {
            self.client
                .create_review(work_item_id, rating, &self.reviewer)
                .await?;
        } else {
            self.client
                .update_review(work_item_id, rating, &self.reviewer)
                .await?;
        }

        // Step 2: completion flag; failure here is tolerated; the review is
        // already saved and reported as such
        let done_flag_updated = match self.client.mark_done(work_item_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    work_item_id,
                    error = %e,
                    "Review saved but completion flag update failed"
                );
                false
            }
        };

        // Propagate: cache, then aggregate, then the open detail view
        self.cache
            .put(
                work_item_id,
                SubmissionSummary {
                    submission_id: current.id,
                    file_ref: current.file_ref.clone(),
                    has_review: true,
                },
            )
            .await;

        if done_flag_updated {
            self.mark_item_done(work_item_id).await;
        }

        let review = ReviewRecord {
            rating,
            reviewed_by: self.reviewer.clone(),
            reviewed_at: time::now(),
        };
        self.detail.apply_review(work_item_id, review).await;

        tracing::info!(work_item_id, rating, created, done_flag_updated, "Rating saved");

        let _ = self.event_bus.emit(ViewEvent::RatingSaved {
            work_item_id,
            rating,
            done_flag_updated,
            timestamp: time::now(),
        });

        Ok(RatingOutcome {
            work_item_id,
            rating,
            created,
            done_flag_updated,
        })
    }

    async fn mark_item_done(&self, work_item_id: WorkItemId) {
        let mut tasks = self.tasks.write().await;
        for task in tasks.iter_mut() {
            for item in task.items.iter_mut() {
                if item.id == work_item_id {
                    item.is_done = true;
                }
            }
        }
    }
}
