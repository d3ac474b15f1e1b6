//! Dashboard API client
//!
//! HTTP client for the dashboard REST endpoints the view consumes:
//! submissions, reviews, work-item completion flags, and the task aggregate.
//! All persistence lives behind these endpoints; this service never talks to
//! a database.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ReviewRecord, SubmissionDetail, Task, WorkItemId};

/// Transport-level timeout applied by reqwest to every request, independent
/// of the per-operation deadlines composed via [`with_deadline`].
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("perfmap-view/", env!("CARGO_PKG_VERSION"));

/// Dashboard client errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Resource does not exist (no submission / no review yet)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Per-operation deadline exceeded
    #[error("Deadline exceeded after {0:?}")]
    Timeout(Duration),

    /// API returned an unexpected error status
    #[error("API error {0}: {1}")]
    ApiStatus(u16, String),

    /// Failed to parse a response body
    #[error("Decode error: {0}")]
    Decode(String),
}

impl BackendError {
    /// True for failures treated as soft cache misses (retried on a future
    /// trigger, never surfaced as run-level errors)
    pub fn is_soft(&self) -> bool {
        matches!(self, BackendError::Timeout(_) | BackendError::Network(_))
    }
}

/// Run `operation` under a deadline, mapping expiry to [`BackendError::Timeout`]
///
/// The single timeout combinator composed with every per-item fetch; deadline
/// expiry aborts the in-flight request.
pub async fn with_deadline<T, F>(deadline: Duration, operation: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout(deadline)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewUpsertRequest<'a> {
    rating: u8,
    reviewed_by: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionUpdateRequest {
    is_done: bool,
}

/// Dashboard API client
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new client for the dashboard API at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /submissions/{workItemId} - full submission record, 404 if the
    /// item has not been submitted yet
    pub async fn fetch_submission(
        &self,
        work_item_id: WorkItemId,
    ) -> Result<SubmissionDetail, BackendError> {
        let url = format!("{}/submissions/{}", self.base_url, work_item_id);
        self.get_json(&url, &format!("submission for work item {}", work_item_id))
            .await
    }

    /// GET /reviews/{workItemId} - review record, 404 if no review exists
    pub async fn fetch_review(
        &self,
        work_item_id: WorkItemId,
    ) -> Result<ReviewRecord, BackendError> {
        let url = format!("{}/reviews/{}", self.base_url, work_item_id);
        self.get_json(&url, &format!("review for work item {}", work_item_id))
            .await
    }

    /// POST /reviews/{workItemId} - create a review (no review exists yet)
    pub async fn create_review(
        &self,
        work_item_id: WorkItemId,
        rating: u8,
        reviewed_by: &str,
    ) -> Result<(), BackendError> {
        let url = format!("{}/reviews/{}", self.base_url, work_item_id);
        let response = self
            .http_client
            .post(&url)
            .json(&ReviewUpsertRequest {
                rating,
                reviewed_by,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        check_status(response, &format!("create review for work item {}", work_item_id)).await
    }

    /// PUT /reviews/{workItemId} - update an existing review
    pub async fn update_review(
        &self,
        work_item_id: WorkItemId,
        rating: u8,
        reviewed_by: &str,
    ) -> Result<(), BackendError> {
        let url = format!("{}/reviews/{}", self.base_url, work_item_id);
        let response = self
            .http_client
            .put(&url)
            .json(&ReviewUpsertRequest {
                rating,
                reviewed_by,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        check_status(response, &format!("update review for work item {}", work_item_id)).await
    }

    /// PUT /work-items/{workItemId} - set the completion flag
    pub async fn mark_done(&self, work_item_id: WorkItemId) -> Result<(), BackendError> {
        let url = format!("{}/work-items/{}", self.base_url, work_item_id);
        let response = self
            .http_client
            .put(&url)
            .json(&CompletionUpdateRequest { is_done: true })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        check_status(response, &format!("mark work item {} done", work_item_id)).await
    }

    /// GET /tasks?ownerId=... - the task aggregate, loaded once at startup
    pub async fn fetch_tasks(&self, owner_id: i64) -> Result<Vec<Task>, BackendError> {
        let url = format!("{}/tasks?ownerId={}", self.base_url, owner_id);
        self.get_json(&url, &format!("tasks for owner {}", owner_id))
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T, BackendError> {
        tracing::debug!(url = %url, "Querying dashboard API");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiStatus(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

async fn check_status(response: reqwest::Response, what: &str) -> Result<(), BackendError> {
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound(what.to_string()));
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(BackendError::ApiStatus(status.as_u16(), error_text));
    }

    Ok(())
}

fn map_reqwest_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout(CLIENT_TIMEOUT)
    } else {
        BackendError::Network(error.to_string())
    }
}
