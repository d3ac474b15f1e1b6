//! Test helpers: an in-process mock of the dashboard REST API
//!
//! Provides a programmatically controllable dashboard backend with request
//! counters, per-item delays, and failure injection, plus engine assembly
//! helpers with compressed deadlines.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use perfmap_common::events::EventBus;
use perfmap_common::time::ManualClock;
use perfmap_view::models::{Task, WorkItem};
use perfmap_view::services::{
    BackendClient, DetailFetcher, FetcherConfig, PageOrchestrator, RatingSubmitter,
    SchedulerConfig, StatusScheduler, SubmissionCache,
};

/// Mutable state behind the mock dashboard
#[derive(Default)]
pub struct MockState {
    /// Submission records keyed by work item id
    pub submissions: RwLock<HashMap<i64, Value>>,
    /// Review records keyed by work item id
    pub reviews: RwLock<HashMap<i64, Value>>,
    /// Artificial delay per work item for submission fetches
    pub submission_delays: RwLock<HashMap<i64, Duration>>,
    /// When set, PUT /work-items/{id} responds 500
    pub fail_mark_done: AtomicBool,
    /// Task aggregate served by GET /tasks
    pub tasks: RwLock<Value>,

    pub submission_requests: AtomicUsize,
    pub review_requests: AtomicUsize,
    pub review_creates: AtomicUsize,
    pub review_updates: AtomicUsize,
    pub done_requests: AtomicUsize,
    /// Work items marked done, in request order
    pub done_items: RwLock<Vec<i64>>,
}

/// In-process mock dashboard API
pub struct MockDashboard {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockDashboard {
    /// Bind an ephemeral port and serve the mock API
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            tasks: RwLock::new(json!([])),
            ..MockState::default()
        });

        let app = Router::new()
            .route("/submissions/:id", get(get_submission))
            .route("/reviews/:id", get(get_review).post(create_review).put(update_review))
            .route("/work-items/:id", put(mark_done))
            .route("/tasks", get(get_tasks))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Seed a submission for `work_item_id`, optionally with a review
    pub async fn seed_submission(&self, work_item_id: i64, submission_id: i64, reviewed: bool) {
        self.state
            .submissions
            .write()
            .await
            .insert(work_item_id, submission_json(submission_id, work_item_id));
        if reviewed {
            self.state
                .reviews
                .write()
                .await
                .insert(work_item_id, review_json(3));
        }
    }

    /// Delay submission fetches for `work_item_id` by `delay`
    pub async fn set_submission_delay(&self, work_item_id: i64, delay: Duration) {
        self.state
            .submission_delays
            .write()
            .await
            .insert(work_item_id, delay);
    }

    pub fn submission_requests(&self) -> usize {
        self.state.submission_requests.load(Ordering::SeqCst)
    }

    pub async fn stored_rating(&self, work_item_id: i64) -> Option<u8> {
        self.state
            .reviews
            .read()
            .await
            .get(&work_item_id)
            .and_then(|review| review["rating"].as_u64())
            .map(|rating| rating as u8)
    }
}

async fn get_submission(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
) -> Response {
    state.submission_requests.fetch_add(1, Ordering::SeqCst);

    let delay = state.submission_delays.read().await.get(&id).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match state.submissions.read().await.get(&id) {
        Some(submission) => Json(submission.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_review(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    state.review_requests.fetch_add(1, Ordering::SeqCst);

    match state.reviews.read().await.get(&id) {
        Some(review) => Json(review.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_review(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    state.review_creates.fetch_add(1, Ordering::SeqCst);
    store_review(&state, id, &body).await;
    StatusCode::CREATED.into_response()
}

async fn update_review(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    state.review_updates.fetch_add(1, Ordering::SeqCst);
    store_review(&state, id, &body).await;
    StatusCode::OK.into_response()
}

async fn store_review(state: &MockState, id: i64, body: &Value) {
    state.reviews.write().await.insert(
        id,
        json!({
            "rating": body["rating"],
            "reviewedBy": body["reviewedBy"],
            "reviewedAt": "2026-08-01T12:00:00Z",
        }),
    );
}

async fn mark_done(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    state.done_requests.fetch_add(1, Ordering::SeqCst);

    if state.fail_mark_done.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    state.done_items.write().await.push(id);
    StatusCode::OK.into_response()
}

async fn get_tasks(State(state): State<Arc<MockState>>) -> Response {
    Json(state.tasks.read().await.clone()).into_response()
}

/// Submission record JSON in the dashboard's wire format
pub fn submission_json(submission_id: i64, work_item_id: i64) -> Value {
    json!({
        "id": submission_id,
        "workItemId": work_item_id,
        "fileRef": format!("uploads/{}.pdf", submission_id),
        "comment": null,
        "submittedAt": "2026-08-01T10:00:00Z",
        "isRevised": false,
        "workItem": {
            "id": work_item_id,
            "title": format!("item {}", work_item_id),
            "isDone": false,
            "assignee": null,
        },
        "review": null,
    })
}

/// Review record JSON in the dashboard's wire format
pub fn review_json(rating: u8) -> Value {
    json!({
        "rating": rating,
        "reviewedBy": "mock",
        "reviewedAt": "2026-08-01T11:00:00Z",
    })
}

/// Build `count` tasks with `items_per_task` work items each.
///
/// Task n holds items `n * 10 .. n * 10 + items_per_task`.
pub fn make_tasks(count: i64, items_per_task: i64) -> Vec<Task> {
    (0..count)
        .map(|n| Task {
            id: n,
            title: format!("Task {}", n),
            status: "active".to_string(),
            items: (0..items_per_task)
                .map(|i| WorkItem {
                    id: n * 10 + i,
                    title: format!("item {}", n * 10 + i),
                    is_done: false,
                    assignee: None,
                })
                .collect(),
        })
        .collect()
}

/// Scheduler config with compressed deadlines for tests
pub fn fast_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        chunk_size: 5,
        chunk_delay: Duration::from_millis(20),
        submission_deadline: Duration::from_millis(300),
        review_deadline: Duration::from_millis(200),
    }
}

/// Detail fetcher config with compressed deadlines for tests
pub fn fast_fetcher_config() -> FetcherConfig {
    FetcherConfig {
        submission_deadline: Duration::from_millis(300),
        review_deadline: Duration::from_millis(200),
    }
}

/// Fully wired engine with handles the tests can reach into
pub struct TestEngine {
    pub clock: Arc<ManualClock>,
    pub cache: Arc<SubmissionCache>,
    pub scheduler: Arc<StatusScheduler>,
    pub orchestrator: Arc<PageOrchestrator>,
    pub detail_fetcher: Arc<DetailFetcher>,
    pub rating_submitter: Arc<RatingSubmitter>,
    pub tasks: Arc<tokio::sync::RwLock<Vec<Task>>>,
    pub event_bus: EventBus,
}

/// Assemble the engine against the mock dashboard with compressed deadlines
pub fn build_engine(mock: &MockDashboard, tasks: Vec<Task>) -> TestEngine {
    build_engine_with_config(mock, tasks, fast_scheduler_config())
}

pub fn build_engine_with_config(
    mock: &MockDashboard,
    tasks: Vec<Task>,
    scheduler_config: SchedulerConfig,
) -> TestEngine {
    let client = Arc::new(BackendClient::new(&mock.base_url).unwrap());
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(SubmissionCache::new(clock.clone()));
    let event_bus = EventBus::new(64);
    let scheduler = Arc::new(StatusScheduler::with_config(
        client.clone(),
        cache.clone(),
        event_bus.clone(),
        scheduler_config,
    ));
    let tasks = Arc::new(tokio::sync::RwLock::new(tasks));
    let orchestrator = Arc::new(PageOrchestrator::new(tasks.clone(), scheduler.clone()));
    let detail_fetcher = Arc::new(DetailFetcher::with_config(
        client.clone(),
        fast_fetcher_config(),
    ));
    let rating_submitter = Arc::new(RatingSubmitter::new(
        client,
        cache.clone(),
        tasks.clone(),
        detail_fetcher.clone(),
        event_bus.clone(),
        "lead",
    ));

    TestEngine {
        clock,
        cache,
        scheduler,
        orchestrator,
        detail_fetcher,
        rating_submitter,
        tasks,
        event_bus,
    }
}
