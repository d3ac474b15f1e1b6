//! perfmap-view library interface
//!
//! Exposes the submission-status synchronization engine and the HTTP surface
//! for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use perfmap_common::events::EventBus;
use perfmap_common::time::{Clock, SystemClock};

use crate::models::Task;
use crate::services::{
    BackendClient, DetailFetcher, FetcherConfig, PageOrchestrator, RatingSubmitter,
    SchedulerConfig, StatusScheduler, SubmissionCache,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Page state + refresh triggers
    pub orchestrator: Arc<PageOrchestrator>,
    /// On-demand detail view fetches
    pub detail_fetcher: Arc<DetailFetcher>,
    /// Rating mutations
    pub rating_submitter: Arc<RatingSubmitter>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the engine with production defaults
    pub fn new(
        client: Arc<BackendClient>,
        tasks: Vec<Task>,
        reviewer: impl Into<String>,
        event_bus: EventBus,
    ) -> Self {
        Self::with_configs(
            client,
            tasks,
            reviewer,
            event_bus,
            SchedulerConfig::default(),
            FetcherConfig::default(),
            Arc::new(SystemClock),
        )
    }

    /// Wire the engine with explicit tuning (used by integration tests)
    pub fn with_configs(
        client: Arc<BackendClient>,
        tasks: Vec<Task>,
        reviewer: impl Into<String>,
        event_bus: EventBus,
        scheduler_config: SchedulerConfig,
        fetcher_config: FetcherConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tasks = Arc::new(RwLock::new(tasks));
        let cache = Arc::new(SubmissionCache::new(clock));
        let scheduler = Arc::new(StatusScheduler::with_config(
            client.clone(),
            cache.clone(),
            event_bus.clone(),
            scheduler_config,
        ));
        let orchestrator = Arc::new(PageOrchestrator::new(tasks.clone(), scheduler));
        let detail_fetcher = Arc::new(DetailFetcher::with_config(client.clone(), fetcher_config));
        let rating_submitter = Arc::new(RatingSubmitter::new(
            client,
            cache,
            tasks,
            detail_fetcher.clone(),
            event_bus.clone(),
            reviewer,
        ));

        Self {
            orchestrator,
            detail_fetcher,
            rating_submitter,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::map_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .with_state(state)
}
