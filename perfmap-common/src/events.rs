//! Event types for the perfmap view event system
//!
//! Provides the shared ViewEvent definitions and EventBus. Events are
//! broadcast in-process and serialized for SSE transmission to connected
//! front ends, which drive loading indicators and save confirmations from
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// perfmap view events
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewEvent {
    /// A status refresh run started for the current page
    ///
    /// Triggers:
    /// - SSE: show the page loading indicator
    StatusRefreshStarted {
        /// Run generation (monotonically increasing)
        generation: u64,
        /// Number of work items the run will fetch
        requested: usize,
        /// When the run started
        timestamp: DateTime<Utc>,
    },

    /// A status refresh run finished and the view map was republished
    ///
    /// Triggers:
    /// - SSE: hide the loading indicator, re-render status cells
    StatusRefreshCompleted {
        /// Run generation
        generation: u64,
        /// Work items resolved and merged into the cache
        resolved: usize,
        /// Work items that failed (timeout/network) and stayed misses
        failed: usize,
        /// When the run finished
        timestamp: DateTime<Utc>,
    },

    /// A rating was saved for a work item
    ///
    /// Triggers:
    /// - SSE: show the save confirmation, update the status cell
    RatingSaved {
        /// Work item the review belongs to
        work_item_id: i64,
        /// Saved rating (1-5)
        rating: u8,
        /// Whether the follow-up completion-flag update succeeded
        done_flag_updated: bool,
        /// When the rating was saved
        timestamp: DateTime<Utc>,
    },
}

impl ViewEvent {
    /// Event type name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            ViewEvent::StatusRefreshStarted { .. } => "StatusRefreshStarted",
            ViewEvent::StatusRefreshCompleted { .. } => "StatusRefreshCompleted",
            ViewEvent::RatingSaved { .. } => "RatingSaved",
        }
    }
}

/// Broadcast bus for view events
///
/// Wraps tokio::sync::broadcast: subscribers receive events emitted after
/// they subscribe; slow subscribers drop the oldest buffered events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ViewEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the subscriber count, or an error when nobody is listening.
    /// Having no SSE client connected is normal, so callers log the error at
    /// debug level at most.
    pub fn emit(
        &self,
        event: ViewEvent,
    ) -> Result<usize, broadcast::error::SendError<ViewEvent>> {
        self.tx.send(event)
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
