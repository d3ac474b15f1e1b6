//! Page data orchestration
//!
//! Owns the pagination/search state of the performance-map view. Every
//! trigger (page change, page-size change, search change, arrow-key
//! navigation) recomputes the id set visible on the current page and forwards
//! the entire set to the status scheduler. Search and page-size changes reset
//! the page to 1; plain page navigation does not.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{SubmissionStatus, Task, WorkItemId};
use crate::services::status_scheduler::{RefreshOutcome, StatusScheduler};

/// Tasks shown per page by default
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Current pagination/search state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// 1-based page number
    pub page: usize,
    /// Tasks per page
    pub per_page: usize,
    /// Case-insensitive title filter; empty matches everything
    pub search: String,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
            search: String::new(),
        }
    }
}

/// Arrow keys driving page navigation, named as the front end reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum NavKey {
    ArrowLeft,
    ArrowRight,
}

/// Snapshot of the page state served to the front end
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub search: String,
    /// Tasks visible on the current page
    pub tasks: Vec<Task>,
    /// Submission status per visible work item id
    pub statuses: HashMap<WorkItemId, SubmissionStatus>,
}

/// Tasks matching the search term, in aggregate order
pub fn filter_tasks<'a>(tasks: &'a [Task], search: &str) -> Vec<&'a Task> {
    let needle = search.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| needle.is_empty() || task.title.to_lowercase().contains(&needle))
        .collect()
}

/// Number of pages for `task_count` tasks at `per_page`
pub fn total_pages(task_count: usize, per_page: usize) -> usize {
    task_count.div_ceil(per_page.max(1))
}

/// The tasks visible on `query.page`
pub fn visible_tasks<'a>(tasks: &'a [Task], query: &PageQuery) -> Vec<&'a Task> {
    let filtered = filter_tasks(tasks, &query.search);
    let per_page = query.per_page.max(1);
    let start = query.page.saturating_sub(1) * per_page;
    filtered.into_iter().skip(start).take(per_page).collect()
}

/// Distinct work item ids of the visible tasks, first-seen order
pub fn visible_ids(tasks: &[Task], query: &PageQuery) -> Vec<WorkItemId> {
    let mut seen = HashSet::new();
    visible_tasks(tasks, query)
        .iter()
        .flat_map(|task| task.items.iter())
        .map(|item| item.id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Orchestrates page state changes and status refresh triggers
pub struct PageOrchestrator {
    tasks: Arc<RwLock<Vec<Task>>>,
    query: RwLock<PageQuery>,
    scheduler: Arc<StatusScheduler>,
}

impl PageOrchestrator {
    pub fn new(tasks: Arc<RwLock<Vec<Task>>>, scheduler: Arc<StatusScheduler>) -> Self {
        Self {
            tasks,
            query: RwLock::new(PageQuery::default()),
            scheduler,
        }
    }

    /// Current query state
    pub async fn query(&self) -> PageQuery {
        self.query.read().await.clone()
    }

    /// Page count for the current search/page-size state
    pub async fn total_pages(&self) -> usize {
        let tasks = self.tasks.read().await;
        let query = self.query.read().await;
        total_pages(filter_tasks(&tasks, &query.search).len(), query.per_page)
    }

    /// Navigate to `page` (clamped to valid range); does not reset search
    pub async fn set_page(&self, page: usize) -> RefreshOutcome {
        let max_page = self.total_pages().await.max(1);
        {
            let mut query = self.query.write().await;
            query.page = page.clamp(1, max_page);
        }
        self.sync().await
    }

    /// Change the search term; resets the page to 1
    pub async fn set_search(&self, term: impl Into<String>) -> RefreshOutcome {
        {
            let mut query = self.query.write().await;
            query.search = term.into();
            query.page = 1;
        }
        self.sync().await
    }

    /// Change the page size; resets the page to 1
    pub async fn set_per_page(&self, per_page: usize) -> RefreshOutcome {
        {
            let mut query = self.query.write().await;
            query.per_page = per_page.max(1);
            query.page = 1;
        }
        self.sync().await
    }

    /// Arrow-key page navigation (±1 page, clamped).
    ///
    /// Ignored entirely while the search input has focus, so typing does not
    /// move the page.
    pub async fn navigate(&self, key: NavKey, search_focused: bool) -> Option<RefreshOutcome> {
        if search_focused {
            tracing::debug!(?key, "Ignoring navigation key while search input has focus");
            return None;
        }

        let current = self.query.read().await.page;
        let target = match key {
            NavKey::ArrowLeft => current.saturating_sub(1).max(1),
            NavKey::ArrowRight => current + 1,
        };
        Some(self.set_page(target).await)
    }

    /// Recompute the visible id set and trigger the scheduler with it
    pub async fn sync(&self) -> RefreshOutcome {
        let ids = {
            let tasks = self.tasks.read().await;
            let query = self.query.read().await;
            visible_ids(&tasks, &query)
        };
        self.scheduler.refresh(&ids).await
    }

    /// Snapshot of query state, visible tasks, and published statuses
    pub async fn page_view(&self) -> PageView {
        let tasks = self.tasks.read().await;
        let query = self.query.read().await;

        let filtered_count = filter_tasks(&tasks, &query.search).len();
        let visible: Vec<Task> = visible_tasks(&tasks, &query)
            .into_iter()
            .cloned()
            .collect();

        PageView {
            page: query.page,
            per_page: query.per_page,
            total_pages: total_pages(filtered_count, query.per_page),
            search: query.search.clone(),
            tasks: visible,
            statuses: self.scheduler.view().await,
        }
    }
}
