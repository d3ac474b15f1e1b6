//! Wire and view types for the performance-map view
//!
//! Field names follow the dashboard API's camelCase JSON convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque integer identifier of a unit of work (a subtask)
pub type WorkItemId = i64;

/// Assignee summary nested in a work item
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub id: i64,
    pub name: String,
}

/// A unit of work within a task
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: WorkItemId,
    pub title: String,
    pub is_done: bool,
    pub assignee: Option<Assignee>,
}

/// Task aggregate with its nested work items
///
/// Loaded once at startup from `GET /tasks?ownerId=...` and mutated only by
/// the rating submitter (completion flags).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub items: Vec<WorkItem>,
}

/// Minimal submission projection cached per work item
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub submission_id: i64,
    pub file_ref: String,
    pub has_review: bool,
}

/// Review of a submission
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    /// Rating in 1..=5
    pub rating: u8,
    pub reviewed_by: String,
    pub reviewed_at: DateTime<Utc>,
}

/// Full submission record for one work item
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
    pub id: i64,
    pub work_item_id: WorkItemId,
    pub file_ref: String,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub is_revised: bool,
    pub work_item: WorkItem,
    pub review: Option<ReviewRecord>,
}

impl SubmissionDetail {
    /// Project this detail down to the cacheable summary
    pub fn summary(&self) -> SubmissionSummary {
        SubmissionSummary {
            submission_id: self.id,
            file_ref: self.file_ref.clone(),
            has_review: self.review.is_some(),
        }
    }
}

/// Per-item status published to the page view
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SubmissionStatus {
    /// No submission known for the item (404, or fetch still unresolved)
    NotSubmitted,
    /// A submission exists
    #[serde(rename_all = "camelCase")]
    Submitted { file_ref: String, has_review: bool },
}

impl SubmissionStatus {
    pub fn from_summary(summary: &SubmissionSummary) -> Self {
        SubmissionStatus::Submitted {
            file_ref: summary.file_ref.clone(),
            has_review: summary.has_review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_decodes_camel_case() {
        let json = r#"{
            "id": 1,
            "title": "Q3 rollout",
            "status": "active",
            "items": [
                {
                    "id": 11,
                    "title": "Draft plan",
                    "isDone": false,
                    "assignee": {"id": 5, "name": "Kim"}
                }
            ]
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.items.len(), 1);
        assert_eq!(task.items[0].id, 11);
        assert!(!task.items[0].is_done);
        assert_eq!(task.items[0].assignee.as_ref().unwrap().name, "Kim");
    }

    #[test]
    fn test_detail_summary_projection() {
        let detail = SubmissionDetail {
            id: 900,
            work_item_id: 11,
            file_ref: "uploads/plan.pdf".to_string(),
            comment: None,
            submitted_at: Utc::now(),
            is_revised: false,
            work_item: WorkItem {
                id: 11,
                title: "Draft plan".to_string(),
                is_done: false,
                assignee: None,
            },
            review: None,
        };

        let summary = detail.summary();
        assert_eq!(summary.submission_id, 900);
        assert_eq!(summary.file_ref, "uploads/plan.pdf");
        assert!(!summary.has_review);
    }

    #[test]
    fn test_submission_status_serializes_state_tag() {
        let status = SubmissionStatus::Submitted {
            file_ref: "uploads/plan.pdf".to_string(),
            has_review: true,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"state\":\"submitted\""));
        assert!(json.contains("\"hasReview\":true"));

        let json = serde_json::to_string(&SubmissionStatus::NotSubmitted).unwrap();
        assert!(json.contains("\"state\":\"notSubmitted\""));
    }
}
