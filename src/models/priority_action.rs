//! Priority action schema
//!
//! Recommended actions surfaced at the top of the dashboard. Unlike the other
//! entities these carry a workflow `status` and no display ordering.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::Trend;
use crate::db::mongo::IntoIndexes;
use crate::resource::{
    FieldRules, QueryParams, Resource, ResourceFilter, SortKey, ValidationErrors,
    CREATED_AT_FIELD,
};
use crate::types::ApiError;

closed_set! {
    pub enum Priority {
        Critical => "critical",
        High => "high",
        Medium => "medium",
    }
}

closed_set! {
    pub enum Impact {
        Critical => "Critical",
        High => "High",
        Medium => "Medium",
        Low => "Low",
    }
}

closed_set! {
    pub enum Effort {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

closed_set! {
    /// Workflow state of an action
    #[derive(Default)]
    pub enum ActionStatus {
        #[default]
        NotStarted => "not-started",
        InProgress => "in-progress",
        Completed => "completed",
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PriorityAction {
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub effort: Effort,
    pub recommendation: String,

    /// Number of conversations mentioning the issue
    pub mentions: i64,

    pub sentiment: f64,
    pub trend: Trend,
    pub icon: String,

    #[serde(default)]
    pub status: ActionStatus,
}

impl Resource for PriorityAction {
    type Filter = PriorityActionFilter;

    const COLLECTION: &'static str = "priority_actions";
    const PATH: &'static str = "priority-actions";
    const LABEL: &'static str = "Priority action";
    const PLURAL: &'static str = "priority actions";

    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldRules::new()
            .length("title", &self.title, 3, Some(255))
            .length("description", &self.description, 10, None)
            .length("recommendation", &self.recommendation, 10, None)
            .at_least("mentions", self.mentions, 0)
            .finite("sentiment", self.sentiment)
            .required("icon", &self.icon)
            .finish()
    }

    fn sort_keys() -> &'static [SortKey] {
        const KEYS: &[SortKey] = &[SortKey::desc(CREATED_AT_FIELD)];
        KEYS
    }
}

impl IntoIndexes for PriorityAction {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "priority": 1, "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("priority_status_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PriorityActionFilter {
    pub priority: Option<Priority>,
    pub status: Option<ActionStatus>,
}

impl ResourceFilter for PriorityActionFilter {
    fn from_query(params: &QueryParams) -> Result<Self, ApiError> {
        Ok(Self {
            priority: params.closed("priority", Priority::NAMES)?,
            status: params.closed("status", ActionStatus::NAMES)?,
        })
    }

    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(priority) = self.priority {
            filter.insert("priority", priority);
        }
        if let Some(status) = self.status {
            filter.insert("status", status);
        }
        filter
    }
}

/// Body of `PUT /priority-actions/{id}/status`
#[derive(Deserialize, Debug)]
pub struct StatusChange {
    pub status: String,
}
