//! Risk schema
//!
//! Emerging reputational or operational risks detected in conversations,
//! with supporting indicators and mitigation steps.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::{default_true, null_as_default, Trend};
use crate::db::mongo::IntoIndexes;
use crate::resource::{
    FieldRules, QueryParams, Resource, ResourceFilter, SortKey, ValidationErrors,
    CREATED_AT_FIELD,
};
use crate::types::ApiError;

closed_set! {
    pub enum Severity {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RiskIndicator {
    pub label: String,
    pub value: f64,
    pub change: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Risk {
    pub title: String,
    pub description: String,
    pub severity: Severity,

    /// Likelihood in percent
    pub probability: i64,

    pub impact_assessment: String,
    pub trend: Trend,

    #[serde(default, deserialize_with = "null_as_default")]
    pub indicators: Vec<RiskIndicator>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub mitigation_strategy: Vec<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub order: i32,
}

impl Resource for Risk {
    type Filter = RiskFilter;

    const COLLECTION: &'static str = "risks";
    const PATH: &'static str = "risks";
    const LABEL: &'static str = "Risk";
    const PLURAL: &'static str = "risks";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut rules = FieldRules::new();
        rules
            .length("title", &self.title, 3, Some(255))
            .length("description", &self.description, 10, None)
            .between("probability", self.probability as f64, 0.0, 100.0)
            .required("impact_assessment", &self.impact_assessment);

        for (i, indicator) in self.indicators.iter().enumerate() {
            rules
                .finite(&format!("indicators[{}].value", i), indicator.value)
                .finite(&format!("indicators[{}].change", i), indicator.change);
        }

        rules.finish()
    }

    fn sort_keys() -> &'static [SortKey] {
        const KEYS: &[SortKey] = &[SortKey::asc("order"), SortKey::desc(CREATED_AT_FIELD)];
        KEYS
    }
}

impl IntoIndexes for Risk {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "is_active": 1, "order": 1 },
                Some(
                    IndexOptions::builder()
                        .name("active_order_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "severity": 1 },
                Some(
                    IndexOptions::builder()
                        .name("severity_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RiskFilter {
    pub is_active: Option<bool>,
    pub severity: Option<Severity>,
}

impl ResourceFilter for RiskFilter {
    fn from_query(params: &QueryParams) -> Result<Self, ApiError> {
        Ok(Self {
            is_active: params.flag("is_active"),
            severity: params.closed("severity", Severity::NAMES)?,
        })
    }

    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(active) = self.is_active {
            filter.insert("is_active", active);
        }
        if let Some(severity) = self.severity {
            filter.insert("severity", severity);
        }
        filter
    }
}
