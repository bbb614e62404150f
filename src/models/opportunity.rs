//! Opportunity schema

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
    pub enum Potential {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

closed_set! {
    pub enum Timeframe {
        ShortTerm => "Short-term",
        MediumTerm => "Medium-term",
        LongTerm => "Long-term",
    }
}

/// Display metric; `value` is preformatted text ("+24%", "3.2K")
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyMetric {
    pub label: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Opportunity {
    pub title: String,
    pub description: String,
    pub potential: Potential,
    pub confidence_score: i64,
    pub timeframe: Timeframe,
    pub category: String,
    pub trend: Trend,

    #[serde(default, deserialize_with = "null_as_default")]
    pub key_metrics: Vec<KeyMetric>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_actions: Vec<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub order: i32,
}

impl Resource for Opportunity {
    type Filter = OpportunityFilter;

    const COLLECTION: &'static str = "opportunities";
    const PATH: &'static str = "opportunities";
    const LABEL: &'static str = "Opportunity";
    const PLURAL: &'static str = "opportunities";

    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldRules::new()
            .length("title", &self.title, 3, Some(255))
            .length("description", &self.description, 10, None)
            .between("confidence_score", self.confidence_score as f64, 0.0, 100.0)
            .required("category", &self.category)
            .finish()
    }

    fn sort_keys() -> &'static [SortKey] {
        const KEYS: &[SortKey] = &[SortKey::asc("order"), SortKey::desc(CREATED_AT_FIELD)];
        KEYS
    }
}

impl IntoIndexes for Opportunity {
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
                doc! { "potential": 1 },
                Some(
                    IndexOptions::builder()
                        .name("potential_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OpportunityFilter {
    pub is_active: Option<bool>,
    pub potential: Option<Potential>,
}

impl ResourceFilter for OpportunityFilter {
    fn from_query(params: &QueryParams) -> Result<Self, ApiError> {
        Ok(Self {
            is_active: params.flag("is_active"),
            potential: params.closed("potential", Potential::NAMES)?,
        })
    }

    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(active) = self.is_active {
            filter.insert("is_active", active);
        }
        if let Some(potential) = self.potential {
            filter.insert("potential", potential);
        }
        filter
    }
}
