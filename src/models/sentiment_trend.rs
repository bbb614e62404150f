//! Sentiment trend schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::{default_true, null_as_default, ActiveFilter};
use crate::db::mongo::IntoIndexes;
use crate::resource::{FieldRules, Resource, SortKey, ValidationErrors, CREATED_AT_FIELD};

/// One point of the chart series
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SentimentDataPoint {
    pub date: String,
    pub positive: f64,
    pub negative: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SentimentTrend {
    pub title: String,

    /// Human-readable window, e.g. "Last 30 days"
    pub period: String,

    pub positive_percent: f64,
    pub negative_percent: f64,
    pub neutral_percent: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub trend_data: Vec<SentimentDataPoint>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub order: i32,
}

impl Resource for SentimentTrend {
    type Filter = ActiveFilter;

    const COLLECTION: &'static str = "sentiment_trends";
    const PATH: &'static str = "sentiment-trends";
    const LABEL: &'static str = "Sentiment trend";
    const PLURAL: &'static str = "sentiment trends";

    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldRules::new()
            .required("title", &self.title)
            .required("period", &self.period)
            .between("positive_percent", self.positive_percent, 0.0, 100.0)
            .between("negative_percent", self.negative_percent, 0.0, 100.0)
            .between("neutral_percent", self.neutral_percent, 0.0, 100.0)
            .finish()
    }

    fn sort_keys() -> &'static [SortKey] {
        const KEYS: &[SortKey] = &[SortKey::asc("order"), SortKey::desc(CREATED_AT_FIELD)];
        KEYS
    }
}

impl IntoIndexes for SentimentTrend {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "is_active": 1, "order": 1 },
            Some(
                IndexOptions::builder()
                    .name("active_order_index".to_string())
                    .build(),
            ),
        )]
    }
}
