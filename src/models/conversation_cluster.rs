//! Conversation cluster schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::{default_true, null_as_default, ActiveFilter};
use crate::db::mongo::IntoIndexes;
use crate::resource::{FieldRules, Resource, SortKey, ValidationErrors};

closed_set! {
    #[derive(Default)]
    pub enum ClusterTrend {
        Up => "up",
        Down => "down",
        #[default]
        Stable => "stable",
    }
}

/// A theme grouping related conversations
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConversationCluster {
    pub theme: String,

    /// Number of mentions in the cluster
    pub size: i64,

    pub sentiment: f64,

    #[serde(default)]
    pub trend: ClusterTrend,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub order: i32,
}

impl Resource for ConversationCluster {
    type Filter = ActiveFilter;

    const COLLECTION: &'static str = "conversation_clusters";
    const PATH: &'static str = "conversation-clusters";
    const LABEL: &'static str = "Conversation cluster";
    const PLURAL: &'static str = "conversation clusters";

    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldRules::new()
            .length("theme", &self.theme, 2, Some(200))
            .at_least("size", self.size, 0)
            .finite("sentiment", self.sentiment)
            .finish()
    }

    fn sort_keys() -> &'static [SortKey] {
        const KEYS: &[SortKey] = &[SortKey::asc("order"), SortKey::desc("size")];
        KEYS
    }
}

impl IntoIndexes for ConversationCluster {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "is_active": 1, "order": 1, "size": -1 },
            Some(
                IndexOptions::builder()
                    .name("active_order_size_index".to_string())
                    .build(),
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trend_defaults_to_stable() {
        let body = json!({ "theme": "Refunds", "size": 88, "sentiment": -0.2 });
        let cluster: ConversationCluster = serde_json::from_value(body).unwrap();
        assert_eq!(cluster.trend, ClusterTrend::Stable);
        assert!(cluster.keywords.is_empty());
    }

    #[test]
    fn test_trend_outside_set_is_rejected() {
        let body = json!({ "theme": "Refunds", "size": 88, "sentiment": -0.2, "trend": "sideways" });
        assert!(serde_json::from_value::<ConversationCluster>(body).is_err());
    }

    #[test]
    fn test_theme_length_and_size() {
        let cluster = ConversationCluster {
            theme: "r".repeat(201),
            size: -1,
            sentiment: 0.0,
            trend: ClusterTrend::Down,
            keywords: vec![],
            is_active: true,
            order: 0,
        };
        let errors = cluster.validate().unwrap_err();
        assert!(errors.has_field("theme"));
        assert!(errors.has_field("size"));
    }
}
