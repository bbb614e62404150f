//! Discussion topic schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::{default_true, ActiveFilter};
use crate::db::mongo::IntoIndexes;
use crate::resource::{FieldRules, Resource, SortKey, ValidationErrors};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiscussionTopic {
    pub name: String,
    pub volume: i64,
    pub sentiment_score: f64,

    /// Bar colour used by the frontend
    #[serde(default)]
    pub color: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub order: i32,
}

impl Resource for DiscussionTopic {
    type Filter = ActiveFilter;

    const COLLECTION: &'static str = "discussion_topics";
    const PATH: &'static str = "discussion-topics";
    const LABEL: &'static str = "Discussion topic";
    const PLURAL: &'static str = "discussion topics";

    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldRules::new()
            .length("name", &self.name, 2, Some(100))
            .at_least("volume", self.volume, 0)
            .finite("sentiment_score", self.sentiment_score)
            .finish()
    }

    fn sort_keys() -> &'static [SortKey] {
        const KEYS: &[SortKey] = &[SortKey::asc("order"), SortKey::desc("volume")];
        KEYS
    }
}

impl IntoIndexes for DiscussionTopic {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "is_active": 1, "order": 1, "volume": -1 },
            Some(
                IndexOptions::builder()
                    .name("active_order_volume_index".to_string())
                    .build(),
            ),
        )]
    }
}
