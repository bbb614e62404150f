//! Competitive analysis schema
//!
//! Share-of-voice comparison rows, one per brand.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::{default_true, ActiveFilter};
use crate::db::mongo::IntoIndexes;
use crate::resource::{FieldRules, Resource, SortKey, ValidationErrors};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CompetitiveAnalysis {
    pub name: String,
    pub share_of_voice: f64,
    pub sentiment: f64,

    #[serde(default)]
    pub engagement: f64,

    /// e.g. "#1 in Share of Voice"
    #[serde(default)]
    pub position: String,

    /// e.g. "Leading by 4%"
    #[serde(default)]
    pub gap_to_leader: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub order: i32,
}

impl Resource for CompetitiveAnalysis {
    type Filter = ActiveFilter;

    const COLLECTION: &'static str = "competitive_analyses";
    const PATH: &'static str = "competitive-analyses";
    const LABEL: &'static str = "Competitive analysis";
    const PLURAL: &'static str = "competitive analyses";

    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldRules::new()
            .length("name", &self.name, 2, Some(100))
            .between("share_of_voice", self.share_of_voice, 0.0, 100.0)
            .between("sentiment", self.sentiment, 0.0, 100.0)
            .non_negative("engagement", self.engagement)
            .finish()
    }

    fn sort_keys() -> &'static [SortKey] {
        const KEYS: &[SortKey] = &[SortKey::asc("order"), SortKey::desc("share_of_voice")];
        KEYS
    }
}

impl IntoIndexes for CompetitiveAnalysis {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "is_active": 1, "order": 1, "share_of_voice": -1 },
            Some(
                IndexOptions::builder()
                    .name("active_order_share_index".to_string())
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
    fn test_defaults() {
        let body = json!({ "name": "Acme", "share_of_voice": 38.5, "sentiment": 71.0 });
        let row: CompetitiveAnalysis = serde_json::from_value(body).unwrap();
        assert_eq!(row.engagement, 0.0);
        assert_eq!(row.position, "");
        assert_eq!(row.gap_to_leader, "");
        assert!(row.validate().is_ok());
    }

    #[test]
    fn test_ranges() {
        let row = CompetitiveAnalysis {
            name: "Globex".to_string(),
            share_of_voice: 100.1,
            sentiment: -5.0,
            engagement: -1.0,
            position: String::new(),
            gap_to_leader: String::new(),
            is_active: true,
            order: 0,
        };
        let errors = row.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
