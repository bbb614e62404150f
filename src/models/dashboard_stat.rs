//! Dashboard headline statistic schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::{default_true, ActiveFilter};
use crate::db::mongo::IntoIndexes;
use crate::resource::{FieldRules, Resource, SortKey, ValidationErrors, CREATED_AT_FIELD};

closed_set! {
    pub enum StatTrend {
        Up => "up",
        Down => "down",
    }
}

/// A labelled figure such as "Total mentions: 12.4K (+8%)"
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DashboardStat {
    pub label: String,
    pub value: String,
    pub change: String,
    pub trend: StatTrend,
    pub icon: String,

    #[serde(default)]
    pub order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Resource for DashboardStat {
    type Filter = ActiveFilter;

    const COLLECTION: &'static str = "dashboard_stats";
    const PATH: &'static str = "dashboard-stats";
    const LABEL: &'static str = "Dashboard stat";
    const PLURAL: &'static str = "dashboard stats";

    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldRules::new()
            .length("label", &self.label, 3, Some(100))
            .length("value", &self.value, 1, Some(50))
            .length("change", &self.change, 1, Some(20))
            .required("icon", &self.icon)
            .at_least("order", i64::from(self.order), 0)
            .finish()
    }

    fn sort_keys() -> &'static [SortKey] {
        const KEYS: &[SortKey] = &[SortKey::asc("order"), SortKey::desc(CREATED_AT_FIELD)];
        KEYS
    }
}

impl IntoIndexes for DashboardStat {
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
