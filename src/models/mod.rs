//! Dashboard entities
//!
//! One module per resource: the field set, its validation rules, list filter,
//! sort order and collection indexes.

use bson::Document;
use serde::{Deserialize, Deserializer};

use crate::resource::{QueryParams, ResourceFilter};
use crate::types::ApiError;

/// Declare a string enum restricted to a fixed set of wire values.
///
/// Generates serde renames, `NAMES` (wire values in declaration order),
/// `ALL`, `as_str`, `Display` and a conversion into `Bson` for filters.
macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const NAMES: &'static [&'static str] = &[$($value),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for bson::Bson {
            fn from(value: $name) -> Self {
                bson::Bson::String(value.as_str().to_string())
            }
        }
    };
}

pub mod competitive_analysis;
pub mod conversation_cluster;
pub mod dashboard_stat;
pub mod discussion_topic;
pub mod opportunity;
pub mod priority_action;
pub mod risk;
pub mod sentiment_trend;

pub use competitive_analysis::CompetitiveAnalysis;
pub use conversation_cluster::{ClusterTrend, ConversationCluster};
pub use dashboard_stat::{DashboardStat, StatTrend};
pub use discussion_topic::DiscussionTopic;
pub use opportunity::{KeyMetric, Opportunity, OpportunityFilter, Potential, Timeframe};
pub use priority_action::{
    ActionStatus, Effort, Impact, Priority, PriorityAction, PriorityActionFilter, StatusChange,
};
pub use risk::{Risk, RiskFilter, RiskIndicator, Severity};
pub use sentiment_trend::{SentimentDataPoint, SentimentTrend};

closed_set! {
    /// Direction of a tracked signal, shared by actions, risks and opportunities
    pub enum Trend {
        Increasing => "increasing",
        Decreasing => "decreasing",
        Stable => "stable",
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/// Read an explicit `null` the same as a missing key
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Filter for entities whose only list predicate is `is_active`
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActiveFilter {
    pub is_active: Option<bool>,
}

impl ResourceFilter for ActiveFilter {
    fn from_query(params: &QueryParams) -> Result<Self, ApiError> {
        Ok(Self {
            is_active: params.flag("is_active"),
        })
    }

    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(active) = self.is_active {
            filter.insert("is_active", active);
        }
        filter
    }
}
