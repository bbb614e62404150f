//! Query string parsing for list endpoints

use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::resource::validation::parse_closed;
use crate::resource::PageRequest;
use crate::types::ApiError;

/// Decoded `key=value` pairs from a request URI.
///
/// A key given more than once keeps its last value.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    values: HashMap<String, String>,
}

impl QueryParams {
    pub fn from_query_string(query: Option<&str>) -> Self {
        let mut values = HashMap::new();

        if let Some(q) = query {
            for pair in q.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                let key = decode_component(key);
                let value = decode_component(value);
                values.insert(key, value);
            }
        }

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// `limit` and `offset`, falling back to defaults for missing or bad values
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();

        let limit = self
            .get("limit")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .map(|v| v.min(PageRequest::MAX_LIMIT))
            .unwrap_or(defaults.limit);

        let offset = self
            .get("offset")
            .and_then(|v| v.parse::<u64>().ok())
            .map(|v| v.min(PageRequest::MAX_OFFSET))
            .unwrap_or(defaults.offset);

        PageRequest { limit, offset }
    }

    /// `true` and `false` select a state; any other value means no predicate
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }

    /// Closed-set value; empty means no predicate, unknown values are rejected
    pub fn closed<T: DeserializeOwned>(
        &self,
        key: &str,
        allowed: &[&str],
    ) -> Result<Option<T>, ApiError> {
        match self.get(key) {
            None | Some("") => Ok(None),
            Some(raw) => Ok(Some(parse_closed(key, raw, allowed)?)),
        }
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|v| v.into_owned())
        .unwrap_or(spaced)
}
