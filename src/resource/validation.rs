//! Field-level validation rules
//!
//! Entities describe their constraints with a [`FieldRules`] builder; every
//! violated rule is collected so a client sees all problems at once.

use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Serialize;
use std::fmt;

/// A single violated rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All rules violated by one candidate entity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Wrap a decoder message that is not tied to a single field
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: String::new(),
                message: message.into(),
            }],
        }
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether any violation is reported against `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| {
                if e.field.is_empty() {
                    e.message.clone()
                } else {
                    format!("{} {}", e.field, e.message)
                }
            })
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Rule builder used by each entity's `validate`
#[derive(Debug, Default)]
pub struct FieldRules {
    errors: ValidationErrors,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-empty string
    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.errors.push(field, "is required");
        }
        self
    }

    /// Required string whose length (in characters) lies within bounds
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: Option<usize>) -> &mut Self {
        if value.is_empty() {
            self.errors.push(field, "is required");
            return self;
        }

        let len = value.chars().count();
        if len < min {
            self.errors
                .push(field, format!("must be at least {} characters", min));
        }
        if let Some(max) = max {
            if len > max {
                self.errors
                    .push(field, format!("must be at most {} characters", max));
            }
        }
        self
    }

    /// Integer lower bound
    pub fn at_least(&mut self, field: &str, value: i64, min: i64) -> &mut Self {
        if value < min {
            self.errors.push(field, format!("must be at least {}", min));
        }
        self
    }

    /// Inclusive numeric range
    pub fn between(&mut self, field: &str, value: f64, min: f64, max: f64) -> &mut Self {
        if !value.is_finite() {
            self.errors.push(field, "must be a finite number");
        } else if value < min || value > max {
            self.errors
                .push(field, format!("must be between {} and {}", min, max));
        }
        self
    }

    /// Numeric lower bound for floating point fields
    pub fn non_negative(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.errors.push(field, "must be a finite number");
        } else if value < 0.0 {
            self.errors.push(field, "must be at least 0");
        }
        self
    }

    pub fn finite(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.errors.push(field, "must be a finite number");
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

/// Parse a raw string into one of a closed set of values.
///
/// `allowed` is only used to build the error message.
pub fn parse_closed<T: DeserializeOwned>(
    field: &str,
    raw: &str,
    allowed: &[&str],
) -> Result<T, ValidationErrors> {
    let deserializer: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
        raw.into_deserializer();
    T::deserialize(deserializer).map_err(|_| {
        let mut errors = ValidationErrors::default();
        errors.push(field, format!("must be one of: {}", allowed.join(", ")));
        errors
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionStatus;

    #[test]
    fn test_length_rules() {
        let mut rules = FieldRules::new();
        rules
            .length("title", "ab", 3, Some(255))
            .length("description", "", 10, None)
            .length("theme", "ok theme", 2, Some(200));

        let errors = rules.finish().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("title"));
        assert!(errors.has_field("description"));
        assert!(!errors.has_field("theme"));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut rules = FieldRules::new();
        // three characters, six bytes
        rules.length("label", "éàü", 3, Some(3));
        assert!(rules.finish().is_ok());
    }

    #[test]
    fn test_numeric_rules() {
        let mut rules = FieldRules::new();
        rules
            .between("probability", 101.0, 0.0, 100.0)
            .at_least("mentions", -1, 0)
            .finite("sentiment", f64::NAN)
            .non_negative("engagement", 0.0);

        let errors = rules.finish().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(!errors.has_field("engagement"));
    }

    #[test]
    fn test_display_joins_messages() {
        let mut rules = FieldRules::new();
        rules.required("icon", "").at_least("size", -5, 0);
        let errors = rules.finish().unwrap_err();
        assert_eq!(errors.to_string(), "icon is required; size must be at least 0");
    }

    #[test]
    fn test_parse_closed() {
        let status: ActionStatus =
            parse_closed("status", "in-progress", ActionStatus::NAMES).unwrap();
        assert_eq!(status, ActionStatus::InProgress);

        let err = parse_closed::<ActionStatus>("status", "done", ActionStatus::NAMES).unwrap_err();
        assert!(err.has_field("status"));
        assert!(err.to_string().contains("not-started, in-progress, completed"));
    }
}
