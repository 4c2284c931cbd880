//! Per-field form validation for the source and destination configurations.

use std::{borrow::Cow, collections::BTreeMap};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::{DestinationConfig, SourceConfig};

/// Validation messages keyed by field name. Empty when the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// First message for a field, the one a form shows inline.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.field(name).first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        for (name, errors) in errors.field_errors() {
            let messages = errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string())
                })
                .collect::<Vec<_>>();
            fields.insert(name.to_string(), messages);
        }
        Self(fields)
    }
}

pub fn validate_source(config: &SourceConfig) -> FieldErrors {
    config.validate().map(|_| FieldErrors::default()).unwrap_or_else(FieldErrors::from)
}

pub fn validate_destination(config: &DestinationConfig) -> FieldErrors {
    config.validate().map(|_| FieldErrors::default()).unwrap_or_else(FieldErrors::from)
}

pub(crate) fn validate_host_url(value: &str) -> Result<(), ValidationError> {
    // Emptiness is reported by the length rule.
    if value.is_empty() {
        return Ok(());
    }
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("url").with_message(Cow::Borrowed("Invalid URL format")))
}

pub(crate) fn validate_auth_json(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    serde_json::from_str::<serde_json::Value>(value)
        .map(|_| ())
        .map_err(|_| {
            ValidationError::new("json")
                .with_message(Cow::Borrowed("Invalid JSON format for authentication"))
        })
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
