//! Field and form validation
//!
//! [`validate`] checks one value against an ordered rule list and returns
//! the failure messages in rule order. Every rule is evaluated; a field can
//! collect several messages at once.

pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::{FormSchema, ValidationRule};
use crate::value::{FieldValue, FormData};

pub use rules::{EmailRule, LengthRule, PasswordRule, RequiredRule, Rule};

/// Validate a value against rules, returning failure messages in rule order
pub fn validate(value: Option<&FieldValue>, rules: &[ValidationRule]) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rules::violates(rule, value))
        .map(|rule| rule.message.clone())
        .collect()
}

/// Per-field error messages from validating a whole form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no field produced a message
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record messages for a field; empty lists are ignored
    pub fn insert(&mut self, field_id: impl Into<String>, messages: Vec<String>) {
        if !messages.is_empty() {
            self.errors.insert(field_id.into(), messages);
        }
    }

    pub fn remove(&mut self, field_id: &str) -> Option<Vec<String>> {
        self.errors.remove(field_id)
    }

    /// Messages for one field (empty when it passed)
    pub fn errors_for(&self, field_id: &str) -> &[String] {
        self.errors.get(field_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of fields with at least one message
    pub fn field_count(&self) -> usize {
        self.errors.len()
    }

    /// Total number of messages across fields
    pub fn message_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.errors
    }
}

/// Validate every non-derived field of a schema against `data`
pub fn validate_form(schema: &FormSchema, data: &FormData) -> ValidationReport {
    let mut report = ValidationReport::new();
    for field in schema.fields.iter().filter(|f| !f.is_derived()) {
        report.insert(field.id.clone(), validate(data.get(&field.id), &field.validation_rules));
    }
    report
}
