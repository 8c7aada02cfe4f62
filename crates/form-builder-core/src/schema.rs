//! Form schema model
//!
//! Defines fields, validation rules and form schemas along with the builder
//! mutations (append, delete, move) that keep field `order` dense.
//!
//! The wire format uses the camelCase keys of the stored JSON collection
//! (`validationRules`, `isDerived`, `derivedConfig`, `createdAt`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use crate::error::SchemaError;
use crate::graph::DependencyGraph;
use crate::value::FieldValue;

/// Input control kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Textarea,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Date,
    ];

    /// Whether this type renders a list of options
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio | FieldType::Checkbox)
    }

    /// Label given to a freshly added field, e.g. "Text Field"
    pub fn default_label(&self) -> String {
        let name = self.to_string();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} Field", first.to_uppercase(), chars.as_str()),
            None => "Field".to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Number => write!(f, "number"),
            FieldType::Textarea => write!(f, "textarea"),
            FieldType::Select => write!(f, "select"),
            FieldType::Radio => write!(f, "radio"),
            FieldType::Checkbox => write!(f, "checkbox"),
            FieldType::Date => write!(f, "date"),
        }
    }
}

/// Kind of a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Email,
    Password,
}

impl RuleKind {
    /// Whether the rule needs a numeric `value`
    pub fn takes_value(&self) -> bool {
        matches!(self, RuleKind::MinLength | RuleKind::MaxLength)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Required => write!(f, "required"),
            RuleKind::MinLength => write!(f, "minLength"),
            RuleKind::MaxLength => write!(f, "maxLength"),
            RuleKind::Email => write!(f, "email"),
            RuleKind::Password => write!(f, "password"),
        }
    }
}

/// One constraint attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,

    /// Length bound for minLength/maxLength; fractional bounds are compared as-is
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_limit"
    )]
    pub value: Option<f64>,

    /// Returned verbatim when the rule fails
    #[serde(default)]
    pub message: String,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            value: None,
            message: message.into(),
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Required, message)
    }

    pub fn min_length(limit: usize, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MinLength, message).with_value(limit as f64)
    }

    pub fn max_length(limit: usize, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MaxLength, message).with_value(limit as f64)
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Email, message)
    }

    pub fn password(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Password, message)
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// Accepts a number, a numeric string, or null for a length bound
fn deserialize_limit<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let number = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite() && *n >= 0.0))
}

/// A selectable option of a choice field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Formula configuration of a derived field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedConfig {
    /// Ids of the fields the formula reads
    #[serde(default)]
    pub parent_fields: Vec<String>,
    #[serde(default)]
    pub formula: String,
}

impl DerivedConfig {
    pub fn new<I, S>(parents: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self {
            parent_fields: Vec::new(),
            formula: formula.into(),
        };
        for parent in parents {
            config.add_parent(parent);
        }
        config
    }

    /// Add a parent id, ignoring duplicates
    pub fn add_parent(&mut self, parent: impl Into<String>) {
        let parent = parent.into();
        if !self.parent_fields.contains(&parent) {
            self.parent_fields.push(parent);
        }
    }

    pub fn remove_parent(&mut self, parent: &str) {
        self.parent_fields.retain(|p| p != parent);
    }
}

/// One form input definition
///
/// A field is derived exactly when `derived` is `Some`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldRecord", into = "FieldRecord")]
pub struct Field {
    pub id: String,
    pub field_type: FieldType,
    pub label: String,
    /// Advisory only; enforcement is done by validation rules
    pub required: bool,
    pub default_value: Option<FieldValue>,
    pub validation_rules: Vec<ValidationRule>,
    pub options: Option<Vec<FieldOption>>,
    pub derived: Option<DerivedConfig>,
    pub order: usize,
}

impl Field {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            required: false,
            default_value: None,
            validation_rules: Vec::new(),
            options: None,
            derived: None,
            order: 0,
        }
    }

    /// A palette field with generated id, default label and default options
    pub fn generate(field_type: FieldType) -> Self {
        let mut field = Self::new(generate_id("field"), field_type, field_type.default_label());
        if field_type.is_choice() {
            field.options = Some(vec![
                FieldOption::new("option1", "Option 1"),
                FieldOption::new("option2", "Option 2"),
            ]);
        }
        field
    }

    pub fn is_derived(&self) -> bool {
        self.derived.is_some()
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = FieldOption>,
    {
        self.options = Some(options.into_iter().collect());
        self
    }

    pub fn with_derived(mut self, config: DerivedConfig) -> Self {
        self.derived = Some(config);
        self
    }

    /// Turn derivation on (with an empty config) or off
    pub fn set_derived(&mut self, derived: bool) {
        if derived {
            self.derived.get_or_insert_with(DerivedConfig::default);
        } else {
            self.derived = None;
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldRecord {
    id: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    label: String,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<FieldValue>,
    #[serde(default)]
    validation_rules: Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_derived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    derived_config: Option<DerivedConfig>,
    #[serde(default)]
    order: usize,
}

impl TryFrom<FieldRecord> for Field {
    type Error = SchemaError;

    fn try_from(record: FieldRecord) -> Result<Self, Self::Error> {
        let derived = match (record.is_derived.unwrap_or(false), record.derived_config) {
            (true, Some(config)) => Some(config),
            (true, None) => {
                return Err(SchemaError::InvalidField(format!(
                    "field '{}' is derived but has no derivedConfig",
                    record.id
                )))
            }
            (false, _) => None,
        };

        Ok(Field {
            id: record.id,
            field_type: record.field_type,
            label: record.label,
            required: record.required,
            default_value: record.default_value,
            validation_rules: record.validation_rules,
            options: record.options,
            derived,
            order: record.order,
        })
    }
}

impl From<Field> for FieldRecord {
    fn from(field: Field) -> Self {
        FieldRecord {
            id: field.id,
            field_type: field.field_type,
            label: field.label,
            required: field.required,
            default_value: field.default_value,
            validation_rules: field.validation_rules,
            options: field.options,
            is_derived: field.derived.is_some().then_some(true),
            derived_config: field.derived,
            order: field.order,
        }
    }
}

/// Direction for a one-position move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// A named, ordered collection of fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    pub created_at: DateTime<Utc>,
}

impl FormSchema {
    /// Create an empty form with a generated id and the current timestamp
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id("form"),
            name: name.into(),
            fields: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a field; builder-style
    pub fn with_field(mut self, field: Field) -> Self {
        self.push_field(field);
        self
    }

    /// Append a field with `order` set to the current field count
    pub fn push_field(&mut self, mut field: Field) {
        field.order = self.fields.len();
        self.fields.push(field);
    }

    /// Append a new palette field of the given type and return it
    pub fn add_field(&mut self, field_type: FieldType) -> &mut Field {
        self.push_field(Field::generate(field_type));
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }

    /// Remove a field and renumber the rest; unknown ids are a no-op
    pub fn remove_field(&mut self, id: &str) -> Option<Field> {
        self.normalize_order();
        let index = self.fields.iter().position(|f| f.id == id)?;
        let removed = self.fields.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Swap a field with its neighbour; returns false at the boundaries
    pub fn move_field(&mut self, id: &str, direction: MoveDirection) -> bool {
        self.normalize_order();
        let Some(index) = self.fields.iter().position(|f| f.id == id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.fields.len() => index + 1,
            _ => return false,
        };
        self.fields.swap(index, target);
        self.renumber();
        true
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Fields in render order
    pub fn sorted_fields(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }

    pub fn derived_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_derived())
    }

    /// Sort fields by `order` and renumber them 0..N-1
    pub fn normalize_order(&mut self) {
        self.fields.sort_by_key(|f| f.order);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (index, field) in self.fields.iter_mut().enumerate() {
            field.order = index;
        }
    }

    /// Structural validation of the whole schema
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::BlankName);
        }

        let mut seen = HashSet::new();
        for (position, field) in self.fields.iter().enumerate() {
            if field.id.is_empty() {
                return Err(SchemaError::EmptyFieldId(position));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateFieldId(field.id.clone()));
            }
            if field.options.is_some() && !field.field_type.is_choice() {
                return Err(SchemaError::UnexpectedOptions {
                    field: field.id.clone(),
                    field_type: field.field_type.to_string(),
                });
            }
            if let Some(rule) = field
                .validation_rules
                .iter()
                .find(|r| r.kind.takes_value() && r.value.is_none())
            {
                return Err(SchemaError::MissingRuleValue {
                    field: field.id.clone(),
                    rule: rule.kind.to_string(),
                });
            }
        }

        for field in self.derived_fields() {
            if let Some(config) = &field.derived {
                if let Some(parent) = config.parent_fields.iter().find(|p| !seen.contains(p.as_str())) {
                    return Err(SchemaError::UnknownParent {
                        field: field.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        DependencyGraph::build(self).map(|_| ())
    }
}

fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}
