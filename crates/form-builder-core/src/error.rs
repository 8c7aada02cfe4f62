//! Error types for the form builder engine
//!
//! Validation failures are not errors: they are reported as data through
//! [`crate::validation::ValidationReport`]. The types here cover schema
//! problems, formula evaluation, session misuse and configuration loading.

use thiserror::Error;

/// Structural problems in a form schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Form name is empty or whitespace
    #[error("Form name must not be blank")]
    BlankName,

    /// A field has an empty id
    #[error("Field at position {0} has an empty id")]
    EmptyFieldId(usize),

    /// Two fields share the same id
    #[error("Duplicate field id: {0}")]
    DuplicateFieldId(String),

    /// Options were attached to a field type that does not render them
    #[error("Field '{field}' of type {field_type} cannot carry options")]
    UnexpectedOptions { field: String, field_type: String },

    /// A minLength/maxLength rule has no numeric bound
    #[error("Rule '{rule}' on field '{field}' requires a numeric value")]
    MissingRuleValue { field: String, rule: String },

    /// A derived field lists a parent that is not in the schema
    #[error("Derived field '{field}' references unknown parent '{parent}'")]
    UnknownParent { field: String, parent: String },

    /// Derived fields depend on each other in a loop
    #[error("Derivation cycle detected: {}", .0.join(" -> "))]
    DerivationCycle(Vec<String>),

    /// A record could not be decoded into a valid field
    #[error("Invalid field definition: {0}")]
    InvalidField(String),
}

/// Failures inside the derivation engine
///
/// These never escape [`crate::derivation::DerivationEngine::evaluate`];
/// they are logged and replaced by the empty-string sentinel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DerivationError {
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("Malformed number '{0}'")]
    MalformedNumber(String),

    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },

    #[error("Formula nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Unresolved identifier '{0}'")]
    UnresolvedIdentifier(String),

    #[error("Field '{0}' does not hold a number")]
    NonNumericValue(String),

    #[error("Field '{0}' has no date value")]
    MissingDate(String),

    #[error("Field '{field}' holds an invalid date '{value}'")]
    InvalidDate { field: String, value: String },

    #[error("Formula produced a non-finite result")]
    NonFinite,
}

/// Misuse of a live form session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Derived fields are computed and cannot be edited
    #[error("Field '{0}' is derived and read-only")]
    ReadOnlyField(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(format!("TOML error: {}", err))
    }
}

/// Umbrella error for callers that drive several engine components
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Stored form JSON could not be decoded
    #[error("Form decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FormError {
    /// Check if this error was caused by user input rather than the host
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            FormError::Schema(_)
                | FormError::Session(_)
                | FormError::Derivation(_)
                | FormError::Decode(_)
        )
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, FormError>;
