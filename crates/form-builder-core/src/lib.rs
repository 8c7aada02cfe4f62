//! Form Builder Core
//!
//! Schema model, validation rules and derived-field evaluation for a
//! dynamic form builder.
//!
//! ## Architecture
//!
//! 1. **Schema** (`schema`): fields, validation rules and forms, plus the
//!    builder mutations that keep field order dense.
//!
//! 2. **Validation** (`validation`): per-value rule checks returning the
//!    failure messages in rule order, and form-level reports.
//!
//! 3. **Derivation** (`derivation`): age-from-date formulas and tokenized
//!    arithmetic over number fields. Failures yield a blank value.
//!
//! 4. **Graph** (`graph`): derived-field dependencies, topological order and
//!    cycle rejection.
//!
//! 5. **Session** (`session`): the live value map of one form instance.
//!
//! ## Example
//!
//! ```rust
//! use form_builder_core::{
//!     DerivationEngine, DerivedConfig, Field, FieldType, FieldValue, FormSchema, FormSession,
//!     ValidationRule,
//! };
//!
//! let schema = FormSchema::new("Order")
//!     .with_field(
//!         Field::new("price", FieldType::Number, "Price")
//!             .with_rule(ValidationRule::required("Price is required")),
//!     )
//!     .with_field(Field::new("qty", FieldType::Number, "Quantity"))
//!     .with_field(
//!         Field::new("total", FieldType::Number, "Total")
//!             .with_derived(DerivedConfig::new(["price", "qty"], "price * qty")),
//!     );
//!
//! let mut session = FormSession::new(schema, DerivationEngine::new()).unwrap();
//! session.set_value("price", 2.5).unwrap();
//! session.set_value("qty", 4.0).unwrap();
//! assert_eq!(session.value("total"), Some(&FieldValue::Number(10.0)));
//! assert!(session.submit().is_ok());
//! ```

pub mod config;
pub mod derivation;
pub mod error;
pub mod graph;
pub mod schema;
pub mod session;
pub mod telemetry;
pub mod validation;
pub mod value;

pub use config::{EngineConfig, EngineConfigBuilder, DEFAULT_STORAGE_KEY};
pub use derivation::{Clock, DerivationEngine, FixedClock, Formula, SystemClock};
pub use error::{ConfigError, DerivationError, FormError, Result, SchemaError, SessionError};
pub use graph::DependencyGraph;
pub use schema::{
    DerivedConfig, Field, FieldOption, FieldType, FormSchema, MoveDirection, RuleKind,
    ValidationRule,
};
pub use session::FormSession;
pub use validation::{validate, validate_form, ValidationReport};
pub use value::{FieldValue, FormData};

/// Evaluate a formula with the system clock; failures yield a blank value
pub fn evaluate(formula: &str, values: &FormData) -> FieldValue {
    DerivationEngine::new().evaluate(formula, values)
}
