//! Derived-field evaluation
//!
//! A formula is either the age-from-date template or an arithmetic
//! expression over numeric field values. Formulas are compiled into a
//! [`Formula`] so the dependency graph can ask which fields they read.
//!
//! [`DerivationEngine::evaluate`] never fails: any problem is logged at
//! debug level and the empty-string sentinel is returned instead.

pub mod age;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::sync::Arc;

pub use age::{Clock, FixedClock, SystemClock};
pub use parser::{BinaryOp, Expr};

use crate::error::DerivationError;
use crate::value::{FieldValue, FormData};

/// A compiled derivation formula
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// Completed years since the date held by `field`
    Age { field: String },
    /// Arithmetic over number fields
    Arithmetic(Expr),
}

impl Formula {
    /// Compile formula text
    pub fn parse(formula: &str) -> Result<Self, DerivationError> {
        if let Some(field) = age::match_age_formula(formula) {
            return Ok(Formula::Age { field });
        }
        Expr::parse(formula).map(Formula::Arithmetic)
    }

    /// Field ids this formula reads
    pub fn references(&self) -> Vec<String> {
        match self {
            Formula::Age { field } => vec![field.clone()],
            Formula::Arithmetic(expr) => expr.references(),
        }
    }

    /// Evaluate against the current values with `today` for date math
    pub fn evaluate(
        &self,
        values: &FormData,
        today: chrono::NaiveDate,
    ) -> Result<FieldValue, DerivationError> {
        match self {
            Formula::Age { field } => {
                let raw = match values.get(field) {
                    Some(FieldValue::Text(s)) if !s.trim().is_empty() => s,
                    Some(FieldValue::Text(_)) | None => {
                        return Err(DerivationError::MissingDate(field.clone()))
                    }
                    Some(other) => {
                        return Err(DerivationError::InvalidDate {
                            field: field.clone(),
                            value: other.to_string(),
                        })
                    }
                };
                let birth = age::parse_date(field, raw)?;
                Ok(FieldValue::Number(f64::from(age::completed_years(birth, today))))
            }
            Formula::Arithmetic(expr) => {
                let result = expr.eval(&|id: &str| resolve_number(values, id))?;
                if result.is_finite() {
                    Ok(FieldValue::Number(result))
                } else {
                    Err(DerivationError::NonFinite)
                }
            }
        }
    }
}

fn resolve_number(values: &FormData, id: &str) -> Result<f64, DerivationError> {
    match values.get(id) {
        Some(FieldValue::Number(n)) => Ok(*n),
        Some(_) => Err(DerivationError::NonNumericValue(id.to_string())),
        None => Err(DerivationError::UnresolvedIdentifier(id.to_string())),
    }
}

/// Evaluates derived-field formulas against live values
#[derive(Clone)]
pub struct DerivationEngine {
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for DerivationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivationEngine")
            .field("today", &self.clock.today())
            .finish()
    }
}

impl Default for DerivationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivationEngine {
    /// Engine reading the host's local date
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    /// Evaluate formula text; failures yield the empty-string sentinel
    pub fn evaluate(&self, formula: &str, values: &FormData) -> FieldValue {
        self.try_evaluate(formula, values).unwrap_or_else(|e| {
            tracing::debug!(formula = formula, error = %e, "Derived value unavailable");
            FieldValue::empty()
        })
    }

    /// Evaluate formula text, reporting why it failed
    pub fn try_evaluate(&self, formula: &str, values: &FormData) -> Result<FieldValue, DerivationError> {
        Formula::parse(formula)?.evaluate(values, self.clock.today())
    }

    /// Evaluate an already compiled formula; failures yield the sentinel
    pub fn evaluate_compiled(&self, formula: &Formula, values: &FormData) -> FieldValue {
        formula
            .evaluate(values, self.clock.today())
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Derived value unavailable");
                FieldValue::empty()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn engine() -> DerivationEngine {
        DerivationEngine::with_clock(FixedClock(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()))
    }

    fn data(pairs: &[(&str, FieldValue)]) -> FormData {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    const AGE: &str = "new Date().getFullYear() - new Date(dob).getFullYear()";

    #[test]
    fn test_age_before_and_on_birthday() {
        let engine = engine();
        let tomorrow = data(&[("dob", FieldValue::text("2000-06-16"))]);
        assert_eq!(engine.evaluate(AGE, &tomorrow), FieldValue::Number(23.0));

        let today = data(&[("dob", FieldValue::text("2000-06-15"))]);
        assert_eq!(engine.evaluate(AGE, &today), FieldValue::Number(24.0));
    }

    #[test]
    fn test_age_without_value_is_blank() {
        let engine = engine();
        assert!(engine.evaluate(AGE, &FormData::new()).is_blank());
        assert!(engine.evaluate(AGE, &data(&[("dob", FieldValue::text(""))])).is_blank());
        assert!(engine.evaluate(AGE, &data(&[("dob", FieldValue::text("soon"))])).is_blank());
    }

    #[test]
    fn test_arithmetic_over_numbers() {
        let values = data(&[("a", FieldValue::Number(3.0)), ("b", FieldValue::Number(4.0))]);
        assert_eq!(engine().evaluate("a * b", &values), FieldValue::Number(12.0));
        assert_eq!(engine().evaluate("(a + b) / 2", &values), FieldValue::Number(3.5));
    }

    #[test]
    fn test_no_partial_token_substitution() {
        let values = data(&[("a", FieldValue::Number(1.0)), ("tax", FieldValue::Number(2.0))]);
        assert_eq!(engine().evaluate("tax + a", &values), FieldValue::Number(3.0));
    }

    #[test]
    fn test_unresolvable_formulas_are_blank() {
        let values = data(&[("name", FieldValue::text("Ada")), ("n", FieldValue::Number(2.0))]);
        let engine = engine();
        assert!(engine.evaluate("name + 1", &values).is_blank());
        assert!(engine.evaluate("missing * n", &values).is_blank());
        assert!(engine.evaluate("n > 1", &values).is_blank());
        assert!(engine.evaluate("n / 0", &values).is_blank());
        assert!(engine.evaluate("", &values).is_blank());
        assert!(engine.evaluate("Math.max(n, 1)", &values).is_blank());
    }

    #[test]
    fn test_deeply_nested_formula_is_blank() {
        let deep = format!("{}1{}", "(".repeat(30_000), ")".repeat(30_000));
        assert!(engine().evaluate(&deep, &FormData::new()).is_blank());
        assert!(matches!(
            engine().try_evaluate(&deep, &FormData::new()),
            Err(DerivationError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_try_evaluate_reports_reason() {
        let values = data(&[("name", FieldValue::text("Ada"))]);
        assert_eq!(
            engine().try_evaluate("name * 2", &values),
            Err(DerivationError::NonNumericValue("name".into()))
        );
        assert_eq!(
            engine().try_evaluate(AGE, &FormData::new()),
            Err(DerivationError::MissingDate("dob".into()))
        );
    }

    #[test]
    fn test_formula_references() {
        assert_eq!(Formula::parse(AGE).unwrap().references(), vec!["dob"]);
        assert_eq!(Formula::parse("price * qty + price").unwrap().references(), vec!["price", "qty"]);
    }
}
