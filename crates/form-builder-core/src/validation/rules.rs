//! Built-in validation rules
//!
//! Each rule checks a single value in isolation. Rules that only make sense
//! for text (length, email, password) exempt absent, empty and non-text
//! values so they can be combined with `required` to force presence.

use regex::Regex;
use std::sync::OnceLock;

use crate::schema::{RuleKind, ValidationRule};
use crate::value::FieldValue;

/// A single-value validation rule
pub trait Rule: Send + Sync {
    /// Identifier matching the stored rule `type`
    fn id(&self) -> &str;

    /// Description of what this rule validates
    fn description(&self) -> &str;

    fn kind(&self) -> RuleKind;

    /// Whether `value` fails this rule
    fn violates(&self, value: Option<&FieldValue>) -> bool;
}

/// Non-empty text of a value, if it has any
fn non_empty_text(value: Option<&FieldValue>) -> Option<&str> {
    match value {
        Some(FieldValue::Text(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Fails on absent or falsy values and on whitespace-only text
///
/// Numeric zero and `false` fail too.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredRule;

impl Rule for RequiredRule {
    fn id(&self) -> &str {
        "required"
    }

    fn description(&self) -> &str {
        "Value must be present and non-empty"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Required
    }

    fn violates(&self, value: Option<&FieldValue>) -> bool {
        match value {
            None => true,
            Some(FieldValue::Text(s)) => s.trim().is_empty(),
            Some(other) => !other.is_truthy(),
        }
    }
}

/// Which side of a length bound is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthBound {
    Min,
    Max,
}

/// Character-count bound on text values
#[derive(Debug, Clone, Copy)]
pub struct LengthRule {
    bound: LengthBound,
    limit: Option<f64>,
}

impl LengthRule {
    pub fn min(limit: Option<f64>) -> Self {
        Self {
            bound: LengthBound::Min,
            limit,
        }
    }

    pub fn max(limit: Option<f64>) -> Self {
        Self {
            bound: LengthBound::Max,
            limit,
        }
    }
}

impl Rule for LengthRule {
    fn id(&self) -> &str {
        match self.bound {
            LengthBound::Min => "minLength",
            LengthBound::Max => "maxLength",
        }
    }

    fn description(&self) -> &str {
        match self.bound {
            LengthBound::Min => "Text must have at least the given number of characters",
            LengthBound::Max => "Text must have at most the given number of characters",
        }
    }

    fn kind(&self) -> RuleKind {
        match self.bound {
            LengthBound::Min => RuleKind::MinLength,
            LengthBound::Max => RuleKind::MaxLength,
        }
    }

    fn violates(&self, value: Option<&FieldValue>) -> bool {
        // A bound without a limit never fails
        let (Some(limit), Some(text)) = (self.limit, non_empty_text(value)) else {
            return false;
        };
        let length = text.chars().count() as f64;
        match self.bound {
            LengthBound::Min => length < limit,
            LengthBound::Max => length > limit,
        }
    }
}

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Loose `local@domain.tld` shape check
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailRule;

impl Rule for EmailRule {
    fn id(&self) -> &str {
        "email"
    }

    fn description(&self) -> &str {
        "Text must look like an email address"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Email
    }

    fn violates(&self, value: Option<&FieldValue>) -> bool {
        let pattern = EMAIL_PATTERN
            .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"));
        non_empty_text(value).is_some_and(|text| !pattern.is_match(text))
    }
}

/// At least 8 characters with at least one digit
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordRule;

impl PasswordRule {
    pub const MIN_LENGTH: usize = 8;
}

impl Rule for PasswordRule {
    fn id(&self) -> &str {
        "password"
    }

    fn description(&self) -> &str {
        "Password must be at least 8 characters and contain a number"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Password
    }

    fn violates(&self, value: Option<&FieldValue>) -> bool {
        non_empty_text(value).is_some_and(|text| {
            text.chars().count() < Self::MIN_LENGTH || !text.chars().any(|c| c.is_ascii_digit())
        })
    }
}

/// Whether `value` fails the configured rule
pub fn violates(rule: &ValidationRule, value: Option<&FieldValue>) -> bool {
    match rule.kind {
        RuleKind::Required => RequiredRule.violates(value),
        RuleKind::MinLength => LengthRule::min(rule.value).violates(value),
        RuleKind::MaxLength => LengthRule::max(rule.value).violates(value),
        RuleKind::Email => EmailRule.violates(value),
        RuleKind::Password => PasswordRule.violates(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::text(s)
    }

    #[test]
    fn test_required_falsy_values() {
        let rule = RequiredRule;
        assert!(rule.violates(None));
        assert!(rule.violates(Some(&text(""))));
        assert!(rule.violates(Some(&text("   "))));
        assert!(rule.violates(Some(&FieldValue::Number(0.0))));
        assert!(rule.violates(Some(&FieldValue::Bool(false))));
        assert!(rule.violates(Some(&FieldValue::List(vec![]))));

        assert!(!rule.violates(Some(&text(" x "))));
        assert!(!rule.violates(Some(&FieldValue::Number(7.0))));
        assert!(!rule.violates(Some(&FieldValue::Bool(true))));
        assert!(!rule.violates(Some(&FieldValue::List(vec!["a".into()]))));
    }

    #[test]
    fn test_length_bounds_only_apply_to_text() {
        let min = LengthRule::min(Some(3.0));
        assert!(min.violates(Some(&text("ab"))));
        assert!(!min.violates(Some(&text("abc"))));
        assert!(!min.violates(Some(&text(""))));
        assert!(!min.violates(None));
        assert!(!min.violates(Some(&FieldValue::Number(1.0))));

        let max = LengthRule::max(Some(3.0));
        assert!(max.violates(Some(&text("abcd"))));
        assert!(!max.violates(Some(&text("abc"))));
        assert!(!max.violates(Some(&FieldValue::List(vec!["a".into(); 9]))));
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(!LengthRule::max(Some(4.0)).violates(Some(&text("café"))));
    }

    #[test]
    fn test_fractional_limits_compare_exactly() {
        let min = LengthRule::min(Some(2.5));
        assert!(min.violates(Some(&text("ab"))));
        assert!(!min.violates(Some(&text("abc"))));

        let max = LengthRule::max(Some(2.5));
        assert!(max.violates(Some(&text("abc"))));
        assert!(!max.violates(Some(&text("ab"))));
    }

    #[test]
    fn test_length_without_limit_never_fails() {
        assert!(!LengthRule::min(None).violates(Some(&text("a"))));
        assert!(!LengthRule::max(None).violates(Some(&text("abcdef"))));
    }

    #[test]
    fn test_email() {
        assert!(!EmailRule.violates(Some(&text("a@b.co"))));
        assert!(EmailRule.violates(Some(&text("a@b"))));
        assert!(EmailRule.violates(Some(&text("a b@c.de"))));
        assert!(!EmailRule.violates(Some(&text(""))));
        assert!(!EmailRule.violates(None));
    }

    #[test]
    fn test_password() {
        assert!(!PasswordRule.violates(Some(&text("abc12345"))));
        assert!(PasswordRule.violates(Some(&text("abcdefgh"))));
        assert!(PasswordRule.violates(Some(&text("a1"))));
        assert!(!PasswordRule.violates(None));
    }

    #[test]
    fn test_rule_ids_match_wire_names() {
        assert_eq!(LengthRule::min(None).id(), RuleKind::MinLength.to_string());
        assert_eq!(PasswordRule.id(), RuleKind::Password.to_string());
    }
}
