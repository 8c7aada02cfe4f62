//! Live form-filling session
//!
//! Holds the value map for one schema, recomputes derived fields after each
//! edit and validates on submit. Derived fields are read-only and are never
//! validated.

use crate::derivation::DerivationEngine;
use crate::error::SessionError;
use crate::graph::DependencyGraph;
use crate::schema::{Field, FormSchema};
use crate::validation::{validate_form, ValidationReport};
use crate::value::{FieldValue, FormData};

/// One form instance being filled in
#[derive(Debug, Clone)]
pub struct FormSession {
    schema: FormSchema,
    graph: DependencyGraph,
    engine: DerivationEngine,
    values: FormData,
    errors: ValidationReport,
}

impl FormSession {
    /// Start a session; fails if derived fields form a cycle
    pub fn new(schema: FormSchema, engine: DerivationEngine) -> Result<Self, SessionError> {
        let graph = DependencyGraph::build(&schema)?;
        let mut session = Self {
            schema,
            graph,
            engine,
            values: FormData::new(),
            errors: ValidationReport::new(),
        };
        session.reset();
        Ok(session)
    }

    /// Decode a stored form and start a session on it
    ///
    /// The schema must also pass [`FormSchema::check`], so forms with
    /// duplicate ids, dangling parents or missing rule bounds are refused.
    pub fn from_json(json: &str, engine: DerivationEngine) -> crate::Result<Self> {
        let schema: FormSchema = serde_json::from_str(json)?;
        schema.check()?;
        Ok(Self::new(schema, engine)?)
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Discard all input, re-seed defaults and recompute derived fields
    pub fn reset(&mut self) {
        self.values = self
            .schema
            .fields
            .iter()
            .filter(|f| !f.is_derived())
            .filter_map(|f| f.default_value.clone().map(|v| (f.id.clone(), v)))
            .collect();
        self.errors = ValidationReport::new();

        for id in self.graph.order().to_vec() {
            let value = self.compute(&id);
            self.values.insert(id, value);
        }
    }

    fn editable_field(&self, id: &str) -> Result<&Field, SessionError> {
        let field = self
            .schema
            .field(id)
            .ok_or_else(|| SessionError::UnknownField(id.to_string()))?;
        if field.is_derived() {
            tracing::warn!(field = id, "Rejected edit of a derived field");
            return Err(SessionError::ReadOnlyField(id.to_string()));
        }
        Ok(field)
    }

    /// Set a field value and recompute dependents
    ///
    /// Returns the ids of derived fields whose value changed.
    pub fn set_value(
        &mut self,
        id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Vec<String>, SessionError> {
        self.editable_field(id)?;
        let value = value.into();
        if self.values.get(id) == Some(&value) {
            return Ok(Vec::new());
        }
        self.values.insert(id.to_string(), value);
        self.errors.remove(id);
        Ok(self.propagate(id))
    }

    /// Remove a field value and recompute dependents
    pub fn clear_value(&mut self, id: &str) -> Result<Vec<String>, SessionError> {
        self.editable_field(id)?;
        if self.values.remove(id).is_none() {
            return Ok(Vec::new());
        }
        self.errors.remove(id);
        Ok(self.propagate(id))
    }

    fn compute(&self, id: &str) -> FieldValue {
        match self.graph.formula(id) {
            Some(formula) => self.engine.evaluate_compiled(formula, &self.values),
            None => FieldValue::empty(),
        }
    }

    /// Recompute derived fields downstream of `changed`
    ///
    /// A field is only recomputed when one of its inputs changed in this
    /// pass; an unchanged result stops propagation through it.
    fn propagate(&mut self, changed: &str) -> Vec<String> {
        let mut dirty: Vec<String> = vec![changed.to_string()];
        let mut updated = Vec::new();

        for id in self.graph.affected_by(changed) {
            let stale = self
                .graph
                .dependencies(&id)
                .iter()
                .any(|dep| dirty.contains(dep));
            if !stale {
                continue;
            }

            let value = self.compute(&id);
            if self.values.get(&id) != Some(&value) {
                tracing::debug!(field = %id, value = %value, "Derived value updated");
                self.values.insert(id.clone(), value);
                dirty.push(id.clone());
                updated.push(id);
            }
        }

        updated
    }

    pub fn value(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(id)
    }

    pub fn values(&self) -> &FormData {
        &self.values
    }

    /// Errors from the last validation, minus fields edited since
    pub fn errors(&self) -> &ValidationReport {
        &self.errors
    }

    pub fn errors_for(&self, id: &str) -> &[String] {
        self.errors.errors_for(id)
    }

    /// Validate every non-derived field and keep the report
    pub fn validate(&mut self) -> &ValidationReport {
        self.errors = validate_form(&self.schema, &self.values);
        &self.errors
    }

    /// Validate and hand back a snapshot of the data when it passes
    pub fn submit(&mut self) -> Result<FormData, ValidationReport> {
        let report = self.validate().clone();
        if report.is_valid() {
            tracing::info!(
                form_id = %self.schema.id,
                fields = self.values.len(),
                "Form submitted"
            );
            Ok(self.values.clone())
        } else {
            tracing::info!(
                form_id = %self.schema.id,
                invalid_fields = report.field_count(),
                "Form submission rejected"
            );
            Err(report)
        }
    }
}
