//! Dependency graph between derived fields and their inputs
//!
//! A derived field depends on its declared parents plus every field its
//! formula reads. Derived parents are allowed, so chains evaluate in
//! topological order; cycles are rejected when the graph is built.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::derivation::Formula;
use crate::error::SchemaError;
use crate::schema::FormSchema;

#[derive(Debug, Clone)]
struct Node {
    dependencies: Vec<String>,
    formula: Option<Formula>,
}

/// Derived-field dependency graph of one schema
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<String, Node>,
    /// field id -> derived fields that read it directly
    dependents: HashMap<String, Vec<String>>,
    /// every derived field, inputs before outputs
    order: Vec<String>,
}

impl DependencyGraph {
    /// Build the graph, failing on derivation cycles
    pub fn build(schema: &FormSchema) -> Result<Self, SchemaError> {
        let mut known: HashSet<&str> = HashSet::with_capacity(schema.fields.len());
        for field in &schema.fields {
            if !known.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateFieldId(field.id.clone()));
            }
        }
        let rank: HashMap<&str, usize> = schema
            .sorted_fields()
            .into_iter()
            .enumerate()
            .map(|(i, f)| (f.id.as_str(), i))
            .collect();

        let mut graph = DependencyGraph::default();

        for field in schema.sorted_fields() {
            let Some(config) = &field.derived else {
                continue;
            };

            let formula = match Formula::parse(&config.formula) {
                Ok(formula) => Some(formula),
                Err(e) => {
                    tracing::debug!(field = %field.id, error = %e, "Formula does not compile");
                    None
                }
            };

            let mut dependencies: Vec<String> = Vec::new();
            let referenced = formula.as_ref().map(Formula::references).unwrap_or_default();
            for id in config.parent_fields.iter().chain(referenced.iter()) {
                if dependencies.contains(id) {
                    continue;
                }
                if !known.contains(id.as_str()) {
                    tracing::warn!(field = %field.id, reference = %id, "Derived field references an unknown field");
                    continue;
                }
                dependencies.push(id.clone());
            }

            for dep in &dependencies {
                graph
                    .dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(field.id.clone());
            }
            graph.nodes.insert(field.id.clone(), Node { dependencies, formula });
        }

        graph.order = graph.topological_order(&rank)?;
        Ok(graph)
    }

    /// Kahn's algorithm over derived-to-derived edges, ties broken by field order
    fn topological_order(&self, rank: &HashMap<&str, usize>) -> Result<Vec<String>, SchemaError> {
        let rank_of = |id: &str| rank.get(id).copied().unwrap_or(usize::MAX);

        let mut pending: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(id, node)| {
                let derived_inputs = node
                    .dependencies
                    .iter()
                    .filter(|d| self.nodes.contains_key(d.as_str()))
                    .count();
                (id.as_str(), derived_inputs)
            })
            .collect();

        let mut ready: BTreeSet<(usize, &str)> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| (rank_of(*id), *id))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(entry) = ready.iter().next().copied() {
            ready.remove(&entry);
            let id = entry.1;
            pending.remove(id);
            order.push(id.to_string());

            for dependent in self.dependents.get(id).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert((rank_of(dependent.as_str()), dependent.as_str()));
                    }
                }
            }
        }

        if pending.is_empty() {
            Ok(order)
        } else {
            let remaining: HashSet<&str> = pending.keys().copied().collect();
            Err(SchemaError::DerivationCycle(self.find_cycle(&remaining, rank_of)))
        }
    }

    /// Walk unresolved dependencies from the first stuck field until one repeats
    fn find_cycle<F>(&self, remaining: &HashSet<&str>, rank_of: F) -> Vec<String>
    where
        F: Fn(&str) -> usize,
    {
        let Some(start) = remaining.iter().copied().min_by_key(|id| (rank_of(*id), *id)) else {
            return Vec::new();
        };

        let mut path: Vec<&str> = vec![start];
        let mut current = start;
        loop {
            let next = self.nodes[current]
                .dependencies
                .iter()
                .map(String::as_str)
                .filter(|d| remaining.contains(d))
                .min_by_key(|d| (rank_of(*d), *d));
            let Some(next) = next else {
                return path.into_iter().map(str::to_string).collect();
            };
            if let Some(pos) = path.iter().position(|p| *p == next) {
                let mut cycle: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
                cycle.push(next.to_string());
                return cycle;
            }
            path.push(next);
            current = next;
        }
    }

    /// All derived field ids, inputs before outputs
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn is_derived(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Direct inputs of a derived field
    pub fn dependencies(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|n| n.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Compiled formula of a derived field, if it compiles
    pub fn formula(&self, id: &str) -> Option<&Formula> {
        self.nodes.get(id).and_then(|n| n.formula.as_ref())
    }

    /// Derived fields that transitively read `id`, in evaluation order
    pub fn affected_by(&self, id: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents.get(current).into_iter().flatten() {
                if seen.insert(dependent.as_str()) {
                    queue.push_back(dependent.as_str());
                }
            }
        }
        self.order
            .iter()
            .filter(|d| seen.contains(d.as_str()))
            .cloned()
            .collect()
    }
}
