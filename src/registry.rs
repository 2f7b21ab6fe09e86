//! Binding registry.
//!
//! The registry is owned by the surrounding application (course
//! administration). The engine only reads from it.

use std::collections::HashMap;

use crate::models::Binding;
use crate::validation::{validate_bindings, ValidationError, ValidationErrorKind, ValidationResult};

/// Read-only view of the bindings for a term.
pub trait BindingRegistry: Send + Sync {
    /// Looks up a binding by id.
    fn get_binding(&self, id: &str) -> Option<Binding>;

    /// Bindings of one class in one term, in registry order.
    fn list_bindings(&self, class_id: &str, term: &str) -> Vec<Binding>;
}

/// In-process registry backed by a vector.
///
/// Keeps insertion order, which is the order auto-assign visits bindings.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    bindings: Vec<Binding>,
    index: HashMap<String, usize>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from validated bindings.
    pub fn from_bindings(bindings: Vec<Binding>) -> Result<Self, Vec<ValidationError>> {
        validate_bindings(&bindings)?;
        let mut registry = Self::new();
        for b in bindings {
            registry.push(b);
        }
        Ok(registry)
    }

    /// Adds a binding, builder style. Identifiers are not validated.
    ///
    /// A binding with an existing id replaces the previous one only when
    /// teacher, class, classroom and term are unchanged; otherwise the
    /// previous binding is kept and a warning is logged.
    pub fn with_binding(mut self, binding: Binding) -> Self {
        if let Err(errors) = self.upsert(binding) {
            for e in &errors {
                tracing::warn!(error = %e, "binding replacement ignored");
            }
        }
        self
    }

    /// Adds or replaces a binding after validating it.
    ///
    /// Replacement may change names, course and weekly hours. Teacher,
    /// class, classroom and term are fixed once registered, since stored
    /// placements carry a copy of them.
    pub fn insert(&mut self, binding: Binding) -> ValidationResult {
        validate_bindings(std::slice::from_ref(&binding))?;
        self.upsert(binding)
    }

    fn upsert(&mut self, binding: Binding) -> ValidationResult {
        match self.index.get(&binding.id) {
            Some(&i) => {
                let existing = &self.bindings[i];
                if !same_owners(existing, &binding) {
                    return Err(vec![ValidationError::new(
                        ValidationErrorKind::OwnerChanged,
                        format!(
                            "Binding '{}': teacher, class, classroom and term cannot change",
                            binding.id
                        ),
                    )]);
                }
                self.bindings[i] = binding;
            }
            None => self.push(binding),
        }
        Ok(())
    }

    fn push(&mut self, binding: Binding) {
        self.index.insert(binding.id.clone(), self.bindings.len());
        self.bindings.push(binding);
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// All bindings in insertion order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

fn same_owners(a: &Binding, b: &Binding) -> bool {
    a.teacher_id == b.teacher_id
        && a.class_id == b.class_id
        && a.classroom_id == b.classroom_id
        && a.term == b.term
}

impl BindingRegistry for MemoryRegistry {
    fn get_binding(&self, id: &str) -> Option<Binding> {
        self.index.get(id).map(|&i| self.bindings[i].clone())
    }

    fn list_bindings(&self, class_id: &str, term: &str) -> Vec<Binding> {
        self.bindings
            .iter()
            .filter(|b| b.class_id == class_id && b.term == term)
            .cloned()
            .collect()
    }
}
