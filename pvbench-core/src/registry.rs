//! Case Registry
//!
//! Append-only, insertion-ordered collection of uniquely named cases.
//! Registration order is the execution and reporting order.

use crate::adapter::Adapter;
use crate::case::{Case, CaseError};
use crate::workload::AppendWorkload;
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while building a suite
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A case with this name is already registered
    #[error("duplicate case name: {0}")]
    DuplicateName(String),
}

/// Ordered set of benchmark cases
#[derive(Debug, Default)]
pub struct CaseRegistry {
    cases: Vec<Case>,
    names: HashSet<String>,
}

impl CaseRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a case body under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, run: F) -> Result<(), RegistryError>
    where
        F: FnMut() -> Result<(), CaseError> + 'static,
    {
        self.add(Case::new(name, run))
    }

    /// Register `workload` bound to `adapter`, named after the adapter
    pub fn register_adapter<A>(
        &mut self,
        adapter: A,
        workload: AppendWorkload,
    ) -> Result<(), RegistryError>
    where
        A: Adapter + 'static,
    {
        if self.names.contains(adapter.name()) {
            return Err(RegistryError::DuplicateName(adapter.name().to_string()));
        }
        self.add(Case::from_adapter(adapter, workload))
    }

    /// Register a prepared case. On a name clash the registry is unchanged.
    pub fn add(&mut self, case: Case) -> Result<(), RegistryError> {
        if !self.names.insert(case.name().to_string()) {
            return Err(RegistryError::DuplicateName(case.name().to_string()));
        }
        tracing::debug!(case = case.name(), "registered case");
        self.cases.push(case);
        Ok(())
    }

    /// Cases in registration order. Restartable: every call starts over.
    pub fn iter(&self) -> std::slice::Iter<'_, Case> {
        self.cases.iter()
    }

    /// Mutable cases in registration order
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Case> {
        self.cases.iter_mut()
    }

    /// Case names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(Case::name)
    }

    /// Look up a case by name
    pub fn get(&self, name: &str) -> Option<&Case> {
        self.cases.iter().find(|case| case.name() == name)
    }

    /// Number of registered cases
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether no case is registered
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Build a new suite holding only the cases `keep` accepts, in the
    /// same relative order. Used to narrow a suite before it runs.
    pub fn into_selected<P>(self, mut keep: P) -> CaseRegistry
    where
        P: FnMut(&Case) -> bool,
    {
        let cases: Vec<Case> = self.cases.into_iter().filter(|case| keep(case)).collect();
        let names = cases.iter().map(|case| case.name().to_string()).collect();
        CaseRegistry { cases, names }
    }
}

impl<'a> IntoIterator for &'a CaseRegistry {
    type Item = &'a Case;
    type IntoIter = std::slice::Iter<'a, Case>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut CaseRegistry {
    type Item = &'a mut Case;
    type IntoIter = std::slice::IterMut<'a, Case>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
