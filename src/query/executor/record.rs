//! Match result sinks
//!
//! Every complete binding found by a run is handed to a [`MatchAccumulator`].
//! Returning `ControlFlow::Break` stops the search without an error.

use super::{ExecutionError, ExecutionResult};
use crate::query::symbols::{Bindings, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::ControlFlow;

/// Receives one call per match
pub trait MatchAccumulator {
    /// `path` holds one value per pattern position; `bindings` the named
    /// variables bound by this run, in pattern order.
    fn store_result(&mut self, path: &[Value], bindings: &Bindings) -> ExecutionResult<ControlFlow<()>>;
}

impl<F> MatchAccumulator for F
where
    F: FnMut(&[Value], &Bindings) -> ExecutionResult<ControlFlow<()>>,
{
    fn store_result(&mut self, path: &[Value], bindings: &Bindings) -> ExecutionResult<ControlFlow<()>> {
        self(path, bindings)
    }
}

/// A single result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Matched value per pattern position
    pub path: Vec<Value>,
    /// Variable bindings (variable name -> value)
    pub bindings: Bindings,
}

impl Record {
    /// Get a bound value
    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.bindings.get(variable)
    }

    /// Check if a variable is bound
    pub fn has(&self, variable: &str) -> bool {
        self.bindings.contains_key(variable)
    }
}

/// Collects every row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub records: Vec<Record>,
}

impl RecordBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter()
    }
}

impl MatchAccumulator for RecordBatch {
    fn store_result(&mut self, path: &[Value], bindings: &Bindings) -> ExecutionResult<ControlFlow<()>> {
        self.records.push(Record {
            path: path.to_vec(),
            bindings: bindings.clone(),
        });
        Ok(ControlFlow::Continue(()))
    }
}

/// Counts rows without keeping them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountAccumulator {
    count: usize,
}

impl CountAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl MatchAccumulator for CountAccumulator {
    fn store_result(&mut self, _path: &[Value], _bindings: &Bindings) -> ExecutionResult<ControlFlow<()>> {
        self.count += 1;
        Ok(ControlFlow::Continue(()))
    }
}

/// Passes on only the rows `predicate` accepts (a WHERE clause).
///
/// Predicate errors abort the run as [`ExecutionError::Predicate`].
pub struct FilteredAccumulator<A, P> {
    inner: A,
    predicate: P,
}

impl<A, P> FilteredAccumulator<A, P> {
    pub fn new(inner: A, predicate: P) -> Self {
        Self { inner, predicate }
    }

    pub fn into_inner(self) -> A {
        self.inner
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A, P, E> MatchAccumulator for FilteredAccumulator<A, P>
where
    A: MatchAccumulator,
    P: FnMut(&Bindings) -> Result<bool, E>,
    E: fmt::Display,
{
    fn store_result(&mut self, path: &[Value], bindings: &Bindings) -> ExecutionResult<ControlFlow<()>> {
        match (self.predicate)(bindings) {
            Ok(true) => self.inner.store_result(path, bindings),
            Ok(false) => Ok(ControlFlow::Continue(())),
            Err(e) => Err(ExecutionError::Predicate(e.to_string())),
        }
    }
}
