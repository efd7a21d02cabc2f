//! Query processing module
//!
//! Pattern matching for openCypher-style `MATCH` clauses:
//! - [`pattern`]: node and edge constraints laid out as a path
//! - [`symbols`]: bound values and outer-scope constraints
//! - [`executor`]: planner, match operators and result accumulators

pub mod executor;
pub mod pattern;
pub mod symbols;

// Re-export main types
pub use executor::{
    CountAccumulator, ExecutionError, ExecutionResult, FilteredAccumulator, MatchAccumulator,
    MatchClause, MatchContext, MatchOptions, Record, RecordBatch,
};
pub use pattern::{
    Direction, EdgePattern, LengthPattern, NodePattern, PathPattern, PathSegment, PatternElement,
};
pub use symbols::{Bindings, PatternSymbol, SymbolKind, Symbols, Value};
