//! Rule Tree - a multi-dimensional rule-matching index for Rust
//!
//! This library indexes rules that constrain several independent dimensions
//! and answers "which rules match this query" without scanning them all:
//! - Exact and ordered matching on scalar dimensions
//! - Set inclusion / exclusion constraints
//! - "Anything but" dimensions (`NotContains`)
//! - Wildcard rules and wildcard / OR queries
//! - Mismatch tracing that explains why a rule did not match
//! - LRU caching of query results
//!
//! # Example
//!
//! ```rust
//! use rule_tree::{
//!     Constraint, Dimension, EnumDimension, LongDimension, QueryValue, Rule, StringDimension, Tree,
//! };
//!
//! let dimensions: Vec<Box<dyn Dimension>> = vec![
//!     Box::new(StringDimension::new("color")),
//!     Box::new(LongDimension::new("size")),
//!     Box::new(EnumDimension::new("region", ["EU", "US", "APAC"]).not_contains()),
//! ];
//!
//! let rules = vec![
//!     Rule::new("small-red", vec!["red".into(), 1i64.into(), Constraint::Any]),
//!     Rule::new("big-blue", vec!["blue".into(), 2i64.into(), Constraint::Any]),
//!     Rule::new("not-eu", vec![Constraint::Any, Constraint::Any, "EU".into()]),
//! ];
//!
//! let tree = Tree::build(dimensions, rules).unwrap();
//!
//! let found = tree
//!     .find(&["red".into(), QueryValue::Wildcard, "US".into()])
//!     .unwrap();
//! assert!(found.contains("small-red"));
//! assert!(found.contains("not-eu"));
//! assert!(!found.contains("big-blue"));
//!
//! // Why did "big-blue" not match?
//! let report = tree
//!     .trace(&["red".into(), QueryValue::Wildcard, "US".into()])
//!     .unwrap();
//! assert!(report.contains("big-blue"));
//! ```
//!
//! # Constraint Kinds
//!
//! | Constraint | Example | Matches when |
//! |------------|---------|--------------|
//! | Any | `Constraint::Any` | always |
//! | Value | `"red".into()` | query holds the value |
//! | Many | `Constraint::any_of(["a", "b"])` | query holds one of the values |
//! | Include | `Constraint::include(["x", "y"])` | query holds one of the values |
//! | Exclude | `Constraint::exclude(["EU"])` | query holds none of the values |
//!
//! On a `NotContains` dimension a `Value` constraint matches every query
//! value except the given one.

pub mod bitset;
pub mod cache;
pub mod dimension;
pub mod error;
pub mod query;
pub mod tree;
pub mod types;

// Re-export commonly used items
pub use bitset::Bitset;
pub use cache::{CachedTree, TreeOptions, DEFAULT_CACHE_SIZE};
pub use dimension::{
    BoolDimension, Dimension, EnumDimension, LongDimension, OperationKind, StringDimension,
};
pub use error::{Result, TreeError};
pub use query::EncodedQuery;
pub use tree::{Failure, Mismatch, PathConstraint, TraceEntry, TraceReport, Tree};
pub use types::{Constraint, QueryValue, Rule, Value, ANY};
