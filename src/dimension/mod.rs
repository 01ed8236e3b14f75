//! Dimension providers.
//!
//! A dimension maps domain values onto `i64` codes that keep the domain
//! ordering, and decides which comparison semantics the tree applies to it.

mod fixed;
mod long;
mod string;

pub use fixed::{BoolDimension, EnumDimension};
pub use long::LongDimension;
pub use string::StringDimension;

use std::fmt;

use crate::bitset::Bitset;
use crate::error::{Result, TreeError};
use crate::types::{Value, ANY};

/// Comparison semantics of a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationKind {
    /// Equality and range comparison on codes
    #[default]
    Ordered,
    /// A scalar rule value means "anything but this value"
    NotContains,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Ordered => f.write_str("ORDERED"),
            OperationKind::NotContains => f.write_str("NOT_CONTAINS"),
        }
    }
}

/// Trait for dimension providers
pub trait Dimension: Send + Sync {
    /// Dimension name, used in errors and dumps
    fn name(&self) -> &str;

    fn operation(&self) -> OperationKind;

    /// Observe every rule value that will be encoded against this dimension.
    ///
    /// Called exactly once per build, before any `encode`.
    fn init(&mut self, values: &mut dyn Iterator<Item = &Value>);

    /// Monotonic code for `value`, or `None` if the value is not encodable.
    ///
    /// Must never return [`ANY`].
    fn encode(&self, value: &Value) -> Option<i64>;

    /// Number of bits needed to index every code this dimension hands out
    fn bitset_capacity(&self) -> usize;

    /// Human-readable form of a code
    fn render(&self, code: i64) -> String;

    /// Encode, falling back to [`ANY`] for values the dimension does not know
    fn encode_or_any(&self, value: &Value) -> i64 {
        self.encode(value).unwrap_or(ANY)
    }

    /// Encode or report the value as unknown
    fn encode_checked(&self, value: &Value) -> Result<i64> {
        self.encode(value).ok_or_else(|| TreeError::UnknownValue {
            dimension: self.name().to_string(),
            value: value.to_string(),
        })
    }

    /// Membership bitset of `values`, indexed by code.
    ///
    /// Every code must fall in `0..bitset_capacity()`.
    fn to_bitset(&self, values: &[Value]) -> Result<Bitset> {
        let capacity = self.bitset_capacity();
        let mut codes = Vec::with_capacity(values.len());
        for value in values {
            let code = self.encode_checked(value)?;
            if !usize::try_from(code).is_ok_and(|idx| idx < capacity) {
                return Err(TreeError::InvalidConstraint(format!(
                    "dimension '{}' cannot place code {} of '{}' in a set of {} bits",
                    self.name(),
                    code,
                    value,
                    capacity
                )));
            }
            codes.push(code);
        }
        Ok(Bitset::from_codes(capacity, codes))
    }
}

impl fmt::Debug for dyn Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dimension")
            .field("name", &self.name())
            .field("operation", &self.operation())
            .finish()
    }
}
