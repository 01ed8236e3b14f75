//! Dimensions with a domain known up front. `init` has nothing to learn.

use super::{Dimension, OperationKind};
use crate::types::{Value, ANY};

/// Boolean dimension: `false` = 0, `true` = 1
#[derive(Debug, Clone)]
pub struct BoolDimension {
    name: String,
    operation: OperationKind,
}

impl BoolDimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: OperationKind::Ordered,
        }
    }

    /// Set operation kind
    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = operation;
        self
    }

    pub fn not_contains(self) -> Self {
        self.with_operation(OperationKind::NotContains)
    }
}

impl Dimension for BoolDimension {
    fn name(&self) -> &str {
        &self.name
    }

    fn operation(&self) -> OperationKind {
        self.operation
    }

    fn init(&mut self, _values: &mut dyn Iterator<Item = &Value>) {}

    fn encode(&self, value: &Value) -> Option<i64> {
        match value {
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    fn bitset_capacity(&self) -> usize {
        2
    }

    fn render(&self, code: i64) -> String {
        match code {
            0 => "false".to_string(),
            1 => "true".to_string(),
            ANY => "ANY".to_string(),
            other => format!("#{}", other),
        }
    }
}

/// Enumeration dimension.
///
/// Codes are declaration indices, so declaration order is the ordering
/// used for range splits.
#[derive(Debug, Clone)]
pub struct EnumDimension {
    name: String,
    operation: OperationKind,
    variants: Vec<String>,
}

impl EnumDimension {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            operation: OperationKind::Ordered,
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Set operation kind
    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = operation;
        self
    }

    pub fn not_contains(self) -> Self {
        self.with_operation(OperationKind::NotContains)
    }
}

impl Dimension for EnumDimension {
    fn name(&self) -> &str {
        &self.name
    }

    fn operation(&self) -> OperationKind {
        self.operation
    }

    fn init(&mut self, _values: &mut dyn Iterator<Item = &Value>) {}

    fn encode(&self, value: &Value) -> Option<i64> {
        match value {
            Value::String(s) => self
                .variants
                .iter()
                .position(|v| v.eq_ignore_ascii_case(s))
                .map(|idx| idx as i64),
            _ => None,
        }
    }

    fn bitset_capacity(&self) -> usize {
        self.variants.len()
    }

    fn render(&self, code: i64) -> String {
        if code == ANY {
            return "ANY".to_string();
        }
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.variants.get(idx))
            .cloned()
            .unwrap_or_else(|| format!("#{}", code))
    }
}
