use super::{Dimension, OperationKind};
use crate::types::{Value, ANY};

/// String dimension.
///
/// Codes are ranks in the sorted dictionary of every string seen by `init`,
/// so code order is lexicographic order. Strings outside the dictionary
/// are not encodable.
#[derive(Debug, Clone)]
pub struct StringDimension {
    name: String,
    operation: OperationKind,
    dictionary: Vec<String>,
}

impl StringDimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: OperationKind::Ordered,
            dictionary: Vec::new(),
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

    /// Number of distinct strings known to the dimension
    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }
}

impl Dimension for StringDimension {
    fn name(&self) -> &str {
        &self.name
    }

    fn operation(&self) -> OperationKind {
        self.operation
    }

    fn init(&mut self, values: &mut dyn Iterator<Item = &Value>) {
        let mut dictionary: Vec<String> = values
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        dictionary.sort_unstable();
        dictionary.dedup();
        self.dictionary = dictionary;
    }

    fn encode(&self, value: &Value) -> Option<i64> {
        match value {
            Value::String(s) => self
                .dictionary
                .binary_search(s)
                .ok()
                .map(|rank| rank as i64),
            _ => None,
        }
    }

    fn bitset_capacity(&self) -> usize {
        self.dictionary.len()
    }

    fn render(&self, code: i64) -> String {
        if code == ANY {
            return "ANY".to_string();
        }
        usize::try_from(code)
            .ok()
            .and_then(|rank| self.dictionary.get(rank))
            .cloned()
            .unwrap_or_else(|| format!("#{}", code))
    }
}
