use super::{Dimension, OperationKind};
use crate::types::{Value, ANY};

/// Integer dimension.
///
/// Known values (seen by `init`) get odd codes `2 * rank + 1`; any other
/// integer gets the even code of its insertion point. The encoding is total
/// and keeps integer order, and unknown values never land on a set bit.
#[derive(Debug, Clone)]
pub struct LongDimension {
    name: String,
    operation: OperationKind,
    dictionary: Vec<i64>,
}

impl LongDimension {
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
}

impl Dimension for LongDimension {
    fn name(&self) -> &str {
        &self.name
    }

    fn operation(&self) -> OperationKind {
        self.operation
    }

    fn init(&mut self, values: &mut dyn Iterator<Item = &Value>) {
        let mut dictionary: Vec<i64> = values
            .filter_map(|v| match v {
                Value::Long(l) => Some(*l),
                _ => None,
            })
            .collect();
        dictionary.sort_unstable();
        dictionary.dedup();
        self.dictionary = dictionary;
    }

    fn encode(&self, value: &Value) -> Option<i64> {
        match value {
            Value::Long(l) => Some(match self.dictionary.binary_search(l) {
                Ok(rank) => 2 * rank as i64 + 1,
                Err(insert_at) => 2 * insert_at as i64,
            }),
            _ => None,
        }
    }

    fn bitset_capacity(&self) -> usize {
        2 * self.dictionary.len() + 1
    }

    fn render(&self, code: i64) -> String {
        if code == ANY {
            return "ANY".to_string();
        }
        let Ok(code) = usize::try_from(code) else {
            return format!("#{}", code);
        };
        if code % 2 == 1 {
            return self
                .dictionary
                .get(code / 2)
                .map(|v| v.to_string())
                .unwrap_or_else(|| format!("#{}", code));
        }

        // Gap between two known values
        let rank = code / 2;
        let lower = rank
            .checked_sub(1)
            .and_then(|r| self.dictionary.get(r))
            .map(|v| v.to_string())
            .unwrap_or_default();
        let upper = self
            .dictionary
            .get(rank)
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!("({}..{})", lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimension(values: &[i64]) -> LongDimension {
        let values: Vec<Value> = values.iter().map(|&v| Value::Long(v)).collect();
        let mut dim = LongDimension::new("size");
        dim.init(&mut values.iter());
        dim
    }

    #[test]
    fn test_known_values_get_odd_codes() {
        let dim = dimension(&[10, 20, 30]);
        assert_eq!(dim.encode(&Value::Long(10)), Some(1));
        assert_eq!(dim.encode(&Value::Long(20)), Some(3));
        assert_eq!(dim.encode(&Value::Long(30)), Some(5));
    }

    #[test]
    fn test_unknown_values_keep_order() {
        let dim = dimension(&[10, 20, 30]);
        assert_eq!(dim.encode(&Value::Long(-5)), Some(0));
        assert_eq!(dim.encode(&Value::Long(15)), Some(2));
        assert_eq!(dim.encode(&Value::Long(100)), Some(6));

        let codes: Vec<i64> = [-5, 10, 15, 20, 25, 30, 100]
            .iter()
            .map(|&v| dim.encode(&Value::Long(v)).unwrap())
            .collect();
        assert!(codes.windows(2).all(|w| w[0] < w[1]), "{:?}", codes);
    }

    #[test]
    fn test_unknown_values_miss_sets() {
        let dim = dimension(&[10, 20]);
        let set = dim.to_bitset(&[Value::Long(10), Value::Long(20)]).unwrap();
        assert!(!set.contains_code(dim.encode(&Value::Long(15)).unwrap()));
        assert!(set.contains_code(dim.encode(&Value::Long(20)).unwrap()));
    }

    #[test]
    fn test_render() {
        let dim = dimension(&[10, 20]);
        assert_eq!(dim.render(1), "10");
        assert_eq!(dim.render(3), "20");
        assert_eq!(dim.render(2), "(10..20)");
        assert_eq!(dim.render(ANY), "ANY");
    }

    #[test]
    fn test_rejects_strings() {
        let dim = dimension(&[1]);
        assert_eq!(dim.encode(&Value::from("1")), None);
    }
}
