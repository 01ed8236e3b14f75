use std::fmt;

use serde::{Deserialize, Serialize};

/// Code reserved for "no constraint on this dimension".
///
/// Dimension providers must never hand this out for a real value.
pub const ANY: i64 = i64::MIN;

/// Domain value held by a rule or supplied in a query
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Long(i64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Long(l) => write!(f, "{}", l),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Per-dimension constraint carried by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// The rule does not constrain this dimension
    Any,
    /// Query must hold this value
    Value(Value),
    /// Query must hold one of these values
    Many(Vec<Value>),
    /// Query values must (include) or must not (exclude) intersect `values`
    Set { values: Vec<Value>, include: bool },
}

impl Constraint {
    /// Set constraint satisfied when a query value is one of `values`
    pub fn include<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Constraint::Set {
            values: values.into_iter().map(Into::into).collect(),
            include: true,
        }
    }

    /// Set constraint satisfied when no query value is one of `values`
    pub fn exclude<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Constraint::Set {
            values: values.into_iter().map(Into::into).collect(),
            include: false,
        }
    }

    /// Multi-scalar constraint
    pub fn any_of<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Constraint::Many(values.into_iter().map(Into::into).collect())
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Constraint::Set { .. })
    }

    /// Iterate every domain value mentioned by this constraint
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        let slice: &[Value] = match self {
            Constraint::Any => &[],
            Constraint::Value(v) => std::slice::from_ref(v),
            Constraint::Many(values) => values,
            Constraint::Set { values, .. } => values,
        };
        slice.iter()
    }
}

/// `From` conversions for every scalar type that converts into a [`Value`].
macro_rules! impl_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Constraint {
                fn from(value: $ty) -> Self {
                    Constraint::Value(value.into())
                }
            }

            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::Single(value.into())
                }
            }

            impl From<Option<$ty>> for QueryValue {
                fn from(value: Option<$ty>) -> Self {
                    match value {
                        Some(v) => QueryValue::Single(v.into()),
                        None => QueryValue::Wildcard,
                    }
                }
            }
        )*
    };
}

impl_from_scalar!(Value, &str, String, i64, bool);

/// Rule: one constraint per dimension plus the payload returned on match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule<T> {
    pub constraints: Vec<Constraint>,
    pub payload: T,
}

impl<T> Rule<T> {
    pub fn new(payload: T, constraints: Vec<Constraint>) -> Self {
        Self {
            constraints,
            payload,
        }
    }
}

/// Query input for one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// Matches every constraint on the dimension
    Wildcard,
    Single(Value),
    /// Logical OR of the listed values; an empty list is a wildcard
    Many(Vec<Value>),
}

impl QueryValue {
    pub fn many<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        QueryValue::Many(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_values() {
        let c = Constraint::include(["x", "y"]);
        let values: Vec<_> = c.values().cloned().collect();
        assert_eq!(values, vec![Value::from("x"), Value::from("y")]);
        assert!(c.is_set());

        assert_eq!(Constraint::Any.values().count(), 0);
        assert_eq!(Constraint::from(5i64).values().count(), 1);
    }

    #[test]
    fn test_query_value_from_option() {
        assert_eq!(QueryValue::from(None::<&str>), QueryValue::Wildcard);
        assert_eq!(
            QueryValue::from(Some("red")),
            QueryValue::Single(Value::from("red"))
        );
    }

    #[test]
    fn test_value_serde_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"[true, 42, "red"]"#).unwrap();
        assert_eq!(
            values,
            vec![Value::Bool(true), Value::Long(42), Value::from("red")]
        );
    }

    #[test]
    fn test_query_value_serde() {
        let query: Vec<QueryValue> = serde_json::from_str(r#"[null, "red", [1, 2]]"#).unwrap();
        assert_eq!(query[0], QueryValue::Wildcard);
        assert_eq!(query[1], QueryValue::from("red"));
        assert_eq!(query[2], QueryValue::many([1i64, 2]));
    }

    #[test]
    fn test_constraint_serde() {
        let constraints: Vec<Constraint> = serde_json::from_str(
            r#"["any", {"value": "red"}, {"set": {"values": ["EU"], "include": false}}]"#,
        )
        .unwrap();
        assert_eq!(constraints[0], Constraint::Any);
        assert_eq!(constraints[1], Constraint::from("red"));
        assert_eq!(constraints[2], Constraint::exclude(["EU"]));
    }
}
