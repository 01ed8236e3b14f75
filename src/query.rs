//! Query encoding.

use crate::dimension::Dimension;
use crate::error::{Result, TreeError};
use crate::types::QueryValue;

/// Query converted to dimension codes, one code list per dimension.
///
/// An empty code list is the wildcard: a single-value or OR query always
/// encodes to at least one code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedQuery {
    codes: Vec<Vec<i64>>,
}

impl EncodedQuery {
    /// Encode `query` against `dimensions`.
    ///
    /// Fails with `UnknownValue` on the first value a dimension cannot encode.
    pub fn encode(dimensions: &[Box<dyn Dimension>], query: &[QueryValue]) -> Result<Self> {
        if query.len() != dimensions.len() {
            return Err(TreeError::DimensionCountMismatch {
                expected: dimensions.len(),
                actual: query.len(),
            });
        }

        let codes = dimensions
            .iter()
            .zip(query)
            .map(|(dimension, value)| match value {
                QueryValue::Wildcard => Ok(Vec::new()),
                QueryValue::Single(v) => Ok(vec![dimension.encode_checked(v)?]),
                QueryValue::Many(values) => {
                    let mut codes = values
                        .iter()
                        .map(|v| dimension.encode_checked(v))
                        .collect::<Result<Vec<_>>>()?;
                    codes.sort_unstable();
                    codes.dedup();
                    Ok(codes)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { codes })
    }

    /// Codes at a dimension; empty for a wildcard
    #[inline]
    pub fn get(&self, dimension: usize) -> &[i64] {
        &self.codes[dimension]
    }

    #[inline]
    pub fn is_wildcard(&self, dimension: usize) -> bool {
        self.codes[dimension].is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{LongDimension, StringDimension};
    use crate::types::Value;

    fn dimensions() -> Vec<Box<dyn Dimension>> {
        let colors = [Value::from("blue"), Value::from("red")];
        let mut color = StringDimension::new("color");
        color.init(&mut colors.iter());

        let sizes = [Value::Long(1), Value::Long(2)];
        let mut size = LongDimension::new("size");
        size.init(&mut sizes.iter());

        vec![Box::new(color), Box::new(size)]
    }

    #[test]
    fn test_encode_single_and_wildcard() {
        let dims = dimensions();
        let query = EncodedQuery::encode(&dims, &["red".into(), QueryValue::Wildcard]).unwrap();
        assert_eq!(query.get(0), &[1]);
        assert!(query.is_wildcard(1));
        assert!(!query.is_wildcard(0));
    }

    #[test]
    fn test_encode_many() {
        let dims = dimensions();
        let query = EncodedQuery::encode(
            &dims,
            &[QueryValue::many(["red", "blue", "red"]), QueryValue::many([2i64])],
        )
        .unwrap();
        assert_eq!(query.get(0), &[0, 1]);
        assert_eq!(query.get(1), &[3]);
    }

    #[test]
    fn test_empty_many_is_wildcard() {
        let dims = dimensions();
        let query =
            EncodedQuery::encode(&dims, &[QueryValue::Many(vec![]), 1i64.into()]).unwrap();
        assert!(query.is_wildcard(0));
    }

    #[test]
    fn test_unknown_value() {
        let dims = dimensions();
        let err = EncodedQuery::encode(&dims, &["green".into(), QueryValue::Wildcard]).unwrap_err();
        assert!(matches!(err, TreeError::UnknownValue { ref dimension, .. } if dimension == "color"));
    }

    #[test]
    fn test_dimension_count_mismatch() {
        let dims = dimensions();
        let err = EncodedQuery::encode(&dims, &["red".into()]).unwrap_err();
        assert_eq!(
            err,
            TreeError::DimensionCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
