//! Mismatch tracing.
//!
//! Walks every branch of the tree, carrying the constraint each path imposes
//! per dimension and the dimensions where the path parted from the query.
//! Payloads reached only through such paths are reported with the
//! constraints that excluded them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::dimension::{Dimension, OperationKind};
use crate::query::EncodedQuery;
use crate::types::QueryValue;

use super::node::{Child, SplitNode, TreeNode};

/// Constraint a tree path imposes on one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathConstraint {
    Any,
    Equal(i64),
    /// Exclusive bounds
    Range {
        above: Option<i64>,
        below: Option<i64>,
    },
    Set {
        codes: Vec<i64>,
        include: bool,
    },
}

impl PathConstraint {
    fn below(&self, bound: i64) -> Self {
        match self {
            PathConstraint::Range { above, below } => PathConstraint::Range {
                above: *above,
                below: Some(below.map_or(bound, |b| b.min(bound))),
            },
            _ => PathConstraint::Range {
                above: None,
                below: Some(bound),
            },
        }
    }

    fn above(&self, bound: i64) -> Self {
        match self {
            PathConstraint::Range { above, below } => PathConstraint::Range {
                above: Some(above.map_or(bound, |a| a.max(bound))),
                below: *below,
            },
            _ => PathConstraint::Range {
                above: Some(bound),
                below: None,
            },
        }
    }

    fn render(&self, dimension: &dyn Dimension) -> String {
        match self {
            PathConstraint::Any => "ANY".to_string(),
            PathConstraint::Equal(code) => {
                let negate = dimension.operation() == OperationKind::NotContains;
                format!(
                    "{}{{{}}}",
                    if negate { "!" } else { "" },
                    dimension.render(*code)
                )
            }
            PathConstraint::Range { above, below } => format!(
                "({}..{})",
                above.map(|c| dimension.render(c)).unwrap_or_default(),
                below.map(|c| dimension.render(c)).unwrap_or_default()
            ),
            PathConstraint::Set { codes, include } => format!(
                "{}{{{}}}",
                if *include { "" } else { "!" },
                codes
                    .iter()
                    .map(|&c| dimension.render(c))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }
}

/// Dimension where a path parted from the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub dimension: usize,
    /// `NotContains` when the query held an excluded value (scalar or exclude
    /// set), `Ordered` when it missed a required value, range or include set
    pub kind: OperationKind,
}

/// One reason a payload did not match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Per-dimension constraint of the excluded rule
    pub constraints: Vec<PathConstraint>,
    /// Failed dimensions in the order the path met them
    pub failures: Vec<Failure>,
}

impl Mismatch {
    pub fn failed_on(&self, dimension: usize) -> bool {
        self.failures.iter().any(|f| f.dimension == dimension)
    }
}

/// Payload with every reason it was excluded
#[derive(Debug, Clone)]
pub struct TraceEntry<T> {
    pub payload: T,
    pub mismatches: Vec<Mismatch>,
}

/// Result of tracing one query. Display renders `ALL OK` when empty.
pub struct TraceReport<'a, T> {
    dimensions: &'a [Box<dyn Dimension>],
    query: Vec<QueryValue>,
    entries: Vec<TraceEntry<T>>,
}

impl<'a, T> TraceReport<'a, T> {
    /// Entries in traversal order
    pub fn entries(&self) -> &[TraceEntry<T>] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn query(&self) -> &[QueryValue] {
        &self.query
    }
}

impl<'a, T: PartialEq> TraceReport<'a, T> {
    /// Mismatches recorded for `payload`
    pub fn get(&self, payload: &T) -> Option<&[Mismatch]> {
        self.entries
            .iter()
            .find(|e| &e.payload == payload)
            .map(|e| e.mismatches.as_slice())
    }
}

impl<'a, T> TraceReport<'a, T> {
    fn render_query(&self) -> String {
        let parts: Vec<String> = self
            .query
            .iter()
            .map(|value| match value {
                QueryValue::Wildcard => "ANY".to_string(),
                QueryValue::Many(values) if values.is_empty() => "ANY".to_string(),
                QueryValue::Single(v) => v.to_string(),
                QueryValue::Many(values) => format!(
                    "[{}]",
                    values
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                ),
            })
            .collect();
        format!("({})", parts.join(","))
    }

    fn render_mismatch(&self, mismatch: &Mismatch) -> String {
        let constraints: Vec<String> = mismatch
            .constraints
            .iter()
            .zip(self.dimensions)
            .map(|(c, d)| c.render(d.as_ref()))
            .collect();
        let failed: Vec<&str> = mismatch
            .failures
            .iter()
            .map(|f| self.dimensions[f.dimension].name())
            .collect();
        format!("({}) on {}", constraints.join(","), failed.join(","))
    }
}

impl<'a, T: fmt::Display> fmt::Display for TraceReport<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("ALL OK");
        }

        let query = self.render_query();
        for entry in &self.entries {
            let mismatches: Vec<String> = entry
                .mismatches
                .iter()
                .map(|m| self.render_mismatch(m))
                .collect();
            writeln!(
                f,
                "{} -> {} not in: [{}]",
                entry.payload,
                query,
                mismatches.join(", ")
            )?;
        }
        Ok(())
    }
}

#[derive(Clone)]
struct Path {
    constraints: Vec<PathConstraint>,
    failures: Vec<Failure>,
}

impl Path {
    fn constrain(&self, dimension: usize, constraint: PathConstraint) -> Self {
        let mut path = self.clone();
        path.constraints[dimension] = constraint;
        path
    }

    /// Record a failure unless the dimension already failed on this path
    fn fail_if(mut self, failed: bool, dimension: usize, kind: OperationKind) -> Self {
        if failed && !self.failures.iter().any(|f| f.dimension == dimension) {
            self.failures.push(Failure { dimension, kind });
        }
        self
    }
}

struct Tracer<'a, T> {
    dimensions: &'a [Box<dyn Dimension>],
    query: &'a EncodedQuery,
    entries: Vec<TraceEntry<T>>,
    index: HashMap<T, usize>,
    matched: HashSet<T>,
}

impl<'a, T: Clone + Eq + Hash> Tracer<'a, T> {
    fn visit(&mut self, node: &Child<T>, path: Path) {
        let Some(node) = node else {
            return;
        };

        match &**node {
            TreeNode::Leaf(payloads) => self.record(payloads, path),
            TreeNode::Node(n) => self.visit_node(n, path),
        }
    }

    fn record(&mut self, payloads: &[T], path: Path) {
        if path.failures.is_empty() {
            self.matched.extend(payloads.iter().cloned());
            return;
        }

        for payload in payloads {
            let idx = match self.index.get(payload) {
                Some(&idx) => idx,
                None => {
                    self.index.insert(payload.clone(), self.entries.len());
                    self.entries.push(TraceEntry {
                        payload: payload.clone(),
                        mismatches: Vec::new(),
                    });
                    self.entries.len() - 1
                }
            };

            let mismatch = Mismatch {
                constraints: path.constraints.clone(),
                failures: path.failures.clone(),
            };
            let mismatches = &mut self.entries[idx].mismatches;
            if !mismatches.contains(&mismatch) {
                mismatches.push(mismatch);
            }
        }
    }

    fn visit_node(&mut self, n: &SplitNode<T>, path: Path) {
        let d = n.dimension;
        let split = n.split_value;
        let current = &path.constraints[d];
        let equal_path = path.constrain(d, PathConstraint::Equal(split));
        let left_path = path.constrain(d, current.below(split));
        let right_path = path.constrain(d, current.above(split));

        self.visit(&n.any, path.clone());

        let query = self.query;
        let codes = query.get(d);

        if codes.is_empty() {
            self.visit(&n.equal, equal_path);
            self.visit(&n.right, right_path);
            self.visit(&n.left, left_path);
            for set in &n.sets {
                let set_path = path.constrain(d, set_constraint(set.bitset.iter(), set.include));
                self.visit(&set.subtree, set_path);
            }
        } else if !n.sets.is_empty() {
            for set in &n.sets {
                let kind = if set.include {
                    OperationKind::Ordered
                } else {
                    OperationKind::NotContains
                };
                let set_path = path
                    .constrain(d, set_constraint(set.bitset.iter(), set.include))
                    .fail_if(!set.matches(codes), d, kind);
                self.visit(&set.subtree, set_path);
            }
        } else if self.dimensions[d].operation() == OperationKind::NotContains {
            self.visit(&n.left, left_path);
            self.visit(&n.right, right_path);
            let excluded = codes.iter().all(|&c| c == split);
            self.visit(
                &n.equal,
                equal_path.fail_if(excluded, d, OperationKind::NotContains),
            );
        } else {
            let left_hit = codes.iter().any(|&c| c < split);
            let equal_hit = codes.iter().any(|&c| c == split);
            let right_hit = codes.iter().any(|&c| c > split);
            self.visit(
                &n.left,
                left_path.fail_if(!left_hit, d, OperationKind::Ordered),
            );
            self.visit(
                &n.equal,
                equal_path.fail_if(!equal_hit, d, OperationKind::Ordered),
            );
            self.visit(
                &n.right,
                right_path.fail_if(!right_hit, d, OperationKind::Ordered),
            );
        }
    }
}

fn set_constraint(bits: impl Iterator<Item = usize>, include: bool) -> PathConstraint {
    PathConstraint::Set {
        codes: bits.map(|idx| idx as i64).collect(),
        include,
    }
}

/// Trace `query` from `root`
pub(crate) fn trace<'a, T: Clone + Eq + Hash>(
    root: &Child<T>,
    dimensions: &'a [Box<dyn Dimension>],
    query: Vec<QueryValue>,
    encoded: &EncodedQuery,
) -> TraceReport<'a, T> {
    let mut tracer = Tracer {
        dimensions,
        query: encoded,
        entries: Vec::new(),
        index: HashMap::new(),
        matched: HashSet::new(),
    };

    let path = Path {
        constraints: vec![PathConstraint::Any; dimensions.len()],
        failures: Vec::new(),
    };
    tracer.visit(root, path);

    let Tracer {
        mut entries,
        matched,
        ..
    } = tracer;
    entries.retain(|e| !matched.contains(&e.payload));

    TraceReport {
        dimensions,
        query,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::StringDimension;
    use crate::types::Value;

    fn dimension() -> StringDimension {
        let values = [Value::from("a"), Value::from("b"), Value::from("c")];
        let mut dim = StringDimension::new("letter");
        dim.init(&mut values.iter());
        dim
    }

    #[test]
    fn test_range_narrowing() {
        let c = PathConstraint::Any.below(5).above(1).below(7).below(3);
        assert_eq!(
            c,
            PathConstraint::Range {
                above: Some(1),
                below: Some(3)
            }
        );
    }

    #[test]
    fn test_render_constraints() {
        let dim = dimension();
        assert_eq!(PathConstraint::Any.render(&dim), "ANY");
        assert_eq!(PathConstraint::Equal(1).render(&dim), "{b}");
        assert_eq!(PathConstraint::Any.below(2).render(&dim), "(..c)");
        assert_eq!(
            PathConstraint::Set {
                codes: vec![0, 2],
                include: false
            }
            .render(&dim),
            "!{a,c}"
        );

        let negated = dimension().not_contains();
        assert_eq!(PathConstraint::Equal(0).render(&negated), "!{a}");
    }

    #[test]
    fn test_failure_recorded_once_per_dimension() {
        let path = Path {
            constraints: vec![PathConstraint::Any],
            failures: Vec::new(),
        };
        let path = path
            .fail_if(true, 0, OperationKind::NotContains)
            .fail_if(true, 0, OperationKind::Ordered)
            .fail_if(false, 1, OperationKind::Ordered);
        assert_eq!(
            path.failures,
            vec![Failure {
                dimension: 0,
                kind: OperationKind::NotContains
            }]
        );
    }
}
