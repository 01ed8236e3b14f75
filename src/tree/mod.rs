//! Rule tree.
//!
//! Built once from a rule set, then queried read-only. Concurrent `find` and
//! `trace` calls on a shared tree need no synchronisation.

mod build;
mod node;
mod print;
mod trace;

pub use trace::{Failure, Mismatch, PathConstraint, TraceEntry, TraceReport};

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use crate::bitset::Bitset;
use crate::dimension::{Dimension, OperationKind};
use crate::error::{Result, TreeError};
use crate::query::EncodedQuery;
use crate::types::{QueryValue, Rule};

use build::{encode_rules, Builder};
use node::{Child, TreeNode};

/// Multi-dimensional rule index
pub struct Tree<T> {
    dimensions: Vec<Box<dyn Dimension>>,
    root: Child<T>,
    rule_count: usize,
}

impl<T: Clone> Tree<T> {
    /// Build a tree from `rules`.
    ///
    /// Every dimension is initialised with all rule values at its index
    /// before any encoding takes place.
    pub fn build(mut dimensions: Vec<Box<dyn Dimension>>, rules: Vec<Rule<T>>) -> Result<Self> {
        if let Some(rule) = rules
            .iter()
            .find(|r| r.constraints.len() != dimensions.len())
        {
            return Err(TreeError::DimensionCountMismatch {
                expected: dimensions.len(),
                actual: rule.constraints.len(),
            });
        }

        for (i, dimension) in dimensions.iter_mut().enumerate() {
            let mut values = rules.iter().flat_map(|r| r.constraints[i].values());
            dimension.init(&mut values);
        }

        let rule_count = rules.len();
        let entries = encode_rules(&dimensions, rules)?;
        let root = Builder::new(&dimensions).build(entries, &Bitset::with_capacity(dimensions.len()))?;

        let tree = Self {
            dimensions,
            root,
            rule_count,
        };

        tracing::debug!(
            rules = tree.rule_count,
            dimensions = tree.dimensions.len(),
            max_depth = tree.max_depth(),
            "rule tree built"
        );

        Ok(tree)
    }
}

impl<T> Tree<T> {
    pub fn dimensions(&self) -> &[Box<dyn Dimension>] {
        &self.dimensions
    }

    /// Number of rules the tree was built from
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Encode a query against this tree's dimensions
    pub fn encode(&self, query: &[QueryValue]) -> Result<EncodedQuery> {
        EncodedQuery::encode(&self.dimensions, query)
    }

    /// Depth of the deepest leaf; an absent child counts at its parent's depth.
    /// Zero for an empty tree.
    pub fn max_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(&Child<T>, usize)> = vec![(&self.root, 1)];

        while let Some((node, depth)) = stack.pop() {
            let Some(node) = node else {
                max_depth = max_depth.max(depth - 1);
                continue;
            };

            match &**node {
                TreeNode::Leaf(_) => max_depth = max_depth.max(depth),
                TreeNode::Node(n) => {
                    for (_, child) in n.scalar_children() {
                        stack.push((child, depth + 1));
                    }
                    for set in &n.sets {
                        stack.push((&set.subtree, depth + 1));
                    }
                }
            }
        }

        max_depth
    }
}

impl<T: Clone + Eq + Hash> Tree<T> {
    /// Payloads of every rule the query satisfies
    pub fn find(&self, query: &[QueryValue]) -> Result<HashSet<T>> {
        let encoded = self.encode(query)?;
        Ok(self.find_encoded(&encoded))
    }

    /// Match an already encoded query
    pub fn find_encoded(&self, query: &EncodedQuery) -> HashSet<T> {
        let mut result = HashSet::new();
        let mut stack: Vec<&TreeNode<T>> = Vec::new();
        stack.extend(self.root.as_deref());

        while let Some(node) = stack.pop() {
            let n = match node {
                TreeNode::Leaf(payloads) => {
                    result.extend(payloads.iter().cloned());
                    continue;
                }
                TreeNode::Node(n) => n,
            };

            stack.extend(n.any.as_deref());

            let codes = query.get(n.dimension);

            if codes.is_empty() {
                stack.extend(n.equal.as_deref());
                stack.extend(n.right.as_deref());
                stack.extend(n.left.as_deref());
                stack.extend(n.sets.iter().filter_map(|s| s.subtree.as_deref()));
            } else if !n.sets.is_empty() {
                stack.extend(
                    n.sets
                        .iter()
                        .filter(|s| s.matches(codes))
                        .filter_map(|s| s.subtree.as_deref()),
                );
            } else if self.dimensions[n.dimension].operation() == OperationKind::NotContains {
                stack.extend(n.left.as_deref());
                stack.extend(n.right.as_deref());
                if codes.iter().any(|&c| c != n.split_value) {
                    stack.extend(n.equal.as_deref());
                }
            } else {
                let split = n.split_value;
                if codes.iter().any(|&c| c < split) {
                    stack.extend(n.left.as_deref());
                }
                if codes.iter().any(|&c| c == split) {
                    stack.extend(n.equal.as_deref());
                }
                if codes.iter().any(|&c| c > split) {
                    stack.extend(n.right.as_deref());
                }
            }
        }

        result
    }

    /// Explain why rules did not match `query`
    pub fn trace_report(&self, query: &[QueryValue]) -> Result<TraceReport<'_, T>> {
        let encoded = self.encode(query)?;
        Ok(trace::trace(
            &self.root,
            &self.dimensions,
            query.to_vec(),
            &encoded,
        ))
    }
}

impl<T: Clone + Eq + Hash + fmt::Display> Tree<T> {
    /// Text form of [`Tree::trace_report`]; `ALL OK` when nothing was excluded
    pub fn trace(&self, query: &[QueryValue]) -> Result<String> {
        Ok(self.trace_report(query)?.to_string())
    }
}

impl<T: fmt::Display> Tree<T> {
    /// Indented dump of the tree structure
    pub fn render(&self) -> String {
        print::render(&self.root, &self.dimensions)
    }
}

impl<T: fmt::Display> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<T> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("dimensions", &self.dimensions)
            .field("rule_count", &self.rule_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{LongDimension, StringDimension};
    use crate::types::Constraint;

    fn color_size_tree() -> Tree<&'static str> {
        let dimensions: Vec<Box<dyn Dimension>> = vec![
            Box::new(StringDimension::new("color")),
            Box::new(LongDimension::new("size")),
        ];
        let rules = vec![
            Rule::new("A", vec!["red".into(), 1i64.into()]),
            Rule::new("B", vec!["blue".into(), 2i64.into()]),
        ];
        Tree::build(dimensions, rules).unwrap()
    }

    fn set(payloads: &[&'static str]) -> HashSet<&'static str> {
        payloads.iter().copied().collect()
    }

    #[test]
    fn test_find_scalar() {
        let tree = color_size_tree();
        assert_eq!(
            tree.find(&["red".into(), QueryValue::Wildcard]).unwrap(),
            set(&["A"])
        );
        assert_eq!(
            tree.find(&[QueryValue::Wildcard, QueryValue::Wildcard]).unwrap(),
            set(&["A", "B"])
        );
        assert_eq!(
            tree.find(&["red".into(), 2i64.into()]).unwrap(),
            set(&[])
        );
    }

    #[test]
    fn test_find_or_query() {
        let tree = color_size_tree();
        let result = tree
            .find(&[QueryValue::many(["red", "blue"]), QueryValue::many([2i64, 7])])
            .unwrap();
        assert_eq!(result, set(&["B"]));
    }

    #[test]
    fn test_find_dimension_count_mismatch() {
        let tree = color_size_tree();
        let err = tree.find(&["red".into()]).unwrap_err();
        assert!(matches!(err, TreeError::DimensionCountMismatch { .. }));
    }

    #[test]
    fn test_build_rejects_short_rule() {
        let dimensions: Vec<Box<dyn Dimension>> = vec![
            Box::new(StringDimension::new("color")),
            Box::new(LongDimension::new("size")),
        ];
        let rules = vec![Rule::new("A", vec!["red".into()])];
        let err = Tree::build(dimensions, rules).unwrap_err();
        assert_eq!(
            err,
            TreeError::DimensionCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_empty_tree() {
        let dimensions: Vec<Box<dyn Dimension>> = vec![Box::new(StringDimension::new("color"))];
        let tree: Tree<&str> = Tree::build(dimensions, vec![]).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.max_depth(), 0);
        assert!(tree.find(&[QueryValue::Wildcard]).unwrap().is_empty());
        assert_eq!(tree.trace(&[QueryValue::Wildcard]).unwrap(), "ALL OK");
    }

    #[test]
    fn test_max_depth() {
        let tree = color_size_tree();
        // color split -> color split (blue side) -> size split -> leaf
        assert_eq!(tree.max_depth(), 4);

        let dimensions: Vec<Box<dyn Dimension>> = vec![Box::new(StringDimension::new("color"))];
        let rules = vec![Rule::new("A", vec![Constraint::Any])];
        let tree = Tree::build(dimensions, rules).unwrap();
        assert_eq!(tree.max_depth(), 1);
    }

    #[test]
    fn test_trace_names_conflicting_dimension() {
        let tree = color_size_tree();
        let text = tree.trace(&["red".into(), QueryValue::Wildcard]).unwrap();
        assert_eq!(text, "B -> (red,ANY) not in: [({blue},{2}) on color]\n");
    }

    #[test]
    fn test_trace_all_ok() {
        let tree = color_size_tree();
        let text = tree
            .trace(&[QueryValue::Wildcard, QueryValue::Wildcard])
            .unwrap();
        assert_eq!(text, "ALL OK");
    }

    #[test]
    fn test_render() {
        let tree = color_size_tree();
        let dump = tree.render();
        assert!(dump.starts_with("└── root:kdn|d:color/0,sv:red\n"), "{}", dump);
        assert!(dump.contains("dn|[A]"), "{}", dump);
        assert!(dump.contains("dn|[B]"), "{}", dump);
        assert_eq!(dump, tree.to_string());
    }
}
