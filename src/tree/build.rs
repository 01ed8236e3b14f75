//! Tree construction.
//!
//! Rules are encoded once, then partitioned recursively. Each internal node
//! splits on the free dimension with the most distinct scalar codes; a
//! dimension carrying set constraints splits into one branch per distinct set.

use std::collections::{HashMap, HashSet};

use crate::bitset::Bitset;
use crate::dimension::Dimension;
use crate::error::{Result, TreeError};
use crate::types::{Constraint, Rule, ANY};

use super::node::{Child, SetBranch, SplitNode, TreeNode};

/// Canonical set constraint: sorted distinct codes plus the include flag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SetKey {
    pub codes: Vec<i64>,
    pub include: bool,
}

/// Encoded constraint of one rule on one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Code {
    /// Scalar code, or `ANY`
    Scalar(i64),
    Set(SetKey),
}

/// Rule with every constraint encoded
#[derive(Debug, Clone)]
pub(crate) struct Entry<T> {
    pub codes: Vec<Code>,
    pub payload: T,
}

/// Dimension picked for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Split {
    Scalar { dimension: usize, value: i64 },
    Set { dimension: usize },
}

/// Encode rules against initialised dimensions.
///
/// Multi-scalar constraints are expanded into one entry per value, so a rule
/// with `Many` constraints on several dimensions yields their product.
pub(crate) fn encode_rules<T: Clone>(
    dimensions: &[Box<dyn Dimension>],
    rules: Vec<Rule<T>>,
) -> Result<Vec<Entry<T>>> {
    let mut entries = Vec::with_capacity(rules.len());

    for rule in rules {
        let mut expanded: Vec<Vec<Code>> = vec![Vec::with_capacity(dimensions.len())];

        for (dimension, constraint) in dimensions.iter().zip(&rule.constraints) {
            let options = encode_constraint(dimension.as_ref(), constraint)?;
            if let [single] = options.as_slice() {
                for codes in &mut expanded {
                    codes.push(single.clone());
                }
            } else {
                expanded = expanded
                    .into_iter()
                    .flat_map(|prefix| {
                        options.iter().map(move |option| {
                            let mut codes = prefix.clone();
                            codes.push(option.clone());
                            codes
                        })
                    })
                    .collect();
            }
        }

        for codes in expanded {
            entries.push(Entry {
                codes,
                payload: rule.payload.clone(),
            });
        }
    }

    Ok(entries)
}

/// Alternatives a constraint expands to; never empty
fn encode_constraint(dimension: &dyn Dimension, constraint: &Constraint) -> Result<Vec<Code>> {
    match constraint {
        Constraint::Any => Ok(vec![Code::Scalar(ANY)]),
        Constraint::Value(v) => Ok(vec![Code::Scalar(dimension.encode_checked(v)?)]),
        Constraint::Many(values) if values.is_empty() => Ok(vec![Code::Scalar(ANY)]),
        Constraint::Many(values) => {
            let mut codes = values
                .iter()
                .map(|v| dimension.encode_checked(v))
                .collect::<Result<Vec<_>>>()?;
            codes.sort_unstable();
            codes.dedup();
            Ok(codes.into_iter().map(Code::Scalar).collect())
        }
        Constraint::Set { values, include } => {
            let bitset = dimension.to_bitset(values)?;
            Ok(vec![Code::Set(SetKey {
                codes: bitset.iter().map(|idx| idx as i64).collect(),
                include: *include,
            })])
        }
    }
}

/// Recursive partitioner over encoded rules
pub(crate) struct Builder<'a> {
    dimensions: &'a [Box<dyn Dimension>],
}

impl<'a> Builder<'a> {
    pub fn new(dimensions: &'a [Box<dyn Dimension>]) -> Self {
        Self { dimensions }
    }

    /// Build the subtree for `entries`; `fixed` marks dimensions already
    /// settled on this path
    pub fn build<T>(&self, entries: Vec<Entry<T>>, fixed: &Bitset) -> Result<Child<T>> {
        if entries.is_empty() {
            return Ok(None);
        }

        let node = match self.select_split(&entries, fixed)? {
            None => TreeNode::Leaf(entries.into_iter().map(|e| e.payload).collect()),
            Some(Split::Scalar { dimension, value }) => {
                TreeNode::Node(self.split_scalar(entries, fixed, dimension, value)?)
            }
            Some(Split::Set { dimension }) => {
                TreeNode::Node(self.split_set(entries, fixed, dimension)?)
            }
        };

        Ok(Some(Box::new(node)))
    }

    /// Pick the free dimension with the most distinct scalar codes.
    ///
    /// A set-constrained dimension scores 1. Ties keep the lowest index.
    /// `None` when no free dimension discriminates.
    pub fn select_split<T>(&self, entries: &[Entry<T>], fixed: &Bitset) -> Result<Option<Split>> {
        let mut best: Option<(usize, usize, bool)> = None;

        for dimension in 0..self.dimensions.len() {
            if fixed.contains(dimension) {
                continue;
            }

            let mut unique = HashSet::new();
            let mut set_count = 0usize;
            for entry in entries {
                match &entry.codes[dimension] {
                    Code::Scalar(ANY) => {}
                    Code::Scalar(code) => {
                        unique.insert(*code);
                    }
                    Code::Set(_) => set_count += 1,
                }
            }

            if set_count > 0 && !unique.is_empty() {
                return Err(TreeError::ConstraintKindMismatch {
                    dimension: self.dimensions[dimension].name().to_string(),
                });
            }

            let score = if set_count > 0 { 1 } else { unique.len() };
            if score > best.map_or(0, |(_, s, _)| s) {
                best = Some((dimension, score, set_count > 0));
            }
        }

        let Some((dimension, _, is_set)) = best else {
            return Ok(None);
        };

        if is_set {
            return Ok(Some(Split::Set { dimension }));
        }

        let mut unique: Vec<i64> = entries
            .iter()
            .filter_map(|e| match e.codes[dimension] {
                Code::Scalar(code) if code != ANY => Some(code),
                _ => None,
            })
            .collect();
        unique.sort_unstable();
        unique.dedup();

        Ok(Some(Split::Scalar {
            dimension,
            value: unique[unique.len() / 2],
        }))
    }

    fn split_scalar<T>(
        &self,
        entries: Vec<Entry<T>>,
        fixed: &Bitset,
        dimension: usize,
        value: i64,
    ) -> Result<SplitNode<T>> {
        tracing::trace!(
            dimension = self.dimensions[dimension].name(),
            split = %self.dimensions[dimension].render(value),
            rules = entries.len(),
            "scalar split"
        );

        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut equal = Vec::new();
        let mut any = Vec::new();

        for entry in entries {
            let bucket = match entry.codes[dimension] {
                Code::Scalar(ANY) => &mut any,
                Code::Scalar(code) if code < value => &mut left,
                Code::Scalar(code) if code > value => &mut right,
                _ => &mut equal,
            };
            bucket.push(entry);
        }

        let with_dimension = fixed.with(dimension);

        Ok(SplitNode {
            dimension,
            split_value: value,
            left: self.build(left, fixed)?,
            right: self.build(right, fixed)?,
            equal: self.build(equal, &with_dimension)?,
            any: self.build(any, &with_dimension)?,
            sets: Vec::new(),
        })
    }

    fn split_set<T>(
        &self,
        entries: Vec<Entry<T>>,
        fixed: &Bitset,
        dimension: usize,
    ) -> Result<SplitNode<T>> {
        let mut any = Vec::new();
        let mut groups: Vec<(SetKey, Vec<Entry<T>>)> = Vec::new();
        let mut index: HashMap<SetKey, usize> = HashMap::new();

        for entry in entries {
            let key = match &entry.codes[dimension] {
                Code::Set(key) if !key.codes.is_empty() => key.clone(),
                _ => {
                    any.push(entry);
                    continue;
                }
            };
            match index.get(&key) {
                Some(&idx) => groups[idx].1.push(entry),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, vec![entry]));
                }
            }
        }

        tracing::trace!(
            dimension = self.dimensions[dimension].name(),
            branches = groups.len(),
            "set split"
        );

        let with_dimension = fixed.with(dimension);
        let capacity = self.dimensions[dimension].bitset_capacity();

        let sets = groups
            .into_iter()
            .map(|(key, members)| {
                Ok(SetBranch {
                    bitset: Bitset::from_codes(capacity, key.codes),
                    include: key.include,
                    subtree: self.build(members, &with_dimension)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SplitNode {
            dimension,
            split_value: ANY,
            left: None,
            right: None,
            equal: None,
            any: self.build(any, &with_dimension)?,
            sets,
        })
    }
}
