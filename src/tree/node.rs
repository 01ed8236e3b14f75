use crate::bitset::Bitset;

/// Absent subtrees contribute nothing to a match
pub(crate) type Child<T> = Option<Box<TreeNode<T>>>;

/// Tree node. Children are owned by their parent; nodes are never mutated
/// after the build.
#[derive(Debug)]
pub(crate) enum TreeNode<T> {
    /// Payloads whose remaining constraints do not discriminate further
    Leaf(Vec<T>),
    Node(SplitNode<T>),
}

/// Internal node splitting on one dimension
#[derive(Debug)]
pub(crate) struct SplitNode<T> {
    pub dimension: usize,
    /// Median code for scalar splits, `ANY` for set splits
    pub split_value: i64,
    /// Rules with code < `split_value`
    pub left: Child<T>,
    /// Rules with code > `split_value`
    pub right: Child<T>,
    /// Rules with code == `split_value`
    pub equal: Child<T>,
    /// Rules unconstrained on `dimension`
    pub any: Child<T>,
    pub sets: Vec<SetBranch<T>>,
}

/// Subtree of rules sharing one set constraint on the node's dimension
#[derive(Debug)]
pub(crate) struct SetBranch<T> {
    pub bitset: Bitset,
    pub include: bool,
    pub subtree: Child<T>,
}

impl<T> SetBranch<T> {
    /// Check if the query codes satisfy this branch's set constraint
    pub fn matches(&self, codes: &[i64]) -> bool {
        let hit = codes.iter().any(|&code| self.bitset.contains_code(code));
        hit == self.include
    }
}

impl<T> SplitNode<T> {
    /// Labelled children in dump order; set branches are labelled by the caller
    pub fn scalar_children(&self) -> [(&'static str, &Child<T>); 4] {
        [
            ("l", &self.left),
            ("r", &self.right),
            ("eq", &self.equal),
            ("a", &self.any),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(codes: &[i64], include: bool) -> SetBranch<()> {
        SetBranch {
            bitset: Bitset::from_codes(8, codes.iter().copied()),
            include,
            subtree: None,
        }
    }

    #[test]
    fn test_include_branch() {
        let b = branch(&[1, 2], true);
        assert!(b.matches(&[1]));
        assert!(b.matches(&[5, 2]));
        assert!(!b.matches(&[3]));
    }

    #[test]
    fn test_exclude_branch() {
        let b = branch(&[1, 2], false);
        assert!(!b.matches(&[1]));
        assert!(!b.matches(&[3, 2]));
        assert!(b.matches(&[3]));
        assert!(b.matches(&[0, 4]));
    }
}
