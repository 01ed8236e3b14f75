use std::collections::HashSet;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::error::Result;
use crate::query::EncodedQuery;
use crate::tree::Tree;
use crate::types::QueryValue;

/// Default LRU cache size
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// Options for [`CachedTree`].
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// LRU cache size for `find` results
    pub cache_size: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl TreeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache size.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}

/// Rule tree with LRU-cached `find` results
pub struct CachedTree<T> {
    tree: Arc<Tree<T>>,
    cache: Mutex<LruCache<EncodedQuery, Arc<HashSet<T>>>>,
}

impl<T: Clone + Eq + Hash> CachedTree<T> {
    pub fn new(tree: impl Into<Arc<Tree<T>>>, options: TreeOptions) -> Self {
        let cache_size = NonZeroUsize::new(options.cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            tree: tree.into(),
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// Match a query, consulting the cache first.
    ///
    /// Encoding errors are returned and never cached.
    pub fn find(&self, query: &[QueryValue]) -> Result<Arc<HashSet<T>>> {
        let key = self.tree.encode(query)?;

        let mut cache = self.cache.lock();

        if let Some(cached) = cache.get(&key) {
            tracing::trace!("rule tree cache hit");
            return Ok(Arc::clone(cached));
        }

        // Matching is CPU-only, so it runs under the lock to avoid
        // computing the same key twice.
        tracing::trace!("rule tree cache miss");
        let result = Arc::new(self.tree.find_encoded(&key));
        cache.put(key, Arc::clone(&result));

        Ok(result)
    }

    pub fn tree(&self) -> &Arc<Tree<T>> {
        &self.tree
    }

    /// Number of cached queries
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{Dimension, StringDimension};
    use crate::error::TreeError;
    use crate::types::{Constraint, Rule};

    fn cached(cache_size: usize) -> CachedTree<&'static str> {
        let dimensions: Vec<Box<dyn Dimension>> = vec![Box::new(StringDimension::new("color"))];
        let rules = vec![
            Rule::new("A", vec!["red".into()]),
            Rule::new("B", vec!["blue".into()]),
            Rule::new("C", vec![Constraint::Any]),
        ];
        let tree = Tree::build(dimensions, rules).unwrap();
        CachedTree::new(tree, TreeOptions::new().with_cache_size(cache_size))
    }

    #[test]
    fn test_cache_hit_returns_same_result() {
        let tree = cached(16);
        let r1 = tree.find(&["red".into()]).unwrap();
        let r2 = tree.find(&["red".into()]).unwrap();
        assert!(Arc::ptr_eq(&r1, &r2));
        assert_eq!(*r1, HashSet::from(["A", "C"]));
        assert_eq!(tree.cached_len(), 1);
    }

    #[test]
    fn test_cache_different_keys() {
        let tree = cached(16);
        assert_eq!(*tree.find(&["red".into()]).unwrap(), HashSet::from(["A", "C"]));
        assert_eq!(*tree.find(&["blue".into()]).unwrap(), HashSet::from(["B", "C"]));
        assert_eq!(
            *tree.find(&[QueryValue::Wildcard]).unwrap(),
            HashSet::from(["A", "B", "C"])
        );
        assert_eq!(tree.cached_len(), 3);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let tree = cached(16);
        let err = tree.find(&["green".into()]).unwrap_err();
        assert!(matches!(err, TreeError::UnknownValue { .. }));
        assert_eq!(tree.cached_len(), 0);
    }

    #[test]
    fn test_cache_eviction_and_clear() {
        let tree = cached(1);
        tree.find(&["red".into()]).unwrap();
        tree.find(&["blue".into()]).unwrap();
        assert_eq!(tree.cached_len(), 1);

        tree.clear_cache();
        assert_eq!(tree.cached_len(), 0);
        assert_eq!(*tree.find(&["red".into()]).unwrap(), HashSet::from(["A", "C"]));
    }

    #[test]
    fn test_zero_cache_size_is_clamped() {
        let tree = cached(0);
        tree.find(&["red".into()]).unwrap();
        assert_eq!(tree.cached_len(), 1);
    }
}
