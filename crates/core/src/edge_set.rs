//! Bidirectional edge set for many-to-many relations.
//!
//! A relation such as "follows" has two views: who a user follows (forward)
//! and who follows that user (inverse). Both views live in one `EdgeSet`, so an
//! insert or a removal always updates both sides together.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexSet;

/// A set of directed edges `left -> right` with forward and inverse views.
///
/// Each view lists neighbours in the order the edges were inserted.
#[derive(Debug, Clone)]
pub struct EdgeSet<L, R> {
    forward: HashMap<L, IndexSet<R>>,
    inverse: HashMap<R, IndexSet<L>>,
    len: usize,
}

impl<L, R> Default for EdgeSet<L, R> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            inverse: HashMap::new(),
            len: 0,
        }
    }
}

impl<L, R> EdgeSet<L, R>
where
    L: Clone + Eq + Hash,
    R: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the edge `left -> right`. Returns `false` if it already existed.
    pub fn insert(&mut self, left: L, right: R) -> bool {
        let added = self
            .forward
            .entry(left.clone())
            .or_default()
            .insert(right.clone());
        if added {
            self.inverse.entry(right).or_default().insert(left);
            self.len += 1;
        }
        added
    }

    /// Remove the edge `left -> right` from both views. Returns `false` if it
    /// was not present.
    pub fn remove(&mut self, left: &L, right: &R) -> bool {
        let removed = match self.forward.get_mut(left) {
            Some(rights) => rights.shift_remove(right),
            None => false,
        };
        if !removed {
            return false;
        }

        if self.forward.get(left).is_some_and(|rights| rights.is_empty()) {
            self.forward.remove(left);
        }
        if let Some(lefts) = self.inverse.get_mut(right) {
            lefts.shift_remove(left);
            if lefts.is_empty() {
                self.inverse.remove(right);
            }
        }
        self.len -= 1;
        true
    }

    pub fn contains(&self, left: &L, right: &R) -> bool {
        self.forward
            .get(left)
            .is_some_and(|rights| rights.contains(right))
    }

    /// Right-hand neighbours of `left`, in insertion order.
    pub fn forward<'a>(&'a self, left: &L) -> impl Iterator<Item = &'a R> + use<'a, L, R> {
        self.forward.get(left).into_iter().flatten()
    }

    /// Left-hand neighbours of `right`, in insertion order.
    pub fn inverse<'a>(&'a self, right: &R) -> impl Iterator<Item = &'a L> + use<'a, L, R> {
        self.inverse.get(right).into_iter().flatten()
    }

    /// All edges, grouped by left-hand side.
    pub fn edges(&self) -> impl Iterator<Item = (&L, &R)> + '_ {
        self.forward
            .iter()
            .flat_map(|(left, rights)| rights.iter().map(move |right| (left, right)))
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn insert_registers_both_views() {
        let mut edges = EdgeSet::new();
        assert!(edges.insert("a", "b"));

        assert_eq!(edges.forward(&"a").collect::<Vec<_>>(), vec![&"b"]);
        assert_eq!(edges.inverse(&"b").collect::<Vec<_>>(), vec![&"a"]);
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn duplicate_insert_is_a_no_op() {
        let mut edges = EdgeSet::new();
        assert!(edges.insert(1, 2));
        assert!(!edges.insert(1, 2));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges.inverse(&2).count(), 1);
    }

    #[test]
    fn remove_clears_both_views() {
        let mut edges = EdgeSet::new();
        edges.insert(1, 2);
        edges.insert(1, 3);

        assert!(edges.remove(&1, &2));
        assert!(!edges.contains(&1, &2));
        assert_eq!(edges.inverse(&2).count(), 0);
        assert_eq!(edges.forward(&1).collect::<Vec<_>>(), vec![&3]);
        assert!(!edges.remove(&1, &2));
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn forward_view_keeps_insertion_order_after_removal() {
        let mut edges = EdgeSet::new();
        for right in [5, 3, 9, 1] {
            edges.insert(0, right);
        }
        edges.remove(&0, &3);
        assert_eq!(edges.forward(&0).copied().collect::<Vec<_>>(), vec![5, 9, 1]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: after any sequence of inserts/removes, every forward edge
        /// has its inverse counterpart and vice versa.
        #[test]
        fn views_stay_symmetric(
            ops in prop::collection::vec((any::<bool>(), 0u8..6, 0u8..6), 0..64)
        ) {
            let mut edges = EdgeSet::new();
            for (insert, left, right) in ops {
                if insert {
                    edges.insert(left, right);
                } else {
                    edges.remove(&left, &right);
                }
            }

            let mut count = 0;
            for (left, right) in edges.edges() {
                prop_assert!(edges.inverse(right).any(|l| l == left));
                count += 1;
            }
            prop_assert_eq!(count, edges.len());
            for right in 0u8..6 {
                for left in edges.inverse(&right) {
                    prop_assert!(edges.contains(left, &right));
                }
            }
        }
    }
}
