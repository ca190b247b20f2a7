//! Append-only arena with typed handles.

use core::marker::PhantomData;

/// Index of a node in an [`Arena<N>`].
///
/// Handles are only meaningful for the arena that issued them.
pub struct Handle<N> {
    index: usize,
    _marker: PhantomData<fn() -> N>,
}

impl<N> Handle<N> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

// Manual impls: derives would require `N: Clone`, `N: Eq`, ...
impl<N> Clone for Handle<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for Handle<N> {}

impl<N> PartialEq for Handle<N> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<N> Eq for Handle<N> {}

impl<N> core::hash::Hash for Handle<N> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<N> core::fmt::Debug for Handle<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Owns every node of one graph.
#[derive(Debug, Clone)]
pub struct Arena<N> {
    nodes: Vec<N>,
}

impl<N> Default for Arena<N> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<N> Arena<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: N) -> Handle<N> {
        self.nodes.push(node);
        Handle::new(self.nodes.len() - 1)
    }

    pub fn get(&self, handle: Handle<N>) -> Option<&N> {
        self.nodes.get(handle.index)
    }

    pub fn get_mut(&mut self, handle: Handle<N>) -> Option<&mut N> {
        self.nodes.get_mut(handle.index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<N>, &N)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (Handle::new(index), node))
    }
}

impl<N> core::ops::Index<Handle<N>> for Arena<N> {
    type Output = N;

    fn index(&self, handle: Handle<N>) -> &N {
        &self.nodes[handle.index]
    }
}

impl<N> core::ops::IndexMut<Handle<N>> for Arena<N> {
    fn index_mut(&mut self, handle: Handle<N>) -> &mut N {
        &mut self.nodes[handle.index]
    }
}
