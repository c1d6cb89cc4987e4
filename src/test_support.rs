//! A small keyed container built on the engine, shared by the unit tests.
//!
//! `Slab` owns its records in a `Vec` and does its own key comparison, the
//! way a real derived container would. Each record carries a `weight` and a
//! `summary` slot so tests can run an interval-style "max end point in
//! subtree" augmentation through [`MaxWeight`].

use core::sync::atomic::{AtomicU64, Ordering};

use crate::{Augment, Dir, Linked, Links, NoAugment, NodeId, Root, Summary};

pub(crate) struct Entry<K> {
    links: Links,
    key: K,
    weight: u64,
    summary: AtomicU64,
}

pub(crate) struct Slab<K> {
    entries: Vec<Entry<K>>,
}

impl<K> Linked for Slab<K> {
    fn links(&self, node: NodeId) -> &Links {
        &self.entries[node.index()].links
    }
}

impl<K: Ord + Copy> Slab<K> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Pushes one unlinked record per key, weight 0.
    pub(crate) fn with_keys(keys: impl IntoIterator<Item = K>) -> Self {
        let mut slab = Self::new();
        for key in keys {
            slab.push(key);
        }
        slab
    }

    pub(crate) fn push(&mut self, key: K) -> NodeId {
        self.push_weighted(key, 0)
    }

    pub(crate) fn push_weighted(&mut self, key: K, weight: u64) -> NodeId {
        let id = NodeId::new(self.entries.len());
        self.entries.push(Entry {
            links: Links::new(),
            key,
            weight,
            summary: AtomicU64::new(weight),
        });
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + use<K> {
        (0..self.entries.len()).map(NodeId::new)
    }

    pub(crate) fn key(&self, node: NodeId) -> K {
        self.entries[node.index()].key
    }

    pub(crate) fn weight(&self, node: NodeId) -> u64 {
        self.entries[node.index()].weight
    }

    pub(crate) fn summary(&self, node: NodeId) -> u64 {
        self.entries[node.index()].summary.load(Ordering::Relaxed)
    }

    pub(crate) fn set_summary(&self, node: NodeId, value: u64) {
        self.entries[node.index()]
            .summary
            .store(value, Ordering::Relaxed);
    }

    /// Finds the insertion slot for `node` by key (equal keys go right), links
    /// it and rebalances.
    pub(crate) fn insert(&self, root: &Root, node: NodeId) {
        self.insert_augmented(root, node, &mut NoAugment);
    }

    pub(crate) fn insert_augmented<A: Augment<Self>>(&self, root: &Root, node: NodeId, aug: &mut A) {
        let key = self.key(node);
        let mut parent = None;
        let mut dir = Dir::Left;
        let mut cursor = root.node();

        while let Some(current) = cursor {
            parent = Some(current);
            let links = self.links(current);
            if key < self.key(current) {
                dir = Dir::Left;
                cursor = links.left();
            } else {
                dir = Dir::Right;
                cursor = links.right();
            }
        }

        root.link(self, node, parent, dir);
        self.set_summary(node, self.weight(node));
        if let Some(parent) = parent {
            aug.propagate(self, parent, None);
        }
        root.insert_fixup_augmented(self, node, aug);
    }

    /// Inserts every record of the slab, in push order.
    pub(crate) fn insert_all(&self, root: &Root) {
        for node in self.ids() {
            self.insert(root, node);
        }
    }

    pub(crate) fn find(&self, root: &Root, key: K) -> Option<NodeId> {
        let mut cursor = root.node();
        while let Some(current) = cursor {
            let links = self.links(current);
            cursor = match key.cmp(&self.key(current)) {
                core::cmp::Ordering::Equal => return Some(current),
                core::cmp::Ordering::Less => links.left(),
                core::cmp::Ordering::Greater => links.right(),
            };
        }
        None
    }

    /// In-order keys
    pub(crate) fn keys(&self, root: &Root) -> Vec<K> {
        root.iter(self).map(|node| self.key(node)).collect()
    }

    /// Brute-force maximum weight of the subtree rooted at `node`
    pub(crate) fn subtree_max(&self, node: Option<NodeId>) -> u64 {
        match node {
            None => 0,
            Some(node) => {
                let links = self.links(node);
                self.weight(node)
                    .max(self.subtree_max(links.left()))
                    .max(self.subtree_max(links.right()))
            }
        }
    }

    /// Panics unless every linked node's summary equals its brute-force value.
    pub(crate) fn assert_summaries(&self, root: &Root) {
        for node in root.iter(self) {
            assert_eq!(
                self.summary(node),
                self.subtree_max(Some(node)),
                "stale summary at {node}"
            );
        }
    }
}

/// Maximum weight in a subtree, the interval-tree "max end" aggregate.
pub(crate) struct MaxWeight;

impl<K: Ord + Copy> Summary<Slab<K>> for MaxWeight {
    type Value = u64;

    fn compute(&self, store: &Slab<K>, node: NodeId) -> u64 {
        let links = store.links(node);
        let mut max = store.weight(node);
        if let Some(left) = links.left() {
            max = max.max(store.summary(left));
        }
        if let Some(right) = links.right() {
            max = max.max(store.summary(right));
        }
        max
    }

    fn get(&self, store: &Slab<K>, node: NodeId) -> u64 {
        store.summary(node)
    }

    fn set(&self, store: &Slab<K>, node: NodeId, value: u64) {
        store.set_summary(node, value);
    }
}

/// Wraps another callback set and counts the rotations it sees.
#[derive(Default)]
pub(crate) struct CountRotations<A> {
    pub(crate) inner: A,
    pub(crate) rotations: usize,
    pub(crate) last: Option<(NodeId, NodeId)>,
}

impl<S: ?Sized, A: Augment<S>> Augment<S> for CountRotations<A> {
    fn propagate(&mut self, store: &S, node: NodeId, stop: Option<NodeId>) {
        self.inner.propagate(store, node, stop);
    }

    fn copy(&mut self, store: &S, old: NodeId, new: NodeId) {
        self.inner.copy(store, old, new);
    }

    fn rotate(&mut self, store: &S, old: NodeId, new: NodeId) {
        self.rotations += 1;
        self.last = Some((old, new));
        self.inner.rotate(store, old, new);
    }
}
