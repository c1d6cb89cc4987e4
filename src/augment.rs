use crate::node::{Linked, NodeId};

/// Callbacks that keep per-node aggregate data consistent across structural
/// changes.
///
/// A derived container (an interval tree keeping the maximum end point of
/// each subtree, an order-statistics tree keeping subtree sizes) implements
/// this trait and passes it to the `*_augmented` operations of
/// [`Root`](crate::Root). The engine never interprets the aggregate; it only
/// tells the container which nodes changed shape.
pub trait Augment<S: ?Sized> {
    /// Recomputes the aggregate of `node` and of its ancestors, walking upward
    /// until `stop` is reached (exclusive) or the root has been processed.
    fn propagate(&mut self, store: &S, node: NodeId, stop: Option<NodeId>);

    /// `new` has structurally taken the place of `old`: give it `old`'s
    /// aggregate.
    fn copy(&mut self, store: &S, old: NodeId, new: NodeId);

    /// A rotation moved `new` into the position previously held by `old`,
    /// which is now a child of `new`. Called once per rotation, after the
    /// links have been rewritten.
    fn rotate(&mut self, store: &S, old: NodeId, new: NodeId);
}

/// The default callback set: no aggregate data, every callback is a no-op.
///
/// With it the engine is a plain red-black tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoAugment;

impl<S: ?Sized> Augment<S> for NoAugment {
    #[inline(always)]
    fn propagate(&mut self, _store: &S, _node: NodeId, _stop: Option<NodeId>) {}

    #[inline(always)]
    fn copy(&mut self, _store: &S, _old: NodeId, _new: NodeId) {}

    #[inline(always)]
    fn rotate(&mut self, _store: &S, _old: NodeId, _new: NodeId) {}
}

/// A single aggregate value derived from a node and its two subtrees.
///
/// Implement this instead of [`Augment`] when the aggregate is a pure function
/// of the node and its children's aggregates, and wrap it in [`Summarized`]
/// to get the three callbacks.
pub trait Summary<S: ?Sized> {
    /// The aggregate stored in every node
    type Value: Copy + PartialEq;

    /// Computes the aggregate of `node` from the node itself and the stored
    /// aggregates of its children.
    fn compute(&self, store: &S, node: NodeId) -> Self::Value;

    /// Reads the aggregate currently stored in `node`
    fn get(&self, store: &S, node: NodeId) -> Self::Value;

    /// Stores `value` as the aggregate of `node`
    fn set(&self, store: &S, node: NodeId, value: Self::Value);
}

/// Adapter that derives the [`Augment`] callbacks from a [`Summary`].
///
/// - `propagate` recomputes upward and stops early as soon as a node's
///   stored aggregate is already up to date, since its ancestors then are too.
/// - `copy` transfers the stored aggregate unchanged.
/// - `rotate` hands the old subtree aggregate to the promoted node and
///   recomputes the demoted one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summarized<T>(pub T);

impl<S, T> Augment<S> for Summarized<T>
where
    S: Linked + ?Sized,
    T: Summary<S>,
{
    fn propagate(&mut self, store: &S, mut node: NodeId, stop: Option<NodeId>) {
        loop {
            if Some(node) == stop {
                break;
            }

            let value = self.0.compute(store, node);
            if self.0.get(store, node) == value {
                break;
            }
            self.0.set(store, node, value);

            match store.links(node).parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }
    }

    fn copy(&mut self, store: &S, old: NodeId, new: NodeId) {
        self.0.set(store, new, self.0.get(store, old));
    }

    fn rotate(&mut self, store: &S, old: NodeId, new: NodeId) {
        self.0.set(store, new, self.0.get(store, old));
        let value = self.0.compute(store, old);
        self.0.set(store, old, value);
    }
}
