use core::iter::FusedIterator;

use crate::node::{Linked, NodeId};
use crate::root::Root;

#[inline]
pub(crate) fn leftmost<S: Linked + ?Sized>(store: &S, mut node: NodeId) -> NodeId {
    while let Some(left) = store.links(node).left() {
        node = left;
    }
    node
}

#[inline]
pub(crate) fn rightmost<S: Linked + ?Sized>(store: &S, mut node: NodeId) -> NodeId {
    while let Some(right) = store.links(node).right() {
        node = right;
    }
    node
}

/// Deepest node reachable from `node` preferring left, then right.
fn left_deepest<S: Linked + ?Sized>(store: &S, mut node: NodeId) -> NodeId {
    loop {
        let links = store.links(node);
        match (links.left(), links.right()) {
            (Some(left), _) => node = left,
            (None, Some(right)) => node = right,
            (None, None) => return node,
        }
    }
}

impl Root {
    /// Returns the smallest node in sort order, if any
    pub fn first<S: Linked + ?Sized>(&self, store: &S) -> Option<NodeId> {
        self.node().map(|root| leftmost(store, root))
    }

    /// Returns the largest node in sort order, if any
    pub fn last<S: Linked + ?Sized>(&self, store: &S) -> Option<NodeId> {
        self.node().map(|root| rightmost(store, root))
    }

    /// Returns the first node of a post-order walk: the deepest node on the
    /// left-preferring path from the root.
    pub fn first_postorder<S: Linked + ?Sized>(&self, store: &S) -> Option<NodeId> {
        self.node().map(|root| left_deepest(store, root))
    }

    /// In-order iterator over the tree, usable from both ends.
    pub fn iter<'a, S: Linked + ?Sized>(&self, store: &'a S) -> Iter<'a, S> {
        Iter {
            store,
            front: self.first(store),
            back: self.last(store),
        }
    }

    /// Post-order iterator over the tree.
    ///
    /// Each node is yielded after both of its children, and the iterator has
    /// already stepped past a node when it is yielded, so the caller may
    /// recycle it right away.
    pub fn postorder<'a, S: Linked + ?Sized>(&self, store: &'a S) -> Postorder<'a, S> {
        Postorder {
            store,
            next: self.first_postorder(store),
        }
    }

    /// Empties the tree, handing every node to `f` in post-order.
    ///
    /// Each node is re-marked [`Unlinked`](crate::LinkState::Unlinked) before
    /// `f` sees it, and no rebalancing is done. The root is empty as soon as
    /// the walk starts.
    pub fn teardown<S, F>(&self, store: &S, mut f: F)
    where
        S: Linked + ?Sized,
        F: FnMut(NodeId),
    {
        let mut cursor = self.first_postorder(store);
        self.publish(None);

        while let Some(node) = cursor {
            cursor = next_postorder(store, node);
            store.links(node).reset();
            trace_log!("teardown: releasing {}", node);
            f(node);
        }
    }
}

/// Returns the in-order successor of `node`.
///
/// `None` if `node` is the maximum or is not currently linked. A node
/// detached by [`Root::erase`] or a replace no longer has a position to step
/// from.
pub fn next<S: Linked + ?Sized>(store: &S, node: NodeId) -> Option<NodeId> {
    let links = store.links(node);
    if !links.is_linked() {
        return None;
    }

    if let Some(right) = links.right() {
        return Some(leftmost(store, right));
    }

    // No right subtree: climb while we are a right child.
    let mut node = node;
    let mut parent = links.parent();
    while let Some(up) = parent {
        let up_links = store.links(up);
        if up_links.right() != Some(node) {
            break;
        }
        node = up;
        parent = up_links.parent();
    }
    parent
}

/// Returns the in-order predecessor of `node`; the mirror image of [`next`].
pub fn prev<S: Linked + ?Sized>(store: &S, node: NodeId) -> Option<NodeId> {
    let links = store.links(node);
    if !links.is_linked() {
        return None;
    }

    if let Some(left) = links.left() {
        return Some(rightmost(store, left));
    }

    let mut node = node;
    let mut parent = links.parent();
    while let Some(up) = parent {
        let up_links = store.links(up);
        if up_links.left() != Some(node) {
            break;
        }
        node = up;
        parent = up_links.parent();
    }
    parent
}

/// Returns the node after `node` in post-order.
///
/// A left child with a right sibling is followed by the deepest node of that
/// sibling's subtree; any other node is followed by its parent.
pub fn next_postorder<S: Linked + ?Sized>(store: &S, node: NodeId) -> Option<NodeId> {
    let parent = store.links(node).parent()?;
    let parent_links = store.links(parent);

    match parent_links.right() {
        Some(right) if parent_links.left() == Some(node) => Some(left_deepest(store, right)),
        _ => Some(parent),
    }
}

/// Double-ended in-order iterator, created by [`Root::iter`].
///
/// The tree must not be modified while the iterator is alive.
pub struct Iter<'a, S: ?Sized> {
    store: &'a S,
    front: Option<NodeId>,
    back: Option<NodeId>,
}

impl<S: Linked + ?Sized> Iterator for Iter<'_, S> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = next(self.store, node);
        }
        Some(node)
    }
}

impl<S: Linked + ?Sized> DoubleEndedIterator for Iter<'_, S> {
    fn next_back(&mut self) -> Option<NodeId> {
        let node = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = prev(self.store, node);
        }
        Some(node)
    }
}

impl<S: Linked + ?Sized> FusedIterator for Iter<'_, S> {}

/// Post-order iterator, created by [`Root::postorder`].
pub struct Postorder<'a, S: ?Sized> {
    store: &'a S,
    next: Option<NodeId>,
}

impl<S: Linked + ?Sized> Iterator for Postorder<'_, S> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.next?;
        self.next = next_postorder(self.store, node);
        Some(node)
    }
}

impl<S: Linked + ?Sized> FusedIterator for Postorder<'_, S> {}
