use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::node::{Color, Dir, LinkState, Linked, NodeId};

/// Root handle of a tree.
///
/// The root is the only externally addressable entry point: every other node
/// is reached by walking links from it. All balancing operations are methods
/// on `Root` because a rotation or a splice at the top of the tree rewrites
/// this handle.
///
/// The engine assumes a single writer. Readers may load the root and walk
/// child links concurrently; see [`Root::replace_concurrent`].
pub struct Root {
    /// Encoded root node handle, `usize::MAX` when the tree is empty
    node: AtomicUsize,
}

impl Root {
    /// Creates an empty root
    #[inline]
    pub const fn new() -> Self {
        Self {
            node: AtomicUsize::new(NodeId::encode(None)),
        }
    }

    /// Returns the root node, if any
    #[inline]
    pub fn node(&self) -> Option<NodeId> {
        NodeId::decode(self.node.load(Ordering::Acquire))
    }

    /// Returns true if the tree has no nodes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.node().is_none()
    }

    #[inline]
    pub(crate) fn set(&self, node: Option<NodeId>) {
        self.node.store(NodeId::encode(node), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn publish(&self, node: Option<NodeId>) {
        self.node.store(NodeId::encode(node), Ordering::Release);
    }

    /// Attaches `node` as a red leaf in slot `dir` of `parent`, or as the root
    /// when `parent` is `None` (`dir` is then ignored).
    ///
    /// The caller has already located the position by comparison; the target
    /// slot must be empty. This only links the node in: call
    /// [`Root::insert_fixup`] afterwards to restore the red-black invariants.
    ///
    /// The node's fields are written before the slot that makes it reachable,
    /// and that slot is stored with `Release` ordering.
    pub fn link<S: Linked + ?Sized>(
        &self,
        store: &S,
        node: NodeId,
        parent: Option<NodeId>,
        dir: Dir,
    ) {
        let links = store.links(node);
        debug_assert!(!links.is_linked(), "linking {node} which is already linked");

        links.set_left(None);
        links.set_right(None);
        links.set_parent_and_color(parent, Color::Red);
        links.set_state(LinkState::Linked);

        match parent {
            Some(parent) => {
                debug_assert!(
                    store.links(parent).child(dir).is_none(),
                    "slot {dir:?} of {parent} is occupied"
                );
                store.links(parent).publish_child(dir, Some(node));
            }
            None => {
                debug_assert!(self.is_empty(), "linking {node} as root of a non-empty tree");
                self.publish(Some(node));
            }
        }
    }

    /// Points whichever slot held `old` (a child slot of `parent`, or the root
    /// handle) at `new`.
    pub(crate) fn change_child<S: Linked + ?Sized>(
        &self,
        store: &S,
        old: NodeId,
        new: Option<NodeId>,
        parent: Option<NodeId>,
    ) {
        match parent {
            Some(parent) => {
                let links = store.links(parent);
                if links.left() == Some(old) {
                    links.set_left(new);
                } else {
                    links.set_right(new);
                }
            }
            None => self.set(new),
        }
    }

    /// Same as [`Root::change_child`], but the store is a `Release` publish.
    pub(crate) fn publish_child<S: Linked + ?Sized>(
        &self,
        store: &S,
        old: NodeId,
        new: Option<NodeId>,
        parent: Option<NodeId>,
    ) {
        match parent {
            Some(parent) => {
                let links = store.links(parent);
                let dir = if links.left() == Some(old) {
                    Dir::Left
                } else {
                    Dir::Right
                };
                links.publish_child(dir, new);
            }
            None => self.publish(new),
        }
    }

    /// Re-verifies the whole tree after `op` when the `verify` feature is on
    /// in a debug build.
    #[inline]
    pub(crate) fn check_invariants<S: Linked + ?Sized>(&self, store: &S, op: &'static str) {
        if !cfg!(all(debug_assertions, feature = "verify")) {
            return;
        }
        if let Err(violation) = crate::verify(store, self) {
            panic!("red-black invariants violated after {op}: {violation}");
        }
    }
}

impl Default for Root {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Root").field(&self.node()).finish()
    }
}
