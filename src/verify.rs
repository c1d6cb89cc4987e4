use crate::node::{Linked, NodeId};
use crate::root::Root;

/// The first red-black or structural invariant found broken by [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// The root is red
    #[error("root {0} is red")]
    RedRoot(NodeId),

    /// The root has a parent link
    #[error("root {0} has a parent")]
    RootHasParent(NodeId),

    /// A red node has a red child
    #[error("red node {node} has red child {child}")]
    RedRed {
        /// The red parent
        node: NodeId,
        /// Its red child
        child: NodeId,
    },

    /// The two subtrees of a node have different black heights
    #[error("black height below {node} differs: {left} on the left, {right} on the right")]
    BlackHeight {
        /// Node whose subtrees disagree
        node: NodeId,
        /// Black height of the left subtree
        left: usize,
        /// Black height of the right subtree
        right: usize,
    },

    /// A child does not point back at the node that links to it
    #[error("{child} is a child of {parent} but its parent link disagrees")]
    ParentMismatch {
        /// Node holding the child link
        parent: NodeId,
        /// Child with the wrong parent link
        child: NodeId,
    },

    /// Both child slots of a node hold the same node
    #[error("both children of {0} are the same node")]
    SharedChild(NodeId),

    /// A reachable node is not marked linked
    #[error("{0} is reachable but not marked linked")]
    NotLinked(NodeId),
}

/// Checks every invariant of the tree under `root`.
///
/// Returns the black height of the tree (black nodes on any root-to-leaf
/// path, empty leaves not counted; `0` for an empty tree), or the first
/// violation met in a depth-first, left-first walk. Recursion depth is the
/// tree height.
pub fn verify<S: Linked + ?Sized>(store: &S, root: &Root) -> Result<usize, Violation> {
    let Some(top) = root.node() else {
        return Ok(0);
    };

    let links = store.links(top);
    if links.parent().is_some() {
        return Err(Violation::RootHasParent(top));
    }
    if links.is_red() {
        return Err(Violation::RedRoot(top));
    }

    black_height(store, top)
}

fn black_height<S: Linked + ?Sized>(store: &S, node: NodeId) -> Result<usize, Violation> {
    let links = store.links(node);
    if !links.is_linked() {
        return Err(Violation::NotLinked(node));
    }

    let (left, right) = (links.left(), links.right());
    if left.is_some() && left == right {
        return Err(Violation::SharedChild(node));
    }

    for child in [left, right].into_iter().flatten() {
        let child_links = store.links(child);
        if child_links.parent() != Some(node) {
            return Err(Violation::ParentMismatch {
                parent: node,
                child,
            });
        }
        if links.is_red() && child_links.is_red() {
            return Err(Violation::RedRed { node, child });
        }
    }

    let left_height = match left {
        Some(left) => black_height(store, left)?,
        None => 0,
    };
    let right_height = match right {
        Some(right) => black_height(store, right)?,
        None => 0,
    };

    if left_height != right_height {
        return Err(Violation::BlackHeight {
            node,
            left: left_height,
            right: right_height,
        });
    }

    Ok(left_height + usize::from(links.is_black()))
}
