use crate::augment::Augment;
use crate::node::{Linked, NodeId};
use crate::root::Root;

impl Root {
    /// Rotates left at `pivot`: its right child takes the pivot's position and
    /// the pivot becomes that child's left child. The child's former left
    /// subtree moves under the pivot. In-order sequence is unchanged.
    ///
    /// Calls `aug.rotate(pivot, promoted)` once the links are rewritten. Does
    /// nothing if `pivot` has no right child. Colors are not touched, so on
    /// its own this may break the red-black invariants.
    pub fn rotate_left<S, A>(&self, store: &S, pivot: NodeId, aug: &mut A)
    where
        S: Linked + ?Sized,
        A: Augment<S>,
    {
        let links = store.links(pivot);
        let Some(promoted) = links.right() else {
            return;
        };
        let promoted_links = store.links(promoted);

        let inner = promoted_links.left();
        links.set_right(inner);
        if let Some(inner) = inner {
            store.links(inner).set_parent(Some(pivot));
        }

        let parent = links.parent();
        promoted_links.set_parent(parent);
        self.change_child(store, pivot, Some(promoted), parent);

        promoted_links.set_left(Some(pivot));
        links.set_parent(Some(promoted));

        trace_log!("rotate_left: {} promoted over {}", promoted, pivot);
        aug.rotate(store, pivot, promoted);
    }

    /// Rotates right at `pivot`; the mirror image of [`Root::rotate_left`].
    pub fn rotate_right<S, A>(&self, store: &S, pivot: NodeId, aug: &mut A)
    where
        S: Linked + ?Sized,
        A: Augment<S>,
    {
        let links = store.links(pivot);
        let Some(promoted) = links.left() else {
            return;
        };
        let promoted_links = store.links(promoted);

        let inner = promoted_links.right();
        links.set_left(inner);
        if let Some(inner) = inner {
            store.links(inner).set_parent(Some(pivot));
        }

        let parent = links.parent();
        promoted_links.set_parent(parent);
        self.change_child(store, pivot, Some(promoted), parent);

        promoted_links.set_right(Some(pivot));
        links.set_parent(Some(promoted));

        trace_log!("rotate_right: {} promoted over {}", promoted, pivot);
        aug.rotate(store, pivot, promoted);
    }
}
