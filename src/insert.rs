use crate::augment::{Augment, NoAugment};
use crate::node::{Color, Linked, NodeId, is_red_at, set_color_at};
use crate::root::Root;

impl Root {
    /// Restores the red-black invariants after `node` was attached with
    /// [`Root::link`].
    pub fn insert_fixup<S: Linked + ?Sized>(&self, store: &S, node: NodeId) {
        self.insert_fixup_augmented(store, node, &mut NoAugment);
    }

    /// Restores the red-black invariants after `node` was attached with
    /// [`Root::link`], reporting every rotation to `aug`.
    ///
    /// The caller must already have brought the aggregates along the path
    /// from the root to the new leaf up to date; rotations then keep them
    /// correct through `aug.rotate`.
    ///
    /// Iterative; each pass either terminates or moves two levels up, so the
    /// work is O(log n) with at most two rotations.
    pub fn insert_fixup_augmented<S, A>(&self, store: &S, mut node: NodeId, aug: &mut A)
    where
        S: Linked + ?Sized,
        A: Augment<S>,
    {
        debug_assert!(
            store.links(node).is_linked(),
            "insert fixup on {node} which is not linked"
        );

        // Loop invariant: `node` is red.
        loop {
            let Some(parent) = store.links(node).parent() else {
                store.links(node).set_color(Color::Black);
                break;
            };

            let parent_links = store.links(parent);
            if parent_links.is_black() {
                break;
            }

            let Some(grandparent) = parent_links.parent() else {
                // A red root; recoloring it is always allowed.
                parent_links.set_color(Color::Black);
                break;
            };
            let grandparent_links = store.links(grandparent);

            if grandparent_links.left() == Some(parent) {
                let uncle = grandparent_links.right();

                if is_red_at(store, uncle) {
                    // Case 1: red uncle, push the red up to the grandparent.
                    set_color_at(store, uncle, Color::Black);
                    parent_links.set_color(Color::Black);
                    grandparent_links.set_color(Color::Red);
                    trace_log!("insert_fixup: color flip at {}", grandparent);
                    node = grandparent;
                    continue;
                }

                let mut parent = parent;
                if parent_links.right() == Some(node) {
                    // Case 2: inner grandchild, turn it into an outer one.
                    self.rotate_left(store, parent, aug);
                    parent = node;
                }

                // Case 3: outer grandchild.
                store.links(parent).set_color(Color::Black);
                grandparent_links.set_color(Color::Red);
                self.rotate_right(store, grandparent, aug);
                break;
            } else {
                let uncle = grandparent_links.left();

                if is_red_at(store, uncle) {
                    set_color_at(store, uncle, Color::Black);
                    parent_links.set_color(Color::Black);
                    grandparent_links.set_color(Color::Red);
                    trace_log!("insert_fixup: color flip at {}", grandparent);
                    node = grandparent;
                    continue;
                }

                let mut parent = parent;
                if parent_links.left() == Some(node) {
                    self.rotate_right(store, parent, aug);
                    parent = node;
                }

                store.links(parent).set_color(Color::Black);
                grandparent_links.set_color(Color::Red);
                self.rotate_left(store, grandparent, aug);
                break;
            }
        }

        self.check_invariants(store, "insert");
    }
}
