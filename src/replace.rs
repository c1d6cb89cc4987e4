use crate::augment::{Augment, NoAugment};
use crate::node::{LinkState, Linked, NodeId};
use crate::root::Root;

impl Root {
    /// Puts `replacement` in the exact position of `victim`.
    ///
    /// The replacement takes over the victim's color, parent and children;
    /// nothing is rebalanced, so it must sort the same as the victim. The
    /// victim ends up [`LinkState::Detached`] with its old links.
    pub fn replace<S: Linked + ?Sized>(&self, store: &S, victim: NodeId, replacement: NodeId) {
        self.replace_augmented(store, victim, replacement, &mut NoAugment);
    }

    /// Same as [`Root::replace`], then hands the victim's aggregate to the
    /// replacement through `aug.copy`.
    ///
    /// If the replacement's own contribution differs from the victim's, the
    /// caller must `propagate` from the replacement afterwards.
    pub fn replace_augmented<S, A>(
        &self,
        store: &S,
        victim: NodeId,
        replacement: NodeId,
        aug: &mut A,
    ) where
        S: Linked + ?Sized,
        A: Augment<S>,
    {
        let parent = self.take_position(store, victim, replacement);
        for child in children(store, replacement) {
            store.links(child).set_parent(Some(replacement));
        }
        self.change_child(store, victim, Some(replacement), parent);
        aug.copy(store, victim, replacement);
        store.links(victim).set_state(LinkState::Detached);

        debug_log!("replace: {} takes the place of {}", replacement, victim);
        self.check_invariants(store, "replace");
    }

    /// [`Root::replace`] for trees walked by lock-free readers.
    ///
    /// Every field of `replacement` is written before any store that makes
    /// it reachable. The children's parent links and the parent's child slot
    /// (or the root) are all stored with `Release`, so a reader that
    /// `Acquire`-loads either direction sees a fully formed node.
    ///
    /// The victim's child links are left pointing into the tree, so a reader
    /// standing on it can finish walking down. It is no longer linked, so
    /// [`next`](crate::next) and [`prev`](crate::prev) return `None` from it.
    /// Its record must not be reused until all such readers are gone.
    pub fn replace_concurrent<S: Linked + ?Sized>(
        &self,
        store: &S,
        victim: NodeId,
        replacement: NodeId,
    ) {
        let parent = self.take_position(store, victim, replacement);
        for child in children(store, replacement) {
            store.links(child).publish_parent(Some(replacement));
        }
        self.publish_child(store, victim, Some(replacement), parent);
        store.links(victim).set_state(LinkState::Detached);

        debug_log!(
            "replace_concurrent: {} published in place of {}",
            replacement,
            victim
        );
        self.check_invariants(store, "replace_concurrent");
    }

    /// Copies the victim's links onto `replacement`. Returns the parent whose
    /// slot still has to be retargeted.
    fn take_position<S: Linked + ?Sized>(
        &self,
        store: &S,
        victim: NodeId,
        replacement: NodeId,
    ) -> Option<NodeId> {
        let victim_links = store.links(victim);
        let links = store.links(replacement);
        debug_assert!(
            victim_links.is_linked(),
            "replacing {victim} which is not linked"
        );
        debug_assert!(
            !links.is_linked(),
            "replacement {replacement} is already linked"
        );

        links.copy_from(victim_links);
        links.parent()
    }
}

fn children<S: Linked + ?Sized>(store: &S, node: NodeId) -> impl Iterator<Item = NodeId> {
    let links = store.links(node);
    [links.left(), links.right()].into_iter().flatten()
}
