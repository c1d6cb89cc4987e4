use crate::augment::{Augment, NoAugment};
use crate::node::{
    Color, LinkState, Linked, NodeId, clear, is_black_at, is_red_at, left_of, right_of,
    set_color_at,
};
use crate::root::Root;
use crate::traverse::leftmost;

impl Root {
    /// Detaches `node` from the tree and restores the red-black invariants.
    ///
    /// Afterwards `node` is [`LinkState::Detached`]; call [`clear`] (or use
    /// [`Root::erase_init`]) before inserting it again. The relative order of
    /// every other node is unchanged.
    pub fn erase<S: Linked + ?Sized>(&self, store: &S, node: NodeId) {
        self.erase_augmented(store, node, &mut NoAugment);
    }

    /// Detaches `node` and re-marks it [`LinkState::Unlinked`] so its record
    /// can be reused right away.
    pub fn erase_init<S: Linked + ?Sized>(&self, store: &S, node: NodeId) {
        self.erase(store, node);
        clear(store, node);
    }

    /// Detaches `node`, keeping aggregate data consistent through `aug`.
    ///
    /// `aug.copy` moves the erased node's aggregate onto its in-order
    /// successor when the successor takes its place, `aug.propagate` repairs
    /// every position whose subtree lost a node, and `aug.rotate` follows
    /// each rebalancing rotation.
    pub fn erase_augmented<S, A>(&self, store: &S, node: NodeId, aug: &mut A)
    where
        S: Linked + ?Sized,
        A: Augment<S>,
    {
        debug_assert!(
            store.links(node).is_linked(),
            "erasing {node} which is not linked"
        );

        if let Some(parent) = self.splice_out(store, node, aug) {
            self.erase_fixup(store, parent, aug);
        }
        store.links(node).set_state(LinkState::Detached);

        debug_log!("erase: {} detached", node);
        self.check_invariants(store, "erase");
    }

    /// Unlinks `node` structurally. Returns the parent of the position that
    /// is one black node short, if any.
    fn splice_out<S, A>(&self, store: &S, node: NodeId, aug: &mut A) -> Option<NodeId>
    where
        S: Linked + ?Sized,
        A: Augment<S>,
    {
        let links = store.links(node);
        let parent = links.parent();
        let color = links.color();

        let (rebalance, changed) = match (links.left(), links.right()) {
            (None, child) => {
                self.change_child(store, node, child, parent);
                match child {
                    // A lone child of a node is always a red leaf; it inherits
                    // the erased node's color and the black height is kept.
                    Some(child) => {
                        store.links(child).set_parent_and_color(parent, color);
                        (None, parent)
                    }
                    None if color == Color::Black => (parent, parent),
                    None => (None, parent),
                }
            }
            (Some(child), None) => {
                store.links(child).set_parent_and_color(parent, color);
                self.change_child(store, node, Some(child), parent);
                (None, parent)
            }
            (Some(left), Some(right)) => {
                let successor = leftmost(store, right);
                let successor_links = store.links(successor);
                let successor_color = successor_links.color();
                let successor_child = successor_links.right();

                // Where the successor's old slot ends up after the move.
                let vacated = if successor == right {
                    aug.copy(store, node, successor);
                    successor
                } else {
                    let successor_parent = successor_links.parent().unwrap_or(right);
                    store.links(successor_parent).set_left(successor_child);
                    successor_links.set_right(Some(right));
                    store.links(right).set_parent(Some(successor));
                    aug.copy(store, node, successor);
                    aug.propagate(store, successor_parent, Some(successor));
                    successor_parent
                };

                successor_links.set_left(Some(left));
                store.links(left).set_parent(Some(successor));
                self.change_child(store, node, Some(successor), parent);

                let rebalance = match successor_child {
                    Some(child) => {
                        store
                            .links(child)
                            .set_parent_and_color(Some(vacated), Color::Black);
                        None
                    }
                    None if successor_color == Color::Black => Some(vacated),
                    None => None,
                };
                successor_links.set_parent_and_color(parent, color);
                (rebalance, Some(successor))
            }
        };

        if let Some(changed) = changed {
            aug.propagate(store, changed, None);
        }
        rebalance
    }

    /// Rebalances after a black node was removed below `parent`.
    ///
    /// The deficient side is the child slot of `parent` holding `node`
    /// (initially empty). Each pass either fixes the deficit or moves it one
    /// level up.
    fn erase_fixup<S, A>(&self, store: &S, mut parent: NodeId, aug: &mut A)
    where
        S: Linked + ?Sized,
        A: Augment<S>,
    {
        let mut node: Option<NodeId> = None;

        loop {
            let links = store.links(parent);

            if links.right() != node {
                // `node` is the left child; its sibling is on the right.
                let mut sibling = links.right();
                debug_assert!(
                    sibling.is_some(),
                    "black deficit below {parent} with no sibling"
                );

                if is_red_at(store, sibling) {
                    // Case 1: red sibling, rotate it above the parent so the
                    // new sibling is black.
                    set_color_at(store, sibling, Color::Black);
                    links.set_color(Color::Red);
                    self.rotate_left(store, parent, aug);
                    sibling = links.right();
                }

                if is_black_at(store, left_of(store, sibling))
                    && is_black_at(store, right_of(store, sibling))
                {
                    // Case 2: black sibling with black children.
                    set_color_at(store, sibling, Color::Red);
                    if links.is_red() {
                        links.set_color(Color::Black);
                        break;
                    }
                    trace_log!("erase_fixup: deficit moves up from {}", parent);
                    node = Some(parent);
                    match links.parent() {
                        Some(grandparent) => {
                            parent = grandparent;
                            continue;
                        }
                        None => break,
                    }
                }

                if is_black_at(store, right_of(store, sibling)) {
                    // Case 3: near child red, far child black.
                    set_color_at(store, left_of(store, sibling), Color::Black);
                    set_color_at(store, sibling, Color::Red);
                    if let Some(sibling) = sibling {
                        self.rotate_right(store, sibling, aug);
                    }
                    sibling = links.right();
                }

                // Case 4: far child red.
                set_color_at(store, sibling, links.color());
                links.set_color(Color::Black);
                set_color_at(store, right_of(store, sibling), Color::Black);
                self.rotate_left(store, parent, aug);
                break;
            } else {
                let mut sibling = links.left();
                debug_assert!(
                    sibling.is_some(),
                    "black deficit below {parent} with no sibling"
                );

                if is_red_at(store, sibling) {
                    set_color_at(store, sibling, Color::Black);
                    links.set_color(Color::Red);
                    self.rotate_right(store, parent, aug);
                    sibling = links.left();
                }

                if is_black_at(store, right_of(store, sibling))
                    && is_black_at(store, left_of(store, sibling))
                {
                    set_color_at(store, sibling, Color::Red);
                    if links.is_red() {
                        links.set_color(Color::Black);
                        break;
                    }
                    trace_log!("erase_fixup: deficit moves up from {}", parent);
                    node = Some(parent);
                    match links.parent() {
                        Some(grandparent) => {
                            parent = grandparent;
                            continue;
                        }
                        None => break,
                    }
                }

                if is_black_at(store, left_of(store, sibling)) {
                    set_color_at(store, right_of(store, sibling), Color::Black);
                    set_color_at(store, sibling, Color::Red);
                    if let Some(sibling) = sibling {
                        self.rotate_left(store, sibling, aug);
                    }
                    sibling = links.left();
                }

                set_color_at(store, sibling, links.color());
                links.set_color(Color::Black);
                set_color_at(store, left_of(store, sibling), Color::Black);
                self.rotate_right(store, parent, aug);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ahash::RandomState;
    use hashbrown::HashMap;
    use proptest::prelude::*;

    use crate::test_support::{CountRotations, MaxWeight, Slab};
    use crate::{
        Color, Dir, LinkState, Linked, Links, NoAugment, NodeId, Root, Summarized, next, prev,
        verify,
    };

    #[test]
    fn test_erase_only_node() {
        let slab = Slab::with_keys([1]);
        let root = Root::new();
        slab.insert_all(&root);

        root.erase(&slab, NodeId::new(0));

        assert!(root.is_empty());
        assert_eq!(slab.links(NodeId::new(0)).state(), LinkState::Detached);
    }

    #[test]
    fn test_erase_root_of_three() {
        let slab = Slab::with_keys([10, 20, 30]);
        let root = Root::new();
        slab.insert_all(&root);

        let twenty = slab.find(&root, 20).unwrap();
        root.erase(&slab, twenty);

        let top = root.node().unwrap();
        assert!(slab.links(top).is_black());
        assert!(matches!(slab.key(top), 10 | 30));
        assert_eq!(slab.keys(&root), vec![10, 30]);
        assert!(verify(&slab, &root).is_ok());
        assert_eq!(slab.find(&root, 20), None);
    }

    #[test]
    fn test_erase_red_leaf_needs_no_fixup() {
        let slab = Slab::with_keys([10, 20, 30]);
        let root = Root::new();
        slab.insert_all(&root);
        let mut aug = CountRotations::<NoAugment>::default();

        let thirty = slab.find(&root, 30).unwrap();
        root.erase_augmented(&slab, thirty, &mut aug);

        assert_eq!(aug.rotations, 0);
        assert_eq!(slab.keys(&root), vec![10, 20]);
        assert_eq!(verify(&slab, &root), Ok(1));
    }

    #[test]
    fn test_erase_black_leaf_rebalances() {
        // 20 black root, 10 and 30 black, 25/35 red under 30.
        let slab = Slab::with_keys([20, 10, 30, 25, 35, 5]);
        let root = Root::new();
        slab.insert_all(&root);
        let five = slab.find(&root, 5).unwrap();
        root.erase(&slab, five);
        assert!(verify(&slab, &root).is_ok());

        let ten = slab.find(&root, 10).unwrap();
        assert!(slab.links(ten).is_black());
        root.erase(&slab, ten);

        assert!(verify(&slab, &root).is_ok());
        assert_eq!(slab.keys(&root), vec![20, 25, 30, 35]);
    }

    #[test]
    fn test_erase_node_with_deep_successor() {
        let slab = Slab::with_keys([50, 25, 75, 12, 37, 62, 87, 6, 18, 31, 43, 56, 68]);
        let root = Root::new();
        slab.insert_all(&root);

        for key in [25, 50, 75] {
            let node = slab.find(&root, key).unwrap();
            root.erase(&slab, node);
            assert!(verify(&slab, &root).is_ok(), "invalid after erasing {key}");
        }

        assert_eq!(slab.keys(&root), vec![6, 12, 18, 31, 37, 43, 56, 62, 68, 87]);
    }

    #[test]
    fn test_erase_everything_in_every_direction() {
        for order in 0..3 {
            let slab = Slab::with_keys(0..300u32);
            let root = Root::new();
            slab.insert_all(&root);

            let mut keys: Vec<u32> = (0..300).collect();
            match order {
                0 => {}
                1 => keys.reverse(),
                _ => keys.sort_by_key(|k| (k * 7919) % 300),
            }

            for (done, key) in keys.iter().enumerate() {
                let node = slab.find(&root, *key).unwrap();
                root.erase(&slab, node);
                assert!(verify(&slab, &root).is_ok());
                assert_eq!(slab.keys(&root).len(), 300 - done - 1);
            }
            assert!(root.is_empty());
        }
    }

    #[test]
    fn test_erase_init_allows_reinsertion() {
        let slab = Slab::with_keys([1, 2, 3, 4, 5]);
        let root = Root::new();
        slab.insert_all(&root);

        let three = slab.find(&root, 3).unwrap();
        root.erase_init(&slab, three);
        assert_eq!(slab.links(three).state(), LinkState::Unlinked);
        assert_eq!(slab.links(three).parent(), None);
        assert_eq!(slab.keys(&root), vec![1, 2, 4, 5]);

        slab.insert(&root, three);
        assert_eq!(slab.keys(&root), vec![1, 2, 3, 4, 5]);
        assert!(verify(&slab, &root).is_ok());
    }

    #[test]
    fn test_erased_node_can_be_relinked_after_clear() {
        let slab = Slab::with_keys([8, 4, 12]);
        let root = Root::new();
        slab.insert_all(&root);

        let four = slab.find(&root, 4).unwrap();
        root.erase(&slab, four);
        crate::clear(&slab, four);
        slab.insert(&root, four);

        assert_eq!(slab.keys(&root), vec![4, 8, 12]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not linked")]
    fn test_double_erase_caught() {
        let slab = Slab::with_keys([1, 2]);
        let root = Root::new();
        slab.insert_all(&root);
        root.erase(&slab, NodeId::new(1));
        root.erase(&slab, NodeId::new(1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "no sibling")]
    fn test_missing_sibling_caught() {
        // Black root with a lone black left child: one black node too many
        // on the left, so erasing the child leaves a deficit with no sibling.
        let links: [Links; 2] = Default::default();
        let store: &[Links] = &links;
        let root = Root::new();
        root.link(store, NodeId::new(0), None, Dir::Left);
        root.link(store, NodeId::new(1), Some(NodeId::new(0)), Dir::Left);
        store[0].set_color(Color::Black);
        store[1].set_color(Color::Black);

        root.erase(store, NodeId::new(1));
    }

    #[test]
    fn test_erased_node_has_no_neighbours() {
        let slab = Slab::with_keys([10, 20, 30, 40, 50]);
        let root = Root::new();
        slab.insert_all(&root);

        let thirty = slab.find(&root, 30).unwrap();
        root.erase(&slab, thirty);

        assert_eq!(next(&slab, thirty), None);
        assert_eq!(prev(&slab, thirty), None);
        let twenty = slab.find(&root, 20).unwrap();
        assert_eq!(slab.key(next(&slab, twenty).unwrap()), 40);
    }

    #[test]
    fn test_root_stays_black_after_erase() {
        let slab = Slab::with_keys(0..64u32);
        let root = Root::new();
        slab.insert_all(&root);

        for key in (0..64).step_by(3) {
            let node = slab.find(&root, key).unwrap();
            root.erase(&slab, node);
            assert_eq!(slab.links(root.node().unwrap()).color(), Color::Black);
        }
    }

    #[test]
    fn test_augmented_erase_keeps_summaries() {
        let mut slab = Slab::new();
        for key in 0..200u64 {
            slab.push_weighted(key, (key * 37) % 101);
        }
        let root = Root::new();
        let mut aug = Summarized(MaxWeight);
        for node in slab.ids() {
            slab.insert_augmented(&root, node, &mut aug);
        }

        for key in (0..200u64).map(|k| (k * 53) % 200) {
            let node = slab.find(&root, key).unwrap();
            root.erase_augmented(&slab, node, &mut aug);
            slab.assert_summaries(&root);
            assert!(verify(&slab, &root).is_ok());
        }
        assert!(root.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u16),
        Erase(u16),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u16..64).prop_map(Op::Insert),
            2 => (0u16..64).prop_map(Op::Erase),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        /// Random insert/erase sequences against a multiset oracle.
        #[test]
        fn prop_matches_multiset(ops in prop::collection::vec(op(), 1..200)) {
            let mut slab = Slab::new();
            for op in &ops {
                if let Op::Insert(key) = op {
                    slab.push_weighted(*key, u64::from(*key) * 3 % 17);
                }
            }

            let root = Root::new();
            let mut aug = Summarized(MaxWeight);
            let mut oracle: HashMap<u16, usize, RandomState> = HashMap::with_hasher(RandomState::new());
            let mut next_record = 0;

            for op in &ops {
                match op {
                    Op::Insert(key) => {
                        let node = NodeId::new(next_record);
                        next_record += 1;
                        slab.insert_augmented(&root, node, &mut aug);
                        *oracle.entry(*key).or_insert(0) += 1;
                    }
                    Op::Erase(key) => {
                        let expected = oracle.get(key).copied().unwrap_or(0);
                        match slab.find(&root, *key) {
                            Some(node) => {
                                prop_assert!(expected > 0);
                                root.erase_augmented(&slab, node, &mut aug);
                                oracle.insert(*key, expected - 1);
                            }
                            None => {
                                prop_assert_eq!(expected, 0);
                            }
                        }
                    }
                }

                prop_assert!(verify(&slab, &root).is_ok());
                slab.assert_summaries(&root);
            }

            let mut expected: Vec<u16> = oracle
                .iter()
                .flat_map(|(key, count)| core::iter::repeat_n(*key, *count))
                .collect();
            expected.sort_unstable();
            prop_assert_eq!(slab.keys(&root), expected);
        }
    }
}
