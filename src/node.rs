use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Sentinel stored in a link word when the link is empty
const NIL: usize = usize::MAX;

const BLACK_BIT: u8 = 0b001;
const STATE_SHIFT: u8 = 1;
const STATE_MASK: u8 = 0b110;

/// Handle of a node inside caller-owned storage.
///
/// The engine never dereferences a `NodeId` itself; it asks the [`Linked`]
/// store for the node's [`Links`]. A handle is a plain lookup key, so a parent
/// back-reference can never keep a node alive or form an ownership cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a handle for the node stored at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is `usize::MAX`, which is reserved for empty links.
    #[inline]
    pub const fn new(index: usize) -> Self {
        assert!(index != NIL, "usize::MAX is reserved for empty links");
        Self(index)
    }

    /// Returns the storage index of this node
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub(crate) const fn encode(node: Option<NodeId>) -> usize {
        match node {
            Some(NodeId(index)) => index,
            None => NIL,
        }
    }

    #[inline]
    pub(crate) const fn decode(raw: usize) -> Option<NodeId> {
        if raw == NIL { None } else { Some(NodeId(raw)) }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Red-Black tree node colors used to maintain tree balance properties.
///
/// Red-Black trees maintain balance by ensuring:
/// - Red nodes have black children
/// - All paths from a node to its empty descendants have equal black node counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Red node - must have black children, cannot be adjacent to other red nodes
    Red,
    /// Black node - can have children of any color, contributes to black height
    Black,
}

/// Child slot of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    /// The left child, holding smaller keys
    Left,
    /// The right child, holding greater or equal keys
    Right,
}

impl Dir {
    /// Returns the mirrored slot
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Membership of a node in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Freshly constructed or cleared for reuse; its links are empty
    Unlinked,
    /// Part of a tree
    Linked,
    /// Erased or replaced; its links are stale and still describe the old
    /// position, which keeps concurrent readers standing on it walking
    Detached,
}

impl LinkState {
    #[inline]
    const fn bits(self) -> u8 {
        let state = match self {
            LinkState::Unlinked => 0,
            LinkState::Linked => 1,
            LinkState::Detached => 2,
        };
        state << STATE_SHIFT
    }

    #[inline]
    const fn from_bits(meta: u8) -> Self {
        match (meta & STATE_MASK) >> STATE_SHIFT {
            1 => LinkState::Linked,
            2 => LinkState::Detached,
            _ => LinkState::Unlinked,
        }
    }
}

/// The structural part of a node: parent, children, color and link state.
///
/// Callers embed one `Links` per record and expose it through [`Linked`].
/// Every word is atomic so that a single writer and any number of lock-free
/// readers can share the store. Loads use `Acquire`; ordinary stores use
/// `Relaxed` and only the stores that make a node reachable use `Release`.
pub struct Links {
    /// Encoded parent handle, `NIL` for the root or an unlinked node
    parent: AtomicUsize,

    /// Encoded left child handle, `NIL` if absent
    left: AtomicUsize,

    /// Encoded right child handle, `NIL` if absent
    right: AtomicUsize,

    /// Color in bit 0, [`LinkState`] in bits 1-2
    meta: AtomicU8,
}

impl Links {
    /// Creates an unlinked, red, childless link record.
    #[inline]
    pub const fn new() -> Self {
        Self {
            parent: AtomicUsize::new(NIL),
            left: AtomicUsize::new(NIL),
            right: AtomicUsize::new(NIL),
            meta: AtomicU8::new(0),
        }
    }

    /// Returns the structural parent, `None` for the root
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        NodeId::decode(self.parent.load(Ordering::Acquire))
    }

    /// Returns the left child
    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        NodeId::decode(self.left.load(Ordering::Acquire))
    }

    /// Returns the right child
    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        NodeId::decode(self.right.load(Ordering::Acquire))
    }

    /// Returns the child in slot `dir`
    #[inline]
    pub fn child(&self, dir: Dir) -> Option<NodeId> {
        match dir {
            Dir::Left => self.left(),
            Dir::Right => self.right(),
        }
    }

    /// Returns the node color
    #[inline]
    pub fn color(&self) -> Color {
        if self.meta.load(Ordering::Acquire) & BLACK_BIT != 0 {
            Color::Black
        } else {
            Color::Red
        }
    }

    /// Returns true if the node is red
    #[inline]
    pub fn is_red(&self) -> bool {
        self.color() == Color::Red
    }

    /// Returns true if the node is black
    #[inline]
    pub fn is_black(&self) -> bool {
        self.color() == Color::Black
    }

    /// Returns the tree membership of the node
    #[inline]
    pub fn state(&self) -> LinkState {
        LinkState::from_bits(self.meta.load(Ordering::Acquire))
    }

    /// Returns true if the node is currently part of a tree
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.state() == LinkState::Linked
    }

    /// Recolors the node. Does not restore any tree invariant.
    #[inline]
    pub fn set_color(&self, color: Color) {
        let meta = self.meta.load(Ordering::Relaxed);
        self.meta.store(with_color(meta, color), Ordering::Relaxed);
    }

    /// Sets the parent and the color in one step. Does not restore any tree
    /// invariant and does not touch the parent's child slots.
    #[inline]
    pub fn set_parent_and_color(&self, parent: Option<NodeId>, color: Color) {
        self.set_parent(parent);
        self.set_color(color);
    }

    #[inline]
    pub(crate) fn set_parent(&self, parent: Option<NodeId>) {
        self.parent.store(NodeId::encode(parent), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_left(&self, left: Option<NodeId>) {
        self.left.store(NodeId::encode(left), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_right(&self, right: Option<NodeId>) {
        self.right.store(NodeId::encode(right), Ordering::Relaxed);
    }

    /// Stores `child` in slot `dir`, ordering every earlier write before it.
    #[inline]
    pub(crate) fn publish_child(&self, dir: Dir, child: Option<NodeId>) {
        let slot = match dir {
            Dir::Left => &self.left,
            Dir::Right => &self.right,
        };
        slot.store(NodeId::encode(child), Ordering::Release);
    }

    /// Stores the parent link, ordering every earlier write before it.
    #[inline]
    pub(crate) fn publish_parent(&self, parent: Option<NodeId>) {
        self.parent.store(NodeId::encode(parent), Ordering::Release);
    }

    #[inline]
    pub(crate) fn set_state(&self, state: LinkState) {
        let meta = self.meta.load(Ordering::Relaxed);
        self.meta
            .store((meta & !STATE_MASK) | state.bits(), Ordering::Relaxed);
    }

    /// Takes over the position described by `other`: parent, children, color
    /// and state.
    pub(crate) fn copy_from(&self, other: &Links) {
        self.set_parent(other.parent());
        self.set_left(other.left());
        self.set_right(other.right());
        self.meta
            .store(other.meta.load(Ordering::Acquire), Ordering::Relaxed);
    }

    /// Resets to the freshly constructed state
    pub(crate) fn reset(&self) {
        self.set_parent(None);
        self.set_left(None);
        self.set_right(None);
        self.meta.store(0, Ordering::Relaxed);
    }
}

#[inline]
const fn with_color(meta: u8, color: Color) -> u8 {
    match color {
        Color::Red => meta & !BLACK_BIT,
        Color::Black => meta | BLACK_BIT,
    }
}

impl Default for Links {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// A copy of a record is a different node, so it starts outside any tree.
impl Clone for Links {
    #[inline]
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for Links {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("state", &self.state())
            .field("color", &self.color())
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}

/// Storage that hands out the [`Links`] of its nodes.
///
/// This is the seam between the engine and a derived container: the container
/// owns its records (and their allocation) and the engine only ever reaches
/// them through this lookup.
pub trait Linked {
    /// Returns the links of `node`.
    ///
    /// Every `NodeId` the engine passes here was handed to it by the caller
    /// or read out of another node's links, so it is always in bounds for a
    /// well-formed tree.
    fn links(&self, node: NodeId) -> &Links;
}

impl Linked for [Links] {
    #[inline]
    fn links(&self, node: NodeId) -> &Links {
        &self[node.index()]
    }
}

/// Re-marks `node` as unlinked, emptying its links so it can be inserted again.
///
/// Must only be called on a node that is not part of a tree.
pub fn clear<S: Linked + ?Sized>(store: &S, node: NodeId) {
    debug_assert!(
        !store.links(node).is_linked(),
        "clearing {node} while it is still linked"
    );
    store.links(node).reset();
}

// Empty handles count as black leaves; these helpers let the fixup loops read
// and recolor possibly-absent relatives without branching at every call site.

#[inline]
pub(crate) fn color_of<S: Linked + ?Sized>(store: &S, node: Option<NodeId>) -> Color {
    match node {
        Some(node) => store.links(node).color(),
        None => Color::Black,
    }
}

#[inline]
pub(crate) fn is_red_at<S: Linked + ?Sized>(store: &S, node: Option<NodeId>) -> bool {
    color_of(store, node) == Color::Red
}

#[inline]
pub(crate) fn is_black_at<S: Linked + ?Sized>(store: &S, node: Option<NodeId>) -> bool {
    color_of(store, node) == Color::Black
}

#[inline]
pub(crate) fn set_color_at<S: Linked + ?Sized>(store: &S, node: Option<NodeId>, color: Color) {
    if let Some(node) = node {
        store.links(node).set_color(color);
    }
}

#[inline]
pub(crate) fn left_of<S: Linked + ?Sized>(store: &S, node: Option<NodeId>) -> Option<NodeId> {
    node.and_then(|node| store.links(node).left())
}

#[inline]
pub(crate) fn right_of<S: Linked + ?Sized>(store: &S, node: Option<NodeId>) -> Option<NodeId> {
    node.and_then(|node| store.links(node).right())
}
