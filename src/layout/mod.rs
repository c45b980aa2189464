//! Split-pane layout tree.
//!
//! A [`LayoutTree`] arranges panes in nested groups. Each group lays its children out along
//! one [`Orientation`]; each pane (leaf) carries an opaque value `V`, such as a buffer id.
//! Exactly one leaf is focused at any time, and all operations act on it:
//!
//! - [`split`](LayoutTree::split) places a new leaf next to the focused one and focuses it,
//! - [`remove`](LayoutTree::remove) closes the focused leaf, collapsing groups that end up
//!   with a single child,
//! - [`move_focus`](LayoutTree::move_focus) moves focus to the neighbouring leaf on screen.
//!
//! After every change the tree refreshes a cached [`SerializedTree`] snapshot and calls its
//! observers, so a renderer can subscribe once and redraw from the snapshot.
//!
//! ```
//! use panetree::layout::LayoutTree;
//! use panetree::ipc::{Direction, Orientation};
//!
//! let mut tree = LayoutTree::new("editor");
//! tree.split(Orientation::Vertical, Some("terminal"));
//! assert_eq!(tree.focused_value(), &"terminal");
//!
//! tree.move_focus(Direction::Left);
//! assert_eq!(tree.focused_value(), &"editor");
//! assert_eq!(tree.flatten(), ["editor", "terminal"]);
//! ```

use std::fmt;

use panetree_ipc::{Direction, GroupId, NodeId, Orientation, SerializedTree, TreeId};

use self::container::ContainerTree;

mod container;
mod navigation;


/// Error returned by fallible [`LayoutTree`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The id does not name a live leaf, usually because it comes from a stale snapshot.
    #[error("{0} is not a pane of this layout tree")]
    NotFound(NodeId),
}

/// Handle identifying an observer registered with [`LayoutTree::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Observer<V> = Box<dyn FnMut(&SerializedTree<V>)>;

/// Split-pane layout tree with a focused pane.
pub struct LayoutTree<V> {
    tree: ContainerTree<V>,
    /// Snapshot as of the last change.
    snapshot: SerializedTree<V>,
    observers: Vec<(Subscription, Observer<V>)>,
    next_subscription: u64,
}

impl<V: Clone> LayoutTree<V> {
    /// Creates a tree with a single focused pane holding `value`.
    pub fn new(value: V) -> Self {
        let tree = ContainerTree::new(value);
        let snapshot = tree.serialize();
        debug!("created layout tree {}", tree.id());

        Self {
            tree,
            snapshot,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Splits the focused pane along `orientation`.
    ///
    /// The new pane goes right after the focused one. When the focused pane's group already
    /// has this orientation the new pane simply joins it; otherwise the focused pane is
    /// wrapped in a new group together with the new pane. The new pane holds `value`, or a
    /// copy of the focused pane's value, and becomes focused.
    pub fn split(&mut self, orientation: Orientation, value: Option<V>) -> NodeId {
        let value = value.unwrap_or_else(|| self.tree.focused_value().clone());
        let id = self.tree.split(orientation, value);
        trace!("split {orientation:?} into {id}");
        self.emit_change();
        id
    }

    /// Removes the focused pane and returns its value.
    ///
    /// The last remaining pane cannot be removed: this returns `None` and leaves the tree
    /// untouched. Otherwise focus moves to the neighbouring pane that takes its place.
    pub fn remove(&mut self) -> Option<V> {
        let removed = self.tree.focused();
        let Some(value) = self.tree.remove_focused() else {
            debug!("not removing {removed}: it is the last pane");
            return None;
        };

        trace!("removed {removed}, focus moves to {}", self.tree.focused());
        self.emit_change();
        Some(value)
    }

    /// Replaces the focused pane's value.
    pub fn set_value(&mut self, value: V) {
        self.tree.set_focused_value(value);
        self.emit_change();
    }

    /// Focuses a pane by id.
    ///
    /// Accepts a [`NodeId`] or a leaf from a snapshot. Fails with [`TreeError::NotFound`]
    /// when the pane no longer exists.
    pub fn set_focused(&mut self, target: impl Into<NodeId>) -> Result<(), TreeError> {
        let id = target.into();
        if let Err(err) = self.tree.focus_leaf(id) {
            debug!("{err}");
            return Err(err);
        }

        self.emit_change();
        Ok(())
    }

    /// Moves focus to the neighbouring pane in `direction`.
    ///
    /// Returns `false` and notifies nobody when there is no pane in that direction.
    pub fn move_focus(&mut self, direction: Direction) -> bool {
        let moved = self.tree.focus_in_direction(direction);
        if moved {
            trace!("moved focus {direction:?} to {}", self.tree.focused());
            self.emit_change();
        }
        moved
    }

    /// Serializes the live tree.
    ///
    /// This always matches [`snapshot`](Self::snapshot); prefer that one to avoid the copy.
    pub fn to_snapshot(&self) -> SerializedTree<V> {
        self.tree.serialize()
    }

    /// Values of all panes in document order.
    pub fn flatten(&self) -> Vec<V> {
        self.tree.leaves().map(|(_, value)| value.clone()).collect()
    }

    fn emit_change(&mut self) {
        self.snapshot = self.tree.serialize();
        for (_, observer) in &mut self.observers {
            observer(&self.snapshot);
        }
    }
}

impl<V> LayoutTree<V> {
    /// Registers an observer called after every change with the fresh snapshot.
    pub fn subscribe(&mut self, observer: impl FnMut(&SerializedTree<V>) + 'static) -> Subscription {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((subscription, Box::new(observer)));
        subscription
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let len = self.observers.len();
        self.observers.retain(|(s, _)| *s != subscription);
        self.observers.len() != len
    }

    /// Snapshot of the tree as of the last change.
    pub fn snapshot(&self) -> &SerializedTree<V> {
        &self.snapshot
    }

    pub fn id(&self) -> TreeId {
        self.tree.id()
    }

    /// Id of the focused pane.
    pub fn focused(&self) -> NodeId {
        self.tree.focused()
    }

    pub fn focused_value(&self) -> &V {
        self.tree.focused_value()
    }

    pub fn value(&self, id: NodeId) -> Option<&V> {
        self.tree.value(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.tree.contains(id)
    }

    /// Group directly containing the pane; `None` for the root pane or an unknown id.
    pub fn parent_of(&self, id: NodeId) -> Option<GroupId> {
        self.tree.parent_of(id)
    }

    pub fn group_orientation(&self, id: GroupId) -> Option<Orientation> {
        self.tree.group_orientation(id)
    }

    /// Number of panes.
    pub fn leaf_count(&self) -> usize {
        self.tree.leaf_count()
    }

    /// Pane at `index` in document order.
    pub fn leaf_at(&self, index: usize) -> Option<NodeId> {
        self.tree.leaf_at(index)
    }

    /// Panes and their values in document order.
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &V)> + '_ {
        self.tree.leaves()
    }

    /// Indented text rendering of the tree, with the focused pane starred.
    pub fn debug_tree(&self) -> String
    where
        V: fmt::Debug,
    {
        self.tree.debug_tree()
    }

    #[cfg(test)]
    fn verify_invariants(&self)
    where
        V: Clone + PartialEq + fmt::Debug,
    {
        self.tree.verify_invariants();
        assert_eq!(self.snapshot, self.tree.serialize(), "cached snapshot is stale");
    }
}

impl<V: fmt::Debug> fmt::Debug for LayoutTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutTree")
            .field("tree", &self.tree)
            .field("observers", &self.observers.len())
            .finish()
    }
}
