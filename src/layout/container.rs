//! Split tree storage using SlotMap
//!
//! Entities form a tree where:
//! - Leaf entities hold a pane value
//! - Group entities hold child entities laid out along one orientation
//!
//! Parents are stored as keys, so walking up the tree is an arena lookup rather than a
//! pointer chase. Public ids ([`NodeId`], [`GroupId`]) are mapped to keys through the
//! registries, which lets a snapshot id be turned back into a live entity.
//!
//! Every method here leaves the tree in a state satisfying these rules:
//! - the focused key names a leaf reachable from the root
//! - the root has no parent; every other entity is listed by its parent
//! - every group has at least two children
//! - no group directly contains a group of its own orientation

use std::collections::HashMap;

use panetree_ipc::{
    GroupId, NodeId, Orientation, SerializedGroup, SerializedLeaf, SerializedTree, TreeId,
};
use slotmap::{new_key_type, SlotMap};

use super::TreeError;
use crate::utils::id::IdCounter;

static TREE_ID_COUNTER: IdCounter = IdCounter::new();
static GROUP_ID_COUNTER: IdCounter = IdCounter::new();
static NODE_ID_COUNTER: IdCounter = IdCounter::new();

// ============================================================================
// SlotMap Key Types
// ============================================================================

new_key_type! {
    /// Key to reference an entity in the split tree
    pub struct EntityKey;
}

// ============================================================================
// Entity Types
// ============================================================================

/// Entity in the split tree
#[derive(Debug)]
pub enum Entity<V> {
    /// Single pane
    Leaf(Leaf<V>),
    /// Split container with children (stored as keys)
    Group(Group),
}

/// Leaf data stored in slotmap
#[derive(Debug)]
pub struct Leaf<V> {
    id: NodeId,
    value: V,
    parent: Option<EntityKey>,
}

/// Group data stored in slotmap
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    orientation: Orientation,
    /// Child entity keys, first to last
    children: Vec<EntityKey>,
    parent: Option<EntityKey>,
}

impl<V> Leaf<V> {
    pub fn value(&self) -> &V {
        &self.value
    }
}

impl Group {
    /// Get group orientation
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Get children keys
    pub fn children(&self) -> &[EntityKey] {
        &self.children
    }

    fn index_of(&self, key: EntityKey) -> Option<usize> {
        self.children.iter().position(|&child| child == key)
    }
}

/// Split tree with a focused leaf
#[derive(Debug)]
pub struct ContainerTree<V> {
    id: TreeId,
    /// SlotMap storing all entities in the tree
    entities: SlotMap<EntityKey, Entity<V>>,
    /// Registry of live leaves
    leaves: HashMap<NodeId, EntityKey>,
    /// Registry of live groups
    groups: HashMap<GroupId, EntityKey>,
    root: EntityKey,
    focused: EntityKey,
}

#[cold]
#[track_caller]
fn broken_invariant(what: &str) -> ! {
    panic!("layout tree invariant violated: {what}")
}

impl<V> ContainerTree<V> {
    /// Create a tree holding a single leaf, which is both root and focused
    pub fn new(value: V) -> Self {
        let mut tree = Self {
            id: TreeId::from_raw(TREE_ID_COUNTER.next()),
            entities: SlotMap::with_key(),
            leaves: HashMap::new(),
            groups: HashMap::new(),
            root: EntityKey::default(),
            focused: EntityKey::default(),
        };

        let root = tree.insert_leaf(value);
        tree.root = root;
        tree.focused = root;
        tree
    }

    // ========================================================================
    // Internal SlotMap helpers
    // ========================================================================

    pub(super) fn get_entity(&self, key: EntityKey) -> Option<&Entity<V>> {
        self.entities.get(key)
    }

    pub(super) fn get_group(&self, key: EntityKey) -> Option<&Group> {
        match self.entities.get(key)? {
            Entity::Group(group) => Some(group),
            Entity::Leaf(_) => None,
        }
    }

    fn get_leaf(&self, key: EntityKey) -> Option<&Leaf<V>> {
        match self.entities.get(key)? {
            Entity::Leaf(leaf) => Some(leaf),
            Entity::Group(_) => None,
        }
    }

    #[track_caller]
    pub(super) fn group(&self, key: EntityKey) -> &Group {
        self.get_group(key)
            .unwrap_or_else(|| broken_invariant("key does not name a live group"))
    }

    #[track_caller]
    fn group_mut(&mut self, key: EntityKey) -> &mut Group {
        match self.entities.get_mut(key) {
            Some(Entity::Group(group)) => group,
            _ => broken_invariant("key does not name a live group"),
        }
    }

    #[track_caller]
    fn leaf(&self, key: EntityKey) -> &Leaf<V> {
        self.get_leaf(key)
            .unwrap_or_else(|| broken_invariant("key does not name a live leaf"))
    }

    #[track_caller]
    fn leaf_mut(&mut self, key: EntityKey) -> &mut Leaf<V> {
        match self.entities.get_mut(key) {
            Some(Entity::Leaf(leaf)) => leaf,
            _ => broken_invariant("key does not name a live leaf"),
        }
    }

    fn parent(&self, key: EntityKey) -> Option<EntityKey> {
        match self.entities.get(key)? {
            Entity::Leaf(leaf) => leaf.parent,
            Entity::Group(group) => group.parent,
        }
    }

    fn set_parent(&mut self, key: EntityKey, parent: Option<EntityKey>) {
        match self.entities.get_mut(key) {
            Some(Entity::Leaf(leaf)) => leaf.parent = parent,
            Some(Entity::Group(group)) => group.parent = parent,
            None => broken_invariant("reparenting a dead entity"),
        }
    }

    /// Parent of `key` and the index of `key` among its children, or `None` for the root
    #[track_caller]
    pub(super) fn slot_of(&self, key: EntityKey) -> Option<(EntityKey, usize)> {
        if key == self.root {
            return None;
        }

        let Some(parent_key) = self.parent(key) else {
            broken_invariant("non-root entity has no parent");
        };
        let Some(idx) = self.get_group(parent_key).and_then(|p| p.index_of(key)) else {
            broken_invariant("parent does not list its child");
        };
        Some((parent_key, idx))
    }

    /// Insert and register a new parentless leaf
    fn insert_leaf(&mut self, value: V) -> EntityKey {
        let id = NodeId::from_raw(NODE_ID_COUNTER.next());
        let key = self.entities.insert(Entity::Leaf(Leaf {
            id,
            value,
            parent: None,
        }));
        self.leaves.insert(id, key);
        key
    }

    /// Insert and register a new parentless group adopting `children`
    fn insert_group(&mut self, orientation: Orientation, children: Vec<EntityKey>) -> EntityKey {
        let id = GroupId::from_raw(GROUP_ID_COUNTER.next());
        let key = self.entities.insert(Entity::Group(Group {
            id,
            orientation,
            children: Vec::new(),
            parent: None,
        }));
        self.groups.insert(id, key);

        for &child in &children {
            self.set_parent(child, Some(key));
        }
        self.group_mut(key).children = children;
        key
    }

    /// Remove a single entity from the slotmap and the registries (children are left alone)
    fn remove_entity(&mut self, key: EntityKey) -> Option<Entity<V>> {
        let entity = self.entities.remove(key)?;
        match &entity {
            Entity::Leaf(leaf) => self.leaves.remove(&leaf.id),
            Entity::Group(group) => self.groups.remove(&group.id),
        };
        Some(entity)
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub(super) fn focused_key(&self) -> EntityKey {
        self.focused
    }

    pub(super) fn set_focused_key(&mut self, key: EntityKey) {
        debug_assert!(self.get_leaf(key).is_some(), "focus must land on a leaf");
        self.focused = key;
    }

    pub fn focused(&self) -> NodeId {
        self.leaf(self.focused).id
    }

    pub fn focused_value(&self) -> &V {
        &self.leaf(self.focused).value
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.leaves.contains_key(&id)
    }

    pub fn value(&self, id: NodeId) -> Option<&V> {
        let key = *self.leaves.get(&id)?;
        self.get_leaf(key).map(Leaf::value)
    }

    /// Group directly containing the leaf, `None` for an unknown id or the root leaf
    pub fn parent_of(&self, id: NodeId) -> Option<GroupId> {
        let key = *self.leaves.get(&id)?;
        self.parent(key).map(|parent| self.group(parent).id)
    }

    pub fn group_orientation(&self, id: GroupId) -> Option<Orientation> {
        let key = *self.groups.get(&id)?;
        self.get_group(key).map(Group::orientation)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Leaf keys in document order
    fn leaf_keys(&self) -> Vec<EntityKey> {
        let mut keys = Vec::with_capacity(self.leaves.len());
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            match self.get_entity(key) {
                Some(Entity::Leaf(_)) => keys.push(key),
                Some(Entity::Group(group)) => stack.extend(group.children.iter().rev()),
                None => broken_invariant("group lists a dead child"),
            }
        }
        keys
    }

    /// Leaves with their values, in document order
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &V)> + '_ {
        self.leaf_keys().into_iter().map(move |key| {
            let leaf = self.leaf(key);
            (leaf.id, &leaf.value)
        })
    }

    /// The `index`-th leaf in document order
    pub fn leaf_at(&self, index: usize) -> Option<NodeId> {
        self.leaf_keys()
            .get(index)
            .map(|&key| self.leaf(key).id)
    }

    /// Walk down from `key` to its first or last leaf
    pub(super) fn edge_leaf(&self, mut key: EntityKey, first: bool) -> EntityKey {
        loop {
            match self.get_entity(key) {
                Some(Entity::Leaf(_)) => return key,
                Some(Entity::Group(group)) => {
                    let child = if first {
                        group.children.first()
                    } else {
                        group.children.last()
                    };
                    key = *child.unwrap_or_else(|| broken_invariant("group has no children"));
                }
                None => broken_invariant("walking into a dead entity"),
            }
        }
    }

    // ========================================================================
    // Mutation methods
    // ========================================================================

    /// Split the focused leaf, placing a new leaf holding `value` right after it
    ///
    /// The new leaf becomes focused. Returns its id.
    pub fn split(&mut self, orientation: Orientation, value: V) -> NodeId {
        let focused = self.focused;
        let clone = self.insert_leaf(value);

        match self.slot_of(focused) {
            None => {
                // Root leaf: wrap it together with the clone
                let group = self.insert_group(orientation, vec![focused, clone]);
                self.root = group;
            }
            Some((parent_key, idx)) if self.group(parent_key).orientation == orientation => {
                // Same axis: the clone becomes a sibling, no new nesting level
                self.group_mut(parent_key).children.insert(idx + 1, clone);
                self.set_parent(clone, Some(parent_key));
            }
            Some((parent_key, idx)) => {
                // Cross axis: a new group takes the focused leaf's slot
                let group = self.insert_group(orientation, vec![focused, clone]);
                self.group_mut(parent_key).children[idx] = group;
                self.set_parent(group, Some(parent_key));
            }
        }

        self.focused = clone;
        self.leaf(clone).id
    }

    /// Remove the focused leaf, returning its value
    ///
    /// Returns `None` without touching the tree when the focused leaf is the root.
    pub fn remove_focused(&mut self) -> Option<V> {
        let focused = self.focused;
        let (parent_key, idx) = self.slot_of(focused)?;

        self.group_mut(parent_key).children.remove(idx);
        let value = match self.remove_entity(focused) {
            Some(Entity::Leaf(leaf)) => leaf.value,
            _ => broken_invariant("focused entity is not a leaf"),
        };

        let remaining = self.group(parent_key).children.len();
        self.focused = match remaining {
            0 => broken_invariant("group had a single child"),
            1 => {
                // The survivor sat after the removed leaf when idx is 0
                let survivor = self.group(parent_key).children[0];
                let next = self.edge_leaf(survivor, idx == 0);
                self.collapse(parent_key);
                next
            }
            _ => {
                let sibling_idx = idx.min(remaining - 1);
                let sibling = self.group(parent_key).children[sibling_idx];
                self.edge_leaf(sibling, sibling_idx == idx)
            }
        };

        Some(value)
    }

    /// Replace `key` by its sole child, repeating up the ancestors
    fn collapse(&mut self, mut key: EntityKey) {
        loop {
            let survivor = match self.group(key).children.as_slice() {
                [] => broken_invariant("group left without children"),
                [survivor] => *survivor,
                _ => return,
            };

            let slot = self.slot_of(key);
            self.remove_entity(key);

            let Some((parent_key, idx)) = slot else {
                self.root = survivor;
                self.set_parent(survivor, None);
                return;
            };

            self.group_mut(parent_key).children[idx] = survivor;
            self.set_parent(survivor, Some(parent_key));
            self.flatten_into_parent(survivor, parent_key, idx);
            key = parent_key;
        }
    }

    /// Splice the children of `key` into its parent when both share an orientation
    fn flatten_into_parent(&mut self, key: EntityKey, parent_key: EntityKey, idx: usize) {
        let parent_orientation = self.group(parent_key).orientation;
        if !self
            .get_group(key)
            .is_some_and(|group| group.orientation == parent_orientation)
        {
            return;
        }

        let Some(Entity::Group(group)) = self.remove_entity(key) else {
            return;
        };
        for &child in &group.children {
            self.set_parent(child, Some(parent_key));
        }
        self.group_mut(parent_key)
            .children
            .splice(idx..=idx, group.children);
    }

    /// Replace the focused leaf's value, returning the old one
    pub fn set_focused_value(&mut self, value: V) -> V {
        let focused = self.focused;
        std::mem::replace(&mut self.leaf_mut(focused).value, value)
    }

    /// Focus the leaf with the given id
    pub fn focus_leaf(&mut self, id: NodeId) -> Result<(), TreeError> {
        let key = *self.leaves.get(&id).ok_or(TreeError::NotFound(id))?;
        self.set_focused_key(key);
        Ok(())
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    pub fn serialize(&self) -> SerializedTree<V>
    where
        V: Clone,
    {
        self.serialize_entity(self.root)
    }

    fn serialize_entity(&self, key: EntityKey) -> SerializedTree<V>
    where
        V: Clone,
    {
        match self.get_entity(key) {
            Some(Entity::Leaf(leaf)) => SerializedTree::Leaf(SerializedLeaf {
                id: leaf.id,
                value: leaf.value.clone(),
            }),
            Some(Entity::Group(group)) => SerializedTree::Group(SerializedGroup {
                id: group.id,
                orientation: group.orientation,
                children: group
                    .children
                    .iter()
                    .map(|&child| self.serialize_entity(child))
                    .collect(),
            }),
            None => broken_invariant("group lists a dead child"),
        }
    }

    pub fn debug_tree(&self) -> String
    where
        V: std::fmt::Debug,
    {
        let mut out = String::new();
        self.debug_tree_entity(self.root, 0, &mut out);
        out
    }

    fn debug_tree_entity(&self, key: EntityKey, depth: usize, out: &mut String)
    where
        V: std::fmt::Debug,
    {
        use std::fmt::Write as _;

        let indent = "  ".repeat(depth);
        match self.get_entity(key) {
            Some(Entity::Leaf(leaf)) => {
                let focused = if key == self.focused { " *" } else { "" };
                let _ = writeln!(out, "{indent}Pane {:?}{focused}", leaf.value);
            }
            Some(Entity::Group(group)) => {
                let _ = writeln!(out, "{indent}{}", group.orientation);
                for &child in &group.children {
                    self.debug_tree_entity(child, depth + 1, out);
                }
            }
            None => {
                let _ = writeln!(out, "{indent}(missing)");
            }
        }
    }

    #[cfg(test)]
    pub(super) fn verify_invariants(&self) {
        assert!(self.parent(self.root).is_none(), "root must not have a parent");

        let mut seen_leaves = 0;
        let mut seen_groups = 0;
        let mut focused_reachable = false;
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            match self.get_entity(key).expect("reachable entity must be live") {
                Entity::Leaf(leaf) => {
                    seen_leaves += 1;
                    focused_reachable |= key == self.focused;
                    assert_eq!(self.leaves.get(&leaf.id), Some(&key));
                }
                Entity::Group(group) => {
                    seen_groups += 1;
                    assert_eq!(self.groups.get(&group.id), Some(&key));
                    assert!(
                        group.children.len() >= 2,
                        "group {} has {} children",
                        group.id,
                        group.children.len()
                    );

                    for &child in &group.children {
                        assert_eq!(self.parent(child), Some(key), "child parent mismatch");
                        if let Some(child_group) = self.get_group(child) {
                            assert_ne!(
                                child_group.orientation, group.orientation,
                                "group {} nests a group of its own orientation",
                                group.id
                            );
                        }
                        stack.push(child);
                    }
                }
            }
        }

        assert!(focused_reachable, "focused leaf is not reachable from root");
        assert_eq!(seen_leaves, self.leaves.len(), "leaf registry out of sync");
        assert_eq!(seen_groups, self.groups.len(), "group registry out of sync");
        assert_eq!(seen_leaves + seen_groups, self.entities.len(), "orphaned entities");
    }
}
