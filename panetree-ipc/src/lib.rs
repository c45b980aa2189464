//! Types for consumers of the panetree layout tree.
//!
//! This crate holds the plain data that crosses the boundary between a
//! [`LayoutTree`](https://docs.rs/panetree) and whatever renders it: entity ids, the
//! [`Orientation`] of a group, the [`Direction`] of a focus move, and the
//! [`SerializedTree`] snapshot.
//!
//! Everything here is an owned value with no references into a live tree, so a
//! renderer can keep a snapshot around for as long as it likes.
//!
//! ## Ids
//!
//! Ids are namespaced by the kind of entity they name. They print and serialize as
//! `tree_N`, `group_N` and `node_N`, and parse back from the same strings:
//!
//! ```
//! use panetree_ipc::NodeId;
//!
//! let id: NodeId = "node_7".parse().unwrap();
//! assert_eq!(id.get(), 7);
//! assert_eq!(id.to_string(), "node_7");
//! ```
//!
//! ## Snapshot shape
//!
//! A serialized leaf is `{"id": "node_3", "value": ...}`; a serialized group is
//! `{"id": "group_1", "orientation": "vertical", "children": [...]}`.
#![warn(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an id from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {input:?}")]
pub struct ParseIdError {
    kind: &'static str,
    input: String,
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw counter value.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw counter value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            /// Accepts both the prefixed form (`node_3`) and a bare number (`3`).
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s
                    .strip_prefix(concat!($prefix, "_"))
                    .unwrap_or(s);
                digits.parse().map(Self).map_err(|_| ParseIdError {
                    kind: $prefix,
                    input: s.to_owned(),
                })
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseIdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }
    };
}

entity_id!(
    /// Id of a layout tree.
    TreeId,
    "tree"
);
entity_id!(
    /// Id of a group: a split container holding other groups or leaves.
    GroupId,
    "group"
);
entity_id!(
    /// Id of a leaf: a single pane.
    NodeId,
    "node"
);

/// Axis along which a group lays out its children.
///
/// The name follows the split line: a horizontal group is divided by horizontal lines,
/// so its children are stacked top to bottom. A vertical group places its children side
/// by side, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Children stacked top to bottom.
    Horizontal,
    /// Children placed left to right.
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Horizontal => "Horizontal",
            Orientation::Vertical => "Vertical",
        })
    }
}

/// Screen direction of a focus move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the top of the screen.
    Up,
    /// Towards the bottom of the screen.
    Down,
    /// Towards the left edge of the screen.
    Left,
    /// Towards the right edge of the screen.
    Right,
}

impl Direction {
    /// Orientation of the groups a move in this direction travels through.
    ///
    /// Up and down step between the stacked children of a horizontal group; left and right
    /// step between the side-by-side children of a vertical group.
    pub fn axis(self) -> Orientation {
        match self {
            Direction::Up | Direction::Down => Orientation::Horizontal,
            Direction::Left | Direction::Right => Orientation::Vertical,
        }
    }

    /// Whether this direction moves towards higher child indices.
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Down | Direction::Right)
    }

    /// Get the opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Serialized leaf: one pane and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedLeaf<V> {
    /// Id of the leaf in the live tree.
    pub id: NodeId,
    /// Pane payload.
    pub value: V,
}

/// Serialized group: a split container and its children in layout order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedGroup<V> {
    /// Id of the group in the live tree.
    pub id: GroupId,
    /// Axis the children are laid out along.
    pub orientation: Orientation,
    /// Children, first to last.
    pub children: Vec<SerializedTree<V>>,
}

/// Immutable snapshot of a layout tree, or of one of its subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedTree<V> {
    /// A single pane.
    Leaf(SerializedLeaf<V>),
    /// A split container.
    Group(SerializedGroup<V>),
}

impl<V> SerializedTree<V> {
    /// Returns the leaf, if this is one.
    pub fn as_leaf(&self) -> Option<&SerializedLeaf<V>> {
        match self {
            SerializedTree::Leaf(leaf) => Some(leaf),
            SerializedTree::Group(_) => None,
        }
    }

    /// Returns the group, if this is one.
    pub fn as_group(&self) -> Option<&SerializedGroup<V>> {
        match self {
            SerializedTree::Leaf(_) => None,
            SerializedTree::Group(group) => Some(group),
        }
    }

    /// Leaves of this snapshot in document order.
    pub fn leaves(&self) -> Vec<&SerializedLeaf<V>> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a SerializedLeaf<V>>) {
        match self {
            SerializedTree::Leaf(leaf) => leaves.push(leaf),
            SerializedTree::Group(group) => {
                for child in &group.children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }
}

impl<V> From<&SerializedLeaf<V>> for NodeId {
    fn from(leaf: &SerializedLeaf<V>) -> Self {
        leaf.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_prefixed_and_bare() {
        assert_eq!("group_12".parse::<GroupId>(), Ok(GroupId::from_raw(12)));
        assert_eq!("4".parse::<NodeId>(), Ok(NodeId::from_raw(4)));
        assert!("group_4".parse::<NodeId>().is_err());
        assert!("node_".parse::<NodeId>().is_err());
    }

    #[test]
    fn direction_axes() {
        assert_eq!(Direction::Up.axis(), Orientation::Horizontal);
        assert_eq!(Direction::Right.axis(), Orientation::Vertical);
        assert!(Direction::Down.is_forward());
        assert!(!Direction::Left.is_forward());
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }

    #[test]
    fn snapshot_json_shape() {
        let tree = SerializedTree::Group(SerializedGroup {
            id: GroupId::from_raw(1),
            orientation: Orientation::Vertical,
            children: vec![
                SerializedTree::Leaf(SerializedLeaf {
                    id: NodeId::from_raw(2),
                    value: "a".to_owned(),
                }),
                SerializedTree::Leaf(SerializedLeaf {
                    id: NodeId::from_raw(3),
                    value: "b".to_owned(),
                }),
            ],
        });

        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(
            json,
            r#"{"id":"group_1","orientation":"vertical","children":[{"id":"node_2","value":"a"},{"id":"node_3","value":"b"}]}"#
        );

        let parsed: SerializedTree<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tree);

        let values: Vec<_> = parsed.leaves().iter().map(|leaf| leaf.value.as_str()).collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn snapshot_accessors() {
        let leaf = SerializedLeaf {
            id: NodeId::from_raw(7),
            value: 'x',
        };
        let group = SerializedTree::Group(SerializedGroup {
            id: GroupId::from_raw(6),
            orientation: Orientation::Horizontal,
            children: vec![SerializedTree::Leaf(leaf.clone())],
        });

        let inner = group.as_group().unwrap();
        assert_eq!(inner.orientation, Orientation::Horizontal);
        assert_eq!(group.as_leaf(), None);

        let child = &inner.children[0];
        assert_eq!(child.as_leaf(), Some(&leaf));
        assert!(child.as_group().is_none());
        assert_eq!(NodeId::from(&leaf), NodeId::from_raw(7));
    }
}
