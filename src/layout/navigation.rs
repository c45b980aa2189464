//! Directional focus navigation.
//!
//! The tree has no geometry, so "the pane to the right" is found structurally: climb to
//! the nearest group laid out along the movement axis, step to the neighbouring child, and
//! walk down into it until a leaf is reached.
//!
//! ```text
//! *---------*---------*---------*---------*
//! |         |    1    |         |         |
//! *         *---------*         *         *
//! |    0    |    2    |    3    |    4    |
//! *         *---------*         *         *
//! |         |    5    |         |         |
//! *---------*---------*---------*---------*
//! ```
//!
//! Walking down into a group laid out along the movement axis lands on its near edge.
//! Walking down into a perpendicular group keeps the cursor at the relative height or width
//! it had in the first perpendicular group the search climbed out of. Moving left from 3
//! lands on 1, the first row, since 3 never left a column. Moving right from the lower half
//! of a two-row column lands in the lower rows of a four-row column.

use panetree_ipc::Direction;

use super::container::{ContainerTree, Entity, EntityKey};

/// Position of the search inside the first perpendicular group it climbed out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RelativePosition {
    index: usize,
    len: usize,
}

impl RelativePosition {
    /// Index, out of `len` children, of the child whose span holds the centre of the
    /// source cell.
    ///
    /// A centre falling exactly on a boundary picks the later child.
    fn project(self, len: usize) -> usize {
        ((2 * self.index + 1) * len / (2 * self.len)).min(len.saturating_sub(1))
    }
}

impl<V> ContainerTree<V> {
    /// Move focus to the neighbouring leaf in `direction`
    ///
    /// Returns `false`, leaving focus where it was, when there is no neighbour.
    pub fn focus_in_direction(&mut self, direction: Direction) -> bool {
        let focused = self.focused_key();
        match self.find_sibling(focused, direction) {
            Some(target) if target != focused => {
                self.set_focused_key(target);
                true
            }
            _ => false,
        }
    }

    /// Leaf reached by moving from `from` in `direction`, if any
    pub(super) fn find_sibling(&self, from: EntityKey, direction: Direction) -> Option<EntityKey> {
        let axis = direction.axis();
        let mut current = from;
        let mut relative = None;

        loop {
            // Climb to the nearest ancestor laid out along the movement axis. Hitting the
            // root on the way means there is nothing in that direction.
            let (parent_key, idx) = loop {
                let (parent_key, idx) = self.slot_of(current)?;
                let parent = self.group(parent_key);
                if parent.orientation() == axis {
                    break (parent_key, idx);
                }

                relative.get_or_insert(RelativePosition {
                    index: idx,
                    len: parent.children().len(),
                });
                current = parent_key;
            };

            let siblings = self.group(parent_key).children();
            let target = if direction.is_forward() {
                Some(idx + 1)
            } else {
                idx.checked_sub(1)
            };

            if let Some(&sibling) = target.and_then(|target| siblings.get(target)) {
                return Some(self.descend(sibling, direction, relative));
            }

            // Ran off the edge of this group, so retry one level up. The relative position
            // is kept from wherever it was first recorded.
            trace!("no sibling at {target:?}, climbing");
            current = parent_key;
        }
    }

    fn descend(
        &self,
        mut key: EntityKey,
        direction: Direction,
        relative: Option<RelativePosition>,
    ) -> EntityKey {
        let axis = direction.axis();

        loop {
            let group = match self.get_entity(key) {
                Some(Entity::Leaf(_)) => return key,
                Some(Entity::Group(group)) => group,
                None => panic!("layout tree invariant violated: descending into a dead entity"),
            };

            let children = group.children();
            let idx = if group.orientation() == axis {
                if direction.is_forward() {
                    0
                } else {
                    children.len().saturating_sub(1)
                }
            } else {
                // Without a recorded position the source spanned the whole cross axis.
                relative.map_or(0, |relative| relative.project(children.len()))
            };

            key = children[idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_keeps_relative_position() {
        let bottom_of_two = RelativePosition { index: 1, len: 2 };
        assert_eq!(bottom_of_two.project(4), 3);
        assert_eq!(bottom_of_two.project(3), 2);
        assert_eq!(bottom_of_two.project(1), 0);

        let top_of_two = RelativePosition { index: 0, len: 2 };
        assert_eq!(top_of_two.project(4), 1);
        assert_eq!(top_of_two.project(3), 0);

        // Centre of the middle third sits on the boundary between two halves.
        let middle_of_three = RelativePosition { index: 1, len: 3 };
        assert_eq!(middle_of_three.project(2), 1);
        assert_eq!(middle_of_three.project(3), 1);
    }
}
