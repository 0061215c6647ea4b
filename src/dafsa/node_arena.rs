//! Slot arena holding every node of a DAFSA.
//!
//! Nodes reference each other in both directions, so they are stored in a
//! vector and addressed by generational [`NodeId`]s instead of references.
//! Freed slots go on a free list and are reused by later allocations; the
//! slot's generation is bumped on every free so that a stale id can never
//! reach the node that replaced it.

use std::ops::{Index, IndexMut};

use smallvec::SmallVec;

use super::char_trait::DafsaChar;
use super::node::Node;

/// Handle to a node stored in a [`Dafsa`](super::graph::Dafsa).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Position of the node's slot in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

struct Slot<C: DafsaChar> {
    generation: u32,
    node: Option<Node<C>>,
}

pub(crate) struct NodeArena<C: DafsaChar> {
    slots: Vec<Slot<C>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<C: DafsaChar> NodeArena<C> {
    pub fn new() -> Self {
        NodeArena {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores a node, reusing a freed slot when one is available.
    pub fn alloc(&mut self, node: Node<C>) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.node.is_none(), "free list points at a live slot");
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).expect("node arena exceeded u32::MAX slots");
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Releases a node's slot. Any copy of `id` becomes stale.
    pub fn free(&mut self, id: NodeId) -> Node<C> {
        let slot = self
            .slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .unwrap_or_else(|| panic!("free: stale or unknown node id {id:?}"));
        let node = slot
            .node
            .take()
            .unwrap_or_else(|| panic!("free: node {id:?} already freed"));
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        node
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<C>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<C>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterates over all live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<C>)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node.as_ref().map(|node| {
                (
                    NodeId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    node,
                )
            })
        })
    }
}

impl<C: DafsaChar> Index<NodeId> for NodeArena<C> {
    type Output = Node<C>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<C> {
        self.get(id)
            .unwrap_or_else(|| panic!("stale or unknown node id {id:?}"))
    }
}

impl<C: DafsaChar> IndexMut<NodeId> for NodeArena<C> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<C> {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("stale or unknown node id {id:?}"))
    }
}

// Edge editing. Every edit updates both the parent's children and the
// child's parents so the two maps stay mutual inverses.
impl<C: DafsaChar> NodeArena<C> {
    /// Links `child` under `parent`, keyed by the child's character.
    ///
    /// Panics if `parent` already has a child with that character.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let label = self[child].character();
        let parent_label = self[parent].character();
        self[parent].insert_child(label, child);
        self[child].push_parent(parent_label, parent);
    }

    /// Unlinks `node` from `parent` on both sides of the edge.
    pub fn remove_parent(&mut self, node: NodeId, parent: NodeId) {
        let label = self[node].character();
        let parent_label = self[parent].character();
        let removed = self[parent].take_child(label);
        assert_eq!(
            removed,
            Some(node),
            "remove_parent: {parent:?} does not link to {node:?}"
        );
        assert!(
            self[node].drop_parent(parent_label, parent),
            "remove_parent: {parent:?} missing from the parents of {node:?}"
        );
    }

    /// Deletes a node that has exactly one parent.
    ///
    /// The node is unlinked from its parent and from each of its children,
    /// then its slot is freed. The caller must have checked that the parent
    /// no longer needs it and that every child is still reachable some other
    /// way.
    pub fn remove(&mut self, node: NodeId) {
        let parent = {
            let n = &self[node];
            assert_eq!(
                n.incoming_count(),
                1,
                "remove: {node:?} must have exactly one parent"
            );
            n.parents()
                .flat_map(|(_, parents)| parents.iter().copied())
                .next()
                .expect("incoming count is one")
        };
        self.remove_parent(node, parent);
        let children: SmallVec<[NodeId; 4]> = self[node].children().map(|(_, c)| c).collect();
        for child in children {
            self.remove_parent(child, node);
        }
        self.free(node);
    }

    /// Shallow-copies the children of `source` onto `target`, skipping
    /// `child_to_avoid`.
    pub fn copy_fork_node(&mut self, target: NodeId, source: NodeId, child_to_avoid: Option<NodeId>) {
        let children: SmallVec<[NodeId; 4]> = self[source]
            .children()
            .map(|(_, c)| c)
            .filter(|&c| Some(c) != child_to_avoid)
            .collect();
        for child in children {
            self.add_child(target, child);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn chain(arena: &mut NodeArena<char>, chars: &str) -> Vec<NodeId> {
        let mut ids = vec![arena.alloc(Node::root())];
        for ch in chars.chars() {
            let id = arena.alloc(Node::new(ch));
            arena.add_child(*ids.last().unwrap(), id);
            ids.push(id);
        }
        ids
    }

    #[test]
    fn alloc_reuses_freed_slots() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(Node::new('a'));
        let b = arena.alloc(Node::new('b'));
        assert_eq!(arena.len(), 2);

        arena.free(a);
        assert_eq!(arena.len(), 1);
        assert!(arena.get(a).is_none());

        let c = arena.alloc(Node::new('c'));
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert_eq!(arena[c].character(), Some('c'));
        assert_eq!(arena[b].character(), Some('b'));
        assert_eq!(arena.iter().count(), 2);
    }

    #[test]
    #[should_panic(expected = "stale or unknown node id")]
    fn stale_id_panics() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(Node::new('a'));
        arena.free(a);
        arena.alloc(Node::new('b'));
        let _ = &arena[a];
    }

    #[test]
    fn add_child_links_both_sides() {
        let mut arena = NodeArena::new();
        let ids = chain(&mut arena, "ab");
        let (root, a, b) = (ids[0], ids[1], ids[2]);

        assert_eq!(arena[root].child('a'), Some(a));
        assert_eq!(arena[a].child('b'), Some(b));
        assert_eq!(arena[a].parents_via(None), &[root]);
        assert_eq!(arena[b].parents_via(Some('a')), &[a]);
    }

    #[test]
    #[should_panic(expected = "already has a child")]
    fn add_child_rejects_duplicate_label() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::root());
        let a1 = arena.alloc(Node::new('a'));
        let a2 = arena.alloc(Node::new('a'));
        arena.add_child(root, a1);
        arena.add_child(root, a2);
    }

    #[test]
    fn remove_parent_drops_empty_label() {
        let mut arena = NodeArena::new();
        let ids = chain(&mut arena, "ab");
        let (a, b) = (ids[1], ids[2]);

        arena.remove_parent(b, a);
        assert_eq!(arena[a].child_count(), 0);
        assert_eq!(arena[b].incoming_count(), 0);
        assert_eq!(arena[b].parents().count(), 0);
    }

    #[test]
    fn remove_detaches_children_and_frees() {
        let mut arena = NodeArena::new();
        let ids = chain(&mut arena, "ab");
        let (root, a, b) = (ids[0], ids[1], ids[2]);
        let other = arena.alloc(Node::new('x'));
        arena.add_child(root, other);
        arena.add_child(other, b);

        arena.remove(a);
        assert!(arena.get(a).is_none());
        assert_eq!(arena[root].child('a'), None);
        assert_eq!(arena[b].parents_via(Some('a')), &[] as &[NodeId]);
        assert_eq!(arena[b].parents_via(Some('x')), &[other]);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn copy_fork_node_skips_avoided_child() {
        let mut arena = NodeArena::new();
        let source = arena.alloc(Node::new('s'));
        let x = arena.alloc(Node::new('x'));
        let y = arena.alloc(Node::new('y'));
        let z = arena.alloc(Node::new('z'));
        for child in [x, y, z] {
            arena.add_child(source, child);
        }

        let target = arena.alloc(Node::new('s'));
        arena.copy_fork_node(target, source, Some(y));
        let copied: Vec<_> = arena[target].children().collect();
        assert_eq!(copied, vec![(Some('x'), x), (Some('z'), z)]);
        assert_eq!(arena[x].parents_via(Some('s')), &[source, target]);
        assert_eq!(arena[y].parents_via(Some('s')), &[source]);
    }
}
