use smallvec::SmallVec;

use super::char_trait::DafsaChar;
use super::node_arena::NodeId;

/// Outgoing edges, keyed by the child's character, in insertion order.
///
/// The edge into the end node is keyed by `None`.
type Children<C> = SmallVec<[(Option<C>, NodeId); 2]>;

/// Parents reaching a node through the same character.
type ParentList = SmallVec<[NodeId; 2]>;

/// Incoming edges, keyed by the parent's character, in insertion order.
///
/// Edges out of the root are keyed by `None`.
type Parents<C> = SmallVec<[(Option<C>, ParentList); 1]>;

/// What role a node plays in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The unique source node. Has no character.
    Root,
    /// The unique accept node. Has no character.
    End,
    /// A node standing for one character of one or more words.
    Inner,
}

/// A vertex of the DAFSA.
///
/// Every node other than the two sentinels carries a character; the path of
/// characters from the root to the end node spells a recognised word. Each
/// node keeps both its children and its parents, which is what lets new
/// words be matched backwards from the end node.
#[derive(Clone, Debug)]
pub struct Node<C: DafsaChar> {
    character: Option<C>,
    kind: NodeKind,
    children: Children<C>,
    parents: Parents<C>,
}

impl<C: DafsaChar> Node<C> {
    /// Creates an unlinked node for `character`.
    pub(crate) fn new(character: C) -> Self {
        Self::with_kind(Some(character), NodeKind::Inner)
    }

    pub(crate) fn root() -> Self {
        Self::with_kind(None, NodeKind::Root)
    }

    pub(crate) fn end() -> Self {
        Self::with_kind(None, NodeKind::End)
    }

    fn with_kind(character: Option<C>, kind: NodeKind) -> Self {
        Node {
            character,
            kind,
            children: SmallVec::new(),
            parents: SmallVec::new(),
        }
    }

    /// An unlinked node with the same character and kind.
    pub(crate) fn detached_copy(&self) -> Self {
        Self::with_kind(self.character, self.kind)
    }

    /// The node's character, `None` for the root and end sentinels.
    #[inline]
    pub fn character(&self) -> Option<C> {
        self.character
    }

    /// The node's role.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// True for the root sentinel.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    /// True for the end (accept) sentinel.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.kind == NodeKind::End
    }

    /// Returns the child reached through `label`, where `None` is the edge to
    /// the end node.
    #[inline]
    pub fn get(&self, label: Option<C>) -> Option<NodeId> {
        self.children
            .iter()
            .find(|&&(l, _)| l == label)
            .map(|&(_, node)| node)
    }

    /// Returns the child for `character`.
    #[inline]
    pub fn child(&self, character: C) -> Option<NodeId> {
        self.get(Some(character))
    }

    /// True if this node links directly to the end node, i.e. the path to it
    /// spells a complete word.
    #[inline]
    pub fn has_end_edge(&self) -> bool {
        self.get(None).is_some()
    }

    /// Returns an iterator over `(label, child)` pairs in insertion order.
    #[inline]
    pub fn children(
        &self,
    ) -> impl DoubleEndedIterator<Item = (Option<C>, NodeId)> + ExactSizeIterator + '_ {
        self.children.iter().copied()
    }

    /// Returns the number of children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Parents that reach this node through a parent with character `label`,
    /// in the order the edges were added.
    #[inline]
    pub fn parents_via(&self, label: Option<C>) -> &[NodeId] {
        self.parents
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, parents)| parents.as_slice())
            .unwrap_or(&[])
    }

    /// Returns an iterator over `(label, parents)` groups in insertion order.
    pub fn parents(&self) -> impl Iterator<Item = (Option<C>, &[NodeId])> + '_ {
        self.parents
            .iter()
            .map(|(label, parents)| (*label, parents.as_slice()))
    }

    /// Total number of incoming edges.
    #[inline]
    pub fn incoming_count(&self) -> usize {
        self.parents.iter().map(|(_, parents)| parents.len()).sum()
    }

    /// True if more than one edge leads into this node, meaning the prefix
    /// ending here is shared by several words.
    #[inline]
    pub fn is_fork(&self) -> bool {
        self.incoming_count() > 1
    }

    /// True if this node can stand in for `old` at the end of a matched
    /// prefix: it has every child of `old` (the very same nodes) plus exactly
    /// one more.
    pub fn is_replacement_for_prefix_end_node(&self, old: &Node<C>) -> bool {
        self.child_count() == old.child_count() + 1
            && old
                .children()
                .all(|(label, child)| self.get(label) == Some(child))
    }

    /// True if this node can stand in for `old` inside a matched prefix: both
    /// have the same number of children and exactly one of `old`'s children
    /// is not shared.
    pub fn is_replacement_for_prefix_node(&self, old: &Node<C>) -> bool {
        if self.child_count() != old.child_count() {
            return false;
        }
        let mut differing = 0;
        for (label, child) in old.children() {
            if self.get(label) != Some(child) {
                differing += 1;
                if differing > 1 {
                    return false;
                }
            }
        }
        differing == 1
    }

    pub(super) fn insert_child(&mut self, label: Option<C>, child: NodeId) {
        assert!(
            self.get(label).is_none(),
            "insert_child: node already has a child for {label:?}"
        );
        self.children.push((label, child));
    }

    pub(super) fn take_child(&mut self, label: Option<C>) -> Option<NodeId> {
        let pos = self.children.iter().position(|&(l, _)| l == label)?;
        Some(self.children.remove(pos).1)
    }

    pub(super) fn push_parent(&mut self, label: Option<C>, parent: NodeId) {
        match self.parents.iter_mut().find(|(l, _)| *l == label) {
            Some((_, parents)) => {
                debug_assert!(!parents.contains(&parent), "duplicate parent link");
                parents.push(parent);
            }
            None => {
                let mut parents = ParentList::new();
                parents.push(parent);
                self.parents.push((label, parents));
            }
        }
    }

    /// Removes one parent link, keeping the order of the others. Returns
    /// false if the link did not exist.
    pub(super) fn drop_parent(&mut self, label: Option<C>, parent: NodeId) -> bool {
        let Some(group) = self.parents.iter().position(|(l, _)| *l == label) else {
            return false;
        };
        let parents = &mut self.parents[group].1;
        let Some(pos) = parents.iter().position(|&p| p == parent) else {
            return false;
        };
        parents.remove(pos);
        if parents.is_empty() {
            self.parents.remove(group);
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::super::node_arena::NodeArena;
    use super::*;

    #[test]
    fn no_children() {
        let n = Node::<char>::new('a');
        assert_eq!(n.children().next(), None);
        assert_eq!(n.child_count(), 0);
        assert!(!n.is_fork());
        assert!(!n.has_end_edge());
    }

    #[test]
    fn sentinels_have_no_character() {
        let root = Node::<u8>::root();
        let end = Node::<u8>::end();
        assert!(root.is_root() && !root.is_end());
        assert!(end.is_end() && !end.is_root());
        assert_eq!(root.character(), None);
        assert_eq!(end.character(), None);
        assert_eq!(Node::new(b'x').kind(), NodeKind::Inner);
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut arena = NodeArena::new();
        let parent = arena.alloc(Node::new('p'));
        let ids: Vec<_> = ['z', 'a', 'm']
            .into_iter()
            .map(|ch| arena.alloc(Node::new(ch)))
            .collect();
        for &id in &ids {
            arena.add_child(parent, id);
        }
        let labels: Vec<_> = arena[parent].children().map(|(l, _)| l).collect();
        assert_eq!(labels, vec![Some('z'), Some('a'), Some('m')]);
        assert_eq!(arena[parent].child('a'), Some(ids[1]));
    }

    #[test]
    fn fork_counts_edges_across_labels() {
        let mut arena = NodeArena::new();
        let shared = arena.alloc(Node::new('s'));
        let a = arena.alloc(Node::new('a'));
        let b = arena.alloc(Node::new('b'));

        arena.add_child(a, shared);
        assert!(!arena[shared].is_fork());

        arena.add_child(b, shared);
        assert!(arena[shared].is_fork());
        assert_eq!(arena[shared].incoming_count(), 2);

        let a2 = arena.alloc(Node::new('a'));
        arena.add_child(a2, shared);
        assert_eq!(arena[shared].parents_via(Some('a')), &[a, a2]);
        assert_eq!(arena[shared].incoming_count(), 3);
    }

    #[test]
    fn replacement_for_prefix_end_requires_one_extra_child() {
        let mut arena = NodeArena::new();
        let x = arena.alloc(Node::new('x'));
        let y = arena.alloc(Node::new('y'));
        let x2 = arena.alloc(Node::new('x'));

        let old = arena.alloc(Node::new('o'));
        arena.add_child(old, x);

        let good = arena.alloc(Node::new('o'));
        arena.add_child(good, x);
        arena.add_child(good, y);

        let other_x = arena.alloc(Node::new('o'));
        arena.add_child(other_x, x2);
        arena.add_child(other_x, y);

        let same = arena.alloc(Node::new('o'));
        arena.add_child(same, x);

        assert!(arena[good].is_replacement_for_prefix_end_node(&arena[old]));
        // Same labels but a different node behind 'x'.
        assert!(!arena[other_x].is_replacement_for_prefix_end_node(&arena[old]));
        assert!(!arena[same].is_replacement_for_prefix_end_node(&arena[old]));
    }

    #[test]
    fn replacement_for_prefix_node_differs_in_one_child() {
        let mut arena = NodeArena::new();
        let x = arena.alloc(Node::new('x'));
        let y = arena.alloc(Node::new('y'));
        let y2 = arena.alloc(Node::new('y'));
        let x2 = arena.alloc(Node::new('x'));

        let old = arena.alloc(Node::new('o'));
        arena.add_child(old, x);
        arena.add_child(old, y);

        let one_diff = arena.alloc(Node::new('o'));
        arena.add_child(one_diff, x);
        arena.add_child(one_diff, y2);

        let two_diff = arena.alloc(Node::new('o'));
        arena.add_child(two_diff, x2);
        arena.add_child(two_diff, y2);

        let identical = arena.alloc(Node::new('o'));
        arena.add_child(identical, x);
        arena.add_child(identical, y);

        assert!(arena[one_diff].is_replacement_for_prefix_node(&arena[old]));
        assert!(!arena[two_diff].is_replacement_for_prefix_node(&arena[old]));
        assert!(!arena[identical].is_replacement_for_prefix_node(&arena[old]));
    }
}
