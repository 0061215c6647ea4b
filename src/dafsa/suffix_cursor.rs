use super::char_trait::DafsaChar;
use super::node::Node;
use super::node_arena::{NodeArena, NodeId};

/// Backwards pointer into the graph used while matching the tail of a new
/// word against suffixes that are already present.
///
/// `index` is 1-based against the word: `node` stands for `word[index - 1]`.
/// A fresh cursor sits at `word.len() + 1` on the end node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SuffixCursor {
    pub index: usize,
    pub node: NodeId,
}

impl SuffixCursor {
    pub fn new(index: usize, node: NodeId) -> Self {
        SuffixCursor { index, node }
    }

    /// Steps back to the first parent under `label` accepted by `check`.
    ///
    /// Parents in `excluded` are skipped: they stay above the point where the
    /// new word is attached, so stepping onto one would close a cycle.
    fn query<C, F>(
        &mut self,
        arena: &NodeArena<C>,
        label: Option<C>,
        excluded: &[NodeId],
        check: F,
    ) -> bool
    where
        C: DafsaChar,
        F: Fn(&Node<C>) -> bool,
    {
        let found = arena[self.node]
            .parents_via(label)
            .iter()
            .copied()
            .find(|&parent| !excluded.contains(&parent) && check(&arena[parent]));
        match found {
            Some(parent) => {
                self.index -= 1;
                self.node = parent;
                true
            }
            None => false,
        }
    }

    /// Steps to a parent for `character` that has no other child.
    ///
    /// A parent with several children cannot be reused past the prefix, as
    /// the new word would pick up all of its other branches.
    pub fn find_single_child<C: DafsaChar>(
        &mut self,
        arena: &NodeArena<C>,
        character: C,
        excluded: &[NodeId],
    ) -> bool {
        self.query(arena, Some(character), excluded, |node| node.child_count() == 1)
    }

    /// Steps to a parent that can replace `end_of_prefix` while also carrying
    /// the new branch.
    pub fn find_end_of_prefix_replacement<C: DafsaChar>(
        &mut self,
        arena: &NodeArena<C>,
        end_of_prefix: NodeId,
        excluded: &[NodeId],
    ) -> bool {
        let old = &arena[end_of_prefix];
        self.query(arena, old.character(), excluded, |node| {
            node.is_replacement_for_prefix_end_node(old)
        })
    }

    /// Steps to a parent that can replace `prefix_node`, a node inside a
    /// prefix shared with other words.
    pub fn find_inside_of_prefix_replacement<C: DafsaChar>(
        &mut self,
        arena: &NodeArena<C>,
        prefix_node: NodeId,
        excluded: &[NodeId],
    ) -> bool {
        let old = &arena[prefix_node];
        self.query(arena, old.character(), excluded, |node| {
            node.is_replacement_for_prefix_node(old)
        })
    }
}
