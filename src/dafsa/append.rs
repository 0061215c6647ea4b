//! Insertion of a single word into a minimal DAFSA.
//!
//! The insertion runs as a small state machine. Every state returns the next
//! state and `None` ends the insertion, at which point the graph is minimal
//! and consistent again.
//!
//! Indexes into the word are placed on the last position known to be valid.
//! They count from the root, which sits in front of the first character.
//! While appending "mozilla.org":
//!
//! ```text
//!      mozilla.org
//!     ^    ^    ^ ^
//!     |    |    | |
//!   root   |    | end
//!          |    suffix cursor: "rg" matched, index 10
//!          prefix: "mozil" matched, prefix_index 5
//! ```

use log::trace;
use smallvec::SmallVec;

use super::char_trait::DafsaChar;
use super::node::Node;
use super::node_arena::{NodeArena, NodeId};
use super::suffix_cursor::SuffixCursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    FindPrefix,
    FindSuffixNodesAfterPrefix,
    FindNextSuffixNodes,
    FindNextSuffixNodeAtPrefixEndAtFork,
    FindNextSuffixNodeAtPrefixEndAfterFork,
    FindNextSuffixNodesWithinPrefixAfterFork,
    FindNextSuffixNodeWithinPrefixAtFork,
    AddNewNodes,
}

pub(crate) struct AppendStateMachine<'d, C: DafsaChar> {
    arena: &'d mut NodeArena<C>,
    word: &'d [C],
    prefix_index: usize,
    stack: SmallVec<[NodeId; 32]>,
    suffix_cursor: SuffixCursor,
    first_fork_index: Option<usize>,
    suffix_overlaps_prefix: bool,
    appended: bool,
}

impl<'d, C: DafsaChar> AppendStateMachine<'d, C> {
    pub fn new(arena: &'d mut NodeArena<C>, root: NodeId, end: NodeId, word: &'d [C]) -> Self {
        assert!(!word.is_empty(), "cannot append an empty word");
        let mut stack = SmallVec::new();
        stack.push(root);
        AppendStateMachine {
            arena,
            word,
            prefix_index: 0,
            stack,
            suffix_cursor: SuffixCursor::new(word.len() + 1, end),
            first_fork_index: None,
            suffix_overlaps_prefix: false,
            appended: false,
        }
    }

    /// Runs the insertion to completion. Returns false if the word was
    /// already present.
    pub fn run(mut self) -> bool {
        let mut state = Some(State::FindPrefix);
        while let Some(current) = state {
            trace!(
                "{current:?}: prefix_index={} suffix_index={} first_fork={:?}",
                self.prefix_index,
                self.suffix_cursor.index,
                self.first_fork_index
            );
            state = self.step(current);
        }
        assert!(
            !self.suffix_overlaps_prefix,
            "suffix overlap interlock still set after append"
        );
        self.appended
    }

    fn step(&mut self, state: State) -> Option<State> {
        match state {
            State::FindPrefix => self.find_prefix(),
            State::FindSuffixNodesAfterPrefix => self.find_suffix_nodes_after_prefix(),
            State::FindNextSuffixNodes => self.find_next_suffix_nodes(),
            State::FindNextSuffixNodeAtPrefixEndAtFork => {
                self.find_next_suffix_node_at_prefix_end_at_fork()
            }
            State::FindNextSuffixNodeAtPrefixEndAfterFork => {
                self.find_next_suffix_node_at_prefix_end_after_fork()
            }
            State::FindNextSuffixNodesWithinPrefixAfterFork => {
                self.find_next_suffix_nodes_within_prefix_after_fork()
            }
            State::FindNextSuffixNodeWithinPrefixAtFork => {
                self.find_next_suffix_node_within_prefix_at_fork()
            }
            State::AddNewNodes => self.add_new_nodes(),
        }
    }

    /// Follows the word from the root as far as the graph allows.
    fn find_prefix(&mut self) -> Option<State> {
        let mut prefix_node = self.stack[0];
        while self.prefix_index < self.word.len() {
            let Some(next) = self.arena[prefix_node].child(self.word[self.prefix_index]) else {
                return Some(State::FindSuffixNodesAfterPrefix);
            };
            self.prefix_index += 1;
            prefix_node = next;
            self.stack.push(next);
            if self.first_fork_index.is_none() && self.arena[next].is_fork() {
                self.first_fork_index = Some(self.prefix_index);
            }
        }
        if self.arena[prefix_node].has_end_edge() {
            // Already present.
            return None;
        }
        Some(State::FindSuffixNodesAfterPrefix)
    }

    /// Matches the characters behind the prefix against existing suffix
    /// chains, walking backwards from the end node.
    fn find_suffix_nodes_after_prefix(&mut self) -> Option<State> {
        while self.suffix_cursor.index - 1 > self.prefix_index {
            let character = self.word[self.suffix_cursor.index - 2];
            let fixed = self.fixed_prefix_len();
            if !self
                .suffix_cursor
                .find_single_child(self.arena, character, &self.stack[..fixed])
            {
                return Some(State::AddNewNodes);
            }

            if Some(&self.suffix_cursor.node) == self.stack.last() {
                // The suffix has run into the prefix, e.g. "abb" after "ab":
                // the node for the first 'b' also matches the second one.
                let Some(fork_index) = self.first_fork_index else {
                    // The prefix is not shared, so the node is about to be
                    // reached twice and is treated as the fork.
                    self.first_fork_index = Some(self.prefix_index);
                    return Some(State::AddNewNodes);
                };
                // Cut the unique part of the prefix off its shared part.
                self.arena
                    .remove_parent(self.stack[fork_index], self.stack[fork_index - 1]);
                self.suffix_overlaps_prefix = true;
            }
        }

        match self.first_fork_index {
            None => Some(State::FindNextSuffixNodes),
            Some(fork_index) if self.suffix_cursor.index - 1 == fork_index => {
                Some(State::FindNextSuffixNodeAtPrefixEndAtFork)
            }
            Some(_) => Some(State::FindNextSuffixNodeAtPrefixEndAfterFork),
        }
    }

    /// The prefix is not shared: swap its tail nodes for suffix nodes as long
    /// as one exists that keeps every old branch and adds the new one.
    fn find_next_suffix_nodes(&mut self) -> Option<State> {
        debug_assert!(self.first_fork_index.is_none());
        while self.prefix_index > 0 {
            let prefix_node = self.stack[self.prefix_index];
            let fixed = self.fixed_prefix_len();
            if !self.suffix_cursor.find_end_of_prefix_replacement(
                self.arena,
                prefix_node,
                &self.stack[..fixed],
            ) {
                break;
            }
            self.prefix_index -= 1;
            self.arena.remove(prefix_node);
        }
        Some(State::AddNewNodes)
    }

    fn find_next_suffix_node_at_prefix_end_at_fork(&mut self) -> Option<State> {
        let fork_node = self.stack[self.prefix_index];
        let fixed = self.fixed_prefix_len();
        if !self.suffix_cursor.find_end_of_prefix_replacement(
            self.arena,
            fork_node,
            &self.stack[..fixed],
        ) {
            return Some(State::AddNewNodes);
        }
        self.prefix_index -= 1;
        self.leave_fork(fork_node);
        Some(State::FindNextSuffixNodes)
    }

    /// The end of the prefix lies behind a fork, so the replaced node is still
    /// used by other words and stays in the graph.
    fn find_next_suffix_node_at_prefix_end_after_fork(&mut self) -> Option<State> {
        let prefix_node = self.stack[self.prefix_index];
        let fixed = self.fixed_prefix_len();
        if !self.suffix_cursor.find_end_of_prefix_replacement(
            self.arena,
            prefix_node,
            &self.stack[..fixed],
        ) {
            return Some(State::AddNewNodes);
        }
        self.prefix_index -= 1;
        if Some(self.prefix_index) == self.first_fork_index {
            Some(State::FindNextSuffixNodeWithinPrefixAtFork)
        } else {
            Some(State::FindNextSuffixNodesWithinPrefixAfterFork)
        }
    }

    fn find_next_suffix_nodes_within_prefix_after_fork(&mut self) -> Option<State> {
        loop {
            let prefix_node = self.stack[self.prefix_index];
            let fixed = self.fixed_prefix_len();
            if !self.suffix_cursor.find_inside_of_prefix_replacement(
                self.arena,
                prefix_node,
                &self.stack[..fixed],
            ) {
                return Some(State::AddNewNodes);
            }
            self.prefix_index -= 1;
            if Some(self.prefix_index) == self.first_fork_index {
                return Some(State::FindNextSuffixNodeWithinPrefixAtFork);
            }
        }
    }

    fn find_next_suffix_node_within_prefix_at_fork(&mut self) -> Option<State> {
        let fork_node = self.stack[self.prefix_index];
        let fixed = self.fixed_prefix_len();
        if !self.suffix_cursor.find_inside_of_prefix_replacement(
            self.arena,
            fork_node,
            &self.stack[..fixed],
        ) {
            return Some(State::AddNewNodes);
        }
        self.prefix_index -= 1;
        self.leave_fork(fork_node);
        Some(State::FindNextSuffixNodes)
    }

    /// Number of prefix nodes that will stay ancestors of the node the rest of
    /// the word is attached to. The suffix cursor must not step onto them.
    ///
    /// With a pending fork the word is attached under a fresh copy of the
    /// shared part, which hangs off `stack[first_fork_index - 1]`. Otherwise
    /// it is attached under `stack[prefix_index]` or a node above it. Nodes
    /// in front of the first fork have a single parent, so these stack
    /// entries are all of their ancestors.
    fn fixed_prefix_len(&self) -> usize {
        self.first_fork_index.unwrap_or(self.prefix_index)
    }

    /// Called once the fork node itself has been replaced: the rest of the
    /// prefix is unique to this word.
    fn leave_fork(&mut self, fork_node: NodeId) {
        self.first_fork_index = None;
        if !std::mem::take(&mut self.suffix_overlaps_prefix) {
            self.arena
                .remove_parent(fork_node, self.stack[self.prefix_index]);
        }
    }

    /// Grafts the unmatched middle of the word between the prefix and the
    /// suffix chain found by the cursor.
    fn add_new_nodes(&mut self) -> Option<State> {
        let mut front = match self.first_fork_index.take() {
            Some(fork_index) => {
                let remove_parent_link = !std::mem::take(&mut self.suffix_overlaps_prefix);
                self.duplicate_fork_nodes(fork_index, remove_parent_link)
            }
            None => self.stack[self.prefix_index],
        };

        let word = self.word;
        for &character in &word[self.prefix_index..self.suffix_cursor.index - 1] {
            let node = self.arena.alloc(Node::new(character));
            self.arena.add_child(front, node);
            front = node;
        }
        self.arena.add_child(front, self.suffix_cursor.node);
        self.appended = true;
        None
    }

    /// Gives this word a private copy of the shared prefix nodes from
    /// `fork_index` up to the end of the prefix. Returns the last copy.
    fn duplicate_fork_nodes(&mut self, fork_index: usize, remove_parent_link: bool) -> NodeId {
        let mut parent = self.stack[fork_index - 1];
        if remove_parent_link {
            self.arena.remove_parent(self.stack[fork_index], parent);
        }
        for i in fork_index..=self.prefix_index {
            let source = self.stack[i];
            let node = self.arena[source].detached_copy();
            let copy = self.arena.alloc(node);
            // The next prefix node gets its own copy in the next iteration.
            self.arena
                .copy_fork_node(copy, source, self.stack.get(i + 1).copied());
            self.arena.add_child(parent, copy);
            parent = copy;
        }
        parent
    }
}
