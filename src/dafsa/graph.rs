use log::debug;
use smallvec::SmallVec;
use thiserror::Error;

use super::append::AppendStateMachine;
use super::builder::IntoWord;
use super::char_trait::DafsaChar;
use super::node::Node;
use super::node_arena::{NodeArena, NodeId};

/// Errors returned by [`Dafsa::append`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DafsaError {
    /// The empty word cannot be represented: the root never links to the end
    /// node directly.
    #[error("cannot append an empty word")]
    EmptyWord,
}

/// A minimal deterministic acyclic finite-state automaton that grows one
/// word at a time.
///
/// Every node except the root and end sentinels carries one character, and
/// every path from the root to the end node spells one of the appended words.
/// After each [`append`](Dafsa::append) the graph is consistent and, as long
/// as words arrive in sorted order, minimal: common prefixes and common
/// suffixes are both shared.
///
/// # Examples
///
/// ```
/// use incremental_dafsa::Dafsa;
///
/// let mut dafsa = Dafsa::new();
/// for word in ["BAKE", "CAKE", "FAKE"] {
///     assert!(dafsa.append(word).unwrap());
/// }
/// assert!(!dafsa.append("CAKE").unwrap()); // already present
/// assert!(dafsa.contains("FAKE"));
/// assert!(!dafsa.contains("AKE"));
///
/// // "AKE" is shared by all three words.
/// let node_after = |first| {
///     let first = dafsa.node(dafsa.root()).child(first).unwrap();
///     dafsa.node(first).child('A').unwrap()
/// };
/// assert_eq!(node_after('B'), node_after('C'));
/// assert_eq!(node_after('C'), node_after('F'));
/// ```
pub struct Dafsa<C: DafsaChar> {
    pub(super) arena: NodeArena<C>,
    pub(super) root: NodeId,
    pub(super) end: NodeId,
}

impl<C: DafsaChar> Dafsa<C> {
    /// Creates a DAFSA recognising no words.
    pub fn new() -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::root());
        let end = arena.alloc(Node::end());
        Dafsa { arena, root, end }
    }

    /// Creates a DAFSA from `words`, appended in iteration order.
    pub fn from_words<W: IntoWord<C>>(
        words: impl IntoIterator<Item = W>,
    ) -> Result<Self, DafsaError> {
        let mut dafsa = Self::new();
        for word in words {
            dafsa.append(word)?;
        }
        Ok(dafsa)
    }

    /// Adds a word.
    ///
    /// Returns `Ok(true)` if the word was added and `Ok(false)` if it was
    /// already present, in which case the graph is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DafsaError::EmptyWord`] for an empty word.
    pub fn append(&mut self, word: impl IntoWord<C>) -> Result<bool, DafsaError> {
        let word = word.collect_word();
        self.append_slice(&word)
    }

    pub(crate) fn append_slice(&mut self, word: &[C]) -> Result<bool, DafsaError> {
        if word.is_empty() {
            return Err(DafsaError::EmptyWord);
        }
        let appended = AppendStateMachine::new(&mut self.arena, self.root, self.end, word).run();
        debug!(
            "append {word:?}: {} ({} nodes)",
            if appended { "added" } else { "already present" },
            self.arena.len()
        );
        Ok(appended)
    }

    /// The root (source) node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The end (accept) node.
    #[inline]
    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to a live node of this DAFSA.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<C> {
        &self.arena[id]
    }

    /// Returns the node behind `id`, or `None` if it has been removed.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<C>> {
        self.arena.get(id)
    }

    /// Iterates over all live nodes, sentinels included.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<C>)> + '_ {
        self.arena.iter()
    }

    /// Number of live nodes, including the root and end sentinels.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// True if no word has been appended.
    pub fn is_empty(&self) -> bool {
        self.arena[self.root].child_count() == 0
    }

    /// Returns `true` if `word` is recognised.
    pub fn contains(&self, word: impl IntoWord<C>) -> bool {
        let word = word.collect_word();
        !word.is_empty()
            && word
                .iter()
                .try_fold(self.root, |node, &ch| self.arena[node].child(ch))
                .is_some_and(|node| self.arena[node].has_end_edge())
    }

    /// Returns an iterator over every recognised word, in depth-first order
    /// following the insertion order of edges.
    pub fn words(&self) -> Words<'_, C> {
        Words {
            dafsa: self,
            stack: vec![(self.root, 0)],
            prefix: Vec::new(),
        }
    }
}

impl<C: DafsaChar> Default for Dafsa<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: DafsaChar> std::fmt::Debug for Dafsa<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dafsa")
            .field("node_count", &self.node_count())
            .finish()
    }
}

/// Iterator over the words recognised by a [`Dafsa`], created by
/// [`Dafsa::words`].
pub struct Words<'d, C: DafsaChar> {
    dafsa: &'d Dafsa<C>,
    stack: Vec<(NodeId, usize)>,
    prefix: Vec<C>,
}

impl<C: DafsaChar> Iterator for Words<'_, C> {
    type Item = Vec<C>;

    fn next(&mut self) -> Option<Vec<C>> {
        while let Some((id, depth)) = self.stack.pop() {
            let node = &self.dafsa.arena[id];
            self.prefix.truncate(depth);
            if node.is_end() {
                return Some(self.prefix.clone());
            }
            if let Some(ch) = node.character() {
                self.prefix.push(ch);
            }
            let depth = self.prefix.len();
            let children: SmallVec<[NodeId; 4]> = node.children().map(|(_, c)| c).collect();
            self.stack
                .extend(children.into_iter().rev().map(|child| (child, depth)));
        }
        None
    }
}
