use hashbrown::HashMap;
use log::debug;
use mark_last::MarkLastIterator;
use smallvec::SmallVec;
use thiserror::Error;

use super::char_trait::DafsaChar;
use super::graph::Dafsa;
use super::node::Node;
use super::node_arena::NodeId;

/// Trait for types that can be used as a word when building a DAFSA.
///
/// Implemented for common string and sequence types so that
/// [`Dafsa::append`], [`Builder::add_word`] and [`build_dafsa`] accept them
/// directly without manual conversion.
pub trait IntoWord<C: DafsaChar> {
    /// Collects this word into a character buffer.
    fn collect_word(self) -> SmallVec<[C; 32]>;
}

// String types → char

impl IntoWord<char> for &str {
    fn collect_word(self) -> SmallVec<[char; 32]> {
        self.chars().collect()
    }
}

impl IntoWord<char> for &&str {
    fn collect_word(self) -> SmallVec<[char; 32]> {
        self.chars().collect()
    }
}

impl IntoWord<char> for String {
    fn collect_word(self) -> SmallVec<[char; 32]> {
        self.chars().collect()
    }
}

impl IntoWord<char> for &String {
    fn collect_word(self) -> SmallVec<[char; 32]> {
        self.chars().collect()
    }
}

// Generic sequence types → C

impl<C: DafsaChar> IntoWord<C> for &[C] {
    fn collect_word(self) -> SmallVec<[C; 32]> {
        self.iter().copied().collect()
    }
}

impl<C: DafsaChar> IntoWord<C> for Vec<C> {
    fn collect_word(self) -> SmallVec<[C; 32]> {
        self.into_iter().collect()
    }
}

impl<C: DafsaChar> IntoWord<C> for &Vec<C> {
    fn collect_word(self) -> SmallVec<[C; 32]> {
        self.iter().copied().collect()
    }
}

impl<C: DafsaChar, const N: usize> IntoWord<C> for [C; N] {
    fn collect_word(self) -> SmallVec<[C; 32]> {
        self.into_iter().collect()
    }
}

impl<C: DafsaChar, const N: usize> IntoWord<C> for &[C; N] {
    fn collect_word(self) -> SmallVec<[C; 32]> {
        self.iter().copied().collect()
    }
}

/// Errors that can occur when building a DAFSA from sorted input.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum BuilderError<C: DafsaChar> {
    /// Words were not provided in strictly increasing order.
    ///
    /// Contains the two words that were out of order (previous word, current word).
    #[error("OrderError - {0:?} came before {1:?}")]
    Order(Vec<C>, Vec<C>),
    /// The empty word was provided.
    #[error("cannot add an empty word")]
    EmptyWord,
}

/// Identity of a finished node: two nodes with the same character and the
/// same children recognise the same suffixes and can be merged.
#[derive(PartialEq, Eq, Hash)]
struct ClassKey<C: DafsaChar> {
    ch: C,
    terminal: bool,
    children: SmallVec<[NodeId; 4]>,
}

/// A node on the path of the last added word that may still gain children.
struct BuildState<C: DafsaChar> {
    ch: Option<C>,
    terminal: bool,
    children: SmallVec<[NodeId; 4]>,
}

/// Builds a minimal DAFSA from words given in sorted order, in one pass.
///
/// Only the path of the most recent word is kept open. When the next word
/// branches off that path, the nodes below the branch point can no longer
/// change: they are frozen bottom-up and merged with an equivalent
/// finished node when one exists.
///
/// Unlike [`Dafsa::append`], which accepts words in any order, this builder
/// rejects unsorted input.
pub struct Builder<C: DafsaChar> {
    dafsa: Dafsa<C>,
    build_state: Vec<BuildState<C>>,
    classes: HashMap<ClassKey<C>, NodeId>,
}

impl<C: DafsaChar> Builder<C> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Builder {
            dafsa: Dafsa::new(),
            build_state: vec![BuildState {
                ch: None,
                terminal: false,
                children: SmallVec::new(),
            }],
            classes: HashMap::new(),
        }
    }

    /// Adds a word to the DAFSA being constructed.
    ///
    /// The word can be any type that implements [`IntoWord`], including `&str`,
    /// `String`, `&[u8]`, `Vec<u8>`, or fixed-size arrays like `[u8; 3]`.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::Order` if the word does not sort strictly after
    /// the previously added word, and `BuilderError::EmptyWord` for an empty
    /// word.
    pub fn add_word(&mut self, word: impl IntoWord<C>) -> Result<(), BuilderError<C>> {
        let word = word.collect_word();
        self.add_word_slice(&word)
    }

    fn add_word_slice(&mut self, word: &[C]) -> Result<(), BuilderError<C>> {
        if word.is_empty() {
            return Err(BuilderError::EmptyWord);
        }
        let prefix_length = self.prefix_length(word)?;
        self.freeze_suffix(prefix_length);
        self.build_state
            .extend(
                word[prefix_length..]
                    .iter()
                    .copied()
                    .mark_last()
                    .map(|(last, ch)| BuildState {
                        ch: Some(ch),
                        terminal: last,
                        children: SmallVec::new(),
                    }),
            );
        Ok(())
    }

    fn prefix_length(&self, word: &[C]) -> Result<usize, BuilderError<C>> {
        let mut prefix_len = 0;
        for (i, &ch) in word.iter().enumerate() {
            let is_last = i == word.len() - 1;
            let Some(prev_ch) = self.build_state.get(prefix_len + 1).and_then(|s| s.ch) else {
                break;
            };
            if ch > prev_ch {
                break;
            }
            if ch < prev_ch || is_last {
                return Err(BuilderError::Order(self.previous_word(), word.to_vec()));
            }
            prefix_len += 1;
        }
        Ok(prefix_len)
    }

    fn previous_word(&self) -> Vec<C> {
        self.build_state[1..].iter().filter_map(|e| e.ch).collect()
    }

    /// Freezes every open node deeper than `target_length`.
    fn freeze_suffix(&mut self, target_length: usize) {
        assert!(self.build_state.len() > target_length);
        let target_length = target_length
            .checked_add(1)
            .expect("target_length overflow");
        while self.build_state.len() > target_length {
            let state = self.pop_build_state();
            let child = self.canonicalize(state);
            self.build_state
                .last_mut()
                .expect("Build state will always have at least one entry")
                .children
                .push(child);
        }
    }

    fn pop_build_state(&mut self) -> BuildState<C> {
        self.build_state
            .pop()
            .expect("Build state will always have at least one entry")
    }

    fn canonicalize(&mut self, state: BuildState<C>) -> NodeId {
        let ch = state.ch.expect("only the root has no character");
        let key = ClassKey {
            ch,
            terminal: state.terminal,
            children: state.children,
        };
        if let Some(&id) = self.classes.get(&key) {
            return id;
        }

        let arena = &mut self.dafsa.arena;
        let id = arena.alloc(Node::new(ch));
        if key.terminal {
            arena.add_child(id, self.dafsa.end);
        }
        for &child in &key.children {
            arena.add_child(id, child);
        }
        self.classes.insert(key, id);
        id
    }

    /// Finalizes the construction and returns the DAFSA.
    pub fn build(mut self) -> Dafsa<C> {
        self.freeze_suffix(0);
        let root_state = self.pop_build_state();
        let root = self.dafsa.root;
        for child in root_state.children {
            self.dafsa.arena.add_child(root, child);
        }
        debug!(
            "built DAFSA with {} nodes ({} classes)",
            self.dafsa.node_count(),
            self.classes.len()
        );
        self.dafsa
    }
}

impl<C: DafsaChar> Default for Builder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a minimal DAFSA from an iterator of sorted words.
///
/// Words **must** be provided in strictly increasing order, or this function
/// returns an error. For input in arbitrary order use [`Dafsa::append`].
///
/// # Examples
///
/// ```
/// use incremental_dafsa::build_dafsa;
///
/// let dafsa = build_dafsa(["APPLE", "BANANA", "CHERRY"]).unwrap();
/// assert!(dafsa.contains("BANANA"));
/// assert!(!dafsa.contains("APRICOT"));
///
/// assert!(build_dafsa(["BANANA", "APPLE"]).is_err());
/// ```
pub fn build_dafsa<C, W>(words: impl IntoIterator<Item = W>) -> Result<Dafsa<C>, BuilderError<C>>
where
    C: DafsaChar,
    W: IntoWord<C>,
{
    let mut builder = Builder::new();
    for word in words {
        builder.add_word(word)?;
    }
    Ok(builder.build())
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use itertools::Itertools;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn order_err(a: &str, b: &str) -> BuilderError<char> {
        BuilderError::Order(a.chars().collect(), b.chars().collect())
    }

    #[test]
    fn graph_shares_nodes() {
        let single = build_dafsa(["ABCDEF"]).unwrap();
        assert_eq!(single.node_count(), "ABCDEF".len() + 2);

        let shared = build_dafsa(["ABCDEF", "ABDEF", "ABEF", "AF"]).unwrap();
        assert_eq!(single.node_count(), shared.node_count());
        shared.verify().unwrap();
    }

    #[test]
    fn sorted_input_words_gives_no_error() {
        let res = build_dafsa(["ALFA", "BRAVO", "CHARLIE", "DELTA"]);
        assert!(res.is_ok());
    }

    #[test]
    fn unsorted_input_words_gives_error() {
        const SORTED_WORDS: [&str; 6] = ["ALFA", "BRAVO", "CHARLIE", "DELTA", "ECHO", "FOXTROT"];
        let mut sorted_count = 0;
        // Every permutation except the sorted one must be rejected.
        for wordlist in SORTED_WORDS.iter().copied().permutations(SORTED_WORDS.len()) {
            let is_sorted = wordlist == SORTED_WORDS;
            let res = build_dafsa(&wordlist);
            assert_eq!(res.is_ok(), is_sorted);
            sorted_count += is_sorted as i32;
        }
        assert_eq!(sorted_count, 1);
    }

    #[test]
    fn same_word_twice_gives_error() {
        let res = build_dafsa(["ALFA", "BRAVO", "CHARLIE", "CHARLIE"]);
        assert_eq!(res.unwrap_err(), order_err("CHARLIE", "CHARLIE"));
    }

    #[test]
    fn prefix_after_longer_word_gives_error() {
        let res = build_dafsa(["CART", "CAR"]);
        assert_eq!(res.unwrap_err(), order_err("CART", "CAR"));
    }

    #[test]
    fn unsorted_input_words_gives_unsorted_words_in_error() {
        let res = build_dafsa([
            "ALFA", "BRAVO", "CHARLIE", "DELTA", "ECHO", "GOLF", "FOXTROT", "HOTEL",
        ]);
        assert_eq!(res.unwrap_err(), order_err("GOLF", "FOXTROT"));

        let res = build_dafsa(["ZULU", "ALFA", "BRAVO", "CHARLIE"]);
        assert_eq!(res.unwrap_err(), order_err("ZULU", "ALFA"));
    }

    #[test]
    fn empty_word_gives_error() {
        let res = build_dafsa(["", "A"]);
        assert_eq!(res.unwrap_err(), BuilderError::EmptyWord);
    }

    #[test]
    fn generic_dafsa_with_u8() {
        let mut builder = Builder::<u8>::new();
        builder.add_word([1, 2, 3]).unwrap();
        builder.add_word([1, 2, 4]).unwrap();
        builder.add_word([2, 3, 4]).unwrap();
        let dafsa = builder.build();
        assert!(dafsa.contains([1, 2, 3]));
        assert!(dafsa.contains([1, 2, 4]));
        assert!(dafsa.contains([2, 3, 4]));
        assert!(!dafsa.contains([1, 2, 5]));
        assert!(!dafsa.contains([1, 2]));
    }

    #[test]
    fn matches_incremental_construction() {
        let words = [
            "BAKE", "BAKED", "BAKER", "CAKE", "CAKED", "FAKE", "FAKED", "LAKE", "MAKE", "MAKER",
        ];
        let batch = build_dafsa(words).unwrap();
        let incremental = Dafsa::from_words(words).unwrap();
        batch.verify().unwrap();
        assert_eq!(batch.minimal_node_count(), batch.node_count());
        assert_eq!(batch.node_count(), incremental.node_count());
        let batch_words: BTreeSet<_> = batch.words().collect();
        let incremental_words: BTreeSet<_> = incremental.words().collect();
        assert_eq!(batch_words, incremental_words);
    }

    #[test]
    fn random_sorted_words_are_minimal() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..30 {
            let words: BTreeSet<Vec<u8>> = (0..rng.gen_range(1..40))
                .map(|_| {
                    let len = rng.gen_range(1..7);
                    (0..len).map(|_| rng.gen_range(0..3u8)).collect()
                })
                .collect();
            let dafsa = build_dafsa(&words).unwrap();
            dafsa.verify().unwrap();
            assert_eq!(dafsa.minimal_node_count(), dafsa.node_count());
            let built: BTreeSet<Vec<u8>> = dafsa.words().collect();
            assert_eq!(built, words);
        }
    }
}
