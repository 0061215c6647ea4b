//! # incremental-dafsa
//!
//! An incrementally built, minimal
//! [DAFSA](https://en.wikipedia.org/wiki/Deterministic_acyclic_finite_state_automaton)
//! (deterministic acyclic finite-state automaton) for Rust.
//!
//! A DAFSA is a trie whose common suffixes are shared as well as its common
//! prefixes. [`Dafsa`] grows one word at a time and keeps the graph minimal
//! after every [`append`](Dafsa::append) as long as the words arrive in
//! sorted order. Words given out of order are still recognised; the graph may
//! then hold some redundant nodes.
//!
//! Nodes carry the characters and edges are implied by them. The root and
//! end sentinels carry none: every path from [`Dafsa::root`] to
//! [`Dafsa::end`] spells one word.
//!
//! ## Quick Start
//!
//! ```
//! use incremental_dafsa::Dafsa;
//!
//! let mut dafsa = Dafsa::new();
//! for word in ["BAKE", "CAKE", "FAKE", "LAKE", "MAKE"] {
//!     dafsa.append(word).unwrap();
//! }
//! assert!(dafsa.contains("CAKE"));
//! assert!(!dafsa.contains("AKE"));
//!
//! // root, end, five first letters and one shared "AKE" chain
//! assert_eq!(dafsa.node_count(), 2 + 5 + 3);
//! ```
//!
//! When the whole sorted word list is known up front, [`build_dafsa`] builds
//! the same graph in a single pass:
//!
//! ```
//! use incremental_dafsa::build_dafsa;
//!
//! let dafsa = build_dafsa(["BAKE", "CAKE", "FAKE", "LAKE", "MAKE"]).unwrap();
//! assert_eq!(dafsa.node_count(), 10);
//! ```
//!
//! ## Generic Usage
//!
//! The DAFSA is generic over the node character type:
//!
//! ```
//! use incremental_dafsa::Dafsa;
//!
//! let words: Vec<Vec<u8>> = vec![vec![1, 2, 3], vec![1, 2, 4], vec![2, 3, 4]];
//! let dafsa = Dafsa::from_words(words).unwrap();
//!
//! assert!(dafsa.contains([1u8, 2, 3]));
//! assert!(!dafsa.contains([1u8, 2, 5]));
//! ```
//!
//! [`Dafsa::from_tld_data`] builds a byte DAFSA from top-level domain
//! entries such as `"example1"`, as found in gperf files.

#![warn(missing_docs)]

/// Core DAFSA data structure: nodes, incremental insertion, builder and
/// character trait.
pub mod dafsa;

pub use dafsa::{
    build_dafsa, Builder, BuilderError, Dafsa, DafsaChar, DafsaError, GraphError, IntoWord, Node,
    NodeId, NodeKind, TldError,
};
