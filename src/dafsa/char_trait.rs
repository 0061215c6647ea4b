use std::fmt::Debug;
use std::hash::Hash;

/// Trait for types that can serve as node characters in a DAFSA.
///
/// This trait is automatically implemented for any type satisfying all the
/// required bounds (`char`, `u8`, `u16`, `u32`, etc.).
///
/// - `Copy`: nodes store their character by value
/// - `Eq`: edge lookup and suffix matching compare characters by equality
/// - `Ord`: the sorted builder checks input order
/// - `Hash`: equivalence-class registers during minimal construction
/// - `Debug`: debug printing of nodes and errors
pub trait DafsaChar: Copy + Eq + Ord + Hash + Debug {}

impl<T: Copy + Eq + Ord + Hash + Debug> DafsaChar for T {}
