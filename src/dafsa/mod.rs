/// Word-at-a-time insertion state machine.
mod append;
/// Offline construction from sorted word lists.
pub mod builder;
/// Trait for types that can serve as DAFSA node characters.
pub mod char_trait;
/// The DAFSA itself: appending, queries and word enumeration.
pub mod graph;
/// Graph nodes and their edge maps.
pub mod node;
/// Internal generational arena holding the nodes.
pub(crate) mod node_arena;
mod suffix_cursor;
/// Top-level domain data input.
pub mod tld;
/// Structural checks and minimality measurement.
pub mod verify;

pub use builder::{build_dafsa, Builder, BuilderError, IntoWord};
pub use char_trait::DafsaChar;
pub use graph::{Dafsa, DafsaError, Words};
pub use node::{Node, NodeKind};
pub use node_arena::NodeId;
pub use tld::TldError;
pub use verify::GraphError;
