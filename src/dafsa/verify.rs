//! Structural checks over a finished or partially built DAFSA.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use thiserror::Error;

use super::char_trait::DafsaChar;
use super::graph::Dafsa;
use super::node::NodeKind;
use super::node_arena::NodeId;

/// A broken structural invariant found by [`Dafsa::verify`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// The root node has an incoming edge.
    #[error("root node has parents")]
    RootHasParents,
    /// The end node has an outgoing edge.
    #[error("end node has children")]
    EndHasChildren,
    /// An edge points at a node that is not live.
    #[error("edge {from:?} -> {to:?} points at a removed node")]
    DanglingEdge {
        /// Source of the edge.
        from: NodeId,
        /// Missing target.
        to: NodeId,
    },
    /// A child is stored under a label other than its own character.
    #[error("child {child:?} of {parent:?} is stored under the wrong label")]
    LabelMismatch {
        /// Parent holding the edge.
        parent: NodeId,
        /// Child behind the edge.
        child: NodeId,
    },
    /// The parent lists of a child do not mirror its parent's children exactly
    /// once.
    #[error("edge {parent:?} -> {child:?} is not mirrored in the child's parents")]
    MissingBackLink {
        /// Parent holding the edge.
        parent: NodeId,
        /// Child missing the back link.
        child: NodeId,
    },
    /// A node lists a parent that does not link to it.
    #[error("{child:?} lists {parent:?} as parent without a matching edge")]
    MissingForwardLink {
        /// Listed parent.
        parent: NodeId,
        /// Node holding the stale parent entry.
        child: NodeId,
    },
    /// A node other than the root has no parent.
    #[error("{0:?} has no parent")]
    Orphan(NodeId),
    /// A node other than the end node has no child, so no word passes
    /// through it.
    #[error("{0:?} has no path to the end node")]
    DeadEnd(NodeId),
    /// A path from the root revisits a node.
    #[error("cycle through {0:?}")]
    Cycle(NodeId),
    /// A live node cannot be reached from the root.
    #[error("{0:?} is unreachable from the root")]
    Unreachable(NodeId),
}

impl<C: DafsaChar> Dafsa<C> {
    /// Checks that the graph is a well-formed DAFSA.
    ///
    /// The children and parents of every node must mirror each other, the
    /// graph must be acyclic, every node must be reachable from the root and
    /// every node other than the end node must lead somewhere. This walks the
    /// whole graph and is meant for tests and debugging.
    pub fn verify(&self) -> Result<(), GraphError> {
        if self.node(self.root).incoming_count() != 0 {
            return Err(GraphError::RootHasParents);
        }
        if self.node(self.end).child_count() != 0 {
            return Err(GraphError::EndHasChildren);
        }

        for (id, node) in self.nodes() {
            for (label, child) in node.children() {
                let child_node = self
                    .get(child)
                    .ok_or(GraphError::DanglingEdge { from: id, to: child })?;
                if child_node.character() != label || child_node.is_root() {
                    return Err(GraphError::LabelMismatch { parent: id, child });
                }
                let back_links = child_node
                    .parents_via(node.character())
                    .iter()
                    .filter(|&&p| p == id)
                    .count();
                if back_links != 1 {
                    return Err(GraphError::MissingBackLink { parent: id, child });
                }
            }
            for (label, parents) in node.parents() {
                for &parent in parents {
                    let parent_node = self
                        .get(parent)
                        .ok_or(GraphError::DanglingEdge { from: parent, to: id })?;
                    if parent_node.character() != label
                        || parent_node.get(node.character()) != Some(id)
                    {
                        return Err(GraphError::MissingForwardLink { parent, child: id });
                    }
                }
            }
            if node.kind() == NodeKind::Inner {
                if node.incoming_count() == 0 {
                    return Err(GraphError::Orphan(id));
                }
                if node.child_count() == 0 {
                    return Err(GraphError::DeadEnd(id));
                }
            }
        }

        let reached: HashSet<NodeId> = self.post_order()?.into_iter().collect();
        for (id, node) in self.nodes() {
            let expected = match node.kind() {
                NodeKind::Root => true,
                NodeKind::End => !self.is_empty(),
                NodeKind::Inner => true,
            };
            if expected && !reached.contains(&id) {
                return Err(GraphError::Unreachable(id));
            }
        }
        Ok(())
    }

    /// Number of nodes a minimal DAFSA for the same words would have,
    /// sentinels included.
    ///
    /// Nodes are grouped bottom-up by character and children; two nodes in
    /// the same group recognise the same suffixes and could be merged. The
    /// graph is minimal exactly when this equals
    /// [`node_count`](Dafsa::node_count).
    ///
    /// # Panics
    ///
    /// Panics if the graph contains a cycle.
    pub fn minimal_node_count(&self) -> usize {
        let order = self.post_order().expect("DAFSA graph contains a cycle");
        let mut class_of: HashMap<NodeId, usize> = HashMap::with_capacity(order.len());
        let mut classes: HashMap<(Option<C>, NodeKind, SmallVec<[usize; 4]>), usize> =
            HashMap::new();
        for id in order {
            let node = self.node(id);
            let mut children: SmallVec<[usize; 4]> = node
                .children()
                .map(|(_, child)| class_of[&child])
                .collect();
            children.sort_unstable();
            let next_class = classes.len();
            let class = *classes
                .entry((node.character(), node.kind(), children))
                .or_insert(next_class);
            class_of.insert(id, class);
        }
        // An empty DAFSA never reaches its end node.
        classes.len() + usize::from(!class_of.contains_key(&self.end))
    }

    /// Nodes reachable from the root, every node listed after all of its
    /// children.
    fn post_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut order = Vec::with_capacity(self.node_count());
        let mut done: HashSet<NodeId> = HashSet::new();
        let mut on_path: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<(NodeId, usize)> = vec![(self.root, 0)];
        on_path.insert(self.root);

        while let Some(top) = stack.last_mut() {
            let (id, next) = *top;
            match self.node(id).children().nth(next) {
                Some((_, child)) => {
                    top.1 += 1;
                    if on_path.contains(&child) {
                        return Err(GraphError::Cycle(child));
                    }
                    if !done.contains(&child) {
                        on_path.insert(child);
                        stack.push((child, 0));
                    }
                }
                None => {
                    stack.pop();
                    on_path.remove(&id);
                    done.insert(id);
                    order.push(id);
                }
            }
        }
        Ok(order)
    }
}
