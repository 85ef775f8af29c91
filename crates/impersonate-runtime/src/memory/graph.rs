//! In-memory graph, partitioned by target.

use impersonate_types::{NodeId, Value};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A stored node, independent of any session.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: BTreeMap<String, Value>,
}

impl StoredNode {
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Node store shared by every memory session.
///
/// Node ids are unique across targets.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    targets: RwLock<HashMap<String, Vec<StoredNode>>>,
    next_id: AtomicU64,
}

impl MemoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node<L, S>(
        &self,
        target: impl Into<String>,
        labels: L,
        properties: BTreeMap<String, Value>,
    ) -> NodeId
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let node = StoredNode {
            id,
            labels: labels.into_iter().map(Into::into).collect(),
            properties,
        };
        self.targets
            .write()
            .entry(target.into())
            .or_default()
            .push(node);
        id
    }

    /// Snapshot of the nodes in `target`, empty if the target is unknown.
    #[must_use]
    pub fn snapshot(&self, target: &str) -> Arc<[StoredNode]> {
        self.targets
            .read()
            .get(target)
            .map_or_else(|| Arc::from(Vec::new()), |nodes| Arc::from(nodes.as_slice()))
    }

    #[must_use]
    pub fn node_count(&self, target: &str) -> usize {
        self.targets.read().get(target).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_are_partitioned_by_target() {
        let graph = MemoryGraph::new();
        let a = graph.add_node("neo4j", ["Person"], BTreeMap::new());
        let b = graph.add_node("sales", ["Person"], BTreeMap::new());

        assert_ne!(a, b);
        assert_eq!(graph.node_count("neo4j"), 1);
        assert_eq!(graph.node_count("sales"), 1);
        assert_eq!(graph.node_count("hr"), 0);
        assert!(graph.snapshot("hr").is_empty());
        assert!(graph.snapshot("neo4j")[0].has_label("Person"));
    }
}
