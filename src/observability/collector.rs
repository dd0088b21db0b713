use std::sync::Arc;

use super::{MetricsSnapshot, NodeMetrics};

/// Per-node metrics of a graph, in node declaration order.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    nodes: Vec<Arc<NodeMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `metrics`, replacing an earlier entry with the same node id.
    pub fn register(&mut self, metrics: Arc<NodeMetrics>) {
        match self.position(metrics.node_id()) {
            Some(index) => self.nodes[index] = metrics,
            None => self.nodes.push(metrics),
        }
    }

    pub fn snapshot(&self) -> Vec<MetricsSnapshot> {
        self.nodes.iter().map(|metrics| metrics.snapshot()).collect()
    }

    pub fn get(&self, node_id: &str) -> Option<Arc<NodeMetrics>> {
        self.position(node_id).map(|index| self.nodes[index].clone())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn position(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|m| m.node_id() == node_id)
    }
}
