use super::{NodeError, NodeState};
use async_trait::async_trait;
use std::fmt;

/// Base trait for all nodes in a graph
///
/// A node is created once from configuration, runs exactly once, and is
/// never restarted. `Display` renders the node's declarative tag and is used
/// in logs and error messages.
#[async_trait]
pub trait Node: Send + fmt::Display {
    /// Run until the inputs are exhausted, then close every output.
    ///
    /// Outputs are closed on every exit path, including when an error is
    /// returned.
    async fn run(&mut self) -> Result<(), NodeError>;

    fn state(&self) -> NodeState;
}
