use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

use crate::core::{ChannelHandle, ConfigError, Node, NodeError, NodeState};
use crate::registry::{NodeArgs, NodeSchema};

pub const TAG: &str = "!print";

#[derive(Debug, Clone, Deserialize)]
struct PrintParams {
    #[serde(default = "default_label")]
    label: String,
}

fn default_label() -> String {
    "Output".to_string()
}

/// Sink node: drains `input` and logs every value.
pub struct Print<T: Send + 'static> {
    label: String,
    input: ChannelHandle<T>,
    received: u64,
    state: NodeState,
}

impl<T: Send + 'static> Print<T> {
    pub fn schema() -> NodeSchema {
        NodeSchema::new(["input"], Vec::<String>::new())
    }

    pub fn from_args(args: NodeArgs<T>) -> Result<Self, ConfigError> {
        let node = format!("{}()", TAG);
        let params: PrintParams = args.params_as(&node)?;
        let input = args
            .channel("input")
            .cloned()
            .ok_or_else(|| ConfigError::MissingAttribute {
                node,
                name: "input".to_string(),
            })?;

        Ok(Self {
            label: params.label,
            input,
            received: 0,
            state: NodeState::Idle,
        })
    }

    pub fn received(&self) -> u64 {
        self.received
    }
}

#[async_trait]
impl<T: Send + fmt::Debug + 'static> Node for Print<T> {
    async fn run(&mut self) -> Result<(), NodeError> {
        if !self.state.can_transition_to(&NodeState::Running) {
            return Err(NodeError::InvalidState {
                node: self.to_string(),
                state: self.state.name(),
            });
        }
        self.state = NodeState::Running;

        while let Some(value) = self.input.get().await {
            self.received += 1;
            tracing::info!(label = %self.label, seq = self.received, value = ?value, "received");
        }
        tracing::debug!(label = %self.label, total = self.received, "input drained");

        self.state = NodeState::Closed;
        Ok(())
    }

    fn state(&self) -> NodeState {
        self.state
    }
}

impl<T: Send + 'static> fmt::Display for Print<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", TAG)
    }
}
