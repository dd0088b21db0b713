use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

use crate::core::{ChannelHandle, ConfigError, Node, NodeError, NodeState};
use crate::engine::CloseStack;
use crate::registry::{NodeArgs, NodeSchema};

pub const TAG: &str = "!range";

fn default_step() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
struct RangeParams {
    #[serde(default)]
    start: i64,
    end: i64,
    #[serde(default = "default_step")]
    step: i64,
}

/// Source node: pushes `start..end` by `step` to `out`, then closes it.
pub struct RangeSource {
    start: i64,
    end: i64,
    step: i64,
    output: ChannelHandle<i64>,
    state: NodeState,
}

impl RangeSource {
    pub fn schema() -> NodeSchema {
        NodeSchema::new(Vec::<String>::new(), ["out"])
    }

    pub fn from_args(args: NodeArgs<i64>) -> Result<Self, ConfigError> {
        let node = format!("{}()", TAG);
        let params: RangeParams = args.params_as(&node)?;
        if params.step <= 0 {
            return Err(ConfigError::InvalidParameter {
                node,
                message: format!("step must be positive, got {}", params.step),
            });
        }

        let output = args
            .channel("out")
            .cloned()
            .ok_or_else(|| ConfigError::MissingAttribute {
                node,
                name: "out".to_string(),
            })?;
        output.open_writer();

        Ok(Self {
            start: params.start,
            end: params.end,
            step: params.step,
            output,
            state: NodeState::Idle,
        })
    }
}

#[async_trait]
impl Node for RangeSource {
    async fn run(&mut self) -> Result<(), NodeError> {
        if !self.state.can_transition_to(&NodeState::Running) {
            return Err(NodeError::InvalidState {
                node: self.to_string(),
                state: self.state.name(),
            });
        }
        self.state = NodeState::Running;

        let result = {
            let mut scope = CloseStack::new();
            scope.push(self.output.clone());

            let mut value = self.start;
            let mut pushed = Ok(());
            while value < self.end {
                if let Err(source) = self.output.put(value).await {
                    pushed = Err(NodeError::ChannelClosed {
                        node: self.to_string(),
                        source,
                    });
                    break;
                }
                value = match value.checked_add(self.step) {
                    Some(next) => next,
                    None => break,
                };
            }
            pushed
        };

        self.state = NodeState::Closed;
        result
    }

    fn state(&self) -> NodeState {
        self.state
    }
}

impl Drop for RangeSource {
    fn drop(&mut self) {
        if self.state == NodeState::Idle {
            self.output.close();
        }
    }
}

impl fmt::Display for RangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", TAG)
    }
}
