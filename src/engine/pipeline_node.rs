use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::broadcast::{BroadcastError, Broadcaster};
use super::scope::CloseStack;
use super::zip::ZipJoin;
use crate::core::{Args, ChannelHandle, ConfigError, Node, NodeError, NodeState};
use crate::observability::NodeMetrics;
use crate::registry::{NodeArgs, NodeSchema, Transform};

/// Function node: zip-joins its inputs, applies a transformation to every
/// joined tuple and broadcasts the result to its outputs.
pub struct PipelineNode<T: Send + 'static> {
    tag: String,
    input_names: Arc<[String]>,
    inputs: Vec<ChannelHandle<T>>,
    outputs: Vec<(String, ChannelHandle<T>)>,
    transform: Transform<T>,
    broadcaster: Broadcaster<T>,
    metrics: Arc<NodeMetrics>,
    state: NodeState,
}

impl<T: Send + 'static> PipelineNode<T> {
    /// Bind `schema` against the channels in `args`.
    ///
    /// Each output registers itself as a writer of its channel, so a channel
    /// fed by several nodes stays open until all of them are done.
    pub fn new(
        tag: &str,
        schema: &NodeSchema,
        transform: Transform<T>,
        args: &NodeArgs<T>,
    ) -> Result<Self, ConfigError> {
        let display = format!("{}()", tag);
        schema.validate(&display)?;

        let ports = schema.bind(&display, args)?;
        let broadcaster = Broadcaster::new(
            ports
                .outputs
                .iter()
                .map(|(_, channel)| channel.clone())
                .collect(),
        )
        .ok_or(ConfigError::NoOutputs { node: display })?;

        for (_, channel) in &ports.outputs {
            channel.open_writer();
        }

        let (input_names, inputs): (Vec<String>, Vec<ChannelHandle<T>>) =
            ports.inputs.into_iter().unzip();

        Ok(Self {
            tag: tag.to_string(),
            input_names: input_names.into(),
            inputs,
            outputs: ports.outputs,
            transform,
            broadcaster,
            metrics: args.metrics().clone(),
            state: NodeState::Idle,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(name, _)| name.as_str())
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    async fn consume(&self) -> Result<(), NodeError> {
        let mut join = ZipJoin::new(self.inputs.clone());

        while let Some(tuple) = join.next().await {
            self.metrics.record_tuple();

            let args = Args::new(self.input_names.clone(), tuple);
            let start = self.metrics.start_transform();
            let emitted = (self.transform)(args).map_err(|source| NodeError::Transformation {
                node: self.to_string(),
                source,
            })?;
            self.metrics.finish_transform(start);

            let count = emitted.len();
            self.broadcaster
                .put(emitted)
                .await
                .map_err(|e| self.broadcast_error(e))?;
            self.metrics.record_emitted(count);
        }

        Ok(())
    }

    fn broadcast_error(&self, error: BroadcastError) -> NodeError {
        match error {
            BroadcastError::ArityMismatch { expected, actual } => NodeError::ArityMismatch {
                node: self.to_string(),
                expected,
                actual,
            },
            BroadcastError::Channel(source) => NodeError::ChannelClosed {
                node: self.to_string(),
                source,
            },
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Node for PipelineNode<T> {
    async fn run(&mut self) -> Result<(), NodeError> {
        if !self.state.can_transition_to(&NodeState::Running) {
            return Err(NodeError::InvalidState {
                node: self.to_string(),
                state: self.state.name(),
            });
        }
        self.state = NodeState::Running;
        tracing::debug!(node = %self, inputs = self.inputs.len(), outputs = self.outputs.len(), "node started");

        let result = {
            let mut scope = CloseStack::new();
            for (_, channel) in &self.outputs {
                scope.push(channel.clone());
            }
            self.consume().await
        };

        self.state = NodeState::Closed;
        match &result {
            Ok(()) => tracing::debug!(node = %self, "node finished"),
            Err(e) => {
                self.metrics.record_error();
                tracing::warn!(node = %self, error = %e, "node failed");
            }
        }
        result
    }

    fn state(&self) -> NodeState {
        self.state
    }
}

impl<T: Send + 'static> Drop for PipelineNode<T> {
    /// A node dropped before it ran still holds a writer slot on each output.
    fn drop(&mut self) {
        if self.state == NodeState::Idle {
            for (_, channel) in &self.outputs {
                channel.close();
            }
        }
    }
}

impl<T: Send + 'static> fmt::Display for PipelineNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.tag)
    }
}
