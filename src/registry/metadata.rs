use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::{Args, ChannelHandle, ConfigError, Emit};
use crate::engine::PipelineNode;
use crate::observability::NodeMetrics;

/// Static port declaration of a node type: ordered input names and ordered
/// output names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSchema {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// Channels bound to a node's ports, in declared order.
pub struct BoundPorts<T: Send + 'static> {
    pub inputs: Vec<(String, ChannelHandle<T>)>,
    pub outputs: Vec<(String, ChannelHandle<T>)>,
}

impl NodeSchema {
    pub fn new<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    /// Every port name must be unique across inputs and outputs, since both
    /// share one constructor-argument namespace.
    pub fn validate(&self, node: &str) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for name in self.inputs.iter().chain(&self.outputs) {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicatePort {
                    node: node.to_string(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up every declared port in `args`.
    pub fn bind<T: Send + 'static>(
        &self,
        node: &str,
        args: &NodeArgs<T>,
    ) -> Result<BoundPorts<T>, ConfigError> {
        let lookup = |names: &[String]| {
            names
                .iter()
                .map(|name| {
                    args.channel(name)
                        .cloned()
                        .map(|handle| (name.clone(), handle))
                        .ok_or_else(|| ConfigError::MissingAttribute {
                            node: node.to_string(),
                            name: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(BoundPorts {
            inputs: lookup(&self.inputs)?,
            outputs: lookup(&self.outputs)?,
        })
    }
}

/// Constructor arguments for one node instance.
pub struct NodeArgs<T: Send + 'static> {
    id: String,
    channels: HashMap<String, ChannelHandle<T>>,
    params: Value,
    metrics: Arc<NodeMetrics>,
}

impl<T: Send + 'static> NodeArgs<T> {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            metrics: Arc::new(NodeMetrics::new(id.clone())),
            id,
            channels: HashMap::new(),
            params: Value::Null,
        }
    }

    /// Bind the port `name` to `channel`.
    pub fn with_channel(mut self, name: impl Into<String>, channel: ChannelHandle<T>) -> Self {
        self.channels.insert(name.into(), channel);
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<NodeMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelHandle<T>> {
        self.channels.get(name)
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Deserialize the parameters; a missing parameter object reads as `{}`.
    pub fn params_as<P: DeserializeOwned>(&self, node: &str) -> Result<P, ConfigError> {
        let params = match &self.params {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(params).map_err(|e| ConfigError::InvalidParameter {
            node: node.to_string(),
            message: e.to_string(),
        })
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }
}

/// User transformation wrapped by a function node.
pub type Transform<T> = Arc<dyn Fn(Args<T>) -> anyhow::Result<Emit<T>> + Send + Sync>;

/// A function node type: tag, schema and transformation.
///
/// Usually generated by `#[node_sub]`, but can be assembled by hand when the
/// transformation is a closure.
pub struct NodeDef<T> {
    tag: String,
    schema: NodeSchema,
    transform: Transform<T>,
}

impl<T: Send + 'static> NodeDef<T> {
    pub fn new<F>(tag: impl Into<String>, inputs: &[&str], outputs: &[&str], transform: F) -> Self
    where
        F: Fn(Args<T>) -> anyhow::Result<Emit<T>> + Send + Sync + 'static,
    {
        Self {
            tag: tag.into(),
            schema: NodeSchema::new(inputs.iter().copied(), outputs.iter().copied()),
            transform: Arc::new(transform),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn schema(&self) -> &NodeSchema {
        &self.schema
    }

    /// Instantiate a node bound to the channels in `args`.
    pub fn build(&self, args: &NodeArgs<T>) -> Result<PipelineNode<T>, ConfigError> {
        PipelineNode::new(&self.tag, &self.schema, self.transform.clone(), args)
    }
}

impl<T> Clone for NodeDef<T> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            schema: self.schema.clone(),
            transform: self.transform.clone(),
        }
    }
}
