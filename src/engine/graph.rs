use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle};

use crate::core::{ChannelHandle, ConfigError, GraphError, Node, NodeError, Queue};
use crate::observability::{MetricsCollector, NodeMetrics, PipelineMonitor};
use crate::registry::{NodeArgs, Registry};

fn default_capacity() -> usize {
    100
}

/// Top-level graph document.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub graph_config: GraphSettings,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    /// Capacity used for channels that do not set their own
    #[serde(default = "default_capacity")]
    pub channel_capacity: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_capacity(),
        }
    }
}

/// A channel is either just a name or a name with its own sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChannelConfig {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        capacity: Option<usize>,
        #[serde(default)]
        unbounded: bool,
    },
}

impl ChannelConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name.as_str(),
        }
    }

    fn build<T: Send + 'static>(&self, settings: &GraphSettings) -> Result<ChannelHandle<T>, ConfigError> {
        let (capacity, unbounded) = match self {
            Self::Name(_) => (settings.channel_capacity, false),
            Self::Detailed {
                capacity,
                unbounded,
                ..
            } => (capacity.unwrap_or(settings.channel_capacity), *unbounded),
        };

        if unbounded {
            return Ok(Queue::unbounded(self.name()).handle());
        }
        if capacity == 0 {
            return Err(ConfigError::InvalidChannel {
                channel: self.name().to_string(),
                message: "capacity must be at least 1".to_string(),
            });
        }
        Ok(Queue::bounded(self.name(), capacity).handle())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub id: Option<String>,
    pub tag: String,
    /// Port name -> channel name
    #[serde(default)]
    pub bind: HashMap<String, String>,
    #[serde(default)]
    pub params: Value,
}

/// A set of nodes wired together through named channels, plus the tasks
/// running them.
pub struct Graph<T: Send + 'static> {
    channels: HashMap<String, ChannelHandle<T>>,
    node_ids: Vec<String>,
    nodes: Vec<(String, Box<dyn Node>)>,
    handles: Vec<(String, JoinHandle<Result<(), NodeError>>)>,
    collector: MetricsCollector,
    started: bool,
}

impl<T: Send + 'static> Graph<T> {
    pub fn from_config(config: GraphConfig, registry: &Registry<T>) -> Result<Self, ConfigError> {
        let mut channels = HashMap::new();
        for channel in &config.channels {
            let name = channel.name().to_string();
            if channels.contains_key(&name) {
                return Err(ConfigError::InvalidChannel {
                    channel: name,
                    message: "declared more than once".to_string(),
                });
            }
            channels.insert(name, channel.build(&config.graph_config)?);
        }

        let mut collector = MetricsCollector::new();
        let mut nodes: Vec<(String, Box<dyn Node>)> = Vec::new();

        for (index, node_config) in config.nodes.into_iter().enumerate() {
            let id = node_config
                .id
                .unwrap_or_else(|| format!("{}#{}", node_config.tag, index));
            if nodes.iter().any(|(existing, _)| *existing == id) {
                return Err(ConfigError::DuplicateNode(id));
            }

            let metrics = Arc::new(NodeMetrics::new(id.clone()));
            let mut args = NodeArgs::new(id.clone())
                .with_params(node_config.params)
                .with_metrics(metrics.clone());

            for (port, channel_name) in node_config.bind {
                let channel = channels.get(&channel_name).cloned().ok_or_else(|| {
                    ConfigError::UnknownChannel {
                        node: id.clone(),
                        name: port.clone(),
                        channel: channel_name.clone(),
                    }
                })?;
                args = args.with_channel(port, channel);
            }

            let node = registry.create(&node_config.tag, args)?;
            tracing::debug!(id = %id, node = %node, "node created");
            collector.register(metrics);
            nodes.push((id, node));
        }

        Ok(Self {
            channels,
            node_ids: nodes.iter().map(|(id, _)| id.clone()).collect(),
            nodes,
            handles: Vec::new(),
            collector,
            started: false,
        })
    }

    pub fn from_json(config: Value, registry: &Registry<T>) -> Result<Self, ConfigError> {
        Self::from_config(serde_json::from_value(config)?, registry)
    }

    pub fn from_path(path: impl AsRef<Path>, registry: &Registry<T>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_config(serde_json::from_str(&text)?, registry)
    }

    /// Handle to a named channel, for feeding sources or draining sinks from
    /// outside the graph.
    pub fn channel(&self, name: &str) -> Option<ChannelHandle<T>> {
        self.channels.get(name).cloned()
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Spawn every node on its own task. Must be called within a tokio runtime.
    pub fn start(&mut self) -> Result<(), GraphError> {
        if self.started {
            return Err(GraphError::AlreadyStarted);
        }
        self.started = true;

        for (id, mut node) in self.nodes.drain(..) {
            let handle = tokio::spawn(async move { node.run().await });
            self.handles.push((id, handle));
        }

        tracing::info!(nodes = self.handles.len(), channels = self.channels.len(), "graph started");
        Ok(())
    }

    /// Wait for every node to finish.
    ///
    /// On the first failure the remaining node tasks are aborted and reaped
    /// before the failure is returned, so every output is closed by then.
    pub async fn wait(&mut self) -> Result<(), GraphError> {
        if !self.started {
            return Err(GraphError::NotStarted);
        }

        let handles = std::mem::take(&mut self.handles);
        let aborts: Vec<AbortHandle> = handles.iter().map(|(_, h)| h.abort_handle()).collect();
        let mut running: FuturesUnordered<_> = handles
            .into_iter()
            .map(|(id, handle)| async move { (id, handle.await) })
            .collect();

        while let Some((id, joined)) = running.next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(source)) => GraphError::Node { id, source },
                Err(e) => GraphError::Panicked {
                    id,
                    message: e.to_string(),
                },
            };

            tracing::warn!(error = %failure, "graph failed, aborting remaining nodes");
            for abort in &aborts {
                abort.abort();
            }
            while let Some((id, joined)) = running.next().await {
                match joined {
                    Err(e) if e.is_cancelled() => {}
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::debug!(id = %id, error = %e, "node failed after abort"),
                    Err(e) => tracing::debug!(id = %id, error = %e, "node panicked after abort"),
                }
            }
            return Err(failure);
        }

        tracing::info!("graph finished");
        Ok(())
    }

    pub async fn run(&mut self) -> Result<(), GraphError> {
        self.start()?;
        self.wait().await
    }

    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.collector.clone())
    }
}
