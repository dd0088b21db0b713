//! Error types shared by channels, nodes, the registry and graphs.

use thiserror::Error;

/// Errors raised by a channel operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The channel no longer accepts values.
    #[error("channel `{channel}` is closed")]
    Closed { channel: String },
}

/// Configuration problems, detected while building nodes or graphs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A declared input or output name was not supplied to the constructor.
    #[error("attribute `{name}` does not exist on {node}")]
    MissingAttribute { node: String, name: String },

    #[error("{node} declares `{name}` more than once")]
    DuplicatePort { node: String, name: String },

    #[error("{node} declares no outputs")]
    NoOutputs { node: String },

    #[error("unknown node tag: {0}")]
    UnknownTag(String),

    #[error("node tag already registered: {0}")]
    DuplicateTag(String),

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("unknown channel `{channel}` bound to {node}.{name}")]
    UnknownChannel {
        node: String,
        name: String,
        channel: String,
    },

    #[error("invalid channel `{channel}`: {message}")]
    InvalidChannel { channel: String, message: String },

    #[error("invalid parameters for {node}: {message}")]
    InvalidParameter { node: String, message: String },

    #[error("invalid graph document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read graph document: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal errors surfaced by [`Node::run`](super::Node::run).
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transformation produced a tuple that does not fit the outputs.
    #[error("{node} produced {actual} value(s) for {expected} output(s)")]
    ArityMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },

    #[error("transformation in {node} failed: {source}")]
    Transformation {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    /// An output channel was closed by someone else while the node was still
    /// producing.
    #[error("{node} could not push: {source}")]
    ChannelClosed {
        node: String,
        #[source]
        source: ChannelError,
    },

    #[error("{node} cannot run from state {state}")]
    InvalidState { node: String, state: &'static str },
}

/// Errors surfaced by a running [`Graph`](crate::engine::Graph).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("node `{id}` failed: {source}")]
    Node {
        id: String,
        #[source]
        source: NodeError,
    },

    #[error("node `{id}` panicked: {message}")]
    Panicked { id: String, message: String },

    #[error("graph has already been started")]
    AlreadyStarted,

    #[error("graph has not been started")]
    NotStarted,
}
