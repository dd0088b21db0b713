pub mod broadcast;
pub mod graph;
pub mod pipeline_node;
pub mod scope;
pub mod zip;

pub use broadcast::{BroadcastError, Broadcaster};
pub use graph::{ChannelConfig, Graph, GraphConfig, GraphSettings, NodeConfig};
pub use pipeline_node::PipelineNode;
pub use scope::CloseStack;
pub use zip::ZipJoin;
