pub mod channel;
pub mod error;
pub mod frame;
pub mod node;
pub mod state;

pub use channel::{Channel, ChannelHandle, Queue};
pub use error::{ChannelError, ConfigError, GraphError, NodeError};
pub use frame::{Args, Emit};
pub use node::Node;
pub use state::NodeState;
