//! Stock node types over `i64` payloads.

pub mod arith;
pub mod print;
pub mod range;

pub use arith::{add, add_node, divmod, divmod_node, negate, negate_node};
pub use print::Print;
pub use range::RangeSource;

use crate::core::{ConfigError, Node};
use crate::registry::Registry;

/// Register every stock node type.
pub fn register_all(registry: &mut Registry<i64>) -> Result<(), ConfigError> {
    registry.register_def(add_node())?;
    registry.register_def(divmod_node())?;
    registry.register_def(negate_node())?;

    registry.register(range::TAG, RangeSource::schema(), |args| {
        Ok(Box::new(RangeSource::from_args(args)?) as Box<dyn Node>)
    })?;
    registry.register(print::TAG, Print::<i64>::schema(), |args| {
        Ok(Box::new(Print::<i64>::from_args(args)?) as Box<dyn Node>)
    })?;

    Ok(())
}
