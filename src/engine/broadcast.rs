use thiserror::Error;

use crate::core::{ChannelError, ChannelHandle, Emit};

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("expected {expected} value(s), got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Fans one transformation result out to a node's outputs.
pub enum Broadcaster<T> {
    /// The whole result goes to the only output.
    Single(ChannelHandle<T>),
    /// Element `i` of the tuple goes to output `i`.
    Multi(Vec<ChannelHandle<T>>),
}

impl<T: Send + 'static> Broadcaster<T> {
    /// Pick the variant from the number of outputs. Returns `None` when there
    /// are no outputs at all.
    pub fn new(mut outputs: Vec<ChannelHandle<T>>) -> Option<Self> {
        match outputs.len() {
            0 => None,
            1 => outputs.pop().map(Self::Single),
            _ => Some(Self::Multi(outputs)),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(outputs) => outputs.len(),
        }
    }

    /// Push `emitted` downstream, in declared output order.
    ///
    /// The arity is checked before anything is pushed, so a mismatched tuple
    /// never reaches any output.
    pub async fn put(&self, emitted: Emit<T>) -> Result<(), BroadcastError> {
        match (self, emitted) {
            (Self::Single(output), Emit::One(value)) => output.put(value).await?,
            (Self::Single(output), Emit::Many(mut values)) if values.len() == 1 => {
                if let Some(value) = values.pop() {
                    output.put(value).await?;
                }
            }
            (Self::Multi(outputs), Emit::Many(values)) if values.len() == outputs.len() => {
                for (output, value) in outputs.iter().zip(values) {
                    output.put(value).await?;
                }
            }
            (_, emitted) => {
                return Err(BroadcastError::ArityMismatch {
                    expected: self.arity(),
                    actual: emitted.len(),
                })
            }
        }
        Ok(())
    }
}
