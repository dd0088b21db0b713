use crate::core::ChannelHandle;

/// Stack of pending "close on exit" obligations.
///
/// Channels are pushed in declared order and closed in reverse when the
/// stack is dropped, whichever way the owning scope is left: normal return,
/// `?` early return, panic unwind, or the owning future being dropped.
pub struct CloseStack<T: Send + 'static> {
    pending: Vec<ChannelHandle<T>>,
}

impl<T: Send + 'static> CloseStack<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Acquire the write lifetime of `channel`.
    pub fn push(&mut self, channel: ChannelHandle<T>) {
        self.pending.push(channel);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T: Send + 'static> Default for CloseStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Drop for CloseStack<T> {
    fn drop(&mut self) {
        while let Some(channel) = self.pending.pop() {
            channel.close();
            tracing::trace!(channel = channel.name(), "output released");
        }
    }
}
