use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

use super::ChannelError;

/// Ordered conduit of values shared between the nodes wired to it.
///
/// Implementations serialize access internally: any number of writers and
/// readers may call in concurrently. Once closed, readers drain the remaining
/// values and then observe end-of-stream (`None`).
#[async_trait]
pub trait Channel<T: Send + 'static>: Send + Sync {
    /// Name of the channel, unique within a graph
    fn name(&self) -> &str;

    /// Push a value, waiting while a bounded channel is full.
    async fn put(&self, value: T) -> Result<(), ChannelError>;

    /// Pull the next value, waiting while the channel is empty and open.
    /// Returns `None` once the channel is closed and drained.
    async fn get(&self) -> Option<T>;

    /// Declare one more producer. The channel only closes after every
    /// registered writer has called `close`.
    fn open_writer(&self) {}

    /// Release one writer's lifetime.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Shared handle to a channel.
pub type ChannelHandle<T> = Arc<dyn Channel<T>>;

enum Sender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Bounded(tx) => Self::Bounded(tx.clone()),
            Self::Unbounded(tx) => Self::Unbounded(tx.clone()),
        }
    }
}

enum Receiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

struct WriterState<T> {
    tx: Option<Sender<T>>,
    writers: usize,
}

/// Default channel backed by a tokio mpsc queue.
///
/// Closing drops the stored sender; pushes already in flight still land and
/// are drained by readers before they see end-of-stream.
pub struct Queue<T> {
    name: String,
    state: Mutex<WriterState<T>>,
    rx: tokio::sync::Mutex<Receiver<T>>,
}

impl<T: Send + 'static> Queue<T> {
    /// Capacity-bounded queue. A capacity of 0 is raised to 1.
    pub fn bounded(name: impl Into<String>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self::from_parts(name.into(), Sender::Bounded(tx), Receiver::Bounded(rx))
    }

    pub fn unbounded(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::from_parts(name.into(), Sender::Unbounded(tx), Receiver::Unbounded(rx))
    }

    /// Convenience for building a shared handle.
    pub fn handle(self) -> ChannelHandle<T> {
        Arc::new(self)
    }

    fn from_parts(name: String, tx: Sender<T>, rx: Receiver<T>) -> Self {
        Self {
            name,
            state: Mutex::new(WriterState { tx: Some(tx), writers: 0 }),
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    fn sender(&self) -> Option<Sender<T>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tx
            .clone()
    }

    fn closed_error(&self) -> ChannelError {
        ChannelError::Closed {
            channel: self.name.clone(),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Channel<T> for Queue<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, value: T) -> Result<(), ChannelError> {
        match self.sender() {
            Some(Sender::Bounded(tx)) => tx.send(value).await.map_err(|_| self.closed_error()),
            Some(Sender::Unbounded(tx)) => tx.send(value).map_err(|_| self.closed_error()),
            None => Err(self.closed_error()),
        }
    }

    async fn get(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;
        match &mut *rx {
            Receiver::Bounded(rx) => rx.recv().await,
            Receiver::Unbounded(rx) => rx.recv().await,
        }
    }

    fn open_writer(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.tx.is_some() {
            state.writers += 1;
        }
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.tx.is_none() {
            return;
        }
        if state.writers > 1 {
            state.writers -= 1;
            tracing::trace!(channel = %self.name, remaining = state.writers, "writer released");
            return;
        }
        state.writers = 0;
        state.tx = None;
        tracing::trace!(channel = %self.name, "channel closed");
    }

    fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tx
            .is_none()
    }
}
