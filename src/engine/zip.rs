use futures::future;
use futures::stream::{self, Stream};

use crate::core::ChannelHandle;

struct Exhausted;

/// Lockstep join over N input channels.
///
/// Every call to [`ZipJoin::next`] pulls exactly one value from each source
/// and yields them as a tuple in source order. As soon as any source reports
/// end-of-stream the join is finished for good: values already pulled from
/// the other sources in that round are dropped and no partial tuple is ever
/// produced. A join over zero sources is empty.
pub struct ZipJoin<T> {
    sources: Vec<ChannelHandle<T>>,
    done: bool,
}

impl<T: Send + 'static> ZipJoin<T> {
    pub fn new(sources: Vec<ChannelHandle<T>>) -> Self {
        let done = sources.is_empty();
        Self { sources, done }
    }

    pub fn arity(&self) -> usize {
        self.sources.len()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Pull the next tuple, or `None` once any source is exhausted.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        if self.done {
            return None;
        }

        let pulls = self
            .sources
            .iter()
            .map(|source| async move { source.get().await.ok_or(Exhausted) });

        match future::try_join_all(pulls).await {
            Ok(tuple) => Some(tuple),
            Err(Exhausted) => {
                self.done = true;
                None
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Vec<T>> + Send {
        stream::unfold(self, |mut join| async move {
            let tuple = join.next().await?;
            Some((tuple, join))
        })
    }
}
