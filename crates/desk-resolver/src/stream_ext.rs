//! Stream combinators used by the resolver
//!
//! - [`SwitchMapExt::switch_map`]: map every item to an inner stream and
//!   follow only the latest one. The superseded inner stream is dropped, which
//!   cancels whatever it was waiting on.
//! - [`until_error`]: pass items through up to and including the first `Err`.

use futures::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream returned by [`SwitchMapExt::switch_map`]
#[must_use = "streams do nothing unless polled"]
pub struct SwitchMap<S, F, U> {
    outer: Option<S>,
    f: F,
    inner: Option<U>,
}

impl<S, F, U> SwitchMap<S, F, U> {
    fn new(outer: S, f: F) -> Self {
        Self {
            outer: Some(outer),
            f,
            inner: None,
        }
    }
}

impl<S, F, U> Stream for SwitchMap<S, F, U>
where
    S: Stream + Unpin,
    F: FnMut(S::Item) -> U + Unpin,
    U: Stream + Unpin,
{
    type Item = U::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // Only the newest outer item matters; older inners are dropped unpolled.
        if let Some(outer) = this.outer.as_mut() {
            loop {
                match outer.poll_next_unpin(cx) {
                    Poll::Ready(Some(item)) => {
                        if this.inner.is_some() {
                            tracing::trace!("switching to newer inner stream");
                        }
                        this.inner = Some((this.f)(item));
                    }
                    Poll::Ready(None) => {
                        this.outer = None;
                        break;
                    }
                    Poll::Pending => break,
                }
            }
        }

        if let Some(inner) = this.inner.as_mut() {
            match inner.poll_next_unpin(cx) {
                Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                Poll::Ready(None) => this.inner = None,
                Poll::Pending => return Poll::Pending,
            }
        }

        if this.outer.is_none() && this.inner.is_none() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}

/// Switch-map extension for streams
pub trait SwitchMapExt: Stream + Sized {
    /// Map each item to a stream, following only the latest one
    fn switch_map<F, U>(self, f: F) -> SwitchMap<Self, F, U>
    where
        F: FnMut(Self::Item) -> U,
        U: Stream,
    {
        SwitchMap::new(self, f)
    }
}

impl<S: Stream> SwitchMapExt for S {}

/// Pass items through up to and including the first error
///
/// The stream ends right after the error without polling `stream` again.
pub fn until_error<T, E>(stream: BoxStream<'static, Result<T, E>>) -> BoxStream<'static, Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    futures::stream::unfold((stream, false), |(mut stream, failed)| async move {
        if failed {
            return None;
        }
        let item = stream.next().await?;
        let failed = item.is_err();
        Some((item, (stream, failed)))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use futures::stream;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn follows_latest_inner() {
        let outer = stream::iter(vec![1, 2, 3]);
        let out: Vec<_> = outer
            .switch_map(|n| stream::iter(vec![n * 10, n * 10 + 1]))
            .collect()
            .await;
        // Outer items are all ready at once, so only the last inner runs
        assert_eq!(out, vec![30, 31]);
    }

    #[tokio::test]
    async fn superseded_inner_is_dropped() {
        let (outer_tx, outer_rx) = mpsc::unbounded::<u32>();
        let (first_tx, first_rx) = mpsc::unbounded::<u32>();
        let mut first_rx = Some(first_rx);

        let mut switched = outer_rx.switch_map(move |n| match (n, first_rx.take()) {
            (1, Some(rx)) => rx.boxed(),
            _ => stream::iter(vec![n]).boxed(),
        });

        outer_tx.unbounded_send(1).unwrap();
        first_tx.unbounded_send(100).unwrap();
        assert_eq!(switched.next().await, Some(100));

        outer_tx.unbounded_send(2).unwrap();
        assert_eq!(switched.next().await, Some(2));
        // first inner receiver is gone
        assert!(first_tx.unbounded_send(101).is_err());

        drop(outer_tx);
        assert_eq!(switched.next().await, None);
    }

    #[tokio::test]
    async fn ends_after_error_without_polling_again() {
        let items = stream::iter(vec![Ok::<u32, &str>(1), Err("boom")]).chain(stream::pending());
        let out: Vec<_> = until_error(items.boxed()).collect().await;
        assert_eq!(out, vec![Ok(1), Err("boom")]);
    }

    #[tokio::test]
    async fn stops_after_first_error() {
        let items: Vec<Result<u32, &str>> = vec![Ok(1), Err("boom"), Ok(2)];
        let out: Vec<_> = until_error(stream::iter(items).boxed()).collect().await;
        assert_eq!(out, vec![Ok(1), Err("boom")]);
    }
}
