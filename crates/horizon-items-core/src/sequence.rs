//! Pull-based snapshot delivery.
//!
//! [`SnapshotStream`] adapts any asynchronous sequence into a uniform,
//! infallible stream of values:
//!
//! - The underlying iterator is created lazily, on the first pull, and at
//!   most once.
//! - A failing pull ends the stream. The failure is logged and swallowed,
//!   and the stream never yields again.
//! - Clones share the same underlying iterator, so each value is observed
//!   by exactly one puller.
//!
//! # Example
//!
//! ```
//! use futures_util::stream;
//! use horizon_items_core::sequence::SnapshotStream;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let snapshots = SnapshotStream::new(stream::iter(vec![1, 2, 3]));
//! assert_eq!(snapshots.next().await, Some(1));
//! assert_eq!(snapshots.next().await, Some(2));
//! assert_eq!(snapshots.next().await, Some(3));
//! assert_eq!(snapshots.next().await, None);
//! # });
//! ```

use std::fmt::Display;
use std::sync::Arc;

use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use tokio::sync::{Mutex, mpsc};

use crate::error::{ItemsError, Result};
use crate::logging::targets;

/// A source of asynchronous iterators.
///
/// Each call to [`make_async_iterator`](Self::make_async_iterator) starts a
/// fresh pass over the sequence. Pulls may fail with [`Self::Error`].
pub trait AsyncSequence {
    /// The element type.
    type Item;
    /// The failure type of a single pull.
    type Error: Display;
    /// The iterator type.
    type Iter: Stream<Item = std::result::Result<Self::Item, Self::Error>> + Send + 'static;

    /// Begin iterating.
    fn make_async_iterator(&self) -> Self::Iter;
}

/// An [`AsyncSequence`] backed by an iterator factory closure.
///
/// Created by [`from_fn`].
#[derive(Clone)]
pub struct FnSequence<F> {
    make: F,
}

/// Build an [`AsyncSequence`] from a closure that creates fallible streams.
pub fn from_fn<F, S, T, E>(make: F) -> FnSequence<F>
where
    F: Fn() -> S,
    S: Stream<Item = std::result::Result<T, E>> + Send + 'static,
    E: Display,
{
    FnSequence { make }
}

impl<F, S, T, E> AsyncSequence for FnSequence<F>
where
    F: Fn() -> S,
    S: Stream<Item = std::result::Result<T, E>> + Send + 'static,
    E: Display,
{
    type Item = T;
    type Error = E;
    type Iter = S;

    fn make_async_iterator(&self) -> S {
        (self.make)()
    }
}

type PullStream<T> = BoxStream<'static, std::result::Result<T, String>>;
type MakeIter<T> = Box<dyn FnOnce() -> PullStream<T> + Send>;

/// Iteration state of a bridged sequence.
enum IterState<T> {
    /// No pull has happened yet.
    Idle(MakeIter<T>),
    /// The iterator exists and has not ended.
    Active(PullStream<T>),
    /// The iterator ended or failed.
    Done,
}

enum Kind<T> {
    Never,
    Finished,
    Sequence(Mutex<IterState<T>>),
}

/// A type-erased, infallible asynchronous stream of values.
///
/// See the [module documentation](self) for its semantics.
pub struct SnapshotStream<T> {
    kind: Arc<Kind<T>>,
}

impl<T> Clone for SnapshotStream<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
        }
    }
}

impl<T> std::fmt::Debug for SnapshotStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match *self.kind {
            Kind::Never => "never",
            Kind::Finished => "finished",
            Kind::Sequence(_) => "sequence",
        };
        f.debug_struct("SnapshotStream").field("kind", &kind).finish()
    }
}

impl<T: Send + 'static> SnapshotStream<T> {
    /// A stream that never yields and never ends.
    pub fn never() -> Self {
        Self {
            kind: Arc::new(Kind::Never),
        }
    }

    /// A stream that ends immediately.
    pub fn finished() -> Self {
        Self {
            kind: Arc::new(Kind::Finished),
        }
    }

    /// Wrap an infallible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self::with_state(IterState::Active(stream.map(Ok).boxed()))
    }

    /// Bridge a fallible sequence.
    ///
    /// The sequence's iterator is created on the first call to
    /// [`next`](Self::next).
    pub fn from_sequence<S>(sequence: S) -> Self
    where
        S: AsyncSequence<Item = T> + Send + 'static,
    {
        let make: MakeIter<T> = Box::new(move || {
            sequence
                .make_async_iterator()
                .map(|pulled| pulled.map_err(|err| err.to_string()))
                .boxed()
        });
        Self::with_state(IterState::Idle(make))
    }

    fn with_state(state: IterState<T>) -> Self {
        Self {
            kind: Arc::new(Kind::Sequence(Mutex::new(state))),
        }
    }

    /// Pull the next value.
    ///
    /// Returns `None` once the underlying sequence has ended or failed, and
    /// on every call after that.
    pub async fn next(&self) -> Option<T> {
        let state = match &*self.kind {
            Kind::Never => return std::future::pending().await,
            Kind::Finished => return None,
            Kind::Sequence(state) => state,
        };

        let mut state = state.lock().await;

        if matches!(*state, IterState::Idle(_)) {
            if let IterState::Idle(make) = std::mem::replace(&mut *state, IterState::Done) {
                tracing::trace!(target: targets::SEQUENCE, "creating iterator");
                *state = IterState::Active(make());
            }
        }

        let IterState::Active(iter) = &mut *state else {
            return None;
        };

        match iter.next().await {
            Some(Ok(value)) => Some(value),
            Some(Err(err)) => {
                tracing::debug!(target: targets::SEQUENCE, error = %err, "pull failed, ending sequence");
                *state = IterState::Done;
                None
            }
            None => {
                tracing::trace!(target: targets::SEQUENCE, "sequence ended");
                *state = IterState::Done;
                None
            }
        }
    }

    /// Convert into a [`Stream`] that pulls through this bridge.
    pub fn into_stream(self) -> impl Stream<Item = T> + Send + 'static {
        stream::unfold(self, |this| async move {
            let value = this.next().await;
            value.map(|value| (value, this))
        })
    }
}

/// Extension methods for every [`AsyncSequence`].
pub trait AsyncSequenceExt: AsyncSequence {
    /// Bridge this sequence into a [`SnapshotStream`].
    fn erase_to_stream(self) -> SnapshotStream<Self::Item>
    where
        Self: Sized + Send + 'static,
        Self::Item: Send + 'static,
    {
        SnapshotStream::from_sequence(self)
    }
}

impl<S: AsyncSequence> AsyncSequenceExt for S {}

/// The producing half of a [`channel`].
#[derive(Debug)]
pub struct SnapshotSender<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for SnapshotSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> SnapshotSender<T> {
    /// Yield a value to the stream.
    ///
    /// Fails with [`ItemsError::StreamClosed`] if the stream was dropped.
    pub fn send(&self, value: T) -> Result<()> {
        self.tx.send(value).map_err(|_| ItemsError::StreamClosed)
    }

    /// Give up this sender.
    ///
    /// The stream ends once every sender has finished or been dropped.
    pub fn finish(self) {
        drop(self.tx);
    }

    /// Returns `true` if the stream was dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a stream fed by explicit sends.
///
/// The stream ends when every [`SnapshotSender`] has been dropped or
/// finished.
pub fn channel<T: Send + 'static>() -> (SnapshotSender<T>, SnapshotStream<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = stream::unfold(rx, |mut rx| async move {
        let value = rx.recv().await;
        value.map(|value| (value, rx))
    });
    (SnapshotSender { tx }, SnapshotStream::new(stream))
}
