//! Core systems for Horizon Items.
//!
//! This crate provides the delivery plumbing that the `horizon-items` update
//! controller is built on:
//!
//! - **UI Context**: A single-threaded execution context that owns all view
//!   mutation
//! - **Push Delivery**: A demand-driven publisher/subscriber protocol with
//!   cancellation tokens
//! - **Subjects**: A concrete publisher for explicitly sent values
//! - **Pull Delivery**: A lazy, failure-absorbing bridge over asynchronous
//!   sequences
//!
//! # Push Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use horizon_items_core::{Completion, Demand, PublisherExt, Subject, Subscriber, Subscription};
//!
//! struct Sum(Cell<i32>);
//!
//! impl Subscriber<i32> for Sum {
//!     fn receive_subscription(&self, _: Rc<dyn Subscription>) {}
//!     fn receive(&self, input: i32) -> Demand {
//!         self.0.set(self.0.get() + input);
//!         Demand::None
//!     }
//!     fn receive_completion(&self, _: Completion) {}
//! }
//!
//! let subject = Subject::new();
//! let sum = Rc::new(Sum(Cell::new(0)));
//!
//! // `bind` drives the subscriber with unlimited demand until dropped.
//! let token = subject.bind(sum.clone());
//! subject.send(2);
//! subject.send(3);
//! drop(token);
//! subject.send(100);
//!
//! assert_eq!(sum.0.get(), 5);
//! ```
//!
//! # Pull Example
//!
//! ```
//! use futures_util::stream;
//! use horizon_items_core::{AsyncSequenceExt, UiContext, UiContextConfig, from_fn};
//!
//! let ctx = UiContext::new(UiContextConfig::default()).unwrap();
//!
//! // A sequence whose second pull fails: the bridge ends there.
//! let snapshots = from_fn(|| stream::iter(vec![Ok(1), Err("offline"), Ok(3)]))
//!     .erase_to_stream();
//!
//! let pulled = ctx.block_on(async move {
//!     let mut pulled = Vec::new();
//!     while let Some(value) = snapshots.next().await {
//!         pulled.push(value);
//!     }
//!     pulled
//! });
//!
//! assert_eq!(pulled, vec![1]);
//! ```

mod error;
pub mod logging;
pub mod publisher;
pub mod sequence;
pub mod subject;
pub mod ui_context;

pub use error::{ItemsError, Result, UiContextError};
pub use logging::UpdateSpan;
pub use publisher::{
    Cancellable, Completion, Demand, Publisher, PublisherExt, Subscriber, Subscription,
};
pub use sequence::{
    AsyncSequence, AsyncSequenceExt, FnSequence, SnapshotSender, SnapshotStream, channel, from_fn,
};
pub use subject::{Subject, SubscriberKey};
pub use ui_context::{TaskHandle, UiContext, UiContextConfig};
