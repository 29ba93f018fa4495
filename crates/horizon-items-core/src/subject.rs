//! A passthrough publisher.
//!
//! [`Subject`] is the concrete push producer of this crate: values passed to
//! [`Subject::send`] are delivered synchronously to every subscriber that
//! has outstanding demand. It is the push-side counterpart of
//! [`crate::sequence::SnapshotStream`].
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use horizon_items_core::publisher::{Completion, Demand, Subscriber, Subscription};
//! use horizon_items_core::subject::Subject;
//!
//! struct Collect(RefCell<Vec<i32>>);
//!
//! impl Subscriber<i32> for Collect {
//!     fn receive_subscription(&self, subscription: Rc<dyn Subscription>) {
//!         subscription.request(Demand::Unlimited);
//!     }
//!     fn receive(&self, input: i32) -> Demand {
//!         self.0.borrow_mut().push(input);
//!         Demand::None
//!     }
//!     fn receive_completion(&self, _: Completion) {}
//! }
//!
//! let subject = Subject::new();
//! let collect = Rc::new(Collect(RefCell::new(Vec::new())));
//! let _token = subject.subscribe_cancellable(collect.clone());
//!
//! subject.send(1);
//! subject.send(2);
//! assert_eq!(*collect.0.borrow(), vec![1, 2]);
//! ```

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;
use crate::publisher::{Cancellable, Completion, Demand, Publisher, Subscriber, Subscription};

new_key_type! {
    /// Identifies one subscriber attached to a [`Subject`].
    pub struct SubscriberKey;
}

/// Bookkeeping for one attached subscriber.
struct SubscriberEntry<T> {
    subscriber: Rc<dyn Subscriber<T>>,
    demand: Demand,
}

struct SubjectState<T> {
    subscribers: RefCell<SlotMap<SubscriberKey, SubscriberEntry<T>>>,
    finished: Cell<bool>,
}

/// A publisher that forwards explicitly sent values to its subscribers.
///
/// Cloning a `Subject` yields another handle to the same subscriber set.
pub struct Subject<T> {
    state: Rc<SubjectState<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Create a subject with no subscribers.
    pub fn new() -> Self {
        Self {
            state: Rc::new(SubjectState {
                subscribers: RefCell::new(SlotMap::with_key()),
                finished: Cell::new(false),
            }),
        }
    }

    /// Get the number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.subscribers.borrow().len()
    }

    /// Returns `true` once [`finish`](Self::finish) has been called.
    pub fn is_finished(&self) -> bool {
        self.state.finished.get()
    }

    /// Deliver `value` to every subscriber with outstanding demand.
    ///
    /// Subscribers without demand miss the value. Sending after
    /// [`finish`](Self::finish) does nothing.
    #[tracing::instrument(skip_all, target = "horizon_items_core::publisher", level = "trace")]
    pub fn send(&self, value: T) {
        if self.is_finished() {
            tracing::trace!(target: targets::PUBLISHER, "subject finished, dropping value");
            return;
        }

        // Reserve demand up front and release the borrow before delivering,
        // so subscribers may request, cancel or send re-entrantly.
        let recipients: Vec<(SubscriberKey, Rc<dyn Subscriber<T>>)> = {
            let mut subscribers = self.state.subscribers.borrow_mut();
            subscribers
                .iter_mut()
                .filter_map(|(key, entry)| {
                    entry
                        .demand
                        .take_one()
                        .then(|| (key, entry.subscriber.clone()))
                })
                .collect()
        };

        tracing::trace!(target: targets::PUBLISHER, recipients = recipients.len(), "sending value");

        for (key, subscriber) in recipients {
            let additional = subscriber.receive(value.clone());
            if let Some(entry) = self.state.subscribers.borrow_mut().get_mut(key) {
                entry.demand += additional;
            }
        }
    }

    /// Complete the subject, notifying and detaching every subscriber.
    pub fn finish(&self) {
        if self.state.finished.replace(true) {
            return;
        }

        let entries: Vec<_> = self
            .state
            .subscribers
            .borrow_mut()
            .drain()
            .map(|(_, entry)| entry.subscriber)
            .collect();

        tracing::debug!(target: targets::PUBLISHER, subscribers = entries.len(), "subject finished");

        for subscriber in entries {
            subscriber.receive_completion(Completion::Finished);
        }
    }

    /// Attach `subscriber` and return a token that detaches it on drop.
    pub fn subscribe_cancellable(&self, subscriber: Rc<dyn Subscriber<T>>) -> Cancellable {
        let subscription = self.attach(subscriber);
        Cancellable::new(move || subscription.cancel())
    }

    fn attach(&self, subscriber: Rc<dyn Subscriber<T>>) -> Rc<SubjectSubscription<T>> {
        if self.is_finished() {
            let subscription = Rc::new(SubjectSubscription {
                state: Weak::new(),
                key: SubscriberKey::default(),
            });
            subscriber.receive_subscription(subscription.clone());
            subscriber.receive_completion(Completion::Finished);
            return subscription;
        }

        let key = self.state.subscribers.borrow_mut().insert(SubscriberEntry {
            subscriber: subscriber.clone(),
            demand: Demand::None,
        });
        let subscription = Rc::new(SubjectSubscription {
            state: Rc::downgrade(&self.state),
            key,
        });

        tracing::trace!(target: targets::PUBLISHER, ?key, "subscriber attached");
        subscriber.receive_subscription(subscription.clone());
        subscription
    }
}

impl<T: Clone + 'static> Publisher for Subject<T> {
    type Output = T;
    type Failure = Infallible;

    fn subscribe(&self, subscriber: Rc<dyn Subscriber<T>>) {
        self.attach(subscriber);
    }
}

/// The subscription handed to subscribers of a [`Subject`].
///
/// Holds the subject weakly: a subscription outliving its subject is inert.
struct SubjectSubscription<T> {
    state: Weak<SubjectState<T>>,
    key: SubscriberKey,
}

impl<T> Subscription for SubjectSubscription<T> {
    fn request(&self, demand: Demand) {
        if let Some(state) = self.state.upgrade() {
            if let Some(entry) = state.subscribers.borrow_mut().get_mut(self.key) {
                entry.demand += demand;
            }
        }
    }

    fn cancel(&self) {
        if let Some(state) = self.state.upgrade() {
            if state.subscribers.borrow_mut().remove(self.key).is_some() {
                tracing::trace!(target: targets::PUBLISHER, key = ?self.key, "subscriber detached");
            }
        }
    }
}
