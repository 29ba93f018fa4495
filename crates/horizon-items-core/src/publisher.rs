//! Push-based delivery protocol.
//!
//! A [`Publisher`] delivers values to registered [`Subscriber`]s on its own
//! schedule, governed by a demand protocol: a subscriber receives a
//! [`Subscription`] first, requests some [`Demand`] through it, and the
//! publisher never delivers more values than were requested.
//!
//! Snapshot producers never fail; their failure type is [`Infallible`], so
//! the failure branch of [`Completion`] is statically unreachable.
//!
//! Everything here is single-threaded: publishers and subscribers are held
//! in `Rc` and delivery is a plain synchronous call on the publishing
//! thread, which must be the UI context.

use std::cell::RefCell;
use std::convert::Infallible;
use std::ops::{Add, AddAssign};
use std::rc::Rc;

use crate::logging::targets;

/// An amount of values a subscriber is willing to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Demand {
    /// No further values.
    #[default]
    None,
    /// At most this many further values. Always non-zero; use
    /// [`Demand::max`] to construct.
    Max(usize),
    /// Any number of values.
    Unlimited,
}

impl Demand {
    /// Create a bounded demand. `Demand::max(0)` is [`Demand::None`].
    pub fn max(count: usize) -> Self {
        if count == 0 { Self::None } else { Self::Max(count) }
    }

    /// Returns `true` if no values may be delivered.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Consume one unit of demand.
    ///
    /// Returns `false` (and leaves the demand untouched) if there was none.
    pub fn take_one(&mut self) -> bool {
        match *self {
            Self::None => false,
            Self::Unlimited => true,
            Self::Max(n) => {
                *self = Self::max(n - 1);
                true
            }
        }
    }
}

impl Add for Demand {
    type Output = Demand;

    fn add(self, rhs: Demand) -> Demand {
        match (self, rhs) {
            (Self::Unlimited, _) | (_, Self::Unlimited) => Self::Unlimited,
            (Self::None, other) | (other, Self::None) => other,
            (Self::Max(a), Self::Max(b)) => Self::Max(a.saturating_add(b)),
        }
    }
}

impl AddAssign for Demand {
    fn add_assign(&mut self, rhs: Demand) {
        *self = *self + rhs;
    }
}

/// How a publisher terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<E = Infallible> {
    /// The publisher finished normally.
    Finished,
    /// The publisher failed.
    Failure(E),
}

/// The link between one publisher and one subscriber.
pub trait Subscription {
    /// Ask for more values.
    fn request(&self, demand: Demand);

    /// Stop delivery. Idempotent.
    fn cancel(&self);
}

/// A consumer of pushed values.
///
/// Methods take `&self`: subscribers are shared through `Rc` and keep any
/// mutable state behind interior mutability.
pub trait Subscriber<Input, Failure = Infallible> {
    /// Called once, before any value, with the subscription to request
    /// demand through.
    fn receive_subscription(&self, subscription: Rc<dyn Subscription>);

    /// Called for each delivered value. Returns additional demand.
    fn receive(&self, input: Input) -> Demand;

    /// Called once when the publisher terminates.
    fn receive_completion(&self, completion: Completion<Failure>);
}

/// A producer of pushed values.
pub trait Publisher {
    /// The value type.
    type Output;
    /// The failure type.
    type Failure;

    /// Attach a subscriber.
    ///
    /// The subscriber receives its subscription synchronously, before this
    /// returns.
    fn subscribe(&self, subscriber: Rc<dyn Subscriber<Self::Output, Self::Failure>>);
}

/// A token that cancels a subscription when dropped.
///
/// Keep it alive for as long as delivery should continue.
#[must_use = "dropping a Cancellable cancels its subscription immediately"]
pub struct Cancellable {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Cancellable {
    /// Create a token running `cancel` when cancelled or dropped.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel now.
    pub fn cancel(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Cancellable {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Cancellable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancellable")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Convenience methods for every [`Publisher`].
pub trait PublisherExt: Publisher {
    /// Drive `subscriber` from this publisher with unlimited demand.
    ///
    /// The subscriber still receives the subscription (so it may cancel it
    /// or add demand of its own), but the demand it returns per value is
    /// ignored. Delivery stops when the returned [`Cancellable`] is dropped.
    fn bind(&self, subscriber: Rc<dyn Subscriber<Self::Output, Self::Failure>>) -> Cancellable
    where
        Self::Output: 'static,
        Self::Failure: 'static,
    {
        let slot: Rc<RefCell<Option<Rc<dyn Subscription>>>> = Rc::new(RefCell::new(None));
        let forwarder = Rc::new(BindForwarder {
            target: subscriber,
            subscription: slot.clone(),
        });
        self.subscribe(forwarder);

        Cancellable::new(move || {
            if let Some(subscription) = slot.borrow_mut().take() {
                subscription.cancel();
            }
        })
    }
}

impl<P: Publisher + ?Sized> PublisherExt for P {}

/// Subscriber installed by [`PublisherExt::bind`].
struct BindForwarder<Input, Failure> {
    target: Rc<dyn Subscriber<Input, Failure>>,
    subscription: Rc<RefCell<Option<Rc<dyn Subscription>>>>,
}

impl<Input, Failure> Subscriber<Input, Failure> for BindForwarder<Input, Failure> {
    fn receive_subscription(&self, subscription: Rc<dyn Subscription>) {
        *self.subscription.borrow_mut() = Some(subscription.clone());
        self.target.receive_subscription(subscription.clone());
        subscription.request(Demand::Unlimited);
    }

    fn receive(&self, input: Input) -> Demand {
        let _ = self.target.receive(input);
        Demand::None
    }

    fn receive_completion(&self, completion: Completion<Failure>) {
        tracing::trace!(target: targets::PUBLISHER, "bound publisher completed");
        self.subscription.borrow_mut().take();
        self.target.receive_completion(completion);
    }
}
