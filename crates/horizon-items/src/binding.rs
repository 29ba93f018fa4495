//! Attaching producers to views.
//!
//! [`ItemsViewExt`] gives every `Rc<V: ItemsView>` entry points that wire a
//! controller to the view and feed it from a producer:
//!
//! | Producer | Sectioned input | Flat input |
//! |---|---|---|
//! | Push ([`Publisher`](horizon_items_core::Publisher)) | [`sections_subscriber`](ItemsViewExt::sections_subscriber) | [`items_subscriber`](ItemsViewExt::items_subscriber) |
//! | Pull ([`SnapshotStream`]) | [`sections_stream`](ItemsViewExt::sections_stream) | [`items_stream`](ItemsViewExt::items_stream) |
//! | Pull ([`AsyncSequence`]) | [`sections_sequence`](ItemsViewExt::sections_sequence) | [`items_sequence`](ItemsViewExt::items_sequence) |
//!
//! Sectioned input is anything convertible into a [`Snapshot`]: a
//! `Vec<Section<T>>`, a nested `Vec<Vec<T>>` or a snapshot itself. Flat input
//! is a `Vec<T>` shown as one implicit section.
//!
//! Every entry point makes the controller the view's data source right away,
//! and re-attaches it before the first value if something detached it in
//! between. The view is only ever held weakly: once it is dropped, values are
//! drained without effect.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use horizon_items::binding::ItemsViewExt;
//! use horizon_items::controller::ItemsController;
//! use horizon_items::diff::Changeset;
//! use horizon_items::view::{ItemsDataSource, ItemsView};
//! use horizon_items_core::{PublisherExt, Subject};
//!
//! #[derive(Default)]
//! struct ListView {
//!     source: RefCell<Option<Rc<dyn ItemsDataSource>>>,
//! }
//!
//! impl ItemsView for ListView {
//!     fn data_source_attached(&self) -> bool { self.source.borrow().is_some() }
//!     fn attach_data_source(&self, source: Rc<dyn ItemsDataSource>) {
//!         *self.source.borrow_mut() = Some(source);
//!     }
//!     fn reload_data(&self) {}
//!     fn perform_batch_updates(&self, _: &Changeset) {}
//! }
//!
//! let view = Rc::new(ListView::default());
//! let controller = ItemsController::new("row", |label: &mut String, _, name: &String| {
//!     label.clone_from(name);
//! });
//!
//! let names = Subject::<Vec<String>>::new();
//! let _token = names.bind(view.items_subscriber(controller.clone()));
//!
//! names.send(vec!["ada".to_string(), "grace".to_string()]);
//! assert_eq!(controller.number_of_items(0), 2);
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use horizon_items_core::logging::targets;
use horizon_items_core::{
    AsyncSequence, AsyncSequenceExt, Completion, Demand, SnapshotStream, Subscriber, Subscription,
    TaskHandle, UiContext,
};

use crate::controller::ItemsController;
use crate::model::Snapshot;
use crate::view::ItemsView;

/// Make `controller` drive `view` and serve as its data source.
fn attach<T, V>(view: &Rc<V>, controller: &Rc<ItemsController<T>>)
where
    T: PartialEq + 'static,
    V: ItemsView + 'static,
{
    controller.set_view(view);
    view.attach_data_source(controller.clone());
    tracing::debug!(target: targets::BINDING, "controller attached to view");
}

/// Re-attach `controller` if the view lost its data source.
fn ensure_attached<T>(view: &dyn ItemsView, controller: &Rc<ItemsController<T>>)
where
    T: PartialEq + 'static,
{
    if !view.data_source_attached() {
        tracing::debug!(target: targets::BINDING, "view lost its data source, re-attaching");
        view.attach_data_source(controller.clone());
    }
}

/// A push subscriber that forwards every received value to a controller.
///
/// Requests unlimited demand. Values arriving after the view was dropped are
/// discarded and answered with [`Demand::None`]. Completion is ignored: the
/// view keeps showing the last snapshot.
///
/// A subscriber serves one subscription; any further subscription it is
/// handed is cancelled immediately.
pub struct ItemsSubscriber<T, In> {
    controller: Rc<ItemsController<T>>,
    view: Weak<dyn ItemsView>,
    convert: fn(In) -> Snapshot<T>,
    subscription: RefCell<Option<Rc<dyn Subscription>>>,
}

impl<T, In> ItemsSubscriber<T, In>
where
    T: PartialEq + 'static,
{
    fn new<V: ItemsView + 'static>(
        view: &Rc<V>,
        controller: Rc<ItemsController<T>>,
        convert: fn(In) -> Snapshot<T>,
    ) -> Rc<Self> {
        attach(view, &controller);
        let view: Weak<V> = Rc::downgrade(view);
        let view: Weak<dyn ItemsView> = view;
        Rc::new(Self {
            controller,
            view,
            convert,
            subscription: RefCell::new(None),
        })
    }

    /// Returns the controller values are forwarded to.
    pub fn controller(&self) -> &Rc<ItemsController<T>> {
        &self.controller
    }

    /// Returns `true` while a subscription is held.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.borrow().is_some()
    }
}

impl<T, In> Subscriber<In> for ItemsSubscriber<T, In>
where
    T: PartialEq + 'static,
{
    fn receive_subscription(&self, subscription: Rc<dyn Subscription>) {
        if self.is_subscribed() {
            tracing::warn!(target: targets::BINDING, "already subscribed, cancelling new subscription");
            subscription.cancel();
            return;
        }
        *self.subscription.borrow_mut() = Some(subscription.clone());
        subscription.request(Demand::Unlimited);
    }

    fn receive(&self, input: In) -> Demand {
        let Some(view) = self.view.upgrade() else {
            tracing::trace!(target: targets::BINDING, "view released, dropping snapshot");
            return Demand::None;
        };

        ensure_attached(&*view, &self.controller);
        // The controller upgrades its own weak handle; don't keep the view
        // alive across the update.
        drop(view);

        self.controller.update_collection((self.convert)(input));
        Demand::Unlimited
    }

    fn receive_completion(&self, _completion: Completion) {
        tracing::trace!(target: targets::BINDING, "producer completed");
        self.subscription.borrow_mut().take();
    }
}

/// Consume `stream` on `ctx`, forwarding every value to `controller`.
fn spawn_pull<T, In, V>(
    view: &Rc<V>,
    controller: Rc<ItemsController<T>>,
    stream: SnapshotStream<In>,
    convert: fn(In) -> Snapshot<T>,
    ctx: &UiContext,
) -> TaskHandle
where
    T: PartialEq + 'static,
    In: Send + 'static,
    V: ItemsView + 'static,
{
    attach(view, &controller);
    let view: Weak<V> = Rc::downgrade(view);
    let view: Weak<dyn ItemsView> = view;

    ctx.spawn_local(async move {
        match view.upgrade() {
            Some(view) => ensure_attached(&*view, &controller),
            None => {
                tracing::trace!(target: targets::BINDING, "view released before consumption started");
                return;
            }
        }

        let mut delivered = 0u64;
        while let Some(value) = stream.next().await {
            controller.update_collection(convert(value));
            delivered += 1;
        }

        tracing::debug!(target: targets::BINDING, delivered, "snapshot stream ended");
    })
}

/// Producer entry points for shared views.
pub trait ItemsViewExt {
    /// Create a push subscriber for sectioned snapshots.
    fn sections_subscriber<T, In>(
        &self,
        controller: Rc<ItemsController<T>>,
    ) -> Rc<ItemsSubscriber<T, In>>
    where
        T: PartialEq + 'static,
        In: Into<Snapshot<T>>;

    /// Create a push subscriber for flat item lists.
    fn items_subscriber<T>(
        &self,
        controller: Rc<ItemsController<T>>,
    ) -> Rc<ItemsSubscriber<T, Vec<T>>>
    where
        T: PartialEq + 'static;

    /// Consume a stream of sectioned snapshots on `ctx`.
    fn sections_stream<T, In>(
        &self,
        controller: Rc<ItemsController<T>>,
        stream: SnapshotStream<In>,
        ctx: &UiContext,
    ) -> TaskHandle
    where
        T: PartialEq + 'static,
        In: Into<Snapshot<T>> + Send + 'static;

    /// Consume a stream of flat item lists on `ctx`.
    fn items_stream<T>(
        &self,
        controller: Rc<ItemsController<T>>,
        stream: SnapshotStream<Vec<T>>,
        ctx: &UiContext,
    ) -> TaskHandle
    where
        T: PartialEq + Send + 'static;

    /// Consume any sequence of sectioned snapshots on `ctx`.
    ///
    /// A failing pull ends consumption.
    fn sections_sequence<T, S>(
        &self,
        controller: Rc<ItemsController<T>>,
        sequence: S,
        ctx: &UiContext,
    ) -> TaskHandle
    where
        T: PartialEq + 'static,
        S: AsyncSequence + Send + 'static,
        S::Item: Into<Snapshot<T>> + Send + 'static;

    /// Consume any sequence of flat item lists on `ctx`.
    ///
    /// A failing pull ends consumption.
    fn items_sequence<T, S>(
        &self,
        controller: Rc<ItemsController<T>>,
        sequence: S,
        ctx: &UiContext,
    ) -> TaskHandle
    where
        T: PartialEq + Send + 'static,
        S: AsyncSequence<Item = Vec<T>> + Send + 'static;
}

impl<V: ItemsView + 'static> ItemsViewExt for Rc<V> {
    fn sections_subscriber<T, In>(
        &self,
        controller: Rc<ItemsController<T>>,
    ) -> Rc<ItemsSubscriber<T, In>>
    where
        T: PartialEq + 'static,
        In: Into<Snapshot<T>>,
    {
        ItemsSubscriber::new(self, controller, Into::into)
    }

    fn items_subscriber<T>(
        &self,
        controller: Rc<ItemsController<T>>,
    ) -> Rc<ItemsSubscriber<T, Vec<T>>>
    where
        T: PartialEq + 'static,
    {
        ItemsSubscriber::new(self, controller, Snapshot::items)
    }

    fn sections_stream<T, In>(
        &self,
        controller: Rc<ItemsController<T>>,
        stream: SnapshotStream<In>,
        ctx: &UiContext,
    ) -> TaskHandle
    where
        T: PartialEq + 'static,
        In: Into<Snapshot<T>> + Send + 'static,
    {
        spawn_pull(self, controller, stream, Into::into, ctx)
    }

    fn items_stream<T>(
        &self,
        controller: Rc<ItemsController<T>>,
        stream: SnapshotStream<Vec<T>>,
        ctx: &UiContext,
    ) -> TaskHandle
    where
        T: PartialEq + Send + 'static,
    {
        spawn_pull(self, controller, stream, Snapshot::items, ctx)
    }

    fn sections_sequence<T, S>(
        &self,
        controller: Rc<ItemsController<T>>,
        sequence: S,
        ctx: &UiContext,
    ) -> TaskHandle
    where
        T: PartialEq + 'static,
        S: AsyncSequence + Send + 'static,
        S::Item: Into<Snapshot<T>> + Send + 'static,
    {
        self.sections_stream(controller, sequence.erase_to_stream(), ctx)
    }

    fn items_sequence<T, S>(
        &self,
        controller: Rc<ItemsController<T>>,
        sequence: S,
        ctx: &UiContext,
    ) -> TaskHandle
    where
        T: PartialEq + Send + 'static,
        S: AsyncSequence<Item = Vec<T>> + Send + 'static,
    {
        self.items_stream(controller, sequence.erase_to_stream(), ctx)
    }
}

static_assertions::assert_not_impl_any!(ItemsSubscriber<u32, Vec<u32>>: Send, Sync);
