use super::models::{Subscription, SubscriptionAttributes};
use super::notification::{Notification, NotificationEvent};
use super::resource::{Attributes, CompositeKey, KeyPrefix, Resource, ResourceKind};
use super::status::EventKind;
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Keyed storage for one resource kind.
#[async_trait]
pub trait ResourceStore<A: Attributes>: Send + Sync {
    /// Fails with `Conflict` if the key is taken.
    async fn create(&self, key: &CompositeKey, record: Resource<A>) -> Result<()>;
    /// Returns a copy, or `NotFound`.
    async fn get(&self, key: &CompositeKey) -> Result<Resource<A>>;
    /// Every record whose key starts with `prefix`, in no particular order.
    async fn list(&self, prefix: &KeyPrefix) -> Result<Vec<Resource<A>>>;
    /// Replaces an existing record; never creates.
    async fn update(&self, key: &CompositeKey, record: Resource<A>) -> Result<()>;
}

#[async_trait]
pub trait SubscriptionStore: ResourceStore<SubscriptionAttributes> {
    async fn delete(&self, key: &CompositeKey) -> Result<()>;
    /// Active subscriptions whose record and event types both match exactly.
    async fn match_subscriptions(&self, record_type: &str, event_type: &str)
    -> Result<Vec<Subscription>>;
}

pub type SubscriptionStoreRef = Arc<dyn SubscriptionStore>;

/// Writes one new status onto a resource.
#[async_trait]
pub trait StatusUpdater: Send + Sync {
    async fn apply(&self, status: &str) -> Result<()>;
}

/// Observes every successfully written transition step.
pub trait StepObserver: Send + Sync {
    fn on_step(&self, kind: ResourceKind, resource_id: &str, status: &str);
}

/// Observer that ignores every step.
pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn on_step(&self, _kind: ResourceKind, _resource_id: &str, _status: &str) {}
}

/// Adapts an async closure into a [`StatusUpdater`].
pub struct FnUpdater<F>(pub F);

#[async_trait]
impl<F, Fut> StatusUpdater for FnUpdater<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn apply(&self, status: &str) -> Result<()> {
        (self.0)(status.to_string()).await
    }
}

/// Non-blocking sink for status-change events.
pub trait Notifier: Send + Sync {
    fn enqueue(&self, event: NotificationEvent);

    fn notify(&self, record_kind: ResourceKind, resource_id: &str, event_kind: EventKind) {
        self.enqueue(NotificationEvent::new(record_kind, resource_id, event_kind));
    }
}

/// Performs one outbound delivery to a callback address.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn deliver(&self, callback_uri: &str, notification: &Notification) -> Result<()>;
}

pub type DeliveryClientRef = Arc<dyn DeliveryClient>;
