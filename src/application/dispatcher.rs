use crate::domain::notification::{Notification, NotificationEvent};
use crate::domain::ports::{DeliveryClientRef, Notifier, StepObserver, SubscriptionStoreRef};
use crate::domain::resource::ResourceKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Counters describing what the dispatcher did with the events it was given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub enqueued: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Fans status-change events out to matching subscriptions.
///
/// `notify` never blocks: events go into a bounded queue and are dropped (and counted)
/// when it is full. A fixed pool of workers drains the queue, each event being taken
/// by exactly one worker. Delivery is best-effort: no retry, no ordering across
/// subscriptions, and one failed callback never affects the others.
pub struct NotificationDispatcher {
    sender: RwLock<Option<mpsc::Sender<NotificationEvent>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl NotificationDispatcher {
    /// Spawns `workers` delivery tasks sharing one queue of `capacity` events.
    ///
    /// Both values are clamped to at least 1.
    pub fn new(
        subscriptions: SubscriptionStoreRef,
        client: DeliveryClientRef,
        capacity: usize,
        workers: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        let handles = (0..workers.max(1))
            .map(|worker| {
                let rx = rx.clone();
                let subscriptions = subscriptions.clone();
                let client = client.clone();
                let counters = counters.clone();
                tokio::spawn(async move {
                    loop {
                        let event = rx.lock().await.recv().await;
                        let Some(event) = event else {
                            break;
                        };
                        deliver(&event, &subscriptions, &client, &counters).await;
                    }
                    debug!(worker, "dispatch worker stopped");
                })
            })
            .collect();

        Self {
            sender: RwLock::new(Some(tx)),
            workers: Mutex::new(handles),
            counters,
        }
    }

    /// Stops intake. Queued events are still delivered.
    pub fn close(&self) {
        if let Ok(mut sender) = self.sender.write() {
            sender.take();
        }
    }

    /// Closes intake and waits until every queued event has been processed.
    ///
    /// Concurrent callers all return only once the queue is drained.
    pub async fn shutdown(&self) {
        self.close();
        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "dispatch worker panicked");
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    fn drop_event(&self, event: &NotificationEvent, reason: &str) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            record_type = %event.record_kind,
            resource_id = %event.resource_id,
            event_type = %event.event_kind,
            reason,
            "dropping notification"
        );
    }
}

impl Notifier for NotificationDispatcher {
    fn enqueue(&self, event: NotificationEvent) {
        let sender = match self.sender.read() {
            Ok(sender) => sender.clone(),
            Err(_) => None,
        };
        let Some(sender) = sender else {
            self.drop_event(&event, "dispatcher closed");
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.drop_event(&event, "queue full");
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.drop_event(&event, "dispatcher closed");
            }
        }
    }
}

/// Forwards every transition step to a notifier as an `updated` event carrying the
/// status reached.
pub struct NotifyOnStep(pub Arc<dyn Notifier>);

impl StepObserver for NotifyOnStep {
    fn on_step(&self, kind: ResourceKind, resource_id: &str, status: &str) {
        self.0.enqueue(NotificationEvent::step(kind, resource_id, status));
    }
}

async fn deliver(
    event: &NotificationEvent,
    subscriptions: &SubscriptionStoreRef,
    client: &DeliveryClientRef,
    counters: &Counters,
) {
    let record_type = event.record_kind.as_str();
    let event_type = event.event_kind.as_str();
    let subs = match subscriptions
        .match_subscriptions(record_type, event_type)
        .await
    {
        Ok(subs) => subs,
        Err(e) => {
            warn!(record_type, event_type, error = %e, "subscription lookup failed");
            return;
        }
    };
    if subs.is_empty() {
        return;
    }

    let notification = Notification::for_event(event);
    for sub in subs {
        let uri = &sub.attributes.callback_uri;
        match client.deliver(uri, &notification).await {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(uri = %uri, notification_id = %notification.id, "notification delivered");
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(uri = %uri, subscription_id = %sub.meta.id, error = %e, "notification delivery failed");
            }
        }
    }
}
