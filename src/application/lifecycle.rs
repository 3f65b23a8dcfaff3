use crate::domain::ports::{ResourceStore, StatusUpdater, StepObserver};
use crate::domain::resource::{Attributes, CompositeKey, HasStatus, ResourceKind};
use crate::domain::status::StatusChain;
use crate::error::{Result, SimError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How a transition ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Every step was written; the resource rests at `status`.
    Completed { status: String },
    /// Writing `failed_status` failed; the resource froze at `last_status`.
    Abandoned {
        last_status: String,
        failed_status: String,
    },
}

/// Completion signal of one background transition.
///
/// Dropping the handle does not stop the transition.
pub struct TransitionHandle {
    task: JoinHandle<TransitionOutcome>,
}

impl TransitionHandle {
    pub async fn wait(self) -> Result<TransitionOutcome> {
        self.task
            .await
            .map_err(|e| SimError::Internal(format!("transition task failed: {e}")))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

type ActiveSet = Arc<Mutex<HashSet<(ResourceKind, String)>>>;

/// Releases a resource's transition slot when the task ends, even on panic.
struct ActiveSlot {
    active: ActiveSet,
    entry: (ResourceKind, String),
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.entry);
        }
    }
}

/// Advances resources through their status chains in the background.
///
/// Each started transition is one independent tokio task that sleeps the configured
/// step delay before every step. Transitions cannot be cancelled. At most one
/// transition runs per resource at a time.
#[derive(Clone)]
pub struct TransitionDriver {
    step_delay: Duration,
    active: ActiveSet,
}

impl TransitionDriver {
    pub fn new(step_delay: Duration) -> Self {
        Self {
            step_delay,
            active: Arc::default(),
        }
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Number of transitions currently in flight.
    pub fn active_count(&self) -> usize {
        self.active.lock().map(|active| active.len()).unwrap_or(0)
    }

    /// Starts advancing the resource at `key` from `chain[0]` to the end of `chain`.
    ///
    /// The resource must already carry `chain[0]`. Fails with `TransitionActive` if a
    /// transition for the same resource is still running; every other failure happens
    /// in the background and is only logged.
    pub fn start_transition(
        &self,
        kind: ResourceKind,
        key: &CompositeKey,
        chain: StatusChain,
        updater: Arc<dyn StatusUpdater>,
        on_step: Arc<dyn StepObserver>,
    ) -> Result<TransitionHandle> {
        let entry = (kind, key.to_string());
        {
            let mut active = self
                .active
                .lock()
                .map_err(|_| SimError::Internal("transition registry poisoned".to_string()))?;
            if !active.insert(entry.clone()) {
                return Err(SimError::TransitionActive {
                    kind,
                    key: key.to_string(),
                });
            }
        }
        let slot = ActiveSlot {
            active: self.active.clone(),
            entry,
        };

        let step_delay = self.step_delay;
        let resource_id = key.id().to_string();
        let task = tokio::spawn(async move {
            let _slot = slot;
            let mut last_status = chain.initial();
            for status in chain.steps().skip(1) {
                tokio::time::sleep(step_delay).await;
                if let Err(e) = updater.apply(status).await {
                    warn!(
                        kind = %kind,
                        id = %resource_id,
                        status,
                        error = %e,
                        "status transition abandoned"
                    );
                    return TransitionOutcome::Abandoned {
                        last_status: last_status.to_string(),
                        failed_status: status.to_string(),
                    };
                }
                debug!(kind = %kind, id = %resource_id, status, "status advanced");
                on_step.on_step(kind, &resource_id, status);
                last_status = status;
            }
            TransitionOutcome::Completed {
                status: last_status.to_string(),
            }
        });

        Ok(TransitionHandle { task })
    }
}

/// Status updater bound to one stored resource.
///
/// Reads the current record, writes the new status, stamps the modification time
/// and persists it through the store's `update`.
pub struct RecordStatusUpdater<A: Attributes> {
    store: Arc<dyn ResourceStore<A>>,
    key: CompositeKey,
    _attrs: PhantomData<fn() -> A>,
}

impl<A: Attributes> RecordStatusUpdater<A> {
    pub fn new(store: Arc<dyn ResourceStore<A>>, key: CompositeKey) -> Self {
        Self {
            store,
            key,
            _attrs: PhantomData,
        }
    }
}

#[async_trait]
impl<A: Attributes + HasStatus> StatusUpdater for RecordStatusUpdater<A> {
    async fn apply(&self, status: &str) -> Result<()> {
        let mut record = self.store.get(&self.key).await?;
        record.attributes.set_status(status);
        record.meta.touch();
        self.store.update(&self.key, record).await
    }
}
