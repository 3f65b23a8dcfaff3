use super::dispatcher::{DispatchStats, NotificationDispatcher, NotifyOnStep};
use super::lifecycle::{RecordStatusUpdater, TransitionDriver, TransitionHandle, TransitionOutcome};
use crate::config::SimulatorConfig;
use crate::domain::models::*;
use crate::domain::ports::{DeliveryClientRef, Notifier, ResourceStore, StepObserver};
use crate::domain::resource::{CompositeKey, HasStatus, KeyPrefix, Resource};
use crate::domain::status::{EventKind, StatusChain};
use crate::error::{Result, SimError};
use crate::infrastructure::in_memory::{InMemoryRepository, Stored};
use crate::infrastructure::webhook::HttpDeliveryClient;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::warn;
use uuid::Uuid;

/// Client-supplied part of a new resource. A missing or empty id is generated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de> + Default"))]
pub struct NewResource<A> {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub organisation_id: Option<String>,
    #[serde(default)]
    pub attributes: A,
}

impl<A> NewResource<A> {
    pub fn with_id(id: impl Into<String>, attributes: A) -> Self {
        Self {
            id: Some(id.into()),
            organisation_id: None,
            attributes,
        }
    }
}

/// Fields of a subscription that a patch may change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubscriptionPatch {
    #[serde(default)]
    pub callback_uri: Option<String>,
    #[serde(default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Every stored resource, grouped by kind and sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub payments: Vec<Payment>,
    pub payment_submissions: Vec<PaymentSubmission>,
    pub payment_admissions: Vec<PaymentAdmission>,
    pub admission_tasks: Vec<AdmissionTask>,
    pub return_payments: Vec<ReturnPayment>,
    pub return_submissions: Vec<ReturnSubmission>,
    pub recalls: Vec<Recall>,
    pub recall_submissions: Vec<RecallSubmission>,
    pub recall_decisions: Vec<RecallDecision>,
    pub recall_decision_submissions: Vec<RecallDecisionSubmission>,
    pub reversals: Vec<Reversal>,
    pub reversal_submissions: Vec<ReversalSubmission>,
    pub subscriptions: Vec<Subscription>,
}

/// The payments platform simulator.
///
/// Wires the repository, the transition driver and the notification dispatcher
/// together the way the request-handling layer uses them: resources with a status
/// chain start advancing as soon as they are created, and every creation and every
/// transition step is forwarded to the dispatcher.
///
/// Must be created inside a tokio runtime.
pub struct Simulator {
    repo: Arc<InMemoryRepository>,
    driver: TransitionDriver,
    dispatcher: Arc<NotificationDispatcher>,
    on_step: Arc<dyn StepObserver>,
    transitions: Mutex<Vec<TransitionHandle>>,
}

impl Simulator {
    pub fn new(config: &SimulatorConfig, client: DeliveryClientRef) -> Self {
        Self::with_repository(Arc::new(InMemoryRepository::new()), config, client)
    }

    /// Builds a simulator delivering notifications over HTTP.
    pub fn with_http_delivery(config: &SimulatorConfig) -> Result<Self> {
        let client = HttpDeliveryClient::new(config.delivery_timeout)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn with_repository(
        repo: Arc<InMemoryRepository>,
        config: &SimulatorConfig,
        client: DeliveryClientRef,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            repo.clone(),
            client,
            config.queue_capacity,
            config.workers,
        ));
        let on_step = Arc::new(NotifyOnStep(dispatcher.clone()));
        Self {
            repo,
            driver: TransitionDriver::new(config.step_delay),
            dispatcher,
            on_step,
            transitions: Mutex::new(Vec::new()),
        }
    }

    pub fn repository(&self) -> &Arc<InMemoryRepository> {
        &self.repo
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Number of transitions still running.
    pub fn outstanding_transitions(&self) -> Result<usize> {
        let mut transitions = self.lock_transitions()?;
        transitions.retain(|handle| !handle.is_finished());
        Ok(transitions.len())
    }

    // --- Payments ---

    pub async fn create_payment(&self, new: NewResource<PaymentAttributes>) -> Result<Payment> {
        self.insert(None, build(new)).await
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetails> {
        let key = CompositeKey::root(payment_id)?;
        let payment = self.repo.get::<PaymentAttributes>(&key).await?;
        let prefix = key.prefix();
        let relationships = PaymentRelationships {
            payment_submissions: self.ids::<PaymentSubmissionAttributes>(&prefix).await?,
            payment_admissions: self.ids::<PaymentAdmissionAttributes>(&prefix).await?,
            payment_returns: self.ids::<ReturnPaymentAttributes>(&prefix).await?,
            payment_recalls: self.ids::<RecallAttributes>(&prefix).await?,
            payment_reversals: self.ids::<ReversalAttributes>(&prefix).await?,
        };
        Ok(PaymentDetails {
            payment,
            relationships: (!relationships.is_empty()).then_some(relationships),
        })
    }

    pub async fn list_payments(&self) -> Result<Vec<Payment>> {
        self.repo.list(&KeyPrefix::all()).await
    }

    // --- Payment submissions and admissions ---

    pub async fn create_payment_submission(
        &self,
        payment_id: &str,
        new: NewResource<PaymentSubmissionAttributes>,
    ) -> Result<PaymentSubmission> {
        let parent = self.existing::<PaymentAttributes>(&[payment_id]).await?;
        let mut record = build(new);
        record.attributes.submission_date = today();
        self.insert_tracked(&parent, record, StatusChain::payment_submission())
            .await
    }

    pub async fn get_payment_submission(
        &self,
        payment_id: &str,
        submission_id: &str,
    ) -> Result<PaymentSubmission> {
        self.fetch(&[payment_id, submission_id]).await
    }

    pub async fn create_payment_admission(
        &self,
        payment_id: &str,
        new: NewResource<PaymentAdmissionAttributes>,
    ) -> Result<PaymentAdmission> {
        let parent = self.existing::<PaymentAttributes>(&[payment_id]).await?;
        let mut record = build(new);
        record.attributes.admission_date = today();
        self.insert_tracked(&parent, record, StatusChain::admission())
            .await
    }

    pub async fn get_payment_admission(
        &self,
        payment_id: &str,
        admission_id: &str,
    ) -> Result<PaymentAdmission> {
        self.fetch(&[payment_id, admission_id]).await
    }

    /// Applies the non-empty fields of `patch`, creating the task on first access.
    pub async fn patch_admission_task(
        &self,
        payment_id: &str,
        admission_id: &str,
        task_id: &str,
        patch: AdmissionTaskAttributes,
    ) -> Result<AdmissionTask> {
        let admission = self
            .existing::<PaymentAdmissionAttributes>(&[payment_id, admission_id])
            .await?;
        let key = admission.child(task_id)?;

        let mut task = match self.repo.get::<AdmissionTaskAttributes>(&key).await {
            Ok(task) => task,
            Err(SimError::NotFound { .. }) => {
                let task = AdmissionTask::new(task_id, "", AdmissionTaskAttributes::default());
                match self.repo.create(&key, task.clone()).await {
                    Ok(()) => task,
                    // lost a race against another first access
                    Err(SimError::Conflict { .. }) => self.repo.get(&key).await?,
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        if !patch.status.is_empty() {
            task.attributes.status = patch.status;
        }
        if !patch.assignee.is_empty() {
            task.attributes.assignee = patch.assignee;
        }
        if !patch.name.is_empty() {
            task.attributes.name = patch.name;
        }
        task.meta.touch();
        self.repo.update(&key, task.clone()).await?;
        Ok(task)
    }

    // --- Returns ---

    pub async fn create_return(
        &self,
        payment_id: &str,
        new: NewResource<ReturnPaymentAttributes>,
    ) -> Result<ReturnPayment> {
        let parent = self.existing::<PaymentAttributes>(&[payment_id]).await?;
        self.insert(Some(&parent), build(new)).await
    }

    pub async fn get_return(&self, payment_id: &str, return_id: &str) -> Result<ReturnPayment> {
        self.fetch(&[payment_id, return_id]).await
    }

    pub async fn list_returns(&self, payment_id: &str) -> Result<Vec<ReturnPayment>> {
        self.children(&[payment_id]).await
    }

    pub async fn create_return_submission(
        &self,
        payment_id: &str,
        return_id: &str,
        new: NewResource<ReturnSubmissionAttributes>,
    ) -> Result<ReturnSubmission> {
        let parent = self
            .existing::<ReturnPaymentAttributes>(&[payment_id, return_id])
            .await?;
        let mut record = build(new);
        record.attributes.0.submission_date = today();
        self.insert_tracked(&parent, record, StatusChain::simple_submission())
            .await
    }

    pub async fn get_return_submission(
        &self,
        payment_id: &str,
        return_id: &str,
        submission_id: &str,
    ) -> Result<ReturnSubmission> {
        self.fetch(&[payment_id, return_id, submission_id]).await
    }

    // --- Recalls ---

    pub async fn create_recall(
        &self,
        payment_id: &str,
        new: NewResource<RecallAttributes>,
    ) -> Result<Recall> {
        let parent = self.existing::<PaymentAttributes>(&[payment_id]).await?;
        self.insert(Some(&parent), build(new)).await
    }

    pub async fn get_recall(&self, payment_id: &str, recall_id: &str) -> Result<Recall> {
        self.fetch(&[payment_id, recall_id]).await
    }

    pub async fn list_recalls(&self, payment_id: &str) -> Result<Vec<Recall>> {
        self.children(&[payment_id]).await
    }

    pub async fn create_recall_submission(
        &self,
        payment_id: &str,
        recall_id: &str,
        new: NewResource<RecallSubmissionAttributes>,
    ) -> Result<RecallSubmission> {
        let parent = self
            .existing::<RecallAttributes>(&[payment_id, recall_id])
            .await?;
        let mut record = build(new);
        record.attributes.0.submission_date = today();
        self.insert_tracked(&parent, record, StatusChain::simple_submission())
            .await
    }

    pub async fn get_recall_submission(
        &self,
        payment_id: &str,
        recall_id: &str,
        submission_id: &str,
    ) -> Result<RecallSubmission> {
        self.fetch(&[payment_id, recall_id, submission_id]).await
    }

    pub async fn create_recall_decision(
        &self,
        payment_id: &str,
        recall_id: &str,
        new: NewResource<RecallDecisionAttributes>,
    ) -> Result<RecallDecision> {
        let parent = self
            .existing::<RecallAttributes>(&[payment_id, recall_id])
            .await?;
        self.insert(Some(&parent), build(new)).await
    }

    pub async fn get_recall_decision(
        &self,
        payment_id: &str,
        recall_id: &str,
        decision_id: &str,
    ) -> Result<RecallDecision> {
        self.fetch(&[payment_id, recall_id, decision_id]).await
    }

    pub async fn list_recall_decisions(
        &self,
        payment_id: &str,
        recall_id: &str,
    ) -> Result<Vec<RecallDecision>> {
        self.children(&[payment_id, recall_id]).await
    }

    pub async fn create_recall_decision_submission(
        &self,
        payment_id: &str,
        recall_id: &str,
        decision_id: &str,
        new: NewResource<RecallDecisionSubmissionAttributes>,
    ) -> Result<RecallDecisionSubmission> {
        let parent = self
            .existing::<RecallDecisionAttributes>(&[payment_id, recall_id, decision_id])
            .await?;
        let mut record = build(new);
        record.attributes.0.submission_date = today();
        self.insert_tracked(&parent, record, StatusChain::simple_submission())
            .await
    }

    pub async fn get_recall_decision_submission(
        &self,
        payment_id: &str,
        recall_id: &str,
        decision_id: &str,
        submission_id: &str,
    ) -> Result<RecallDecisionSubmission> {
        self.fetch(&[payment_id, recall_id, decision_id, submission_id])
            .await
    }

    // --- Reversals ---

    pub async fn create_reversal(
        &self,
        payment_id: &str,
        new: NewResource<ReversalAttributes>,
    ) -> Result<Reversal> {
        let parent = self.existing::<PaymentAttributes>(&[payment_id]).await?;
        self.insert(Some(&parent), build(new)).await
    }

    pub async fn get_reversal(&self, payment_id: &str, reversal_id: &str) -> Result<Reversal> {
        self.fetch(&[payment_id, reversal_id]).await
    }

    pub async fn list_reversals(&self, payment_id: &str) -> Result<Vec<Reversal>> {
        self.children(&[payment_id]).await
    }

    pub async fn create_reversal_submission(
        &self,
        payment_id: &str,
        reversal_id: &str,
        new: NewResource<ReversalSubmissionAttributes>,
    ) -> Result<ReversalSubmission> {
        let parent = self
            .existing::<ReversalAttributes>(&[payment_id, reversal_id])
            .await?;
        let mut record = build(new);
        record.attributes.0.submission_date = today();
        self.insert_tracked(&parent, record, StatusChain::simple_submission())
            .await
    }

    pub async fn get_reversal_submission(
        &self,
        payment_id: &str,
        reversal_id: &str,
        submission_id: &str,
    ) -> Result<ReversalSubmission> {
        self.fetch(&[payment_id, reversal_id, submission_id]).await
    }

    // --- Subscriptions ---

    /// Registers a subscription. New subscriptions are always active.
    pub async fn create_subscription(
        &self,
        new: NewResource<SubscriptionAttributes>,
    ) -> Result<Subscription> {
        let mut record = build(new);
        record.attributes.is_active = true;
        self.insert(None, record).await
    }

    pub async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription> {
        self.fetch(&[subscription_id]).await
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.repo.list(&KeyPrefix::all()).await
    }

    pub async fn patch_subscription(
        &self,
        subscription_id: &str,
        patch: SubscriptionPatch,
    ) -> Result<Subscription> {
        let key = CompositeKey::root(subscription_id)?;
        let mut sub = self.repo.get::<SubscriptionAttributes>(&key).await?;
        if let Some(uri) = patch.callback_uri.filter(|v| !v.is_empty()) {
            sub.attributes.callback_uri = uri;
        }
        if let Some(record_type) = patch.record_type.filter(|v| !v.is_empty()) {
            sub.attributes.record_type = record_type;
        }
        if let Some(event_type) = patch.event_type.filter(|v| !v.is_empty()) {
            sub.attributes.event_type = event_type;
        }
        if let Some(active) = patch.is_active {
            sub.attributes.is_active = active;
        }
        sub.meta.touch();
        self.repo.update(&key, sub.clone()).await?;
        Ok(sub)
    }

    pub async fn delete_subscription(&self, subscription_id: &str) -> Result<()> {
        let key = CompositeKey::root(subscription_id)?;
        self.repo.delete_subscription(&key).await
    }

    // --- Lifecycle ---

    /// Waits for every transition still outstanding and returns their outcomes.
    ///
    /// Transitions that had already finished are reaped as new ones start and are not
    /// reported here; the driver logs abandoned ones. A failed transition task is
    /// logged and skipped.
    pub async fn settle(&self) -> Result<Vec<TransitionOutcome>> {
        let mut outcomes = Vec::new();
        loop {
            let handles = std::mem::take(&mut *self.lock_transitions()?);
            if handles.is_empty() {
                return Ok(outcomes);
            }
            for handle in handles {
                match handle.wait().await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => warn!(error = %e, "transition task failed"),
                }
            }
        }
    }

    /// Settles every transition, then drains the notification queue.
    ///
    /// The queue is drained even when settling fails.
    pub async fn shutdown(&self) -> Result<Vec<TransitionOutcome>> {
        let outcomes = self.settle().await;
        self.dispatcher.shutdown().await;
        outcomes
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            payments: self.all().await?,
            payment_submissions: self.all().await?,
            payment_admissions: self.all().await?,
            admission_tasks: self.all().await?,
            return_payments: self.all().await?,
            return_submissions: self.all().await?,
            recalls: self.all().await?,
            recall_submissions: self.all().await?,
            recall_decisions: self.all().await?,
            recall_decision_submissions: self.all().await?,
            reversals: self.all().await?,
            reversal_submissions: self.all().await?,
            subscriptions: self.all().await?,
        })
    }

    // --- Helpers ---

    async fn insert<A: Stored>(
        &self,
        parent: Option<&CompositeKey>,
        record: Resource<A>,
    ) -> Result<Resource<A>> {
        let key = match parent {
            Some(parent) => parent.child(record.id())?,
            None => CompositeKey::root(record.id())?,
        };
        self.repo.create(&key, record.clone()).await?;
        self.dispatcher
            .notify(A::KIND, record.id(), EventKind::Created);
        Ok(record)
    }

    /// Inserts a resource at `chain[0]` and starts advancing it.
    async fn insert_tracked<A: Stored + HasStatus>(
        &self,
        parent: &CompositeKey,
        mut record: Resource<A>,
        chain: StatusChain,
    ) -> Result<Resource<A>> {
        record.attributes.set_status(chain.initial());
        let record = self.insert(Some(parent), record).await?;
        let key = parent.child(record.id())?;

        let store: Arc<dyn ResourceStore<A>> = self.repo.clone();
        let updater = Arc::new(RecordStatusUpdater::new(store, key.clone()));
        let handle =
            self.driver
                .start_transition(A::KIND, &key, chain, updater, self.on_step.clone())?;
        let mut transitions = self.lock_transitions()?;
        transitions.retain(|handle| !handle.is_finished());
        transitions.push(handle);
        Ok(record)
    }

    /// Key of an existing resource, or `NotFound`.
    async fn existing<A: Stored>(&self, segments: &[&str]) -> Result<CompositeKey> {
        let key = CompositeKey::new(segments)?;
        self.repo.get::<A>(&key).await?;
        Ok(key)
    }

    async fn fetch<A: Stored>(&self, segments: &[&str]) -> Result<Resource<A>> {
        let key = CompositeKey::new(segments)?;
        self.repo.get(&key).await
    }

    async fn children<A: Stored>(&self, parent: &[&str]) -> Result<Vec<Resource<A>>> {
        let key = CompositeKey::new(parent)?;
        self.repo.list(&key.prefix()).await
    }

    async fn ids<A: Stored>(&self, prefix: &KeyPrefix) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .repo
            .list::<A>(prefix)
            .await?
            .into_iter()
            .map(|record| record.meta.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn all<A: Stored>(&self) -> Result<Vec<Resource<A>>> {
        let mut records = self.repo.list::<A>(&KeyPrefix::all()).await?;
        records.sort_by(|a, b| {
            (&a.meta.id, a.meta.created_on).cmp(&(&b.meta.id, b.meta.created_on))
        });
        Ok(records)
    }

    fn lock_transitions(&self) -> Result<std::sync::MutexGuard<'_, Vec<TransitionHandle>>> {
        self.transitions
            .lock()
            .map_err(|_| SimError::Internal("transition list poisoned".to_string()))
    }
}

fn build<A: Stored>(new: NewResource<A>) -> Resource<A> {
    let id = new
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    Resource::new(id, new.organisation_id.unwrap_or_default(), new.attributes)
}

fn today() -> String {
    Utc::now().date_naive().to_string()
}
