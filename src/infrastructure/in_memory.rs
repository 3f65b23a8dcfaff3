use crate::domain::models::*;
use crate::domain::ports::{ResourceStore, SubscriptionStore};
use crate::domain::resource::{Attributes, CompositeKey, KeyPrefix, Resource};
use crate::error::{Result, SimError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Selects the table holding one attribute type inside [`Tables`].
pub trait Stored: Attributes {
    fn table(tables: &Tables) -> &HashMap<String, Resource<Self>>;
    fn table_mut(tables: &mut Tables) -> &mut HashMap<String, Resource<Self>>;
}

macro_rules! tables {
    ($($field:ident: $attrs:ty),* $(,)?) => {
        /// One map per resource kind, keyed by composite key.
        #[derive(Default)]
        pub struct Tables {
            $($field: HashMap<String, Resource<$attrs>>,)*
        }

        $(
            impl Stored for $attrs {
                fn table(tables: &Tables) -> &HashMap<String, Resource<Self>> {
                    &tables.$field
                }

                fn table_mut(tables: &mut Tables) -> &mut HashMap<String, Resource<Self>> {
                    &mut tables.$field
                }
            }
        )*
    };
}

tables! {
    payments: PaymentAttributes,
    payment_submissions: PaymentSubmissionAttributes,
    payment_admissions: PaymentAdmissionAttributes,
    admission_tasks: AdmissionTaskAttributes,
    return_payments: ReturnPaymentAttributes,
    return_submissions: ReturnSubmissionAttributes,
    recalls: RecallAttributes,
    recall_submissions: RecallSubmissionAttributes,
    recall_decisions: RecallDecisionAttributes,
    recall_decision_submissions: RecallDecisionSubmissionAttributes,
    reversals: ReversalAttributes,
    reversal_submissions: ReversalSubmissionAttributes,
    subscriptions: SubscriptionAttributes,
}

/// A thread-safe in-memory repository for every resource kind.
///
/// Uses a single `Arc<RwLock<Tables>>`: writers are serialized against each other,
/// readers run concurrently. The lock is only held for the map access itself, and
/// every read hands out a clone. Nothing is persisted.
#[derive(Default, Clone)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    /// Creates a new, empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create<A: Stored>(&self, key: &CompositeKey, record: Resource<A>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = A::table_mut(&mut tables);
        if table.contains_key(key.as_str()) {
            return Err(SimError::Conflict {
                kind: A::KIND,
                key: key.to_string(),
            });
        }
        table.insert(key.to_string(), record);
        Ok(())
    }

    pub async fn get<A: Stored>(&self, key: &CompositeKey) -> Result<Resource<A>> {
        let tables = self.tables.read().await;
        A::table(&tables)
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| SimError::NotFound {
                kind: A::KIND,
                key: key.to_string(),
            })
    }

    pub async fn list<A: Stored>(&self, prefix: &KeyPrefix) -> Result<Vec<Resource<A>>> {
        let tables = self.tables.read().await;
        Ok(A::table(&tables)
            .iter()
            .filter(|(key, _)| prefix.matches(key))
            .map(|(_, record)| record.clone())
            .collect())
    }

    pub async fn update<A: Stored>(&self, key: &CompositeKey, record: Resource<A>) -> Result<()> {
        let mut tables = self.tables.write().await;
        match A::table_mut(&mut tables).get_mut(key.as_str()) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(SimError::NotFound {
                kind: A::KIND,
                key: key.to_string(),
            }),
        }
    }

    pub async fn delete_subscription(&self, key: &CompositeKey) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .subscriptions
            .remove(key.as_str())
            .map(|_| ())
            .ok_or_else(|| SimError::NotFound {
                kind: SubscriptionAttributes::KIND,
                key: key.to_string(),
            })
    }

    /// Full scan; subscription volume is expected to stay small.
    pub async fn match_subscriptions(
        &self,
        record_type: &str,
        event_type: &str,
    ) -> Vec<Subscription> {
        let tables = self.tables.read().await;
        tables
            .subscriptions
            .values()
            .filter(|sub| sub.attributes.matches(record_type, event_type))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl<A: Stored> ResourceStore<A> for InMemoryRepository {
    async fn create(&self, key: &CompositeKey, record: Resource<A>) -> Result<()> {
        InMemoryRepository::create(self, key, record).await
    }

    async fn get(&self, key: &CompositeKey) -> Result<Resource<A>> {
        InMemoryRepository::get(self, key).await
    }

    async fn list(&self, prefix: &KeyPrefix) -> Result<Vec<Resource<A>>> {
        InMemoryRepository::list(self, prefix).await
    }

    async fn update(&self, key: &CompositeKey, record: Resource<A>) -> Result<()> {
        InMemoryRepository::update(self, key, record).await
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryRepository {
    async fn delete(&self, key: &CompositeKey) -> Result<()> {
        self.delete_subscription(key).await
    }

    async fn match_subscriptions(
        &self,
        record_type: &str,
        event_type: &str,
    ) -> Result<Vec<Subscription>> {
        Ok(InMemoryRepository::match_subscriptions(self, record_type, event_type).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ResourceStore;
    use rust_decimal_macros::dec;

    fn payment(id: &str) -> Payment {
        Payment::new(
            id,
            "org-1",
            PaymentAttributes {
                amount: dec!(100.00),
                currency: "GBP".to_string(),
                ..Default::default()
            },
        )
    }

    fn subscription(id: &str, record_type: &str, event_type: &str, active: bool) -> Subscription {
        Subscription::new(
            id,
            "org-1",
            SubscriptionAttributes {
                callback_uri: format!("http://localhost/{id}"),
                record_type: record_type.to_string(),
                event_type: event_type.to_string(),
                is_active: active,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_create_then_get_returns_equal_value() {
        let repo = InMemoryRepository::new();
        let key = CompositeKey::root("p1").unwrap();
        let p = payment("p1");

        repo.create(&key, p.clone()).await.unwrap();
        let retrieved = repo.get::<PaymentAttributes>(&key).await.unwrap();
        assert_eq!(retrieved, p);
    }

    #[tokio::test]
    async fn test_create_conflict_keeps_first_record() {
        let repo = InMemoryRepository::new();
        let key = CompositeKey::root("p1").unwrap();
        let first = payment("p1");
        let mut second = payment("p1");
        second.attributes.currency = "EUR".to_string();

        repo.create(&key, first.clone()).await.unwrap();
        let err = repo.create(&key, second).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.get::<PaymentAttributes>(&key).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_get_and_update_missing_are_not_found() {
        let repo = InMemoryRepository::new();
        let key = CompositeKey::root("missing").unwrap();

        assert!(repo.get::<PaymentAttributes>(&key).await.unwrap_err().is_not_found());
        let err = repo.update(&key, payment("missing")).await.unwrap_err();
        assert!(err.is_not_found());
        // update never auto-creates
        assert!(repo.get::<PaymentAttributes>(&key).await.is_err());
    }

    #[tokio::test]
    async fn test_kinds_have_disjoint_namespaces() {
        let repo = InMemoryRepository::new();
        let key = CompositeKey::new(&["p1", "x1"]).unwrap();

        let submission = PaymentSubmission::new("x1", "", PaymentSubmissionAttributes::default());
        let admission = PaymentAdmission::new("x1", "", PaymentAdmissionAttributes::default());
        repo.create(&key, submission).await.unwrap();
        repo.create(&key, admission).await.unwrap();

        assert_eq!(repo.get::<PaymentSubmissionAttributes>(&key).await.unwrap().id(), "x1");
        assert_eq!(repo.get::<PaymentAdmissionAttributes>(&key).await.unwrap().id(), "x1");
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let repo = InMemoryRepository::new();
        for (parent, id) in [("p1", "s1"), ("p1", "s2"), ("p10", "s3")] {
            let key = CompositeKey::new(&[parent, id]).unwrap();
            let record = PaymentSubmission::new(id, "", PaymentSubmissionAttributes::default());
            repo.create(&key, record).await.unwrap();
        }

        let p1 = CompositeKey::root("p1").unwrap();
        let mut ids: Vec<String> = repo
            .list::<PaymentSubmissionAttributes>(&p1.prefix())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.meta.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["s1", "s2"]);

        let all = repo
            .list::<PaymentSubmissionAttributes>(&KeyPrefix::all())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_match_subscriptions_filters_inactive_and_fields() {
        let repo = InMemoryRepository::new();
        let subs = [
            subscription("a", "payment_submissions", "updated", true),
            subscription("b", "payment_submissions", "updated", false),
            subscription("c", "payment_submissions", "created", true),
            subscription("d", "payments", "updated", true),
        ];
        for sub in subs {
            let key = CompositeKey::root(sub.id()).unwrap();
            repo.create(&key, sub).await.unwrap();
        }

        let matched = repo.match_subscriptions("payment_submissions", "updated").await;
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id(), "a");
    }

    #[tokio::test]
    async fn test_delete_subscription() {
        let repo = InMemoryRepository::new();
        let key = CompositeKey::root("a").unwrap();
        repo.create(&key, subscription("a", "payments", "created", true))
            .await
            .unwrap();

        repo.delete_subscription(&key).await.unwrap();
        assert!(repo.delete_subscription(&key).await.unwrap_err().is_not_found());
        assert!(repo.match_subscriptions("payments", "created").await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_have_one_winner() {
        let repo = InMemoryRepository::new();
        let key = CompositeKey::root("p1").unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let repo = repo.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                let mut p = payment("p1");
                p.attributes.reference = format!("writer-{i}");
                let result = repo.create(&key, p.clone()).await;
                (result, p)
            }));
        }

        let mut winners = Vec::new();
        for handle in handles {
            let (result, p) = handle.await.unwrap();
            match result {
                Ok(()) => winners.push(p),
                Err(e) => assert!(e.is_conflict()),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(repo.get::<PaymentAttributes>(&key).await.unwrap(), winners[0]);
    }

    #[tokio::test]
    async fn test_repository_as_trait_object() {
        let store: Arc<dyn ResourceStore<PaymentAttributes>> = Arc::new(InMemoryRepository::new());
        let key = CompositeKey::root("p1").unwrap();

        let handle = tokio::spawn({
            let store = store.clone();
            let key = key.clone();
            async move { store.create(&key, payment("p1")).await }
        });
        handle.await.unwrap().unwrap();

        assert_eq!(store.get(&key).await.unwrap().id(), "p1");
    }
}
