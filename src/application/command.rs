use super::simulator::{NewResource, Simulator, SubscriptionPatch};
use crate::domain::models::*;
use crate::error::Result;
use serde::Deserialize;
use std::time::Duration;

/// One scenario step: a request against the simulator, or a pause.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreatePayment {
        #[serde(flatten)]
        resource: NewResource<PaymentAttributes>,
    },
    CreatePaymentSubmission {
        payment_id: String,
        #[serde(flatten)]
        resource: NewResource<PaymentSubmissionAttributes>,
    },
    CreatePaymentAdmission {
        payment_id: String,
        #[serde(flatten)]
        resource: NewResource<PaymentAdmissionAttributes>,
    },
    PatchAdmissionTask {
        payment_id: String,
        admission_id: String,
        task_id: String,
        #[serde(default)]
        attributes: AdmissionTaskAttributes,
    },
    CreateReturn {
        payment_id: String,
        #[serde(flatten)]
        resource: NewResource<ReturnPaymentAttributes>,
    },
    CreateReturnSubmission {
        payment_id: String,
        return_id: String,
        #[serde(flatten)]
        resource: NewResource<ReturnSubmissionAttributes>,
    },
    CreateRecall {
        payment_id: String,
        #[serde(flatten)]
        resource: NewResource<RecallAttributes>,
    },
    CreateRecallSubmission {
        payment_id: String,
        recall_id: String,
        #[serde(flatten)]
        resource: NewResource<RecallSubmissionAttributes>,
    },
    CreateRecallDecision {
        payment_id: String,
        recall_id: String,
        #[serde(flatten)]
        resource: NewResource<RecallDecisionAttributes>,
    },
    CreateRecallDecisionSubmission {
        payment_id: String,
        recall_id: String,
        decision_id: String,
        #[serde(flatten)]
        resource: NewResource<RecallDecisionSubmissionAttributes>,
    },
    CreateReversal {
        payment_id: String,
        #[serde(flatten)]
        resource: NewResource<ReversalAttributes>,
    },
    CreateReversalSubmission {
        payment_id: String,
        reversal_id: String,
        #[serde(flatten)]
        resource: NewResource<ReversalSubmissionAttributes>,
    },
    CreateSubscription {
        #[serde(flatten)]
        resource: NewResource<SubscriptionAttributes>,
    },
    PatchSubscription {
        subscription_id: String,
        #[serde(default)]
        attributes: SubscriptionPatch,
    },
    DeleteSubscription {
        subscription_id: String,
    },
    Sleep {
        ms: u64,
    },
}

impl Command {
    pub fn op(&self) -> &'static str {
        match self {
            Command::CreatePayment { .. } => "create_payment",
            Command::CreatePaymentSubmission { .. } => "create_payment_submission",
            Command::CreatePaymentAdmission { .. } => "create_payment_admission",
            Command::PatchAdmissionTask { .. } => "patch_admission_task",
            Command::CreateReturn { .. } => "create_return",
            Command::CreateReturnSubmission { .. } => "create_return_submission",
            Command::CreateRecall { .. } => "create_recall",
            Command::CreateRecallSubmission { .. } => "create_recall_submission",
            Command::CreateRecallDecision { .. } => "create_recall_decision",
            Command::CreateRecallDecisionSubmission { .. } => "create_recall_decision_submission",
            Command::CreateReversal { .. } => "create_reversal",
            Command::CreateReversalSubmission { .. } => "create_reversal_submission",
            Command::CreateSubscription { .. } => "create_subscription",
            Command::PatchSubscription { .. } => "patch_subscription",
            Command::DeleteSubscription { .. } => "delete_subscription",
            Command::Sleep { .. } => "sleep",
        }
    }
}

impl Simulator {
    /// Applies one scenario command. Created or patched resources are discarded.
    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::CreatePayment { resource } => {
                self.create_payment(resource).await?;
            }
            Command::CreatePaymentSubmission {
                payment_id,
                resource,
            } => {
                self.create_payment_submission(&payment_id, resource).await?;
            }
            Command::CreatePaymentAdmission {
                payment_id,
                resource,
            } => {
                self.create_payment_admission(&payment_id, resource).await?;
            }
            Command::PatchAdmissionTask {
                payment_id,
                admission_id,
                task_id,
                attributes,
            } => {
                self.patch_admission_task(&payment_id, &admission_id, &task_id, attributes)
                    .await?;
            }
            Command::CreateReturn {
                payment_id,
                resource,
            } => {
                self.create_return(&payment_id, resource).await?;
            }
            Command::CreateReturnSubmission {
                payment_id,
                return_id,
                resource,
            } => {
                self.create_return_submission(&payment_id, &return_id, resource)
                    .await?;
            }
            Command::CreateRecall {
                payment_id,
                resource,
            } => {
                self.create_recall(&payment_id, resource).await?;
            }
            Command::CreateRecallSubmission {
                payment_id,
                recall_id,
                resource,
            } => {
                self.create_recall_submission(&payment_id, &recall_id, resource)
                    .await?;
            }
            Command::CreateRecallDecision {
                payment_id,
                recall_id,
                resource,
            } => {
                self.create_recall_decision(&payment_id, &recall_id, resource)
                    .await?;
            }
            Command::CreateRecallDecisionSubmission {
                payment_id,
                recall_id,
                decision_id,
                resource,
            } => {
                self.create_recall_decision_submission(
                    &payment_id,
                    &recall_id,
                    &decision_id,
                    resource,
                )
                .await?;
            }
            Command::CreateReversal {
                payment_id,
                resource,
            } => {
                self.create_reversal(&payment_id, resource).await?;
            }
            Command::CreateReversalSubmission {
                payment_id,
                reversal_id,
                resource,
            } => {
                self.create_reversal_submission(&payment_id, &reversal_id, resource)
                    .await?;
            }
            Command::CreateSubscription { resource } => {
                self.create_subscription(resource).await?;
            }
            Command::PatchSubscription {
                subscription_id,
                attributes,
            } => {
                self.patch_subscription(&subscription_id, attributes).await?;
            }
            Command::DeleteSubscription { subscription_id } => {
                self.delete_subscription(&subscription_id).await?;
            }
            Command::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }
        Ok(())
    }
}
