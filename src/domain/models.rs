use super::resource::{Attributes, HasStatus, Resource, ResourceKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountParty {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sort_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentAttributes {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub end_to_end_reference: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub numeric_reference: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payment_scheme: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub processing_date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary_party: Option<AccountParty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debtor_party: Option<AccountParty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSubmissionAttributes {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub submission_date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheme_status_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentAdmissionAttributes {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub admission_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionTaskAttributes {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assignee: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnPaymentAttributes {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub return_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub return_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallAttributes {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recall_reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recall_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallDecisionAttributes {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub answer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReversalAttributes {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reversal_reason: String,
}

/// Attributes shared by return, recall, reversal and recall-decision submissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAttributes {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub submission_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionAttributes {
    pub callback_uri: String,
    pub record_type: String,
    pub event_type: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub callback_transport: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
}

impl SubscriptionAttributes {
    pub fn matches(&self, record_type: &str, event_type: &str) -> bool {
        self.is_active && self.record_type == record_type && self.event_type == event_type
    }
}

/// Wrappers giving each submission kind its own key namespace over the same attributes.
macro_rules! submission_kind {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub SubmissionAttributes);

            impl Attributes for $name {
                const KIND: ResourceKind = ResourceKind::$kind;
            }

            impl HasStatus for $name {
                fn status(&self) -> &str {
                    &self.0.status
                }

                fn set_status(&mut self, status: &str) {
                    self.0.status = status.to_string();
                }
            }
        )*
    };
}

submission_kind! {
    ReturnSubmissionAttributes => ReturnSubmissions,
    RecallSubmissionAttributes => RecallSubmissions,
    RecallDecisionSubmissionAttributes => RecallDecisionSubmissions,
    ReversalSubmissionAttributes => ReversalSubmissions,
}

macro_rules! attributes_kind {
    ($($attrs:ty => $kind:ident),* $(,)?) => {
        $(
            impl Attributes for $attrs {
                const KIND: ResourceKind = ResourceKind::$kind;
            }
        )*
    };
}

attributes_kind! {
    PaymentAttributes => Payments,
    PaymentSubmissionAttributes => PaymentSubmissions,
    PaymentAdmissionAttributes => PaymentAdmissions,
    AdmissionTaskAttributes => AdmissionTasks,
    ReturnPaymentAttributes => ReturnPayments,
    RecallAttributes => Recalls,
    RecallDecisionAttributes => RecallDecisions,
    ReversalAttributes => Reversals,
    SubscriptionAttributes => Subscriptions,
}

impl HasStatus for PaymentSubmissionAttributes {
    fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

impl HasStatus for PaymentAdmissionAttributes {
    fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

pub type Payment = Resource<PaymentAttributes>;
pub type PaymentSubmission = Resource<PaymentSubmissionAttributes>;
pub type PaymentAdmission = Resource<PaymentAdmissionAttributes>;
pub type AdmissionTask = Resource<AdmissionTaskAttributes>;
pub type ReturnPayment = Resource<ReturnPaymentAttributes>;
pub type ReturnSubmission = Resource<ReturnSubmissionAttributes>;
pub type Recall = Resource<RecallAttributes>;
pub type RecallSubmission = Resource<RecallSubmissionAttributes>;
pub type RecallDecision = Resource<RecallDecisionAttributes>;
pub type RecallDecisionSubmission = Resource<RecallDecisionSubmissionAttributes>;
pub type Reversal = Resource<ReversalAttributes>;
pub type ReversalSubmission = Resource<ReversalSubmissionAttributes>;
pub type Subscription = Resource<SubscriptionAttributes>;

/// Identifiers of the resources hanging off a payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentRelationships {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_submissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_admissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_returns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_recalls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_reversals: Vec<String>,
}

impl PaymentRelationships {
    pub fn is_empty(&self) -> bool {
        self.payment_submissions.is_empty()
            && self.payment_admissions.is_empty()
            && self.payment_returns.is_empty()
            && self.payment_recalls.is_empty()
            && self.payment_reversals.is_empty()
    }
}

/// A payment together with its relationships, as returned by a payment lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(flatten)]
    pub payment: Payment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<PaymentRelationships>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_serialization_shape() {
        let payment = Payment::new(
            "p1",
            "org-1",
            PaymentAttributes {
                amount: dec!(100.50),
                currency: "GBP".to_string(),
                ..Default::default()
            },
        );

        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["type"], "payments");
        assert_eq!(json["id"], "p1");
        assert_eq!(json["organisation_id"], "org-1");
        assert_eq!(json["attributes"]["amount"], "100.50");
        assert!(json["attributes"].get("reference").is_none());
    }

    #[test]
    fn test_submission_wrapper_is_transparent() {
        let mut attrs = RecallSubmissionAttributes::default();
        attrs.set_status("accepted");

        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json["status"], "accepted");
        assert_eq!(attrs.status(), "accepted");
    }

    #[test]
    fn test_subscription_matching_requires_active() {
        let mut attrs = SubscriptionAttributes {
            callback_uri: "http://localhost/hook".to_string(),
            record_type: "payment_submissions".to_string(),
            event_type: "updated".to_string(),
            is_active: true,
            ..Default::default()
        };
        assert!(attrs.matches("payment_submissions", "updated"));
        assert!(!attrs.matches("payment_submissions", "created"));
        assert!(!attrs.matches("payments", "updated"));

        attrs.is_active = false;
        assert!(!attrs.matches("payment_submissions", "updated"));
    }
}
