use super::resource::ResourceKind;
use super::status::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ephemeral status-change signal travelling through the dispatch queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub record_kind: ResourceKind,
    pub resource_id: String,
    pub event_kind: EventKind,
    /// Status reached, for transition steps.
    pub status: Option<String>,
}

impl NotificationEvent {
    pub fn new(record_kind: ResourceKind, resource_id: &str, event_kind: EventKind) -> Self {
        Self {
            record_kind,
            resource_id: resource_id.to_string(),
            event_kind,
            status: None,
        }
    }

    /// An `updated` event for a transition step that reached `status`.
    pub fn step(record_kind: ResourceKind, resource_id: &str, status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Self::new(record_kind, resource_id, EventKind::Updated)
        }
    }
}

/// Payload POSTed to every matching subscription's callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub organisation_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u64,
    pub created_on: DateTime<Utc>,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub record_type: String,
    pub event_type: String,
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Notification {
    /// Builds a payload with a fresh identifier.
    pub fn for_event(event: &NotificationEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            organisation_id: String::new(),
            kind: "notifications".to_string(),
            version: 0,
            created_on: Utc::now(),
            data: NotificationData {
                record_type: event.record_kind.as_str().to_string(),
                event_type: event.event_kind.as_str().to_string(),
                resource_id: event.resource_id.clone(),
                status: event.status.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_payload_gets_a_fresh_id() {
        let event = NotificationEvent::step(ResourceKind::PaymentSubmissions, "s1", "submitted");

        let first = Notification::for_event(&event);
        let second = Notification::for_event(&event);
        assert_ne!(first.id, second.id);

        let json = serde_json::to_value(&first).unwrap();
        assert_eq!(json["type"], "notifications");
        assert_eq!(json["data"]["record_type"], "payment_submissions");
        assert_eq!(json["data"]["event_type"], "updated");
        assert_eq!(json["data"]["resource_id"], "s1");
        assert_eq!(json["data"]["status"], "submitted");
    }

    #[test]
    fn test_created_payload_omits_status() {
        let event = NotificationEvent::new(ResourceKind::Payments, "p1", EventKind::Created);
        let json = serde_json::to_value(Notification::for_event(&event)).unwrap();
        assert_eq!(json["data"]["event_type"], "created");
        assert!(json["data"].get("status").is_none());
    }
}
