use crate::error::{Result, SimError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the segments of a [`CompositeKey`].
pub const KEY_SEPARATOR: char = ':';

/// A named category of entity, each owning a disjoint key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Payments,
    PaymentSubmissions,
    PaymentAdmissions,
    AdmissionTasks,
    ReturnPayments,
    ReturnSubmissions,
    Recalls,
    RecallSubmissions,
    RecallDecisions,
    RecallDecisionSubmissions,
    Reversals,
    ReversalSubmissions,
    Subscriptions,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Payments => "payments",
            ResourceKind::PaymentSubmissions => "payment_submissions",
            ResourceKind::PaymentAdmissions => "payment_admissions",
            ResourceKind::AdmissionTasks => "admission_tasks",
            ResourceKind::ReturnPayments => "return_payments",
            ResourceKind::ReturnSubmissions => "return_submissions",
            ResourceKind::Recalls => "recalls",
            ResourceKind::RecallSubmissions => "recall_submissions",
            ResourceKind::RecallDecisions => "recall_decisions",
            ResourceKind::RecallDecisionSubmissions => "recall_decision_submissions",
            ResourceKind::Reversals => "reversals",
            ResourceKind::ReversalSubmissions => "reversal_submissions",
            ResourceKind::Subscriptions => "subscriptions",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and lifecycle fields shared by every resource kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMeta {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub id: String,
    #[serde(default)]
    pub organisation_id: String,
    #[serde(default)]
    pub version: u64,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl ResourceMeta {
    pub fn new(kind: ResourceKind, id: impl Into<String>, organisation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            kind,
            id: id.into(),
            organisation_id: organisation_id.into(),
            version: 0,
            created_on: now,
            modified_on: now,
        }
    }

    /// Stamps the modification time and bumps the version.
    pub fn touch(&mut self) {
        self.modified_on = Utc::now();
        self.version += 1;
    }
}

/// Attribute set of one resource kind.
pub trait Attributes: Clone + Send + Sync + 'static {
    const KIND: ResourceKind;
}

/// Attribute sets whose resources progress through a status chain.
pub trait HasStatus {
    fn status(&self) -> &str;
    fn set_status(&mut self, status: &str);
}

/// A stored resource: shared identity fields plus the kind's own attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<A> {
    #[serde(flatten)]
    pub meta: ResourceMeta,
    pub attributes: A,
}

impl<A: Attributes> Resource<A> {
    pub fn new(id: impl Into<String>, organisation_id: impl Into<String>, attributes: A) -> Self {
        Self {
            meta: ResourceMeta::new(A::KIND, id, organisation_id),
            attributes,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }
}

/// The full ancestor-chain-plus-own-id address of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Result<Self> {
        if segments.is_empty() {
            return Err(SimError::InvalidKey("key needs at least one segment".to_string()));
        }
        for segment in segments {
            validate_segment(segment.as_ref())?;
        }
        let joined = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(&KEY_SEPARATOR.to_string());
        Ok(Self(joined))
    }

    pub fn root(id: &str) -> Result<Self> {
        Self::new(&[id])
    }

    pub fn child(&self, id: &str) -> Result<Self> {
        validate_segment(id)?;
        Ok(Self(format!("{}{}{}", self.0, KEY_SEPARATOR, id)))
    }

    /// The resource's own identifier (the last segment).
    pub fn id(&self) -> &str {
        self.0.rsplit(KEY_SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Prefix matching every key nested directly or transitively under this one.
    pub fn prefix(&self) -> KeyPrefix {
        KeyPrefix(format!("{}{}", self.0, KEY_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(SimError::InvalidKey("empty identifier".to_string()));
    }
    if segment.contains(KEY_SEPARATOR) {
        return Err(SimError::InvalidKey(format!(
            "identifier '{segment}' contains '{KEY_SEPARATOR}'"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    /// Matches every key.
    pub fn all() -> Self {
        Self(String::new())
    }

    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.0) && key.len() > self.0.len()
    }
}
