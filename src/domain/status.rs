use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An immutable, non-empty, ordered sequence of status labels.
///
/// Cloning is cheap: the labels are shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChain(Arc<[&'static str]>);

impl StatusChain {
    /// Returns `None` for an empty chain.
    pub fn new(statuses: &[&'static str]) -> Option<Self> {
        if statuses.is_empty() {
            None
        } else {
            Some(Self(statuses.into()))
        }
    }

    /// The status a resource carries at creation time.
    pub fn initial(&self) -> &'static str {
        self.0[0]
    }

    pub fn last(&self) -> &'static str {
        self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<&'static str> {
        self.0.get(index).copied()
    }

    pub fn steps(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }

    pub fn payment_submission() -> Self {
        Self(
            [
                "accepted",
                "validation_pending",
                "limit_check_pending",
                "limit_check_passed",
                "released_to_gateway",
                "queued_for_delivery",
                "submitted",
                "delivery_confirmed",
            ]
            .as_slice()
            .into(),
        )
    }

    pub fn admission() -> Self {
        Self(["pending", "confirmed"].as_slice().into())
    }

    /// Used by return, recall, reversal and recall-decision submissions.
    pub fn simple_submission() -> Self {
        Self(["accepted", "delivery_confirmed"].as_slice().into())
    }
}

/// Kind of change a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_is_rejected() {
        assert!(StatusChain::new(&[]).is_none());
        let chain = StatusChain::new(&["only"]).unwrap();
        assert_eq!(chain.initial(), "only");
        assert_eq!(chain.last(), "only");
    }

    #[test]
    fn test_builtin_chains() {
        let chain = StatusChain::payment_submission();
        assert_eq!(chain.len(), 8);
        assert_eq!(chain.initial(), "accepted");
        assert_eq!(chain.last(), "delivery_confirmed");

        assert_eq!(
            StatusChain::admission().steps().collect::<Vec<_>>(),
            vec!["pending", "confirmed"]
        );
        assert_eq!(StatusChain::simple_submission().get(1), Some("delivery_confirmed"));
    }
}
