#![forbid(unsafe_code)]

//! Errors surfaced by upstream subscription.

/// Failure to establish an upstream subscription.
///
/// Returned by [`ChangeFeed::subscribe`](crate::ChangeFeed::subscribe) and
/// propagated unchanged through
/// [`SubscriptionNode::activate`](crate::SubscriptionNode::activate) and
/// [`SubscriptionNode::add_listener`](crate::SubscriptionNode::add_listener).
/// The core never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    /// The source refused the subscription in its current state.
    Rejected { reason: String },
    /// The source has been shut down and accepts no new subscribers.
    Closed,
}

impl SubscribeError {
    /// Convenience constructor for [`SubscribeError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { reason } => write!(f, "subscription rejected: {reason}"),
            Self::Closed => write!(f, "data source is closed"),
        }
    }
}

impl std::error::Error for SubscribeError {}
