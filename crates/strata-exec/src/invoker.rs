use async_trait::async_trait;
use strata_types::Entry;

use crate::context::MigrationContext;

/// A mutation body failed. Carries a human-readable cause.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MutationFailure {
    pub message: String,
}

impl MutationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<crate::error::TagError> for MutationFailure {
    fn from(err: crate::error::TagError) -> Self {
        Self::new(err.to_string())
    }
}

/// The host capability that actually performs an entry's change.
///
/// The executor treats this as opaque: it hands over the entry and a
/// [`MigrationContext`] and awaits the result. Bodies may suspend for as long
/// as they need. They must be safe to retry, because a failed entry is
/// attempted again on the next run and any partial side effects are not
/// rolled back.
#[async_trait]
pub trait MutationInvoker: Send + Sync {
    async fn apply(&self, entry: &Entry, ctx: &mut MigrationContext<'_>) -> Result<(), MutationFailure>;
}

#[async_trait]
impl<I: MutationInvoker + ?Sized> MutationInvoker for &I {
    async fn apply(&self, entry: &Entry, ctx: &mut MigrationContext<'_>) -> Result<(), MutationFailure> {
        (**self).apply(entry, ctx).await
    }
}
