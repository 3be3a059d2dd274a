use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::CongruenceError;

/// Cooperative cancellation for one analysis run.
///
/// Checked at every stage boundary and once per clause. A fired token or an
/// elapsed deadline both surface as `CongruenceError::Canceled`.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn check(&self, stage: &'static str) -> Result<(), CongruenceError> {
        if self.is_canceled() {
            tracing::debug!(stage, "cancel: stopping analysis");
            return Err(CongruenceError::canceled(stage));
        }
        Ok(())
    }
}
