//! Guarded chat session.
//!
//! Keep the public surface small: build a [`ChatSession`] (from a
//! [`GuardConfig`](crate::GuardConfig) or through [`ChatSessionBuilder`]) and
//! call `submit_turn`. Implementation details are split into submodules under
//! `src/client/`.

pub mod builder;
mod policy;
pub mod session;

pub use builder::ChatSessionBuilder;
pub use session::ChatSession;

use tokio_util::sync::CancellationToken;

/// Ends a running turn from outside its event stream.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
