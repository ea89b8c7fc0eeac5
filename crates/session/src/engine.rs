//! Session refresh engine: the recurring freshness check.
//!
//! One timer per live session. The task holds only a weak reference to the
//! controller, so dropping the controller ends the task; logout and re-login
//! abort it explicitly.

use std::sync::{Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::controller::ControllerInner;

#[derive(Debug, Default)]
pub(crate) struct RefreshEngine {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start the recurring check, canceling any previous timer first.
    ///
    /// Called whenever a session is installed; the invariant is one timer
    /// iff a token is present.
    pub(crate) fn arm(&self, controller: Weak<ControllerInner>, period: Duration) {
        self.disarm();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of an interval fires immediately; a freshly
            // installed token does not need checking yet.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                controller.tick().await;
            }
        });

        let mut slot = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(task);
    }

    /// Cancel the timer. Safe to call when no timer is armed, and
    /// unconditional: an in-flight refresh loses its task as well.
    pub(crate) fn disarm(&self) {
        let task = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for RefreshEngine {
    fn drop(&mut self) {
        self.disarm();
    }
}
