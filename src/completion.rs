//! Single-shot completion signal.
//!
//! [`completion`] returns a settle handle and the future observing it. The handle may
//! be cloned and settled from any thread; only the first settle is delivered, every
//! later one is ignored and reported as `false`.
//!
//! If every settle handle is dropped without settling, the future resolves with
//! `Err(Failure)` holding [`NextDropped`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::trace;

use crate::failure::{Failure, StepResult};

/// Rejection value used when a completion can no longer be settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextDropped;

impl fmt::Display for NextDropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("completion callback dropped without being called")
    }
}

impl std::error::Error for NextDropped {}

/// Settles the paired [`Completion`]. First call wins.
#[derive(Clone)]
pub struct Settle {
    slot: Arc<Mutex<Option<oneshot::Sender<StepResult>>>>,
}

impl Settle {
    /// Deliver `outcome` if nothing was delivered yet.
    ///
    /// Returns `true` when this call settled the completion.
    pub fn settle(&self, outcome: StepResult) -> bool {
        let sender = self.slot.lock().take();
        match sender {
            // The receiver may be gone already; the outcome is still "first".
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    trace!("completion receiver dropped before settle");
                }
                true
            }
            None => {
                trace!("completion already settled; ignoring");
                false
            }
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl fmt::Debug for Settle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settle")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Future side of a completion signal.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<StepResult>,
}

impl Future for Completion {
    type Output = StepResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Failure::new(NextDropped))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Create a settle handle and the completion it feeds.
#[must_use]
pub fn completion() -> (Settle, Completion) {
    let (tx, rx) = oneshot::channel();
    (
        Settle {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        Completion { rx },
    )
}
