//! Adapter for callback-style middleware.
//!
//! Middleware written for the common `(request, response, next)` shape signals
//! completion by calling `next`: with no error to continue, with an error to abort.
//! [`init_middleware`] turns such a function into a [`Middleware`] whose completion
//! settles on the first `next` call.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::{BoxFuture, Middleware};
use crate::completion::{completion, Settle};
use crate::failure::{Failure, StepResult};

/// Completion callback handed to legacy middleware.
///
/// `Next` may be cloned, moved to another task or thread, and called any number of
/// times; only the first call has an effect. Each method reports whether it was that
/// first call. Dropping every clone without calling it rejects the completion with
/// [`crate::completion::NextDropped`].
#[derive(Clone, Debug)]
pub struct Next {
    settle: Settle,
}

impl Next {
    /// `next()` / `next(err)` in one call: `None` resolves, `Some` rejects.
    pub fn call(&self, error: Option<Failure>) -> bool {
        match error {
            None => self.settle.settle(Ok(())),
            Some(failure) => self.settle.settle(Err(failure)),
        }
    }

    /// Continue the chain.
    pub fn resolve(&self) -> bool {
        self.call(None)
    }

    /// Abort the chain with `error`, delivered to the error handler as-is.
    pub fn reject(&self, error: impl Into<Failure>) -> bool {
        self.call(Some(error.into()))
    }
}

/// Callback-style middleware: `Fn(Req, Res, Next)`.
pub trait LegacyMiddleware<Req, Res>: Send + Sync + 'static {
    fn call(&self, req: Req, res: Res, next: Next);
}

impl<Req, Res, F> LegacyMiddleware<Req, Res> for F
where
    F: Fn(Req, Res, Next) + Send + Sync + 'static,
{
    fn call(&self, req: Req, res: Res, next: Next) {
        (self)(req, res, next)
    }
}

/// A legacy middleware adapted to [`Middleware`]. Built by [`init_middleware`].
pub struct Adapted<L> {
    legacy: L,
}

/// Wrap a callback-style middleware so it returns a deferred completion.
///
/// The returned middleware never panics outward: a panic raised while the legacy
/// function runs becomes the rejection value, unless `next` was already called.
pub fn init_middleware<Req, Res, L>(legacy: L) -> Adapted<L>
where
    L: LegacyMiddleware<Req, Res>,
{
    Adapted { legacy }
}

impl<Req, Res, L> Middleware<Req, Res> for Adapted<L>
where
    L: LegacyMiddleware<Req, Res>,
{
    fn call(&self, req: Req, res: Res) -> BoxFuture<'static, StepResult> {
        let (settle, done) = completion();
        let next = Next {
            settle: settle.clone(),
        };

        let ran = panic::catch_unwind(AssertUnwindSafe(|| self.legacy.call(req, res, next)));
        if let Err(payload) = ran {
            let failure = Failure::from_panic(payload);
            warn!(failure = %failure, "Legacy middleware panicked");
            if !settle.settle(Err(failure)) {
                debug!("Legacy middleware panicked after calling next; panic ignored");
            }
        }
        // Only clones held by the legacy function keep the completion open now.
        drop(settle);

        Box::pin(done)
    }
}
