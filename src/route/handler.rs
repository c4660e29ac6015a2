use std::future::Future;
use std::sync::Arc;

use crate::failure::StepResult;
use crate::middleware::BoxFuture;

/// A method handler (or fallback): `(request, response, context)` to a deferred
/// completion.
///
/// Implemented for async closures. Wrap synchronous closures with [`sync`].
pub trait MethodHandler<Req, Res, Ctx>: Send + Sync + 'static {
    fn call(&self, req: Req, res: Res, ctx: Ctx) -> BoxFuture<'static, StepResult>;
}

impl<Req, Res, Ctx, F, Fut> MethodHandler<Req, Res, Ctx> for F
where
    F: Fn(Req, Res, Ctx) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    fn call(&self, req: Req, res: Res, ctx: Ctx) -> BoxFuture<'static, StepResult> {
        Box::pin((self)(req, res, ctx))
    }
}

/// Synchronous handler adapter. Built by [`sync`].
pub struct SyncHandler<F> {
    f: F,
}

/// Use a synchronous closure as a [`MethodHandler`].
///
/// ```rust
/// use apiroute::exchange::{ApiRequest, ApiResponse};
/// use apiroute::route::sync;
/// use serde_json::json;
///
/// let handler = sync(|_req: ApiRequest, res: ApiResponse, _ctx: ()| {
///     res.status(405).json(json!({ "message": "Unimplemented" }));
///     Ok(())
/// });
/// # let _ = handler;
/// ```
pub fn sync<Req, Res, Ctx, F>(f: F) -> SyncHandler<F>
where
    F: Fn(Req, Res, Ctx) -> StepResult + Send + Sync + 'static,
{
    SyncHandler { f }
}

impl<Req, Res, Ctx, F> MethodHandler<Req, Res, Ctx> for SyncHandler<F>
where
    F: Fn(Req, Res, Ctx) -> StepResult + Send + Sync + 'static,
{
    fn call(&self, req: Req, res: Res, ctx: Ctx) -> BoxFuture<'static, StepResult> {
        // Runs now, inside the caller's poll; panics surface there too.
        let outcome = (self.f)(req, res, ctx);
        Box::pin(futures::future::ready(outcome))
    }
}

/// Handler shared between routes.
pub type SharedHandler<Req, Res, Ctx> = Arc<dyn MethodHandler<Req, Res, Ctx>>;
