//! # Middleware Module
//!
//! A middleware is a pre-processing step that runs before a route's method handler.
//! It receives the request/response pair and returns a deferred completion: a future
//! that resolves to `Ok(())` to let the request continue, or to `Err(Failure)` to
//! abort the rest of the chain and hand the failure to the route's error handler.
//!
//! Any async closure `Fn(Req, Res) -> impl Future<Output = StepResult>` is a
//! middleware. Legacy callback-style middleware (`Fn(Req, Res, Next)`) is adapted
//! with [`init_middleware`].
//!
//! ```rust
//! use apiroute::exchange::{ApiRequest, ApiResponse};
//! use apiroute::middleware::{init_middleware, Next};
//! use apiroute::Failure;
//!
//! // Async middleware
//! let require_body = |req: ApiRequest, _res: ApiResponse| async move {
//!     match req.body() {
//!         Some(_) => Ok(()),
//!         None => Err(Failure::from("missing body")),
//!     }
//! };
//!
//! // Callback-style middleware, adapted
//! let legacy = init_middleware(|_req: ApiRequest, res: ApiResponse, next: Next| {
//!     res.set_header("x-powered-by", "apiroute");
//!     next.resolve();
//! });
//! # let _ = (require_body, legacy);
//! ```

mod legacy;

use std::future::Future;
use std::sync::Arc;

pub use futures::future::BoxFuture;
pub use legacy::{init_middleware, Adapted, LegacyMiddleware, Next};

use crate::failure::StepResult;

/// A pre-processing step producing a deferred completion.
pub trait Middleware<Req, Res>: Send + Sync + 'static {
    fn call(&self, req: Req, res: Res) -> BoxFuture<'static, StepResult>;
}

impl<Req, Res, F, Fut> Middleware<Req, Res> for F
where
    F: Fn(Req, Res) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    fn call(&self, req: Req, res: Res) -> BoxFuture<'static, StepResult> {
        Box::pin((self)(req, res))
    }
}

/// Middleware shared between a route creator and the routes it builds.
pub type SharedMiddleware<Req, Res> = Arc<dyn Middleware<Req, Res>>;

/// Box a middleware for storage in a chain.
pub fn shared<Req, Res, M>(middleware: M) -> SharedMiddleware<Req, Res>
where
    M: Middleware<Req, Res>,
{
    Arc::new(middleware)
}
