use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, debug_span, trace, warn, Instrument};

use super::creator::Shared;
use super::table::MethodTable;
use crate::exchange::{ApiRequest, ApiResponse, RequestMethod};
use crate::failure::{Failure, StepResult};
use crate::methods::AllowedMethod;
use crate::middleware::{BoxFuture, SharedMiddleware};

/// Step of a request that was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Position in the combined (global then local) middleware chain
    Middleware(usize),
    Context,
    Handler,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Middleware(idx) => write!(f, "middleware[{idx}]"),
            Stage::Context => f.write_str("context"),
            Stage::Handler => f.write_str("handler"),
        }
    }
}

struct RouteInner<Ctx, Req, Res> {
    shared: Arc<Shared<Ctx, Req, Res>>,
    methods: MethodTable<Req, Res, Ctx>,
    /// Global middleware followed by local middleware
    chain: Vec<SharedMiddleware<Req, Res>>,
    global_len: usize,
}

/// The request handler produced by [`super::RouteBuilder::build`].
///
/// For each request it runs the middleware chain, builds the context, dispatches on
/// the request method, and routes any failure to the error handler. It never fails
/// outward.
///
/// Cloning is cheap; a route can serve any number of concurrent requests.
pub struct Route<Ctx, Req = ApiRequest, Res = ApiResponse> {
    inner: Arc<RouteInner<Ctx, Req, Res>>,
}

impl<Ctx, Req, Res> Clone for Route<Ctx, Req, Res> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Ctx, Req, Res> fmt::Debug for Route<Ctx, Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.inner.methods)
            .field("global_middleware", &self.inner.global_len)
            .field(
                "local_middleware",
                &(self.inner.chain.len() - self.inner.global_len),
            )
            .finish()
    }
}

impl<Ctx, Req, Res> Route<Ctx, Req, Res>
where
    Ctx: Send + 'static,
    Req: RequestMethod + Clone + Send + Sync + 'static,
    Res: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        shared: Arc<Shared<Ctx, Req, Res>>,
        methods: MethodTable<Req, Res, Ctx>,
        chain: Vec<SharedMiddleware<Req, Res>>,
        global_len: usize,
    ) -> Self {
        Self {
            inner: Arc::new(RouteInner {
                shared,
                methods,
                chain,
                global_len,
            }),
        }
    }

    /// Handle one request.
    ///
    /// The returned future owns everything it needs and can be spawned.
    pub fn handle(&self, req: Req, res: Res) -> BoxFuture<'static, ()> {
        let request_id = req
            .request_id()
            .map(|id| id.to_string())
            .unwrap_or_default();
        let span = debug_span!(
            "api_route",
            method = %req.method(),
            request_id = %request_id,
        );
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.handle(req, res).await }.instrument(span))
    }

    /// Methods with a registered handler.
    pub fn methods(&self) -> impl Iterator<Item = AllowedMethod> + '_ {
        self.inner.methods.methods()
    }

    /// Length of the combined middleware chain.
    #[must_use]
    pub fn middleware_len(&self) -> usize {
        self.inner.chain.len()
    }
}

impl<Ctx, Req, Res> RouteInner<Ctx, Req, Res>
where
    Ctx: Send + 'static,
    Req: RequestMethod + Clone + Send + Sync + 'static,
    Res: Clone + Send + Sync + 'static,
{
    async fn handle(&self, req: Req, res: Res) {
        let start = Instant::now();
        let config = self.shared.config;
        debug!(middleware_count = self.chain.len(), "Route request start");

        let mut stage = Stage::Middleware(0);
        let outcome = if config.catch_panics {
            AssertUnwindSafe(self.run(req.clone(), res.clone(), &mut stage))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(Failure::from_panic(payload)))
        } else {
            self.run(req.clone(), res.clone(), &mut stage).await
        };

        if let Err(failure) = outcome {
            debug!(
                stage = %stage,
                failure_type = failure.type_name(),
                "Request step failed"
            );
            match &self.shared.handle_error {
                Some(handle_error) => handle_error(req, res, failure),
                None => debug!(
                    stage = %stage,
                    "No error handler configured - failure suppressed"
                ),
            }
        }

        let elapsed = start.elapsed();
        if let Some(threshold) = config.slow_request_threshold() {
            if elapsed > threshold {
                warn!(
                    latency_ms = elapsed.as_millis() as u64,
                    threshold_ms = threshold.as_millis() as u64,
                    "Slow request"
                );
            }
        }
        debug!(latency_ms = elapsed.as_millis() as u64, "Route request complete");
    }

    async fn run(&self, req: Req, res: Res, stage: &mut Stage) -> StepResult {
        for (idx, mw) in self.chain.iter().enumerate() {
            *stage = Stage::Middleware(idx);
            trace!(
                middleware_idx = idx,
                local = idx >= self.global_len,
                "Middleware start"
            );
            mw.call(req.clone(), res.clone()).await?;
        }

        *stage = Stage::Context;
        let ctx = (self.shared.create_context)(&req, &res)?;

        *stage = Stage::Handler;
        let handler = match self.methods.lookup(req.method()) {
            Some(handler) => handler,
            None => {
                debug!(method = %req.method(), "No handler for method - using fallback");
                &self.shared.unimplemented_method
            }
        };
        handler.call(req, res, ctx).await
    }
}
