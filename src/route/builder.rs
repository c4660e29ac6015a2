use std::sync::Arc;

use tracing::{debug, warn};

use super::creator::Shared;
use super::dispatch::Route;
use super::handler::MethodHandler;
use super::table::MethodTable;
use crate::exchange::{ApiRequest, ApiResponse, RequestMethod};
use crate::methods::{AllowedMethod, UnknownMethod};
use crate::middleware::{Middleware, SharedMiddleware};

/// Per-route configuration: method handlers and local middleware.
///
/// Obtained from [`super::RouteCreator::route`].
pub struct RouteBuilder<Ctx, Req = ApiRequest, Res = ApiResponse> {
    shared: Arc<Shared<Ctx, Req, Res>>,
    methods: MethodTable<Req, Res, Ctx>,
    middleware: Vec<SharedMiddleware<Req, Res>>,
}

impl<Ctx, Req, Res> RouteBuilder<Ctx, Req, Res>
where
    Ctx: Send + 'static,
    Req: RequestMethod + Clone + Send + Sync + 'static,
    Res: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(shared: Arc<Shared<Ctx, Req, Res>>) -> Self {
        Self {
            shared,
            methods: MethodTable::new(),
            middleware: Vec::new(),
        }
    }

    /// Register the handler for `method`. A second registration replaces the first.
    #[must_use]
    pub fn on<H>(mut self, method: AllowedMethod, handler: H) -> Self
    where
        H: MethodHandler<Req, Res, Ctx>,
    {
        if self.methods.insert(method, handler).is_some() {
            warn!(method = %method, "Replaced existing method handler");
        }
        self
    }

    /// Register a handler by method name (any case).
    ///
    /// Names outside the allowed set are rejected, since such a handler could never
    /// be reached.
    pub fn try_on<H>(self, method: &str, handler: H) -> Result<Self, UnknownMethod>
    where
        H: MethodHandler<Req, Res, Ctx>,
    {
        let method: AllowedMethod = method.parse()?;
        Ok(self.on(method, handler))
    }

    #[must_use]
    pub fn get<H: MethodHandler<Req, Res, Ctx>>(self, handler: H) -> Self {
        self.on(AllowedMethod::Get, handler)
    }

    #[must_use]
    pub fn post<H: MethodHandler<Req, Res, Ctx>>(self, handler: H) -> Self {
        self.on(AllowedMethod::Post, handler)
    }

    #[must_use]
    pub fn put<H: MethodHandler<Req, Res, Ctx>>(self, handler: H) -> Self {
        self.on(AllowedMethod::Put, handler)
    }

    #[must_use]
    pub fn patch<H: MethodHandler<Req, Res, Ctx>>(self, handler: H) -> Self {
        self.on(AllowedMethod::Patch, handler)
    }

    #[must_use]
    pub fn delete<H: MethodHandler<Req, Res, Ctx>>(self, handler: H) -> Self {
        self.on(AllowedMethod::Delete, handler)
    }

    /// Append a local middleware. Local middleware runs after all global middleware,
    /// in the order added.
    #[must_use]
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<Req, Res>,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append already shared local middleware, in iteration order.
    #[must_use]
    pub fn middlewares<I>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = SharedMiddleware<Req, Res>>,
    {
        self.middleware.extend(middleware);
        self
    }

    /// Finish the route.
    #[must_use]
    pub fn build(self) -> Route<Ctx, Req, Res> {
        let global = self.shared.middleware.len();
        let local = self.middleware.len();

        let mut chain = Vec::with_capacity(global + local);
        chain.extend(self.shared.middleware.iter().map(Arc::clone));
        chain.extend(self.middleware);

        debug!(
            methods = ?self.methods,
            global_middleware = global,
            local_middleware = local,
            "Route built"
        );

        Route::new(self.shared, self.methods, chain, global)
    }
}
