use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::builder::RouteBuilder;
use super::handler::{MethodHandler, SharedHandler};
use crate::exchange::{ApiRequest, ApiResponse, RequestMethod};
use crate::failure::Failure;
use crate::middleware::{Middleware, SharedMiddleware};
use crate::runtime_config::RuntimeConfig;

/// Builds the per-request context from the request/response pair.
pub type ContextFn<Req, Res, Ctx> = Arc<dyn Fn(&Req, &Res) -> Result<Ctx, Failure> + Send + Sync>;

/// Receives every failure of a request: `(request, response, failure)`.
pub type ErrorHandler<Req, Res> = Arc<dyn Fn(Req, Res, Failure) + Send + Sync>;

/// Configuration shared by every route of one creator.
pub(crate) struct Shared<Ctx, Req, Res> {
    pub(crate) create_context: ContextFn<Req, Res, Ctx>,
    pub(crate) unimplemented_method: SharedHandler<Req, Res, Ctx>,
    pub(crate) middleware: Vec<SharedMiddleware<Req, Res>>,
    pub(crate) handle_error: Option<ErrorHandler<Req, Res>>,
    pub(crate) config: RuntimeConfig,
}

/// Factory for routes sharing a context constructor, a fallback handler, global
/// middleware and an error handler.
///
/// Cloning is cheap; clones share the configuration.
///
/// # Example
///
/// ```rust
/// use apiroute::exchange::{ApiRequest, ApiResponse};
/// use apiroute::route::{sync, RouteCreator};
/// use apiroute::Failure;
/// use serde_json::json;
///
/// struct Ctx {
///     value: i64,
/// }
///
/// let create_api_route = RouteCreator::builder(
///     |_req: &ApiRequest, _res: &ApiResponse| Ok::<_, Failure>(Ctx { value: 1 }),
///     sync(|_req: ApiRequest, res: ApiResponse, _ctx: Ctx| {
///         res.status(405).json(json!({ "message": "Unimplemented" }));
///         Ok(())
///     }),
/// )
/// .handle_error(|_req, res: ApiResponse, err: Failure| {
///     res.status(500).json(json!({ "message": err.to_string() }));
/// })
/// .build();
///
/// let route = create_api_route
///     .route()
///     .get(|_req: ApiRequest, res: ApiResponse, ctx: Ctx| async move {
///         res.status(200).json(json!({ "value": ctx.value }));
///         Ok(())
///     })
///     .build();
/// # let _ = route;
/// ```
pub struct RouteCreator<Ctx, Req = ApiRequest, Res = ApiResponse> {
    shared: Arc<Shared<Ctx, Req, Res>>,
}

impl<Ctx, Req, Res> Clone for RouteCreator<Ctx, Req, Res> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<Ctx, Req, Res> fmt::Debug for RouteCreator<Ctx, Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCreator")
            .field("global_middleware", &self.shared.middleware.len())
            .field("handle_error", &self.shared.handle_error.is_some())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl<Ctx, Req, Res> RouteCreator<Ctx, Req, Res>
where
    Ctx: Send + 'static,
    Req: RequestMethod + Clone + Send + Sync + 'static,
    Res: Clone + Send + Sync + 'static,
{
    /// Start configuring a creator from its two required parts: the context
    /// constructor and the fallback used when a route has no handler for a method.
    pub fn builder<C, U>(create_context: C, unimplemented_method: U) -> RouteCreatorBuilder<Ctx, Req, Res>
    where
        C: Fn(&Req, &Res) -> Result<Ctx, Failure> + Send + Sync + 'static,
        U: MethodHandler<Req, Res, Ctx>,
    {
        RouteCreatorBuilder {
            create_context: Arc::new(create_context),
            unimplemented_method: Arc::new(unimplemented_method),
            middleware: Vec::new(),
            handle_error: None,
            config: None,
        }
    }

    /// Start a route. Global middleware runs before the route's own.
    #[must_use]
    pub fn route(&self) -> RouteBuilder<Ctx, Req, Res> {
        RouteBuilder::new(Arc::clone(&self.shared))
    }

    #[must_use]
    pub fn global_middleware_len(&self) -> usize {
        self.shared.middleware.len()
    }

    #[must_use]
    pub fn has_error_handler(&self) -> bool {
        self.shared.handle_error.is_some()
    }

    #[must_use]
    pub fn runtime_config(&self) -> RuntimeConfig {
        self.shared.config
    }
}

/// Builder for [`RouteCreator`].
pub struct RouteCreatorBuilder<Ctx, Req = ApiRequest, Res = ApiResponse> {
    create_context: ContextFn<Req, Res, Ctx>,
    unimplemented_method: SharedHandler<Req, Res, Ctx>,
    middleware: Vec<SharedMiddleware<Req, Res>>,
    handle_error: Option<ErrorHandler<Req, Res>>,
    config: Option<RuntimeConfig>,
}

impl<Ctx, Req, Res> RouteCreatorBuilder<Ctx, Req, Res>
where
    Ctx: Send + 'static,
    Req: RequestMethod + Clone + Send + Sync + 'static,
    Res: Clone + Send + Sync + 'static,
{
    /// Append a global middleware. Global middleware runs in the order added.
    #[must_use]
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<Req, Res>,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append already shared global middleware, in iteration order.
    #[must_use]
    pub fn middlewares<I>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = SharedMiddleware<Req, Res>>,
    {
        self.middleware.extend(middleware);
        self
    }

    /// Set the error handler. Without one, failures are swallowed: the response is
    /// left as it was when the failure happened.
    #[must_use]
    pub fn handle_error<E>(mut self, handle_error: E) -> Self
    where
        E: Fn(Req, Res, Failure) + Send + Sync + 'static,
    {
        self.handle_error = Some(Arc::new(handle_error));
        self
    }

    /// Override the runtime configuration (default: [`RuntimeConfig::from_env`]).
    #[must_use]
    pub fn runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn build(self) -> RouteCreator<Ctx, Req, Res> {
        let config = self.config.unwrap_or_else(RuntimeConfig::from_env);
        debug!(
            global_middleware = self.middleware.len(),
            handle_error = self.handle_error.is_some(),
            catch_panics = config.catch_panics,
            "Route creator built"
        );
        RouteCreator {
            shared: Arc::new(Shared {
                create_context: self.create_context,
                unimplemented_method: self.unimplemented_method,
                middleware: self.middleware,
                handle_error: self.handle_error,
                config,
            }),
        }
    }
}
