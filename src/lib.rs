//! # apiroute
//!
//! **apiroute** builds HTTP API route handlers on top of an embedding framework's
//! request/response values: per-method dispatch, global and per-route middleware
//! chains, a per-request context and a single place where every failure ends up.
//!
//! ## Overview
//!
//! - **[`route`]** - [`RouteCreator`] and the [`Route`] handlers it builds
//! - **[`middleware`]** - the [`Middleware`] trait and [`init_middleware`], which adapts
//!   callback-style `(req, res, next)` middleware
//! - **[`methods`]** - the closed set of [`AllowedMethod`]s a route can key on
//! - **[`failure`]** - [`Failure`], the untyped error channel
//! - **[`exchange`]** - the [`exchange::RequestMethod`] seam and a bundled
//!   request/response pair
//! - **[`completion`]** - the single-shot completion signal behind `init_middleware`
//! - **[`runtime_config`]** / **[`logging`]** - environment driven configuration and
//!   subscriber setup
//!
//! ## Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Server as Embedding server
//!     participant Route
//!     participant MW as Middleware chain
//!     participant Handler as Method handler / fallback
//!     participant Err as handle_error
//!
//!     Server->>Route: handle(req, res)
//!     loop global then local, in order
//!         Route->>MW: call(req, res)
//!         MW-->>Route: Ok / Err(failure)
//!     end
//!     Route->>Route: create_context(&req, &res)
//!     Route->>Handler: call(req, res, ctx)
//!     alt any step failed
//!         Route->>Err: handle_error(req, res, failure)
//!     end
//!     Route-->>Server: ()
//! ```
//!
//! ## Example
//!
//! ```rust
//! use apiroute::exchange::{ApiRequest, ApiResponse};
//! use apiroute::route::{sync, RouteCreator};
//! use apiroute::Failure;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let create_api_route = RouteCreator::builder(
//!     |_req: &ApiRequest, _res: &ApiResponse| Ok::<_, Failure>(1_i64),
//!     sync(|_req: ApiRequest, res: ApiResponse, _ctx: i64| {
//!         res.status(405).json(json!({ "message": "Unimplemented" }));
//!         Ok(())
//!     }),
//! )
//! .build();
//!
//! let route = create_api_route
//!     .route()
//!     .get(|_req: ApiRequest, res: ApiResponse, value: i64| async move {
//!         res.status(200).json(json!({ "value": value }));
//!         Ok(())
//!     })
//!     .build();
//!
//! let res = ApiResponse::new();
//! route.handle(ApiRequest::new("GET", "/value"), res.clone()).await;
//! assert_eq!(res.body(), Some(json!({ "value": 1 })));
//!
//! let res = ApiResponse::new();
//! route.handle(ApiRequest::new("POST", "/value"), res.clone()).await;
//! assert_eq!(res.status_code(), 405);
//! # }
//! ```

pub mod completion;
pub mod exchange;
pub mod failure;
pub mod ids;
pub mod logging;
pub mod methods;
pub mod middleware;
pub mod route;
pub mod runtime_config;

pub use failure::{Failure, StepResult};
pub use methods::{is_allowed_method, AllowedMethod};
pub use middleware::{init_middleware, Middleware, Next};
pub use route::{Route, RouteCreator};
