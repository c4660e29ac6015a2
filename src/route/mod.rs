//! # Route Module
//!
//! Builds request handlers from a method table, middleware chains, a context
//! constructor and an error handler.
//!
//! ## Overview
//!
//! A [`RouteCreator`] holds what every route shares:
//!
//! - `create_context` - builds the per-request context from the request/response pair
//! - `unimplemented_method` - fallback for methods a route has no handler for
//! - global middleware - runs first, for every route
//! - `handle_error` - optional, receives every failure
//!
//! [`RouteCreator::route`] starts a [`RouteBuilder`] for one route's handlers and local
//! middleware; [`RouteBuilder::build`] produces the [`Route`].
//!
//! ## Request Flow
//!
//! 1. Global middleware, then local middleware, one at a time in declared order. The
//!    first failure stops the chain.
//! 2. `create_context` is called once.
//! 3. The request method is matched case-insensitively against the route's table;
//!    unmatched or unknown methods go to `unimplemented_method`.
//! 4. A failure at any step (including a panic, unless disabled in
//!    [`crate::runtime_config::RuntimeConfig`]) goes to `handle_error`. Without an
//!    error handler it is swallowed.
//!
//! [`Route::handle`] therefore never fails. A panic raised by `handle_error` itself is
//! not caught.

mod builder;
mod creator;
mod dispatch;
mod handler;
mod table;

pub use builder::RouteBuilder;
pub use creator::{ContextFn, ErrorHandler, RouteCreator, RouteCreatorBuilder};
pub use dispatch::Route;
pub use handler::{sync, MethodHandler, SharedHandler, SyncHandler};
pub use table::MethodTable;
