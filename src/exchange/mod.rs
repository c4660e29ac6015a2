//! # Exchange Module
//!
//! Request/response values handed to middleware and handlers.
//!
//! The route machinery is generic: it only needs to read a request's method, which is
//! what [`RequestMethod`] provides. Any framework type can be used by implementing
//! it (it is already implemented for `http::Request<B>` and for `Arc<T>`).
//!
//! For embedding code without request/response objects of its own, the module ships a
//! ready pair:
//!
//! - [`ApiRequest`] - method, path, headers, optional JSON body and a request id
//! - [`ApiResponse`] - a shared response handle that handlers write a status and a
//!   JSON body into, in the style of a framework response object
//!
//! Both are cheap to clone; clones refer to the same exchange.

mod request;
mod response;

pub use request::{ApiRequest, HeaderVec, RequestMethod, MAX_INLINE_HEADERS};
pub use response::{ApiResponse, ResponseState};
