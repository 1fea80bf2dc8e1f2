//! # Server Module
//!
//! Request and response collaborators the dispatcher works against.
//!
//! - [`Request`] exposes the method, raw URL, decoded body parameters and the body
//!   [`Transformer`]. [`IncomingRequest`] is the default implementation and can be built from
//!   an `http::Request<String>`.
//! - [`Response`] carries status, headers and body and is flushed at most once through a
//!   [`ResponseWriter`].
//! - [`JsonTransformer`] and [`JsonRpcTransformer`] decode request bodies and encode action
//!   results.

mod request;
mod response;
mod transformer;

pub use request::{IncomingRequest, Request, JSON_RPC_CONTENT_TYPE};
pub use response::{HeaderVec, Response, ResponseWriter, MAX_INLINE_HEADERS};
pub use transformer::{JsonRpcTransformer, JsonTransformer, TransformError, Transformer};
