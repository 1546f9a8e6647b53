//! Handler module - operation registration and dispatch targets.
//!
//! Provides:
//! - [`HandlerRegistry`] - maps (path, action, content type) to operations
//! - [`Operation`] / [`TypedOperation`] - request factory plus handler
//! - [`Reply`] - what a handler returns for the dispatcher to encode
//!
//! # Example
//!
//! ```ignore
//! use soapwire::handler::{HandlerRegistry, Reply};
//!
//! let mut registry = HandlerRegistry::new();
//!
//! registry.register("/svc", "DoThing", "DoThingRequest", DoThingRequest::default,
//!     |req: DoThingRequest, _writer, _http| async move {
//!         Ok(Reply::new(DoThingResponse::from(req)))
//!     });
//! ```

mod registry;
mod reply;

pub use registry::{BoxFuture, HandlerRegistry, HandlerResult, Operation, TypedOperation};
pub use reply::Reply;
