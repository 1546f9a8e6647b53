//! # soapwire
//!
//! Server-side SOAP 1.1/1.2 dispatch for Rust.
//!
//! Accepts XML envelopes over HTTP, works out which registered operation
//! should handle each message, and replies with a success or fault envelope.
//!
//! ## Architecture
//!
//! - **Envelope codec** ([`codec`]): writes envelopes for the active
//!   [`SoapVersion`] and reads them back with a two-pass body decode, since
//!   the body's type is only known from its element name
//! - **Registry** ([`handler`]): operations keyed by HTTP path, SOAP action
//!   and body content type
//! - **Dispatcher** ([`Server`]): read, probe, route, decode, validate,
//!   invoke, encode; every failure becomes a SOAP fault
//! - **Response writer** ([`ResponseWriter`]): lets handlers write their own
//!   output, prefixed with the XML declaration
//!
//! ## Example
//!
//! ```no_run
//! use soapwire::{Reply, Server};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Default)]
//! struct DoThingRequest {
//!     #[serde(rename = "Name")]
//!     name: String,
//! }
//!
//! #[derive(Serialize)]
//! struct DoThingResponse {
//!     #[serde(rename = "Greeting")]
//!     greeting: String,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::builder()
//!         .handle("/svc", "DoThing", "DoThingRequest", DoThingRequest::default,
//!             |req: DoThingRequest, _writer, _http| async move {
//!                 Ok(Reply::new(DoThingResponse { greeting: format!("hello {}", req.name) }))
//!             })
//!         .build();
//!
//!     server.listen_and_serve("0.0.0.0:8080").await.unwrap();
//! }
//! ```

pub mod codec;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod logging;
pub mod writer;

mod server;

pub use envelope::{Envelope, EnvelopeRequest, Fault, Payload, SoapVersion};
pub use error::{BoxError, DispatchError, SoapError};
pub use handler::Reply;
pub use logging::LogConfig;
pub use server::{
    EnvelopeRequestFactory, HeaderCheck, Server, ServerBuilder, DEFAULT_MAX_BODY_SIZE,
    SOAP_ACTION_HEADER,
};
pub use writer::ResponseWriter;
