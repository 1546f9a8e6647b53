//! Server builder and request dispatch.
//!
//! The [`ServerBuilder`] provides a fluent API for registering operations
//! and configuring the protocol. The [`Server`] runs one request at a time
//! per call to [`Server::dispatch`]:
//! 1. Read the POST body
//! 2. Probe-decode it to find the body's content type
//! 3. Resolve the operation by path, SOAP action and content type
//! 4. Decode again into the operation's request type
//! 5. Validate the envelope header
//! 6. Invoke the handler
//! 7. Encode the handler's reply, unless it wrote its own output
//!
//! Any failure ends the request with a SOAP fault. Faults are sent with the
//! normal framing and status; only a fault that cannot itself be encoded
//! produces a `500` with a plain-text diagnostic.
//!
//! # Example
//!
//! ```no_run
//! use soapwire::{Reply, Server, SoapVersion};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Default)]
//! struct Echo {
//!     #[serde(rename = "Text")]
//!     text: String,
//! }
//!
//! #[derive(Serialize)]
//! struct EchoResponse {
//!     #[serde(rename = "Text")]
//!     text: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     Server::builder()
//!         .soap_version(SoapVersion::V12)
//!         .handle("/echo", "Echo", "Echo", Echo::default, |req: Echo, _w, _http| async move {
//!             Ok(Reply::new(EchoResponse { text: req.text }))
//!         })
//!         .build()
//!         .listen_and_serve("127.0.0.1:8080")
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde::de::DeserializeOwned;
use tokio::net::{TcpListener, ToSocketAddrs};

use crate::codec::{EnvelopeCodec, XmlCodec};
use crate::envelope::{Envelope, EnvelopeRequest, Fault, SoapVersion};
use crate::error::{BoxError, DecodeError, DispatchError, Result};
use crate::handler::{HandlerRegistry, HandlerResult};
use crate::logging::LogConfig;
use crate::writer::ResponseWriter;

/// Default limit on the size of a request body.
pub const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// Request header carrying the SOAP action.
pub const SOAP_ACTION_HEADER: &str = "soapaction";

/// Header validator. An error rejects the request before the handler runs.
pub type HeaderCheck = dyn Fn(&EnvelopeRequest) -> std::result::Result<(), BoxError> + Send + Sync;

/// Builds the envelope used for the probe pass.
pub type EnvelopeRequestFactory = dyn Fn() -> EnvelopeRequest + Send + Sync;

/// A SOAP server.
///
/// Configure it (directly or through [`ServerBuilder`]) before serving; the
/// registry and protocol settings are read-only while requests are handled.
pub struct Server {
    registry: HandlerRegistry,
    codec: Box<dyn EnvelopeCodec>,
    version: SoapVersion,
    content_type: String,
    check_header: Box<HeaderCheck>,
    create_envelope_request: Box<EnvelopeRequestFactory>,
    log: LogConfig,
    max_body_size: usize,
}

impl Server {
    /// Create a SOAP 1.1 server with no operations.
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            codec: Box::new(XmlCodec),
            version: SoapVersion::V11,
            content_type: SoapVersion::V11.content_type().to_string(),
            check_header: Box::new(|_| Ok(())),
            create_envelope_request: Box::new(EnvelopeRequest::probe),
            log: LogConfig::default(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Register an operation. See [`HandlerRegistry::register`].
    pub fn register_handler<T, Fa, F, Fut>(
        &mut self,
        path: &str,
        action: &str,
        content_type: &str,
        factory: Fa,
        handler: F,
    ) where
        Fa: Fn() -> T + Send + Sync + 'static,
        F: Fn(T, ResponseWriter, Arc<Parts>) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry
            .register(path, action, content_type, factory, handler);
    }

    /// Speak SOAP 1.1.
    pub fn use_soap11(&mut self) {
        self.set_version(SoapVersion::V11);
    }

    /// Speak SOAP 1.2.
    pub fn use_soap12(&mut self) {
        self.set_version(SoapVersion::V12);
    }

    fn set_version(&mut self, version: SoapVersion) {
        self.version = version;
        self.content_type = version.content_type().to_string();
    }

    /// Install a header validator.
    pub fn set_check_header<F>(&mut self, check: F)
    where
        F: Fn(&EnvelopeRequest) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.check_header = Box::new(check);
    }

    /// Active protocol version.
    pub fn version(&self) -> SoapVersion {
        self.version
    }

    /// `Content-Type` written on envelopes.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The operation registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Set the configured content type and `status` on `writer`.
    pub fn write_header(&self, writer: &ResponseWriter, status: StatusCode) {
        writer.set_content_type(&self.content_type);
        writer.write_header(status);
    }

    /// Handle one HTTP request.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        tracing::debug!(
            "dispatch method: {}, path: {}, SOAPAction: {:?}",
            parts.method,
            parts.uri.path(),
            soap_action(&parts.headers)
        );

        let writer = ResponseWriter::new(self.log);
        let result = if parts.method == Method::POST {
            self.process(parts, body, &writer).await
        } else {
            Err(DispatchError::MethodNotAllowed)
        };

        if let Err(err) = result {
            if writer.output_started() {
                tracing::warn!("error after handler sent its own output: {}", err);
            } else {
                self.handle_error(err, &writer);
            }
        }

        writer.take_response()
    }

    async fn process(
        &self,
        parts: Parts,
        body: Body,
        writer: &ResponseWriter,
    ) -> std::result::Result<(), DispatchError> {
        let data = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| DispatchError::ReadBody(e.to_string()))?;
        if self.log.verbose {
            tracing::debug!("request: {}", String::from_utf8_lossy(&data));
        }

        let mut envelope = (self.create_envelope_request)();
        self.codec
            .unmarshal(&data, &mut envelope, self.version)
            .map_err(DispatchError::Probe)?;

        let action = soap_action(&parts.headers);
        let content_type = envelope.body.content_type().to_string();
        tracing::debug!("found content type {:?}", content_type);
        let operation = self
            .registry
            .resolve(parts.uri.path(), &action, &content_type)?;

        envelope.body.bind(operation.new_request());
        self.codec
            .unmarshal(&data, &mut envelope, self.version)
            .map_err(DispatchError::Decode)?;

        (self.check_header)(&envelope).map_err(DispatchError::HeaderRejected)?;

        let request = envelope
            .body
            .take_content()
            .ok_or(DispatchError::Decode(DecodeError::UnboundContent))?;
        let reply = operation
            .call(request, writer.clone(), Arc::new(parts))
            .await
            .map_err(DispatchError::Handler)?;

        if writer.output_started() {
            tracing::debug!("action handler sent its own output");
            return Ok(());
        }

        let envelope = reply.into_envelope().map_err(DispatchError::Marshal)?;
        let xml = self
            .codec
            .marshal(&envelope, self.version)
            .map_err(DispatchError::Marshal)?;
        writer.add_soap_headers(xml.len(), &self.content_type);
        writer.write(&xml);
        Ok(())
    }

    fn handle_error(&self, err: DispatchError, writer: &ResponseWriter) {
        let fault = match err {
            DispatchError::Handler(e) | DispatchError::HeaderRejected(e) => into_fault(e),
            other => Fault::new(other.to_string()),
        };
        self.write_fault(fault, writer);
    }

    fn write_fault(&self, fault: Fault, writer: &ResponseWriter) {
        tracing::warn!("handling error: {}", fault);
        let message = fault.message().to_string();

        match self.codec.marshal(&Envelope::fault(fault), self.version) {
            Ok(xml) => {
                writer.add_soap_headers(xml.len(), &self.content_type);
                writer.write(&xml);
            }
            Err(xml_err) => {
                tracing::error!("could not marshal soap fault: {}", xml_err);
                writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
                writer.set_content_type("text/plain; charset=utf-8");
                writer.write_raw(
                    format!(
                        "could not marshal soap fault for: {} xmlError: {}",
                        message, xml_err
                    )
                    .as_bytes(),
                );
            }
        }
    }

    /// An `axum` router sending every path and method to this server.
    pub fn into_router(self) -> Router {
        let server = Arc::new(self);
        Router::new().fallback(move |request: Request<Body>| {
            let server = Arc::clone(&server);
            async move { server.dispatch(request).await }
        })
    }

    /// Bind `addr` and serve until the listener fails.
    pub async fn listen_and_serve(self, addr: impl ToSocketAddrs) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("SOAP server listening on {}", listener.local_addr()?);
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

/// A `Fault` error is sent as-is; anything else becomes a message-only fault.
fn into_fault(err: BoxError) -> Fault {
    match err.downcast::<Fault>() {
        Ok(fault) => *fault,
        Err(err) => Fault::new(err.to_string()),
    }
}

/// SOAP action of a request: the `SOAPAction` header without surrounding
/// quotes, or else the `action` parameter of `Content-Type` (SOAP 1.2).
fn soap_action(headers: &HeaderMap) -> String {
    if let Some(action) = headers
        .get(SOAP_ACTION_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return unquote(action).to_string();
    }

    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|content_type| {
            content_type.split(';').skip(1).find_map(|param| {
                let (name, value) = param.split_once('=')?;
                name.trim()
                    .eq_ignore_ascii_case("action")
                    .then(|| unquote(value).to_string())
            })
        })
        .unwrap_or_default()
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Builder for configuring and creating a [`Server`].
pub struct ServerBuilder {
    server: Server,
}

impl ServerBuilder {
    /// Create a new server builder (SOAP 1.1, no operations).
    pub fn new() -> Self {
        Self {
            server: Server::new(),
        }
    }

    /// Register an operation.
    pub fn handle<T, Fa, F, Fut>(
        mut self,
        path: &str,
        action: &str,
        content_type: &str,
        factory: Fa,
        handler: F,
    ) -> Self
    where
        Fa: Fn() -> T + Send + Sync + 'static,
        F: Fn(T, ResponseWriter, Arc<Parts>) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.server
            .register_handler(path, action, content_type, factory, handler);
        self
    }

    /// Set the protocol version. Also resets the content type to the
    /// version's default.
    pub fn soap_version(mut self, version: SoapVersion) -> Self {
        self.server.set_version(version);
        self
    }

    /// Override the response `Content-Type`.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.server.content_type = content_type.into();
        self
    }

    /// Set the header validator.
    ///
    /// Default: accept every request.
    pub fn check_header<F>(mut self, check: F) -> Self
    where
        F: Fn(&EnvelopeRequest) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.server.set_check_header(check);
        self
    }

    /// Set the factory for probe-pass envelopes.
    ///
    /// Default: [`EnvelopeRequest::probe`].
    pub fn envelope_request_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> EnvelopeRequest + Send + Sync + 'static,
    {
        self.server.create_envelope_request = Box::new(factory);
        self
    }

    /// Replace the envelope codec.
    pub fn codec<C: EnvelopeCodec>(mut self, codec: C) -> Self {
        self.server.codec = Box::new(codec);
        self
    }

    /// Set the logging configuration.
    pub fn log_config(mut self, log: LogConfig) -> Self {
        self.server.log = log;
        self
    }

    /// Set the maximum accepted request body size.
    ///
    /// Default: 4 MiB
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.server.max_body_size = limit;
        self
    }

    /// Build the server.
    pub fn build(self) -> Server {
        self.server
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
