//! Handler registry for dispatching requests by path, action and content type.
//!
//! An operation is addressed by three keys: the HTTP path it is served on,
//! the SOAP action of the request, and the local name of the body's child
//! element. Each registration pairs a request factory (a fresh decode target
//! for the full decode pass) with the handler that consumes the decoded
//! request.
//!
//! # Example
//!
//! ```
//! use soapwire::handler::{HandlerRegistry, Reply};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Default)]
//! struct GetQuote {
//!     #[serde(rename = "Symbol")]
//!     symbol: String,
//! }
//!
//! #[derive(Serialize)]
//! struct GetQuoteResponse {
//!     #[serde(rename = "Price")]
//!     price: u32,
//! }
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("/quotes", "GetQuote", "GetQuote", GetQuote::default, |req: GetQuote, _w, _http| async move {
//!     Ok(Reply::new(GetQuoteResponse { price: req.symbol.len() as u32 }))
//! });
//!
//! assert!(registry.resolve("/quotes", "GetQuote", "GetQuote").is_ok());
//! assert!(registry.resolve("/quotes", "Other", "GetQuote").is_err());
//! ```
//!
//! Registration is meant to happen before serving starts; the registry is
//! read-only while requests are dispatched.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::Reply;
use crate::codec::{BodyContent, TypedContent};
use crate::error::{BoxError, RegistryMiss};
use crate::writer::ResponseWriter;

/// Result type for handler functions.
pub type HandlerResult = Result<Reply, BoxError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A registered operation, with its request type erased.
pub trait Operation: Send + Sync + 'static {
    /// Fresh decode target for the full decode pass.
    fn new_request(&self) -> Box<dyn BodyContent>;

    /// Run the handler on a decoded request.
    fn call(
        &self,
        request: Box<dyn BodyContent>,
        writer: ResponseWriter,
        http: Arc<Parts>,
    ) -> BoxFuture<'static, HandlerResult>;
}

/// Operation built from a request factory and a typed handler.
pub struct TypedOperation<T, Fa, F, Fut>
where
    Fa: Fn() -> T + Send + Sync + 'static,
    F: Fn(T, ResponseWriter, Arc<Parts>) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    factory: Fa,
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<T, Fa, F, Fut> TypedOperation<T, Fa, F, Fut>
where
    Fa: Fn() -> T + Send + Sync + 'static,
    F: Fn(T, ResponseWriter, Arc<Parts>) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    /// Create a new typed operation.
    pub fn new(factory: Fa, handler: F) -> Self {
        Self {
            factory,
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<T, Fa, F, Fut> Operation for TypedOperation<T, Fa, F, Fut>
where
    Fa: Fn() -> T + Send + Sync + 'static,
    F: Fn(T, ResponseWriter, Arc<Parts>) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn new_request(&self) -> Box<dyn BodyContent> {
        Box::new(TypedContent::new((self.factory)()))
    }

    fn call(
        &self,
        request: Box<dyn BodyContent>,
        writer: ResponseWriter,
        http: Arc<Parts>,
    ) -> BoxFuture<'static, HandlerResult> {
        let request = match request.into_any().downcast::<T>() {
            Ok(request) => *request,
            Err(_) => {
                let result: HandlerResult = Err(format!(
                    "request content is not a {}",
                    std::any::type_name::<T>()
                )
                .into());
                return Box::pin(async move { result });
            }
        };

        Box::pin((self.handler)(request, writer, http))
    }
}

/// Operations by content type, for one (path, action).
type ContentTypes = HashMap<String, Box<dyn Operation>>;

/// Registry mapping (path, action, content type) to operations.
#[derive(Default)]
pub struct HandlerRegistry {
    /// path -> action -> content type -> operation
    paths: HashMap<String, HashMap<String, ContentTypes>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation handler.
    ///
    /// # Arguments
    ///
    /// * `path` - HTTP path the operation is served on
    /// * `action` - SOAP action
    /// * `content_type` - Local name of the body's child element
    /// * `factory` - Builds the request value the body is decoded into
    /// * `handler` - Handler taking (request, writer, http request parts)
    ///
    /// Registering the same triple again replaces the earlier operation.
    pub fn register<T, Fa, F, Fut>(
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
        self.register_operation(
            path,
            action,
            content_type,
            Box::new(TypedOperation::new(factory, handler)),
        );
    }

    /// Register a type-erased operation.
    pub fn register_operation(
        &mut self,
        path: &str,
        action: &str,
        content_type: &str,
        operation: Box<dyn Operation>,
    ) {
        let replaced = self
            .paths
            .entry(path.to_string())
            .or_default()
            .entry(action.to_string())
            .or_default()
            .insert(content_type.to_string(), operation);

        if replaced.is_some() {
            tracing::debug!(
                "replaced operation for path {:?}, action {:?}, content type {:?}",
                path,
                action,
                content_type
            );
        }
    }

    /// Look up an operation. Each level reports its own miss.
    pub fn resolve(
        &self,
        path: &str,
        action: &str,
        content_type: &str,
    ) -> Result<&dyn Operation, RegistryMiss> {
        let actions = self
            .paths
            .get(path)
            .ok_or_else(|| RegistryMiss::UnknownPath(path.to_string()))?;
        let content_types = actions
            .get(action)
            .ok_or_else(|| RegistryMiss::UnknownAction(action.to_string()))?;
        content_types
            .get(content_type)
            .map(|operation| operation.as_ref())
            .ok_or_else(|| RegistryMiss::UnknownContentType(content_type.to_string()))
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.paths
            .values()
            .flat_map(|actions| actions.values())
            .map(|content_types| content_types.len())
            .sum()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
