//! Echo service - a single SOAP 1.1 operation.
//!
//! This demo shows:
//! - Building a server with the fluent API
//! - Registering an operation with typed request and response
//! - Rejecting requests from a header validator
//!
//! # Trying it out
//!
//! ```sh
//! RUST_LOG=soapwire=debug cargo run --example echo
//!
//! curl -s http://127.0.0.1:8080/echo \
//!     -H 'SOAPAction: "Echo"' \
//!     -H 'Content-Type: text/xml' \
//!     -d '<Envelope><Header><Client>demo</Client></Header>
//!         <Body><EchoRequest><Message>hello</Message></EchoRequest></Body></Envelope>'
//! ```

use serde::{Deserialize, Serialize};
use soapwire::{EnvelopeRequest, LogConfig, Reply, Server, SoapVersion};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Input structure for the echo operation.
#[derive(Deserialize, Default, Debug)]
struct EchoRequest {
    #[serde(rename = "Message")]
    message: String,
}

/// Output structure for the echo operation.
#[derive(Serialize, Debug)]
struct EchoResponse {
    #[serde(rename = "Echo")]
    echo: String,
}

/// Only requests that name their client are served.
fn require_client(request: &EnvelopeRequest) -> Result<(), soapwire::BoxError> {
    match &request.header {
        Some(header) if header.as_str().contains("<Client>") => Ok(()),
        _ => Err("missing Client header".into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soapwire=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Server::builder()
        .soap_version(SoapVersion::V11)
        .log_config(LogConfig::verbose())
        .check_header(require_client)
        .handle(
            "/echo",
            "Echo",
            "EchoRequest",
            EchoRequest::default,
            |req: EchoRequest, _writer, _http| async move {
                Ok(Reply::new(EchoResponse { echo: req.message }))
            },
        )
        .build()
        .listen_and_serve("127.0.0.1:8080")
        .await?;

    Ok(())
}
