//! Integration tests for soapwire.
//!
//! These drive the HTTP surface end to end through the axum router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use soapwire::codec::{EnvelopeCodec, XmlCodec};
use soapwire::envelope::{NAMESPACE_SOAP11, NAMESPACE_SOAP12};
use soapwire::handler::HandlerResult;
use soapwire::writer::{XML_DECLARATION, XML_DECLARATION_LEN};
use soapwire::{
    EnvelopeRequest, Fault, Payload, Reply, ResponseWriter, Server, ServerBuilder, SoapVersion,
};
use tower::ServiceExt;

#[derive(Deserialize, Default, Debug, PartialEq)]
struct DoThingRequest {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Count", default)]
    count: u32,
}

#[derive(Serialize)]
struct DoThingResponse {
    #[serde(rename = "Greeting")]
    greeting: String,
}

#[derive(Deserialize, Default, Debug)]
struct Empty {}

#[derive(Deserialize, Debug)]
struct Credentials {
    #[serde(rename = "User")]
    user: String,
}

fn envelope(header: &str, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\
         <soap:Envelope xmlns:soap=\"{NAMESPACE_SOAP11}\">\
         <soap:Header>{header}</soap:Header>\
         <soap:Body>{body}</soap:Body>\
         </soap:Envelope>"
    )
}

fn post(path: &str, action: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("SOAPAction", action)
        .header("Content-Type", "text/xml")
        .body(Body::from(body))
        .unwrap()
}

/// Builder with the `DoThing` operation; `calls` counts handler invocations.
fn builder(calls: Arc<AtomicUsize>) -> ServerBuilder {
    Server::builder().handle(
        "/svc",
        "DoThing",
        "DoThingRequest",
        DoThingRequest::default,
        move |req: DoThingRequest, _writer, _http| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Reply::new(DoThingResponse {
                    greeting: format!("hello {} x{}", req.name, req.count),
                }))
            }
        },
    )
}

async fn locked() -> HandlerResult {
    Err("account is locked".into())
}

async fn over_quota() -> HandlerResult {
    Err(Fault::new("quota exceeded")
        .with_code("soap:Client")
        .with_detail("limit 10")
        .into())
}

async fn partial_then_fail(writer: ResponseWriter) -> HandlerResult {
    writer.write(b"<partial/>");
    Err("late failure".into())
}

async fn send(server: Server, request: Request<Body>) -> Response {
    server.into_router().oneshot(request).await.unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Decode a response document and return its fault, if any.
fn response_fault(body: &str) -> Option<Fault> {
    let xml = body.strip_prefix(std::str::from_utf8(XML_DECLARATION).unwrap())?;
    let mut envelope = EnvelopeRequest::probe();
    XmlCodec
        .unmarshal(xml.as_bytes(), &mut envelope, SoapVersion::V11)
        .unwrap();
    envelope.body.fault().cloned()
}

async fn fault_message(response: Response) -> String {
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    response_fault(&body)
        .expect("response should carry a fault")
        .message()
        .to_string()
}

#[tokio::test]
async fn test_registered_operation_is_invoked() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = builder(calls.clone()).build();

    let request = post(
        "/svc",
        "DoThing",
        envelope(
            "",
            "<DoThingRequest><Name>widget</Name><Count>2</Count></DoThingRequest>",
        ),
    );
    let response = send(server, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        SoapVersion::V11.content_type()
    );
    let content_length: usize = response.headers()[CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let body = body_string(response).await;
    assert_eq!(content_length, body.len());
    assert!(body.starts_with(std::str::from_utf8(XML_DECLARATION).unwrap()));

    let expected = XmlCodec
        .marshal(
            &soapwire::Envelope::response(
                Some(Payload::from_xml(
                    "<DoThingResponse><Greeting>hello widget x2</Greeting></DoThingResponse>",
                )),
                None,
            ),
            SoapVersion::V11,
        )
        .unwrap();
    assert_eq!(content_length, expected.len() + XML_DECLARATION_LEN);
    assert_eq!(&body.as_bytes()[XML_DECLARATION_LEN..], &expected[..]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_action_fault() {
    let calls = Arc::new(AtomicUsize::new(0));
    let request = post(
        "/svc",
        "Bogus",
        envelope("", "<DoThingRequest><Name>x</Name></DoThingRequest>"),
    );
    let response = send(builder(calls.clone()).build(), request).await;

    assert_eq!(fault_message(response).await, "unknown action \"Bogus\"");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_path_fault() {
    let request = post(
        "/elsewhere",
        "DoThing",
        envelope("", "<DoThingRequest/>"),
    );
    let response = send(builder(Arc::default()).build(), request).await;

    assert_eq!(fault_message(response).await, "unknown path \"/elsewhere\"");
}

#[tokio::test]
async fn test_unknown_content_type_fault() {
    let request = post("/svc", "DoThing", envelope("", "<SomethingElse/>"));
    let response = send(builder(Arc::default()).build(), request).await;

    assert_eq!(
        fault_message(response).await,
        "no action handler for content type: \"SomethingElse\""
    );
}

#[tokio::test]
async fn test_fault_body_with_structured_detail_is_routed() {
    let request = post(
        "/svc",
        "DoThing",
        envelope(
            "",
            "<Fault><faultcode>c</faultcode><faultstring>s</faultstring>\
             <detail><x>1</x></detail></Fault>",
        ),
    );
    let response = send(builder(Arc::default()).build(), request).await;

    assert_eq!(
        fault_message(response).await,
        "no action handler for content type: \"\""
    );
}

#[tokio::test]
async fn test_get_requires_post() {
    let request = Request::builder()
        .method("GET")
        .uri("/svc")
        .body(Body::empty())
        .unwrap();
    let response = send(builder(Arc::default()).build(), request).await;

    assert_eq!(
        fault_message(response).await,
        "this is a soap service - you have to POST soap requests"
    );
}

#[tokio::test]
async fn test_multiple_body_elements_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    let request = post("/svc", "DoThing", envelope("", "<A/><B/>"));
    let response = send(builder(calls.clone()).build(), request).await;

    let message = fault_message(response).await;
    assert!(message.starts_with("could not probe soap body content:: "));
    assert!(message.contains("found multiple elements inside SOAP body"));
    assert!(message.contains("not wrapped-document/literal WS-I compliant"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_xml_fault() {
    let request = post(
        "/svc",
        "DoThing",
        "<soap:Envelope><soap:Body><DoThingRequest></soap:Body>".to_string(),
    );
    let response = send(builder(Arc::default()).build(), request).await;

    assert!(fault_message(response)
        .await
        .starts_with("could not probe soap body content:: "));
}

#[tokio::test]
async fn test_full_decode_failure_fault() {
    let calls = Arc::new(AtomicUsize::new(0));
    let request = post(
        "/svc",
        "DoThing",
        envelope("", "<DoThingRequest><Count>lots</Count></DoThingRequest>"),
    );
    let response = send(builder(calls.clone()).build(), request).await;

    assert!(fault_message(response)
        .await
        .starts_with("could not unmarshal request:: "));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_header_validator_rejects() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = builder(calls.clone())
        .check_header(|_request| Err("invalid MultiSpeak header".into()))
        .build();

    let request = post(
        "/svc",
        "DoThing",
        envelope("", "<DoThingRequest><Name>x</Name></DoThingRequest>"),
    );
    let response = send(server, request).await;

    assert_eq!(fault_message(response).await, "invalid MultiSpeak header");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_header_validator_sees_decoded_envelope() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = builder(calls.clone())
        .check_header(|request: &EnvelopeRequest| {
            let body = request
                .body
                .content_as::<DoThingRequest>()
                .ok_or("body not decoded")?;
            let header = request.header.as_ref().ok_or("missing header")?;
            let credentials: Credentials = header.decode()?;
            if credentials.user == body.name {
                Ok(())
            } else {
                Err(format!("user {} may not act for {}", credentials.user, body.name).into())
            }
        })
        .build();
    let router = server.into_router();

    let ok = post(
        "/svc",
        "DoThing",
        envelope(
            "<Credentials><User>ann</User></Credentials>",
            "<DoThingRequest><Name>ann</Name></DoThingRequest>",
        ),
    );
    let response = router.clone().oneshot(ok).await.unwrap();
    assert!(response_fault(&body_string(response).await).is_none());

    let denied = post(
        "/svc",
        "DoThing",
        envelope(
            "<Credentials><User>bob</User></Credentials>",
            "<DoThingRequest><Name>ann</Name></DoThingRequest>",
        ),
    );
    let response = router.oneshot(denied).await.unwrap();
    assert_eq!(fault_message(response).await, "user bob may not act for ann");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_error_message_is_fault_string() {
    let server = Server::builder()
        .handle(
            "/svc",
            "Fail",
            "FailRequest",
            Empty::default,
            |_: Empty, _writer, _http| locked(),
        )
        .build();

    let request = post("/svc", "Fail", envelope("", "<FailRequest/>"));
    let response = send(server, request).await;

    assert_eq!(fault_message(response).await, "account is locked");
}

#[tokio::test]
async fn test_handler_fault_is_sent_as_is() {
    let server = Server::builder()
        .handle(
            "/svc",
            "Fail",
            "FailRequest",
            Empty::default,
            |_: Empty, _writer, _http| over_quota(),
        )
        .build();

    let request = post("/svc", "Fail", envelope("", "<FailRequest/>"));
    let response = send(server, request).await;
    let fault = response_fault(&body_string(response).await).unwrap();

    assert_eq!(fault.message(), "quota exceeded");
    assert_eq!(fault.code.as_deref(), Some("soap:Client"));
    assert_eq!(fault.detail.as_deref(), Some("limit 10"));
}

#[tokio::test]
async fn test_handler_writing_directly_is_not_encoded_again() {
    let server = Server::builder()
        .handle(
            "/svc",
            "Raw",
            "RawRequest",
            Empty::default,
            |_: Empty, writer: ResponseWriter, _http| async move {
                writer.set_content_type("text/xml");
                writer.write(b"<custom/>");
                Ok(Reply::new(DoThingResponse {
                    greeting: "ignored".into(),
                }))
            },
        )
        .build();

    let request = post("/svc", "Raw", envelope("", "<RawRequest/>"));
    let response = send(server, request).await;

    assert_eq!(response.headers()[CONTENT_TYPE], "text/xml");
    let body = body_string(response).await;
    assert_eq!(
        body,
        format!("{}<custom/>", std::str::from_utf8(XML_DECLARATION).unwrap())
    );
    assert_eq!(body.matches("<?xml").count(), 1);
}

#[tokio::test]
async fn test_handler_error_after_direct_write_keeps_output() {
    let server = Server::builder()
        .handle(
            "/svc",
            "Raw",
            "RawRequest",
            Empty::default,
            |_: Empty, writer, _http| partial_then_fail(writer),
        )
        .build();

    let request = post("/svc", "Raw", envelope("", "<RawRequest/>"));
    let body = body_string(send(server, request).await).await;

    assert!(body.ends_with("<partial/>"));
    assert!(!body.contains("late failure"));
}

#[tokio::test]
async fn test_handler_receives_http_request() {
    let server = Server::builder()
        .handle(
            "/svc",
            "Who",
            "WhoRequest",
            Empty::default,
            |_: Empty, _writer, http: Arc<axum::http::request::Parts>| async move {
                let agent = http
                    .headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Ok(Reply::raw(Payload::from_xml(format!("<Agent>{agent}</Agent>"))))
            },
        )
        .build();

    let mut request = post("/svc", "Who", envelope("", "<WhoRequest/>"));
    request
        .headers_mut()
        .insert("user-agent", "probe/1.0".parse().unwrap());
    let body = body_string(send(server, request).await).await;

    assert!(body.contains("<soap:Body><Agent>probe/1.0</Agent></soap:Body>"));
}

#[tokio::test]
async fn test_soap12_changes_content_type_and_namespace() {
    let request = || post("/svc", "DoThing", envelope("", "<DoThingRequest/>"));

    let response = send(builder(Arc::default()).build(), request()).await;
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "text/xml; charset=\"utf-8\""
    );
    let body = body_string(response).await;
    assert!(body.contains(NAMESPACE_SOAP11));

    let mut server = builder(Arc::default()).build();
    server.use_soap12();
    let response = send(server, request()).await;
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/soap+xml; charset=\"utf-8\""
    );
    let body = body_string(response).await;
    assert!(body.contains(NAMESPACE_SOAP12));
    assert!(!body.contains(NAMESPACE_SOAP11));
}

#[tokio::test]
async fn test_fault_reply_has_content_length() {
    let request = post("/svc", "Bogus", envelope("", "<DoThingRequest/>"));
    let response = send(builder(Arc::default()).build(), request).await;

    let content_length: usize = response.headers()[CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let body = body_string(response).await;
    assert_eq!(content_length, body.len());
}
