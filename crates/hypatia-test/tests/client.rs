//! The test client against the sample controllers.

use std::sync::Arc;

use http::StatusCode;
use hypatia_core::{fixtures, CancellationSignal, ConverterProvider, JsonConverter, TextConverter};
use hypatia_router::{ControllerDescriptionBuilder, DelegateMapper, DescriptionCache};
use hypatia_server::RequestHandler;
use hypatia_test::{TestClient, TestError};
use serde_json::json;

fn client() -> TestClient {
    let cache = DescriptionCache::new(ControllerDescriptionBuilder::new());
    let mut mapper = DelegateMapper::new(Arc::new(fixtures::factories()));
    for metadata in [
        fixtures::TestController::metadata(),
        fixtures::person_controller_metadata(),
        fixtures::ConcatController::metadata(2),
    ] {
        mapper.register(cache.get_or_build(&metadata).unwrap());
    }
    let converters = Arc::new(ConverterProvider::with_converters(vec![
        Arc::new(JsonConverter),
        Arc::new(TextConverter),
    ]));
    TestClient::new(RequestHandler::builder(Arc::new(mapper), converters).build())
}

#[tokio::test]
async fn query_builder_reaches_operation() {
    client()
        .get("/api/test/add")
        .query("operandA", "40")
        .query("operandB", "2")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!(42));
}

#[tokio::test]
async fn every_response_has_a_request_id() {
    let response = client().get("/api/test/nothing-here").send().await;

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_code("NO_MATCHING_ROUTE");
    assert!(response.request_id().is_some());
}

#[tokio::test]
async fn created_person_is_readable() {
    let client = client();

    client
        .post("http://example.com/api/person")
        .json(&json!({ "name": "Ada" }))
        .send()
        .await
        .assert_status(StatusCode::CREATED)
        .assert_header("location", "http://example.com/api/person/1")
        .assert_empty_body();

    client
        .get("/api/person/1")
        .accept("application/json")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("name", &json!("Ada"));
}

#[tokio::test]
async fn form_and_multipart_bodies_bind_to_fields() {
    let client = client();

    client
        .post("/api/concat/join")
        .form(&[("field0", "a"), ("field1", "b")])
        .accept("application/json")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!("a,b"));

    client
        .post("/api/concat/join")
        .multipart(&[("", "x"), ("", "y")])
        .accept("application/json")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!("x,y"));
}

#[tokio::test]
async fn default_headers_are_sent() {
    client()
        .with_default_header("X-Client", "suite")
        .get("/api/test/echo")
        .send()
        .await
        .assert_status(StatusCode::NO_CONTENT)
        .assert_header("x-echo", "suite");
}

#[tokio::test]
async fn cancelled_request_answers_499() {
    let signal = CancellationSignal::new();
    signal.cancel();

    client()
        .get("/api/test/add?operandA=1&operandB=2")
        .cancellation(signal)
        .send()
        .await
        .assert_status_code(499)
        .assert_error_code("REQUEST_CANCELLED");
}

#[tokio::test]
async fn invalid_header_is_a_build_error() {
    let result = client().get("/api/test/add").header("bad header", "x").try_send().await;
    assert!(matches!(result, Err(TestError::InvalidHeader(_))));
}
