//! Requests through the full pipeline, from mapping to rendered response.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Response, StatusCode};
use hypatia_core::{
    fixtures, CancellationSignal, ConverterProvider, JsonConverter, RequestInfo, ResponseInfo,
};
use hypatia_router::{ControllerDescriptionBuilder, DelegateMapper, DescriptionCache};
use hypatia_server::{
    PostRequestHandler, PreRequestHandler, PreRequestOutcome, RequestHandler, RequestHandlerBuilder,
    REQUEST_ID_HEADER,
};
use hypatia_url::UrlParserRegistry;
use serde_json::{json, Value};

fn builder() -> RequestHandlerBuilder {
    let cache = DescriptionCache::new(ControllerDescriptionBuilder::new());
    let mut mapper = DelegateMapper::new(Arc::new(fixtures::factories()));
    for metadata in [
        fixtures::TestController::metadata(),
        fixtures::person_controller_metadata(),
        fixtures::AddressController::metadata(),
    ] {
        mapper.register(cache.get_or_build(&metadata).unwrap());
    }
    let converters = Arc::new(ConverterProvider::with_converters(vec![Arc::new(JsonConverter)]));
    RequestHandler::builder(Arc::new(mapper), converters)
}

fn request(method: Method, url: &str) -> RequestInfo {
    RequestInfo::new(method, UrlParserRegistry::with_defaults().parse(url).unwrap())
}

fn json_request(method: Method, url: &str, body: &Value) -> RequestInfo {
    request(method, url)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
}

fn body_json(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn query_arguments_reach_the_operation() {
    let handler = builder().build();

    let response = handler.handle(request(Method::GET, "/api/test/add?operandA=1&operandB=2")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"3");
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn json_body_is_bound() {
    let handler = builder().build();

    let response = handler
        .handle(json_request(Method::POST, "/api/test/sum", &json!([1, 2, 3])))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!(6));
}

#[tokio::test]
async fn missing_argument_renders_error_envelope() {
    let handler = builder().build();
    let request = request(Method::GET, "/api/test/add?operandA=1");
    let request_id = request.request_id();

    let response = handler.handle(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(&response);
    assert_eq!(body["error"]["code"], "MISSING_PARAMETER");
    assert_eq!(body["error"]["category"], "validation");
    assert_eq!(body["request_id"], request_id.to_string());
    assert_eq!(response.headers()[REQUEST_ID_HEADER], request_id.to_string().as_str());
}

#[tokio::test]
async fn crud_conventions() {
    let handler = builder().build();
    let ada = json!({ "name": "Ada" });

    let created = handler
        .handle(json_request(Method::POST, "http://example.com/api/person", &ada))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.headers()["location"], "http://example.com/api/person/1");
    assert!(created.body().is_empty());

    let conflict = handler
        .handle(json_request(Method::POST, "/api/person", &ada))
        .await;
    assert_eq!(conflict.status(), StatusCode::CONFLICT);

    let fetched = handler.handle(request(Method::GET, "/api/person/1")).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(body_json(&fetched), ada);

    let listed = handler.handle(request(Method::GET, "/api/person")).await;
    assert_eq!(body_json(&listed), json!([ada]));

    let missing = handler.handle(request(Method::GET, "/api/person/9")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let updated = handler
        .handle(json_request(Method::PUT, "/api/person/1", &json!({ "name": "Ada L." })))
        .await;
    assert_eq!(updated.status(), StatusCode::NO_CONTENT);

    let update_missing = handler
        .handle(json_request(Method::PUT, "/api/person/9", &ada))
        .await;
    assert_eq!(update_missing.status(), StatusCode::NOT_FOUND);

    let deleted = handler.handle(request(Method::DELETE, "/api/person/1")).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = handler.handle(request(Method::DELETE, "/api/person/1")).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn relative_request_gets_relative_location() {
    let handler = builder().build();

    let created = handler
        .handle(json_request(Method::POST, "/api/person", &json!({ "name": "Grace" })))
        .await;

    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.headers()["location"], "/api/person/1");
}

#[tokio::test]
async fn options_lists_allowed_verbs() {
    let handler = builder().build();

    let response = handler.handle(request(Method::OPTIONS, "/api/person")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().is_empty());
    assert_eq!(response.headers()["allow"], "GET, POST, PUT, DELETE, OPTIONS");

    // an item route lists the same verbs as the collection
    let response = handler.handle(request(Method::OPTIONS, "/api/person/7")).await;
    assert_eq!(response.headers()["allow"], "GET, POST, PUT, DELETE, OPTIONS");
}

#[tokio::test]
async fn header_results_without_body_give_no_content() {
    let handler = builder().build();

    let response = handler
        .handle(request(Method::GET, "/api/test/echo").with_header("X-Client", "suite"))
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["x-echo"], "suite");
}

#[tokio::test]
async fn controller_route_values_become_constructor_arguments() {
    let handler = builder().build();

    let response = handler.handle(request(Method::GET, "/api/person/7/address")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!(["person 7 main street"]));
}

#[tokio::test]
async fn operation_failure_hides_details() {
    let response = builder().build().handle(request(Method::GET, "/api/test/fail")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(&response);
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert!(!body["error"]["message"].as_str().unwrap().contains("operation failed"));

    let exposed = builder()
        .expose_internal_errors(true)
        .build()
        .handle(request(Method::GET, "/api/test/fail"))
        .await;
    let body = body_json(&exposed);
    assert!(body["error"]["message"].as_str().unwrap().contains("operation failed"));
}

#[tokio::test]
async fn unmatched_request_is_distinguishable() {
    let handler = builder().build();

    let err = handler
        .process(Arc::new(request(Method::GET, "/nowhere")))
        .await
        .unwrap_err();
    assert!(err.is_no_matching_route());

    let response = handler.handle(request(Method::GET, "/nowhere")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(&response)["error"]["code"], "NO_MATCHING_ROUTE");
}

#[tokio::test]
async fn cancelled_request_is_not_invoked() {
    let handler = builder().build();
    let signal = CancellationSignal::new();
    signal.cancel();

    let response = handler
        .handle(request(Method::GET, "/api/test/add?operandA=1&operandB=2").with_cancellation(signal))
        .await;

    assert_eq!(response.status().as_u16(), 499);
    assert_eq!(body_json(&response)["error"]["code"], "REQUEST_CANCELLED");
}

#[derive(Debug)]
struct RequireApiKey;

#[async_trait]
impl PreRequestHandler for RequireApiKey {
    fn name(&self) -> &str {
        "require-api-key"
    }

    async fn handle(&self, request: &Arc<RequestInfo>) -> anyhow::Result<PreRequestOutcome> {
        if request.header("x-api-key").is_some() {
            return Ok(PreRequestOutcome::Continue);
        }
        let mut response = ResponseInfo::new(Arc::clone(request));
        response.set_status(StatusCode::UNAUTHORIZED);
        Ok(PreRequestOutcome::Respond(response))
    }
}

#[derive(Debug)]
struct Broken;

#[async_trait]
impl PreRequestHandler for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    async fn handle(&self, _request: &Arc<RequestInfo>) -> anyhow::Result<PreRequestOutcome> {
        anyhow::bail!("handler state lost")
    }
}

#[derive(Debug)]
struct PoweredBy;

#[async_trait]
impl PostRequestHandler for PoweredBy {
    fn name(&self) -> &str {
        "powered-by"
    }

    async fn handle(&self, response: &mut ResponseInfo) -> anyhow::Result<()> {
        response.set_header("x-powered-by", "hypatia");
        Ok(())
    }
}

#[tokio::test]
async fn pre_request_handler_can_answer() {
    let handler = builder().pre_handler(Arc::new(RequireApiKey)).build();
    let url = "/api/test/add?operandA=1&operandB=2";

    let rejected = handler.handle(request(Method::GET, url)).await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let accepted = handler
        .handle(request(Method::GET, url).with_header("x-api-key", "secret"))
        .await;
    assert_eq!(accepted.status(), StatusCode::OK);
}

#[tokio::test]
async fn failing_pre_request_handler_is_internal_error() {
    let handler = builder().pre_handler(Arc::new(Broken)).build();

    let response = handler.handle(request(Method::GET, "/api/test/add?operandA=1&operandB=2")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn post_request_handler_sees_composed_response() {
    let handler = builder().post_handler(Arc::new(PoweredBy)).build();

    let response = handler.handle(request(Method::GET, "/api/test/add?operandA=1&operandB=2")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-powered-by"], "hypatia");
}

#[tokio::test]
async fn raw_http_requests_are_parsed() {
    let handler = builder().build();
    let incoming = hypatia_core::RequestId::new();

    let request = http::Request::builder()
        .method(Method::GET)
        .uri("/api/test/add?operandA=2&operandB=5")
        .header(REQUEST_ID_HEADER, incoming.to_string())
        .body(Bytes::new())
        .unwrap();
    let response = handler.handle_http(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"7");
    assert_eq!(response.headers()[REQUEST_ID_HEADER], incoming.to_string().as_str());
}
