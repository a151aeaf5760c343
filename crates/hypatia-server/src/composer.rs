//! Turning invocation results into responses.
//!
//! | Operation | Result | Response |
//! |-----------|--------|----------|
//! | `Create` | `true` | 201, `Location` of the new entity |
//! | `Update`, `Delete` | `true` | 204 |
//! | `Create`, `Update`, `Delete` | `false` | 409 |
//! | `Create`, `Update`, `Delete` | `null` | 404 |
//! | `Get` | `null` | 404 |
//! | any other | no body value, or only `null` | 204 |
//! | any other | one body value | 200, body from the output converter |
//! | any other | several body values | 200, JSON array of them |
//!
//! Results bound to headers are written as headers in every case. When the
//! controller populated the response itself, nothing else is touched.

use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use hypatia_core::{ConverterProvider, CrudRole, Invocation, ResponseInfo, ResultTarget, TypeDescriptor};
use hypatia_router::{OperationInfo, RequestMapping, ResultInfo};
use hypatia_url::Url;
use serde_json::Value;

use crate::error::PipelineError;

/// Writes invocation results into a [`ResponseInfo`].
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    converters: Arc<ConverterProvider>,
}

impl ResponseComposer {
    /// Creates a composer that writes bodies with `converters`.
    #[must_use]
    pub fn new(converters: Arc<ConverterProvider>) -> Self {
        Self { converters }
    }

    /// Answers an `OPTIONS` request: 200, empty body, `Allow` listing `allow`.
    pub fn compose_options(&self, allow: &[Method], response: &mut ResponseInfo) {
        let verbs = allow.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
        if let Ok(value) = HeaderValue::from_str(&verbs) {
            response.headers_mut().insert(ALLOW, value);
        }
        response.write_status(StatusCode::OK);
    }

    /// Composes the response for an invoked operation.
    pub async fn compose(
        &self,
        mapping: &RequestMapping,
        operation: &OperationInfo,
        invocation: &Invocation,
        response: &mut ResponseInfo,
    ) -> Result<(), PipelineError> {
        write_header_results(operation, invocation, response);

        if response.is_populated() {
            tracing::debug!(
                operation = operation.method_name(),
                status = response.status().as_u16(),
                "controller populated its own response"
            );
            return Ok(());
        }

        match operation.role() {
            Some(CrudRole::Create) => return compose_create(mapping, operation, invocation, response),
            Some(role @ (CrudRole::Update | CrudRole::Delete)) => {
                let status = write_outcome(operation, invocation.result(), StatusCode::NO_CONTENT)?;
                tracing::debug!(role = ?role, status = status.as_u16(), "composed write outcome");
                response.write_status(status);
                return Ok(());
            }
            Some(CrudRole::Get) if invocation.result().is_null() => {
                response.write_status(StatusCode::NOT_FOUND);
                return Ok(());
            }
            _ => {}
        }

        let bodies: Vec<(&TypeDescriptor, &Value)> = operation
            .results()
            .iter()
            .filter(|result| matches!(result.target(), ResultTarget::Body))
            .filter_map(|result| result_value(result, invocation).map(|value| (result.ty(), value)))
            .collect();

        if bodies.iter().all(|(_, value)| value.is_null()) {
            response.write_status(StatusCode::NO_CONTENT);
            return Ok(());
        }

        let (ty, value) = match bodies.as_slice() {
            [(ty, value)] => ((*ty).clone(), (*value).clone()),
            several => (
                TypeDescriptor::Tuple(several.iter().map(|(ty, _)| (*ty).clone()).collect()),
                Value::Array(several.iter().map(|(_, value)| (*value).clone()).collect()),
            ),
        };

        let converter = self.converters.find_best_output_converter(&ty, response)?;
        converter.convert_from(&ty, &value, response).await?;
        response.write_status(StatusCode::OK);
        Ok(())
    }
}

fn result_value<'a>(result: &ResultInfo, invocation: &'a Invocation) -> Option<&'a Value> {
    match result.name() {
        None => Some(invocation.result()),
        Some(name) => invocation.output(name),
    }
}

fn header_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn write_header_results(operation: &OperationInfo, invocation: &Invocation, response: &mut ResponseInfo) {
    for result in operation.results() {
        let ResultTarget::Header(header) = result.target() else {
            continue;
        };
        let Some(value) = result_value(result, invocation).filter(|value| !value.is_null()) else {
            continue;
        };
        if !response.set_header(header, &header_text(value)) {
            tracing::warn!(
                operation = operation.method_name(),
                header = header.as_str(),
                "result is not a valid header value"
            );
        }
    }
}

fn write_outcome(
    operation: &OperationInfo,
    outcome: &Value,
    done: StatusCode,
) -> Result<StatusCode, PipelineError> {
    match outcome {
        Value::Bool(true) => Ok(done),
        Value::Bool(false) => Ok(StatusCode::CONFLICT),
        Value::Null => Ok(StatusCode::NOT_FOUND),
        other => Err(PipelineError::InvalidResult {
            operation: format!("{}.{}", operation.controller(), operation.method_name()),
            reason: format!("expected true, false or null, got {other}"),
        }),
    }
}

fn compose_create(
    mapping: &RequestMapping,
    operation: &OperationInfo,
    invocation: &Invocation,
    response: &mut ResponseInfo,
) -> Result<(), PipelineError> {
    let status = write_outcome(operation, invocation.result(), StatusCode::CREATED)?;
    response.write_status(status);
    if status != StatusCode::CREATED {
        return Ok(());
    }

    match created_location(mapping, invocation, response.request().url()) {
        Some(location) => {
            if !response.set_header("location", &location) {
                tracing::warn!(location = %location, "created location is not a valid header value");
            }
        }
        None => tracing::warn!(
            controller = operation.controller(),
            "created entity has no readable location"
        ),
    }
    Ok(())
}

/// Expands the sibling `Get` template with the new id and the request's
/// route values.
fn created_location(mapping: &RequestMapping, invocation: &Invocation, request_url: &Url) -> Option<String> {
    let get = mapping.controller().operation_for(CrudRole::Get)?;
    let id = invocation.output("id").filter(|id| !id.is_null())?;

    let path = get.template().expand(|name| {
        if name.eq_ignore_ascii_case("id") {
            return Some(header_text(id));
        }
        mapping
            .constructor_args()
            .iter()
            .find(|(arg, _)| arg.eq_ignore_ascii_case(name))
            .map(|(_, value)| header_text(value))
            .or_else(|| mapping.route_values().get(name).map(str::to_string))
    });

    Some(match request_url {
        Url::Http(http) => format!("{}{path}", http.base()),
        _ => path,
    })
}
