use serde::Serialize;
use serde_json::{json, Value};
use std::borrow::Cow;

use crate::error::ErrorKind;
use crate::server::{Body, Response};

/// Shapes a response into the value handed to a codec.
pub trait ResponseWrapper: Send + Sync {
    /// Value to serialize. `Value::Null` means there is nothing to write
    /// unless [`ResponseWrapper::adds_body_content`] says otherwise.
    fn wrap<'a>(&self, response: &'a Response) -> Cow<'a, Value>;

    /// True when the wrapper produces a body even if the handler set none.
    fn adds_body_content(&self, response: &Response) -> bool;
}

fn body_value(response: &Response) -> Cow<'_, Value> {
    match response.body() {
        Body::Empty => Cow::Owned(Value::Null),
        Body::Value(v) => Cow::Borrowed(v),
        Body::Raw(bytes) => Cow::Owned(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

/// Body as-is. On error the error message replaces the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawResponseWrapper;

impl ResponseWrapper for RawResponseWrapper {
    fn wrap<'a>(&self, response: &'a Response) -> Cow<'a, Value> {
        match response.error() {
            Some(err) => Cow::Owned(Value::String(err.message().to_string())),
            None => body_value(response),
        }
    }

    fn adds_body_content(&self, _response: &Response) -> bool {
        false
    }
}

/// JSend-style envelope: `{code, status, message, data}`.
///
/// `status` is `success` for 1xx to 3xx, `error` for client errors and typed
/// service failures, and `fail` for 5xx and unclassified failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsendResponseWrapper;

impl ResponseWrapper for JsendResponseWrapper {
    fn wrap<'a>(&self, response: &'a Response) -> Cow<'a, Value> {
        let code = response.status();
        if let Some(err) = response.error() {
            let status = if err.kind() == ErrorKind::Internal {
                "fail"
            } else {
                "error"
            };
            return Cow::Owned(json!({
                "code": code,
                "status": status,
                "message": err.message(),
                "data": err.kind().name(),
            }));
        }
        let status = match code {
            400..=499 => "error",
            500..=599 => "fail",
            _ => "success",
        };
        Cow::Owned(json!({
            "code": code,
            "status": status,
            "message": Value::Null,
            "data": body_value(response).into_owned(),
        }))
    }

    fn adds_body_content(&self, _response: &Response) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope<'a> {
    error_id: String,
    http_status: u16,
    message: Option<&'a str>,
    error_type: Option<&'static str>,
}

/// Passes successful bodies through and replaces failures with
/// `{errorId, httpStatus, message, errorType}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponseWrapper;

impl ResponseWrapper for ErrorResponseWrapper {
    fn wrap<'a>(&self, response: &'a Response) -> Cow<'a, Value> {
        if !self.adds_body_content(response) {
            return body_value(response);
        }
        let envelope = match response.error() {
            Some(err) => ErrorEnvelope {
                error_id: err.id().to_string(),
                http_status: response.status(),
                message: Some(err.message()),
                error_type: Some(err.kind().name()),
            },
            None => ErrorEnvelope {
                error_id: ulid::Ulid::new().to_string(),
                http_status: response.status(),
                message: None,
                error_type: None,
            },
        };
        Cow::Owned(serde_json::to_value(envelope).unwrap_or(Value::Null))
    }

    fn adds_body_content(&self, response: &Response) -> bool {
        response.has_error() || (400..600).contains(&response.status())
    }
}
