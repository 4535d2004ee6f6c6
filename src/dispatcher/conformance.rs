//! HTTP/1.1 body and header rules for assembled responses.

use http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};

use crate::error::ServiceError;
use crate::server::Response;

/// Informational, `204 No Content` and `304 Not Modified` carry no body.
#[must_use]
pub fn is_content_allowed(status: u16) -> bool {
    !((100..200).contains(&status) || status == 204 || status == 304)
}

/// Fail with a specification violation when `response` breaks the rules:
/// no body, `Content-Type` or `Content-Length` on a bodiless status, and an
/// `Allow` header on every 405.
pub fn enforce(response: &Response) -> Result<(), ServiceError> {
    let status = response.status();
    if !is_content_allowed(status) {
        if response.has_body() {
            return Err(violation(format!("must not contain response body with status: {status}")));
        }
        if response.has_header(CONTENT_TYPE.as_str()) {
            return Err(violation(format!(
                "must not contain Content-Type header with status: {status}"
            )));
        }
        if response.has_header(CONTENT_LENGTH.as_str()) {
            return Err(violation(format!(
                "must not contain Content-Length header with status: {status}"
            )));
        }
    }
    if status == 405 && !response.has_header(ALLOW.as_str()) {
        return Err(violation("must contain Allow header with status: 405".to_string()));
    }
    Ok(())
}

fn violation(detail: String) -> ServiceError {
    ServiceError::specification_violation(format!("HTTP 1.1 specification: {detail}"))
}
