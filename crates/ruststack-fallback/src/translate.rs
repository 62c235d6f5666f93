//! Translation of raw backend responses into structured responses.

use ruststack_asf::parser::RESPONSE_METADATA;
use ruststack_asf::{OperationModel, ServiceException, ServiceResponse, parse_response};
use ruststack_core::HttpResponse;
use serde_json::Value;

/// Error code used when an error response carries none.
pub const UNKNOWN_ERROR_CODE: &str = "UnknownError";

/// Parse a backend response with the wire protocol of `operation`.
///
/// Error statuses (above 300) become a [`ServiceException`] built from the
/// parsed `Error.Code` and `Error.Message`. Successful responses lose their
/// `ResponseMetadata` member unless `include_metadata` is set.
///
/// # Errors
///
/// Returns the translated [`ServiceException`] for error responses, or an
/// `InternalFailure` if the body cannot be decoded.
pub fn translate_response(
    operation: &OperationModel,
    response: &HttpResponse,
    include_metadata: bool,
) -> Result<ServiceResponse, ServiceException> {
    let mut parsed = parse_response(operation, response)?;

    if response.is_error() {
        let error = parsed.get("Error").and_then(Value::as_object);
        let field = |name: &str| error.and_then(|e| e.get(name)).and_then(value_text);
        let code = field("Code").unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_owned());
        let message = field("Message").unwrap_or_default();
        return Err(ServiceException::new(code, message, response.status));
    }

    if !include_metadata {
        parsed.remove(RESPONSE_METADATA);
    }
    Ok(parsed)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
