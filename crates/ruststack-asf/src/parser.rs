//! Response parsing: decoding an HTTP response into a structured response.
//!
//! The parsed shape follows the conventions AWS SDKs use:
//!
//! - success bodies become a map of output members;
//! - error bodies become `{"Error": {"Code": ..., "Message": ...}}`, whatever
//!   the protocol's native error encoding;
//! - every response carries a `ResponseMetadata` member with the request id,
//!   status code and headers.
//!
//! A `Code` or `Message` the body does not provide is left out, so callers
//! can apply their own defaults.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};

use ruststack_core::HttpResponse;

use crate::context::ServiceResponse;
use crate::error::ServiceException;
use crate::model::{OperationModel, Protocol};

/// Name of the metadata member added to every parsed response.
pub const RESPONSE_METADATA: &str = "ResponseMetadata";

/// Parse `response` according to the wire protocol of `operation`.
///
/// # Errors
///
/// Returns an `InternalFailure` exception if a success response body cannot
/// be decoded. Undecodable error bodies are reported as a generic error
/// shape keyed by the status code instead.
pub fn parse_response(
    operation: &OperationModel,
    response: &HttpResponse,
) -> Result<ServiceResponse, ServiceException> {
    let protocol = operation.protocol();
    let (mut parsed, body_request_id) = if protocol.is_xml() {
        parse_xml_body(operation, protocol, response)?
    } else {
        (parse_json_body(response)?, None)
    };

    let request_id = header_str(response, "x-amzn-requestid")
        .or_else(|| header_str(response, "x-amz-request-id"))
        .map(str::to_owned)
        .or(body_request_id);
    parsed.insert(
        RESPONSE_METADATA.to_owned(),
        response_metadata(response, request_id),
    );
    Ok(parsed)
}

fn response_metadata(response: &HttpResponse, request_id: Option<String>) -> Value {
    let mut headers = Map::new();
    for (name, value) in &response.headers {
        headers.insert(
            name.as_str().to_owned(),
            Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
        );
    }

    let mut metadata = Map::new();
    if let Some(id) = request_id {
        metadata.insert("RequestId".to_owned(), Value::String(id));
    }
    metadata.insert(
        "HTTPStatusCode".to_owned(),
        Value::from(response.status.as_u16()),
    );
    metadata.insert("HTTPHeaders".to_owned(), Value::Object(headers));
    metadata.insert("RetryAttempts".to_owned(), Value::from(0));
    Value::Object(metadata)
}

fn header_str<'a>(response: &'a HttpResponse, name: &str) -> Option<&'a str> {
    response.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Error shape used when an error body cannot be decoded at all.
fn generic_error(response: &HttpResponse) -> ServiceResponse {
    let mut error = Map::new();
    error.insert(
        "Code".to_owned(),
        Value::String(response.status.as_u16().to_string()),
    );
    error.insert(
        "Message".to_owned(),
        Value::String(
            response
                .status
                .canonical_reason()
                .unwrap_or_default()
                .to_owned(),
        ),
    );
    let mut parsed = Map::new();
    parsed.insert("Error".to_owned(), Value::Object(error));
    parsed
}

// ---------------------------------------------------------------------------
// JSON protocols
// ---------------------------------------------------------------------------

fn parse_json_body(response: &HttpResponse) -> Result<ServiceResponse, ServiceException> {
    let body = if response.body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(&response.body) {
            Ok(Value::Object(map)) => map,
            Ok(_) if response.is_error() => return Ok(generic_error(response)),
            Err(_) if response.is_error() => return Ok(generic_error(response)),
            Ok(_) => {
                return Err(ServiceException::internal_failure(
                    "expected a JSON object in response body",
                ));
            }
            Err(e) => {
                return Err(ServiceException::internal_failure(
                    "failed to parse JSON response body",
                )
                .with_source(e));
            }
        }
    };

    if !response.is_error() {
        return Ok(body);
    }
    Ok(json_error_shape(response, body))
}

/// Normalize a JSON error body into the `Error` shape.
fn json_error_shape(response: &HttpResponse, mut body: ServiceResponse) -> ServiceResponse {
    if matches!(body.get("Error"), Some(Value::Object(_))) {
        return body;
    }

    let code = body
        .remove("__type")
        .and_then(|v| v.as_str().map(str::to_owned))
        .or_else(|| ["code", "Code"].iter().find_map(|k| string_member(&body, k)))
        .map(|t| t.rsplit('#').next().unwrap_or_default().to_owned())
        .or_else(|| {
            header_str(response, "x-amzn-errortype")
                .map(|t| t.split(':').next().unwrap_or_default().to_owned())
        });
    let message = ["message", "Message"]
        .iter()
        .find_map(|k| string_member(&body, k));

    let mut error = Map::new();
    if let Some(code) = code.filter(|c| !c.is_empty()) {
        error.insert("Code".to_owned(), Value::String(code));
    }
    if let Some(message) = message {
        error.insert("Message".to_owned(), Value::String(message));
    }
    body.insert("Error".to_owned(), Value::Object(error));
    body
}

fn string_member(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_owned)
}

// ---------------------------------------------------------------------------
// XML protocols
// ---------------------------------------------------------------------------

fn parse_xml_body(
    operation: &OperationModel,
    protocol: Protocol,
    response: &HttpResponse,
) -> Result<(ServiceResponse, Option<String>), ServiceException> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        let parsed = if response.is_error() {
            generic_error(response)
        } else {
            Map::new()
        };
        return Ok((parsed, None));
    }

    let (root, value) = match xml_to_value(&response.body) {
        Ok(doc) => doc,
        Err(_) if response.is_error() => return Ok((generic_error(response), None)),
        Err(e) => {
            return Err(
                ServiceException::internal_failure("failed to parse XML response body")
                    .with_source(e),
            );
        }
    };
    let mut members = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let request_id = ["RequestId", "RequestID", "requestId"]
        .iter()
        .find_map(|k| members.remove(*k))
        .or_else(|| {
            members
                .get(RESPONSE_METADATA)
                .and_then(|m| m.get("RequestId"))
                .cloned()
        })
        .and_then(|v| v.as_str().map(str::to_owned));

    if response.is_error() {
        let error = if root == "Error" {
            members
        } else {
            find_xml_error(&mut members).unwrap_or_default()
        };
        let mut parsed = Map::new();
        parsed.insert("Error".to_owned(), Value::Object(error));
        return Ok((parsed, request_id));
    }

    members.remove(RESPONSE_METADATA);
    if protocol == Protocol::RestXml {
        return Ok((members, request_id));
    }

    let result_key = format!("{}Result", operation.name);
    let parsed = match members.remove(&result_key) {
        Some(Value::Object(result)) => result,
        Some(_) => Map::new(),
        None => members,
    };
    Ok((parsed, request_id))
}

/// Locate the `Error` element under `ErrorResponse` or `Response/Errors`.
fn find_xml_error(members: &mut Map<String, Value>) -> Option<Map<String, Value>> {
    let error = match members.remove("Error") {
        Some(error) => error,
        None => match members.remove("Errors")? {
            Value::Object(mut errors) => errors.remove("Error")?,
            _ => return None,
        },
    };
    match error {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.into_iter().find_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        }),
        _ => None,
    }
}

/// Error raised while converting an XML document.
#[derive(Debug, thiserror::Error)]
pub enum XmlParseError {
    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// The document has no root element or is truncated.
    #[error("malformed XML document: {0}")]
    Malformed(String),
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> Value {
        if self.children.is_empty() {
            Value::String(self.text.trim().to_owned())
        } else {
            Value::Object(self.children)
        }
    }
}

/// Convert an XML document into its root element name and a JSON tree.
///
/// Elements with children become objects, repeated siblings become arrays,
/// and leaf elements become strings with surrounding whitespace trimmed.
/// Namespace prefixes are dropped.
pub fn xml_to_value(xml: &[u8]) -> Result<(String, Value), XmlParseError> {
    let mut reader = Reader::from_reader(xml);

    let mut stack: Vec<Frame> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(Frame::new(local_name(e.local_name().as_ref())));
            }
            Event::Empty(e) => {
                let name = local_name(e.local_name().as_ref());
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, Value::String(String::new())),
                    None => return Ok((name, Value::String(String::new()))),
                }
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    let decoded = e
                        .decode()
                        .map_err(|err| XmlParseError::Malformed(err.to_string()))?;
                    let unescaped = quick_xml::escape::unescape(&decoded)
                        .map_err(|err| XmlParseError::Malformed(err.to_string()))?;
                    frame.text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&resolve_reference(&e)?);
                }
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    return Err(XmlParseError::Malformed("unbalanced end tag".to_owned()));
                };
                let name = frame.name.clone();
                let value = frame.into_value();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value),
                    None => return Ok((name, value)),
                }
            }
            Event::Eof => {
                return Err(XmlParseError::Malformed(
                    "unexpected EOF before root element closed".to_owned(),
                ));
            }
            // Skip declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }
}

fn resolve_reference(reference: &quick_xml::events::BytesRef<'_>) -> Result<Cow<'static, str>, XmlParseError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|err| XmlParseError::Malformed(err.to_string()))?
    {
        return Ok(Cow::Owned(ch.to_string()));
    }
    let name = reference
        .decode()
        .map_err(|err| XmlParseError::Malformed(err.to_string()))?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(Cow::Borrowed)
        .ok_or_else(|| XmlParseError::Malformed(format!("unknown entity &{name};")))
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}
