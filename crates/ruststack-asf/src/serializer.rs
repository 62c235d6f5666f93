//! Request serialization: turning operation parameters into an HTTP request.
//!
//! Each protocol family places parameters differently:
//!
//! | Protocol | Method / path | Parameters |
//! |----------|---------------|------------|
//! | `json` | `POST /` | JSON body, operation in `X-Amz-Target` |
//! | `rest-json` | operation binding | URI labels, rest in a JSON body |
//! | `query` / `ec2` | `POST /` | form-encoded body with `Action` and `Version` |
//! | `rest-xml` | operation binding | URI labels, rest in an XML body |

use std::io;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use quick_xml::Writer;
use quick_xml::events::BytesText;
use serde_json::Value;

use ruststack_core::{AccountId, AwsRegion, HttpRequest};

use crate::context::{RequestContext, ServiceRequest};
use crate::error::ServiceException;
use crate::model::{OperationModel, Protocol};

/// Characters left unencoded in a URI label (RFC 3986 unreserved).
const LABEL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Greedy labels (`{Key+}`) additionally keep path separators.
const GREEDY_LABEL_ENCODE_SET: &AsciiSet = &LABEL_ENCODE_SET.remove(b'/');

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Build a new request context for `operation` from structured parameters.
///
/// The resulting request carries a `Host` header built from `hostname` and a
/// fresh request id; `parameters` is kept as the context's service request.
///
/// # Errors
///
/// Returns a `ValidationException` if a URI label has no matching parameter,
/// or an `InternalFailure` if the parameters cannot be encoded.
pub fn create_aws_request_context(
    operation: &OperationModel,
    parameters: ServiceRequest,
    region: AwsRegion,
    account_id: AccountId,
    hostname: &str,
) -> Result<RequestContext, ServiceException> {
    let request = match operation.protocol() {
        Protocol::Json => serialize_json(operation, &parameters)?,
        Protocol::RestJson => serialize_rest_json(operation, &parameters)?,
        Protocol::Query | Protocol::Ec2 => serialize_query(operation, &parameters),
        Protocol::RestXml => serialize_rest_xml(operation, &parameters)?,
    };
    let request = request.with_header("host", hostname).map_err(|e| {
        ServiceException::internal_failure(format!("invalid host {hostname}")).with_source(e)
    })?;

    tracing::debug!(
        operation = %operation,
        method = %request.method,
        path = %request.path,
        "created request context"
    );

    let mut context = RequestContext::new(operation.clone(), region, account_id, request);
    context.service_request = Some(parameters);
    Ok(context)
}

fn serialize_json(
    operation: &OperationModel,
    parameters: &ServiceRequest,
) -> Result<HttpRequest, ServiceException> {
    let service = &operation.service;
    let prefix = service
        .target_prefix
        .as_deref()
        .unwrap_or(&service.service_name);
    let body = serde_json::to_vec(parameters).map_err(|e| {
        ServiceException::internal_failure("failed to serialize request body").with_source(e)
    })?;

    HttpRequest::new(http::Method::POST, "/")
        .with_body(body)
        .with_header("x-amz-target", &format!("{prefix}.{}", operation.name))
        .and_then(|r| {
            r.with_header(
                "content-type",
                &format!("application/x-amz-json-{}", service.json_version),
            )
        })
        .map_err(|e| ServiceException::internal_failure("invalid request header").with_source(e))
}

fn serialize_rest_json(
    operation: &OperationModel,
    parameters: &ServiceRequest,
) -> Result<HttpRequest, ServiceException> {
    let (request, remaining) = expand_uri(operation, parameters)?;
    if remaining.is_empty() {
        return Ok(request);
    }

    let body = serde_json::to_vec(&remaining).map_err(|e| {
        ServiceException::internal_failure("failed to serialize request body").with_source(e)
    })?;
    request
        .with_body(body)
        .with_header("content-type", "application/json")
        .map_err(|e| ServiceException::internal_failure("invalid request header").with_source(e))
}

fn serialize_rest_xml(
    operation: &OperationModel,
    parameters: &ServiceRequest,
) -> Result<HttpRequest, ServiceException> {
    let (request, remaining) = expand_uri(operation, parameters)?;
    if remaining.is_empty() {
        return Ok(request);
    }

    let mut buf = Vec::with_capacity(256);
    write_xml_document(&mut buf, &format!("{}Request", operation.name), &remaining).map_err(
        |e| ServiceException::internal_failure("failed to serialize request body").with_source(e),
    )?;
    request
        .with_body(buf)
        .with_header("content-type", "application/xml")
        .map_err(|e| ServiceException::internal_failure("invalid request header").with_source(e))
}

fn serialize_query(operation: &OperationModel, parameters: &ServiceRequest) -> HttpRequest {
    let mut pairs = vec![
        ("Action".to_owned(), operation.name.clone()),
        ("Version".to_owned(), operation.service.api_version.clone()),
    ];
    let ec2 = operation.protocol() == Protocol::Ec2;
    for (key, value) in parameters {
        flatten_query(key, value, ec2, &mut pairs);
    }

    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    let mut request = HttpRequest::new(http::Method::POST, "/").with_body(body);
    request.headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(FORM_CONTENT_TYPE),
    );
    request
}

/// Flatten a structured value into query-protocol key/value pairs.
///
/// Structures become `A.B`, lists `A.member.N` (query) or `A.N` (ec2). An
/// empty query list is sent as `A=`.
fn flatten_query(prefix: &str, value: &Value, ec2: bool, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix.to_owned(), b.to_string())),
        Value::Number(n) => out.push((prefix.to_owned(), n.to_string())),
        Value::String(s) => out.push((prefix.to_owned(), s.clone())),
        Value::Array(items) => {
            if items.is_empty() && !ec2 {
                out.push((prefix.to_owned(), String::new()));
            }
            for (i, item) in items.iter().enumerate() {
                let key = if ec2 {
                    format!("{prefix}.{}", i + 1)
                } else {
                    format!("{prefix}.member.{}", i + 1)
                };
                flatten_query(&key, item, ec2, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                flatten_query(&format!("{prefix}.{k}"), v, ec2, out);
            }
        }
    }
}

/// Substitute URI labels from `parameters`.
///
/// Returns the request with method, path and static query set, plus the
/// parameters not consumed by a label.
fn expand_uri(
    operation: &OperationModel,
    parameters: &ServiceRequest,
) -> Result<(HttpRequest, ServiceRequest), ServiceException> {
    let (template, static_query) = match operation.request_uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (operation.request_uri.as_str(), None),
    };

    let mut remaining = parameters.clone();
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        path.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            return Err(ServiceException::internal_failure(format!(
                "unterminated label in URI template {template}"
            )));
        };
        let label = &rest[start + 1..start + len];
        let (name, greedy) = match label.strip_suffix('+') {
            Some(name) => (name, true),
            None => (label, false),
        };

        let value = remaining.remove(name).ok_or_else(|| {
            ServiceException::validation(format!(
                "Missing required URI parameter {name} for {operation}"
            ))
        })?;
        let value = scalar_to_string(&value);
        let encode_set = if greedy {
            GREEDY_LABEL_ENCODE_SET
        } else {
            LABEL_ENCODE_SET
        };
        path.extend(utf8_percent_encode(&value, encode_set));

        rest = &rest[start + len + 1..];
    }
    path.push_str(rest);

    let mut request = HttpRequest::new(operation.http_method.clone(), path);
    if let Some(query) = static_query {
        request = request.with_query(query);
    }
    Ok((request, remaining))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_xml_document(buf: &mut Vec<u8>, root: &str, fields: &ServiceRequest) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    writer
        .create_element(root)
        .write_inner_content(|w| write_xml_fields(w, fields))?;
    Ok(())
}

fn write_xml_fields<W: io::Write>(writer: &mut Writer<W>, fields: &ServiceRequest) -> io::Result<()> {
    for (name, value) in fields {
        write_xml_value(writer, name, value)?;
    }
    Ok(())
}

fn write_xml_value<W: io::Write>(writer: &mut Writer<W>, name: &str, value: &Value) -> io::Result<()> {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            writer
                .create_element(name)
                .write_inner_content(|w| write_xml_fields(w, map))?;
        }
        Value::Array(items) => {
            writer.create_element(name).write_inner_content(|w| {
                for item in items {
                    write_xml_value(w, "member", item)?;
                }
                Ok(())
            })?;
        }
        scalar => {
            writer
                .create_element(name)
                .write_text_content(BytesText::new(&scalar_to_string(scalar)))?;
        }
    }
    Ok(())
}
