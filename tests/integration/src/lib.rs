//! End-to-end tests of the RustStack fallback dispatch layer.
//!
//! The helpers wire two miniature backend engines into a
//! [`BackendDispatcher`]:
//!
//! - `sqs`: a query-protocol queue engine, registered per (account, region)
//!   partition, keeping queues per calling account
//! - `lambda`: a rest-json function engine with one rule per resource
//!
//! Run them with:
//! ```text
//! cargo test -p ruststack-integration
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Once};

use dashmap::DashMap;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use ruststack_asf::{
    OperationModel, Protocol, RequestContext, ServiceModel, create_aws_request_context,
};
use ruststack_backend::{
    BackendError, BackendInstance, RouteHandler, StaticBackendRegistry, route_handler,
};
use ruststack_core::{AccountId, AccountRegionStore, AwsRegion, HttpRequest, HttpResponse, RustStackConfig};
use ruststack_fallback::{ACCOUNT_ID_HEADER, BackendDispatcher};
use serde_json::{Value, json};

static INIT: Once = Once::new();

/// Initialize tracing (once), honoring `RUST_LOG` and then `LOG_LEVEL`.
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(RustStackConfig::from_env().log_level)),
            )
            .with_test_writer()
            .init();
    });
}

/// Request id every sample engine response carries.
pub const REQUEST_ID: &str = "27daac76-34dd-47df-bd01-1f6e873584a0";

/// Error code of the queue engine for unknown queues.
pub const NON_EXISTENT_QUEUE: &str = "AWS.SimpleQueueService.NonExistentQueue";

type Tags = BTreeMap<String, String>;

/// A query-protocol queue engine.
///
/// Queues are kept per calling account, as told by the account header.
#[derive(Debug, Default)]
pub struct QueueBackend {
    accounts: Arc<DashMap<String, BTreeMap<String, Tags>>>,
}

impl BackendInstance for QueueBackend {
    fn url_paths(&self) -> Vec<(String, RouteHandler)> {
        let accounts = Arc::clone(&self.accounts);
        let handler = route_handler(move |req, url, headers| handle_queue(&accounts, req, url, headers));
        vec![
            ("/".to_owned(), Arc::clone(&handler)),
            (
                r#"/<regex("\d{12}"):account_id>/<regex("[a-zA-Z0-9\-_\.]+"):queue_name>"#.to_owned(),
                handler,
            ),
        ]
    }
}

fn handle_queue(
    accounts: &DashMap<String, BTreeMap<String, Tags>>,
    req: &HttpRequest,
    url: &str,
    headers: &HeaderMap,
) -> Result<HttpResponse, BackendError> {
    let params: BTreeMap<String, String> = form_urlencoded::parse(&req.body).into_owned().collect();
    let param = |name: &str| params.get(name).cloned().unwrap_or_default();
    let account = headers
        .get(ACCOUNT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let base = url.splitn(4, '/').take(3).collect::<Vec<_>>().join("/");
    let queue_url = |name: &str| format!("{base}/{account}/{name}");
    let queue_of = |url: &str| url.rsplit('/').next().unwrap_or_default().to_owned();

    let mut queues = accounts.entry(account.clone()).or_default();
    let action = param("Action");
    let body = match action.as_str() {
        "CreateQueue" => {
            let name = param("QueueName");
            queues.entry(name.clone()).or_default();
            format!("<QueueUrl>{}</QueueUrl>", queue_url(&name))
        }
        "ListQueues" => queues
            .keys()
            .map(|name| format!("<QueueUrl>{}</QueueUrl>", queue_url(name)))
            .collect(),
        "GetQueueUrl" => {
            let name = param("QueueName");
            if !queues.contains_key(&name) {
                return Ok(query_error(NON_EXISTENT_QUEUE, "The specified queue does not exist."));
            }
            format!("<QueueUrl>{}</QueueUrl>", queue_url(&name))
        }
        "TagQueue" => {
            let Some(tags) = queues.get_mut(&queue_of(&param("QueueUrl"))) else {
                return Ok(query_error(NON_EXISTENT_QUEUE, "The specified queue does not exist."));
            };
            for (key, value) in &params {
                if let Some(tag) = key.strip_prefix("Tags.") {
                    tags.insert(tag.to_owned(), value.clone());
                }
            }
            String::new()
        }
        "ListQueueTags" => {
            let Some(tags) = queues.get(&queue_of(&param("QueueUrl"))) else {
                return Ok(query_error(NON_EXISTENT_QUEUE, "The specified queue does not exist."));
            };
            tags.iter()
                .map(|(k, v)| format!("<Tag><Key>{k}</Key><Value>{v}</Value></Tag>"))
                .collect()
        }
        "DeleteQueue" => {
            if queues.remove(&queue_of(&param("QueueUrl"))).is_none() {
                return Err(BackendError::new(
                    NON_EXISTENT_QUEUE,
                    "The specified queue does not exist.",
                    400,
                ));
            }
            String::new()
        }
        other => {
            return Ok(query_error("InvalidAction", &format!("The action {other} is not valid for this endpoint.")));
        }
    };

    Ok(xml_response(
        StatusCode::OK,
        format!(
            "<{action}Response><{action}Result>{body}</{action}Result>\
             <ResponseMetadata><RequestId>{REQUEST_ID}</RequestId></ResponseMetadata></{action}Response>"
        ),
    ))
}

fn query_error(code: &str, message: &str) -> HttpResponse {
    xml_response(
        StatusCode::BAD_REQUEST,
        format!(
            "<ErrorResponse><Error><Type>Sender</Type><Code>{code}</Code>\
             <Message>{message}</Message><Detail/></Error>\
             <RequestId>{REQUEST_ID}</RequestId></ErrorResponse>"
        ),
    )
}

fn xml_response(status: StatusCode, body: String) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml"));
    HttpResponse::new(status, headers, body)
}

/// A rest-json function engine.
#[derive(Debug, Default)]
pub struct FunctionBackend {
    functions: Arc<DashMap<String, Value>>,
}

const FUNCTIONS_PREFIX: &str = "/2015-03-31/functions/";

impl BackendInstance for FunctionBackend {
    fn url_paths(&self) -> Vec<(String, RouteHandler)> {
        let functions = Arc::clone(&self.functions);
        let collection = route_handler(move |req, _, _| {
            if req.method == Method::POST {
                let config: Value = serde_json::from_slice(&req.body).unwrap_or_default();
                let name = config["FunctionName"].as_str().unwrap_or_default().to_owned();
                functions.insert(name, config.clone());
                return Ok(HttpResponse::json(StatusCode::CREATED, &config));
            }
            let mut names: Vec<String> = functions.iter().map(|f| f.key().clone()).collect();
            names.sort();
            let listed: Vec<Value> = names.iter().map(|n| json!({"FunctionName": n})).collect();
            Ok(HttpResponse::json(StatusCode::OK, &json!({"Functions": listed})))
        });

        let functions = Arc::clone(&self.functions);
        let function = route_handler(move |req, _, _| {
            let name = function_name(req);
            if req.method == Method::DELETE {
                return Ok(match functions.remove(&name) {
                    Some(_) => HttpResponse::from_status(StatusCode::NO_CONTENT, ""),
                    None => function_not_found(&name),
                });
            }
            Ok(match functions.get(&name) {
                Some(config) => HttpResponse::json(StatusCode::OK, &json!({"Configuration": config.value().clone()})),
                None => function_not_found(&name),
            })
        });

        let functions = Arc::clone(&self.functions);
        let invoke = route_handler(move |req, _, _| {
            let name = function_name(req);
            if !functions.contains_key(&name) {
                return Err(BackendError::new(
                    "ResourceNotFoundException",
                    format!("Function not found: {name}"),
                    404,
                ));
            }
            let mut response = HttpResponse::from_status(StatusCode::OK, req.body.clone());
            response
                .headers
                .insert("x-amz-executed-version", HeaderValue::from_static("$LATEST"));
            Ok(response)
        });

        vec![
            (FUNCTIONS_PREFIX.to_owned(), collection),
            (format!("{FUNCTIONS_PREFIX}<function_name>"), function),
            (format!("{FUNCTIONS_PREFIX}<function_name>/invocations"), invoke),
        ]
    }
}

fn function_name(req: &HttpRequest) -> String {
    req.path
        .strip_prefix(FUNCTIONS_PREFIX)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default()
        .to_owned()
}

fn function_not_found(name: &str) -> HttpResponse {
    let mut response = HttpResponse::json(
        StatusCode::NOT_FOUND,
        &json!({"Type": "User", "message": format!("Function not found: {name}")}),
    );
    response.headers.insert(
        "x-amzn-errortype",
        HeaderValue::from_static("ResourceNotFoundException:http://internal.amazon.com/coral/com.amazonaws.lambda/"),
    );
    response
}

/// The queue service model.
#[must_use]
pub fn queue_service() -> Arc<ServiceModel> {
    Arc::new(ServiceModel::new("sqs", Protocol::Query, "2012-11-05"))
}

/// The function service model.
#[must_use]
pub fn function_service() -> Arc<ServiceModel> {
    Arc::new(ServiceModel::new("lambda", Protocol::RestJson, "2015-03-31"))
}

/// A function operation with its HTTP binding.
#[must_use]
pub fn function_operation(name: &str) -> OperationModel {
    let (method, uri) = match name {
        "ListFunctions" => (Method::GET, "/2015-03-31/functions/"),
        "CreateFunction" => (Method::POST, "/2015-03-31/functions"),
        "GetFunction" => (Method::GET, "/2015-03-31/functions/{FunctionName}"),
        "DeleteFunction" => (Method::DELETE, "/2015-03-31/functions/{FunctionName}"),
        "Invoke" => (Method::POST, "/2015-03-31/functions/{FunctionName}/invocations"),
        other => panic!("unknown function operation {other}"),
    };
    function_service().operation(name).with_http(method, uri)
}

/// A registry with the queue engine partitioned over two regions of the
/// default account and the function engine as a single instance.
#[must_use]
pub fn registry() -> StaticBackendRegistry {
    let queues = AccountRegionStore::<dyn BackendInstance>::new();
    for region in ["us-east-1", "eu-west-1"] {
        queues.insert(
            AccountId::default(),
            AwsRegion::new(region),
            Arc::new(QueueBackend::default()),
        );
    }

    let registry = StaticBackendRegistry::new();
    registry.register_partitioned("sqs", Arc::new(queues));
    registry.register_global("lambda", Arc::new(FunctionBackend::default()));
    registry
}

/// A dispatcher over [`registry`] with the default configuration.
#[must_use]
pub fn dispatcher() -> Arc<BackendDispatcher> {
    init_tracing();
    Arc::new(BackendDispatcher::new(Arc::new(registry()), RustStackConfig::default()))
}

/// Build a request context for `operation` from JSON parameters.
#[must_use]
pub fn context(operation: &OperationModel, params: Value, account: &str) -> RequestContext {
    let params = match params {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    let account = AccountId::new(account).unwrap_or_else(|e| panic!("bad account {account}: {e}"));
    create_aws_request_context(
        operation,
        params,
        AwsRegion::default(),
        account,
        &RustStackConfig::default().hostname,
    )
    .unwrap_or_else(|e| panic!("cannot serialize {operation}: {e}"))
}

/// The default account id as a string.
#[must_use]
pub fn default_account() -> String {
    AccountId::default().as_str().to_owned()
}

mod test_fallback;
mod test_routing;
