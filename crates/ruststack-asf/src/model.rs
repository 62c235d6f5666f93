//! Service and operation models.

use std::fmt;
use std::sync::Arc;

/// AWS wire protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// `awsJson1_0` / `awsJson1_1`: `POST /` with an `X-Amz-Target` header.
    Json,
    /// `restJson1`: HTTP-bound operations with JSON bodies.
    RestJson,
    /// `awsQuery`: form-encoded requests, XML responses.
    Query,
    /// `ec2Query`: like `awsQuery` with flat list encoding.
    Ec2,
    /// `restXml`: HTTP-bound operations with XML bodies.
    RestXml,
}

impl Protocol {
    /// Returns the protocol name as used in service definitions.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::RestJson => "rest-json",
            Self::Query => "query",
            Self::Ec2 => "ec2",
            Self::RestXml => "rest-xml",
        }
    }

    /// Parse a protocol name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(Self::Json),
            "rest-json" => Some(Self::RestJson),
            "query" => Some(Self::Query),
            "ec2" => Some(Self::Ec2),
            "rest-xml" => Some(Self::RestXml),
            _ => None,
        }
    }

    /// Whether responses of this protocol are XML documents.
    #[must_use]
    pub fn is_xml(&self) -> bool {
        matches!(self, Self::Query | Self::Ec2 | Self::RestXml)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of an AWS service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceModel {
    /// Service identifier (e.g. `sqs`, `route53`).
    pub service_name: String,
    /// Wire protocol.
    pub protocol: Protocol,
    /// API version (e.g. `2012-11-05`).
    pub api_version: String,
    /// `X-Amz-Target` prefix for JSON protocols (e.g. `DynamoDB_20120810`).
    pub target_prefix: Option<String>,
    /// JSON protocol version (`1.0` or `1.1`).
    pub json_version: String,
}

impl ServiceModel {
    /// Create a service model.
    #[must_use]
    pub fn new(
        service_name: impl Into<String>,
        protocol: Protocol,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            protocol,
            api_version: api_version.into(),
            target_prefix: None,
            json_version: "1.0".to_owned(),
        }
    }

    /// Set the `X-Amz-Target` prefix.
    #[must_use]
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = Some(prefix.into());
        self
    }

    /// Set the JSON protocol version.
    #[must_use]
    pub fn with_json_version(mut self, version: impl Into<String>) -> Self {
        self.json_version = version.into();
        self
    }

    /// Create an operation of this service with the default `POST /` binding.
    #[must_use]
    pub fn operation(self: &Arc<Self>, name: impl Into<String>) -> OperationModel {
        OperationModel {
            name: name.into(),
            service: Arc::clone(self),
            http_method: http::Method::POST,
            request_uri: "/".to_owned(),
        }
    }
}

/// Static description of one operation of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationModel {
    /// Operation name (e.g. `SendMessage`).
    pub name: String,
    /// The owning service.
    pub service: Arc<ServiceModel>,
    /// HTTP method of the operation's binding.
    pub http_method: http::Method,
    /// Request URI template, e.g. `/2015-03-31/functions/{FunctionName}`.
    pub request_uri: String,
}

impl OperationModel {
    /// Set the HTTP binding for REST protocols.
    #[must_use]
    pub fn with_http(mut self, method: http::Method, request_uri: impl Into<String>) -> Self {
        self.http_method = method;
        self.request_uri = request_uri.into();
        self
    }

    /// The wire protocol of the owning service.
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.service.protocol
    }
}

impl fmt::Display for OperationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service.service_name, self.name)
    }
}
