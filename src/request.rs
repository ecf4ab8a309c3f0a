//! API Gateway request adaptations
//!
//! Inbound events arrive as one of two JSON payload shapes: the HTTP API
//! (payload format v2) shape routed on `rawPath` and
//! `requestContext.http.method`, and the REST API (payload format v1) shape
//! routed on `path` and `httpMethod`. Both adapt into an `http::Request<Body>`
//! carrying the routing key plus request metadata as extensions, exposed via
//! [RequestExt](crate::RequestExt).

use crate::{
    ext::{PathParameters, QueryStringParameters, StageVariables},
    query::QueryMap,
};
use aws_lambda_events::encodings::Body;
use http::header::{HeaderMap, HeaderName, HeaderValue, COOKIE, HOST};
use http::Method;
use serde::Deserialize;
use serde_json::{error::Error as JsonError, Value};
use std::collections::HashMap;

/// Internal representation of a Lambda HTTP event, from the HTTP API and
/// REST API proxy event perspectives.
///
/// The order of the variants is notable. Serde tries to deserialize in this
/// order, which makes `rawPath`-style events win over `path`-style events when
/// both shapes could apply. The REST variant defaults every field, so any JSON
/// object deserializes; an event with no routing fields yields a key that
/// matches no route.
#[doc(hidden)]
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum GatewayEvent {
    HttpApi(HttpApiEvent),
    RestApi(RestApiEvent),
}

impl GatewayEvent {
    /// Return the `RequestOrigin` of the event, so that the response can be
    /// serialized in the shape the request origin expects.
    pub fn origin(&self) -> RequestOrigin {
        match self {
            GatewayEvent::HttpApi(_) => RequestOrigin::HttpApi,
            GatewayEvent::RestApi(_) => RequestOrigin::RestApi,
        }
    }
}

/// Represents the origin from which the event was sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestOrigin {
    /// API Gateway HTTP API, payload format version 2.0
    HttpApi,
    /// API Gateway REST API, payload format version 1.0
    RestApi,
}

/// An API Gateway HTTP API proxy event, payload format version 2.0.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HttpApiEvent {
    #[serde(default)]
    pub raw_path: Option<String>,
    /// Fallback routing path for events carrying only the v1-style field.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub raw_query_string: Option<String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub stage_variables: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub cookies: Option<Vec<String>>,
    /// Required; its presence is what distinguishes this shape.
    pub request_context: HttpApiRequestContext,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub is_base64_encoded: bool,
}

/// Request context carried by HTTP API events.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HttpApiRequestContext {
    pub http: HttpDescription,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
}

/// The `http` block of an HTTP API request context.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HttpDescription {
    pub method: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub source_ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// An API Gateway REST API proxy event, payload format version 1.0.
///
/// Every field carries a default so this variant also absorbs hand-rolled
/// events: a missing method reads as `GET` and a missing path as the empty
/// string.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RestApiEvent {
    #[serde(default = "default_method")]
    pub http_method: String,
    /// Preferred over `path` when present, matching the v2 field's precedence
    /// for events that carry it without a full v2 request context.
    #[serde(default)]
    pub raw_path: Option<String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub path: String,
    #[serde(default, deserialize_with = "nullable_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub stage_variables: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_default")]
    pub request_context: RestApiRequestContext,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: Option<bool>,
}

/// Request context carried by REST API events.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RestApiRequestContext {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub resource_path: Option<String>,
}

fn default_method() -> String {
    "GET".to_owned()
}

// Hand-rolled and console test events can carry unencoded paths; percent-encode
// bytes that are invalid in a request target so URI construction cannot panic
// on a routable event. Bytes legal in paths and query strings pass through.
fn escape_uri_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for &byte in part.as_bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'.'
            | b'_'
            | b'~'
            | b'!'
            | b'$'
            | b'&'
            | b'\''
            | b'('
            | b')'
            | b'*'
            | b'+'
            | b','
            | b';'
            | b'='
            | b':'
            | b'@'
            | b'/'
            | b'%'
            | b'?' => escaped.push(byte as char),
            _ => escaped.push_str(&format!("%{:02X}", byte)),
        }
    }
    escaped
}

// API Gateway serializes absent maps as explicit nulls; treat those as empty
fn nullable_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Event request context as an enumeration of the per-origin contexts,
/// available to handlers as a request extension.
#[derive(Debug, Clone)]
pub enum RequestContext {
    /// HTTP API request context
    HttpApi(HttpApiRequestContext),
    /// REST API request context
    RestApi(RestApiRequestContext),
}

/// Converts gateway event types into `http::Request<Body>` types
impl From<GatewayEvent> for http::Request<Body> {
    fn from(value: GatewayEvent) -> Self {
        match value {
            GatewayEvent::HttpApi(event) => into_http_api_request(event),
            GatewayEvent::RestApi(event) => into_rest_api_request(event),
        }
    }
}

pub(crate) fn into_http_api_request(event: HttpApiEvent) -> http::Request<Body> {
    let method = parse_method(&event.request_context.http.method);
    let path = event
        .raw_path
        .clone()
        .or_else(|| event.path.clone())
        .or_else(|| event.request_context.http.path.clone())
        .unwrap_or_default();

    let mut headers = to_header_map(&event.headers);
    if let Some(cookies) = &event.cookies {
        if let Ok(value) = HeaderValue::from_str(&cookies.join(";")) {
            headers.append(COOKIE, value);
        }
    }

    let query = if event.query_string_parameters.is_empty() {
        event
            .raw_query_string
            .as_deref()
            .map(parse_query)
            .unwrap_or_default()
    } else {
        QueryMap::from(event.query_string_parameters.clone())
    };

    let builder = http::Request::builder()
        .uri({
            let scheme = headers
                .get(x_forwarded_proto())
                .and_then(|v| v.to_str().ok())
                .unwrap_or("https");
            let host = headers
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .or_else(|| event.request_context.domain_name.as_deref())
                .unwrap_or("localhost");

            let mut uri = format!("{}://{}{}", scheme, host, escape_uri_part(&path));
            if let Some(query) = event.raw_query_string.as_deref().filter(|q| !q.is_empty()) {
                uri.push('?');
                uri.push_str(&escape_uri_part(query));
            }
            uri
        })
        .extension(QueryStringParameters(query))
        .extension(PathParameters(QueryMap::from(event.path_parameters.clone())))
        .extension(StageVariables(QueryMap::from(event.stage_variables.clone())))
        .extension(RequestContext::HttpApi(event.request_context.clone()));

    let base64 = event.is_base64_encoded;
    let mut request = builder
        .body(
            event
                .body
                .as_deref()
                .map_or_else(Body::default, |b| Body::from_maybe_encoded(base64, b)),
        )
        .unwrap_or_else(|error| {
            // degenerate routing key; dispatch falls through to the 404 path
            // unless a root route is registered
            tracing::warn!(error = %error, "failed to build request from event");
            http::Request::new(Body::default())
        });

    // no builder method that sets headers in batch
    *request.headers_mut() = headers;
    *request.method_mut() = method;

    request
}

pub(crate) fn into_rest_api_request(event: RestApiEvent) -> http::Request<Body> {
    let method = parse_method(&event.http_method);
    let path = event
        .raw_path
        .clone()
        .unwrap_or_else(|| event.path.clone());

    // multi-valued headers are the canonical source; single-valued entries
    // only fill keys the multi-valued map does not carry
    let mut headers = HeaderMap::new();
    for (key, values) in &event.multi_value_headers {
        if let Ok(name) = HeaderName::from_bytes(key.as_bytes()) {
            for value in values {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.append(&name, value);
                }
            }
        }
    }
    for (key, value) in &event.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            if !headers.contains_key(&name) {
                headers.insert(name, value);
            }
        }
    }

    // multi-valued query string parameters are always a super set of singly
    // valued ones; when present, the multi-valued map is preferred
    let query = if event.multi_value_query_string_parameters.is_empty() {
        QueryMap::from(event.query_string_parameters.clone())
    } else {
        QueryMap::from(event.multi_value_query_string_parameters.clone())
    };

    let builder = http::Request::builder()
        .uri({
            let scheme = headers
                .get(x_forwarded_proto())
                .and_then(|v| v.to_str().ok())
                .unwrap_or("https");
            let host = headers
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("localhost");

            format!("{}://{}{}", scheme, host, escape_uri_part(&path))
        })
        .extension(QueryStringParameters(query))
        .extension(PathParameters(QueryMap::from(event.path_parameters.clone())))
        .extension(StageVariables(QueryMap::from(event.stage_variables.clone())))
        .extension(RequestContext::RestApi(event.request_context.clone()));

    let base64 = event.is_base64_encoded.unwrap_or_default();
    let mut request = builder
        .body(
            event
                .body
                .as_deref()
                .map_or_else(Body::default, |b| Body::from_maybe_encoded(base64, b)),
        )
        .unwrap_or_else(|error| {
            // degenerate routing key; dispatch falls through to the 404 path
            // unless a root route is registered
            tracing::warn!(error = %error, "failed to build request from event");
            http::Request::new(Body::default())
        });

    // no builder method that sets headers in batch
    *request.headers_mut() = headers;
    *request.method_mut() = method;

    request
}

fn parse_method(method: &str) -> Method {
    Method::from_bytes(method.trim().to_uppercase().as_bytes()).unwrap_or(Method::GET)
}

fn parse_query(query: &str) -> QueryMap {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

fn to_header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.append(name, value);
        }
    }
    map
}

fn x_forwarded_proto() -> HeaderName {
    HeaderName::from_static("x-forwarded-proto")
}

/// Deserializes a `Request` from a string of JSON event text.
///
/// # Example
///
/// ```rust,no_run
/// use lambda_router::request::from_str;
/// use std::error::Error;
///
/// fn main() -> Result<(), Box<dyn Error>> {
///     let request = from_str(
///         r#"{ "httpMethod": "GET", "path": "/hello" }"#
///     )?;
///     Ok(println!("{:#?}", request))
/// }
/// ```
pub fn from_str(s: &str) -> Result<crate::Request, JsonError> {
    serde_json::from_str::<GatewayEvent>(s).map(GatewayEvent::into)
}

/// Deserializes a `Request` from an already parsed JSON event.
pub fn from_value(value: Value) -> Result<crate::Request, JsonError> {
    serde_json::from_value::<GatewayEvent>(value).map(GatewayEvent::into)
}
