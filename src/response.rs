//! Response types
//!
//! Handler output converges on `http::Response<Body>`, then serializes into
//! the JSON shape the request origin expects.

use crate::request::RequestOrigin;
use aws_lambda_events::encodings::Body;
use http::{
    header::{HeaderMap, CONTENT_TYPE, SET_COOKIE},
    Response, StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Representation of a Lambda response
#[doc(hidden)]
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum GatewayResponse {
    HttpApi(HttpApiResponse),
    RestApi(RestApiResponse),
}

/// Response shape for API Gateway HTTP API (payload format version 2.0).
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HttpApiResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub is_base64_encoded: bool,
    pub cookies: Vec<String>,
}

/// Response shape for API Gateway REST API (payload format version 1.0).
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RestApiResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

/// tranformation from http type to internal type
impl GatewayResponse {
    pub fn from_response<T>(request_origin: &RequestOrigin, value: Response<T>) -> Self
    where
        T: Into<Body>,
    {
        let (parts, bod) = value.into_parts();
        let (is_base64_encoded, body) = match bod.into() {
            Body::Empty => (false, None),
            Body::Text(text) => (false, Some(text)),
            Body::Binary(bytes) => (true, Some(base64::encode(bytes))),
        };

        let mut headers = parts.headers;
        let status_code = parts.status.as_u16();

        match request_origin {
            RequestOrigin::HttpApi => {
                // the HTTP API expects set-cookie headers in the "cookies"
                // attribute, so remove them from the headers
                let cookies = headers
                    .get_all(SET_COOKIE)
                    .iter()
                    .map(|v| v.to_str().unwrap_or_default().to_string())
                    .collect();
                headers.remove(SET_COOKIE);

                GatewayResponse::HttpApi(HttpApiResponse {
                    status_code,
                    headers: single_valued(&headers),
                    multi_value_headers: multi_valued(&headers),
                    body,
                    is_base64_encoded,
                    cookies,
                })
            }
            RequestOrigin::RestApi => GatewayResponse::RestApi(RestApiResponse {
                status_code,
                headers: single_valued(&headers),
                multi_value_headers: multi_valued(&headers),
                body,
                is_base64_encoded,
            }),
        }
    }
}

fn single_valued(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .keys()
        .filter_map(|key| {
            headers
                .get(key)
                .and_then(|v| v.to_str().ok())
                .map(|v| (key.as_str().to_owned(), v.to_owned()))
        })
        .collect()
}

fn multi_valued(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    headers
        .keys()
        .map(|key| {
            let values = headers
                .get_all(key)
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_owned))
                .collect();
            (key.as_str().to_owned(), values)
        })
        .collect()
}

/// A conversion of self into a `Response<Body>` for various types.
///
/// Implementations for `Response<B> where B: Into<Body>`,
/// `String`, `&str` and `serde_json::Value` are provided
/// by default.
pub trait IntoResponse {
    /// Return a translation of `self` into a `Response<Body>`
    fn into_response(self) -> Response<Body>;
}

impl<B> IntoResponse for Response<B>
where
    B: Into<Body>,
{
    fn into_response(self) -> Response<Body> {
        let (parts, body) = self.into_parts();
        Response::from_parts(parts, body.into())
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response<Body> {
        Response::new(Body::from(self))
    }
}

impl IntoResponse for &str {
    fn into_response(self) -> Response<Body> {
        Response::new(Body::from(self))
    }
}

impl IntoResponse for serde_json::Value {
    fn into_response(self) -> Response<Body> {
        Response::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(
                serde_json::to_string(&self)
                    .expect("unable to serialize serde_json::Value")
                    .into(),
            )
            .expect("unable to build http::Response")
    }
}

/// Build a JSON response with the given status code.
///
/// # Example
///
/// ```rust
/// use lambda_router::{http::StatusCode, response};
/// use serde_json::json;
///
/// let response = response::json(
///     StatusCode::BAD_REQUEST,
///     json!({ "error": "Missing required fields" }),
/// );
/// assert_eq!(response.status(), StatusCode::BAD_REQUEST);
/// ```
pub fn json(status: StatusCode, value: Value) -> Response<Body> {
    let mut response = value.into_response();
    *response.status_mut() = status;
    response
}
