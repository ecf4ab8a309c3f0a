//! Extension methods for `http::Request` types

use crate::{query::QueryMap, request::RequestContext};
use aws_lambda_events::encodings::Body;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::{error::Error, fmt};

/// Request query string parameters, stored as a request extension.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct QueryStringParameters(pub(crate) QueryMap);

/// Request path parameters, stored as a request extension.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PathParameters(pub(crate) QueryMap);

/// Request stage variables, stored as a request extension.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct StageVariables(pub(crate) QueryMap);

/// Errors that may result from failed attempts to deserialize a request body.
#[derive(Debug)]
pub enum PayloadError {
    /// Returned when `application/json` bodies fail to deserialize
    Json(serde_json::Error),
    /// Returned when `application/x-www-form-urlencoded` bodies fail to deserialize
    WwwFormUrlEncoded(serde_urlencoded::de::Error),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Json(err) => write!(f, "failed to parse payload from application/json {}", err),
            PayloadError::WwwFormUrlEncoded(err) => write!(
                f,
                "failed to parse payload from application/x-www-form-urlencoded {}",
                err
            ),
        }
    }
}

impl Error for PayloadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PayloadError::Json(err) => Some(err),
            PayloadError::WwwFormUrlEncoded(err) => Some(err),
        }
    }
}

/// Extensions for `http::Request` structs that provide access to the gateway
/// event data that has no natural home on the request itself.
pub trait RequestExt {
    /// Return the query string parameters associated with the request.
    fn query_string_parameters(&self) -> QueryMap;

    /// Return the path parameters associated with the request.
    fn path_parameters(&self) -> QueryMap;

    /// Return the stage variables associated with the request.
    fn stage_variables(&self) -> QueryMap;

    /// Return the request context associated with the request, when the event
    /// carried one.
    fn request_context(&self) -> Option<RequestContext>;

    /// Return the result of deserializing the request body, selected by the
    /// request's `content-type` header.
    ///
    /// `application/json` bodies deserialize with `serde_json`,
    /// `application/x-www-form-urlencoded` bodies with `serde_urlencoded`.
    /// An empty body, a missing `content-type` header or an unsupported
    /// content type yield `Ok(None)`.
    fn payload<D>(&self) -> Result<Option<D>, PayloadError>
    where
        D: DeserializeOwned;
}

impl RequestExt for http::Request<Body> {
    fn query_string_parameters(&self) -> QueryMap {
        self.extensions()
            .get::<QueryStringParameters>()
            .map(|params| params.0.clone())
            .unwrap_or_default()
    }

    fn path_parameters(&self) -> QueryMap {
        self.extensions()
            .get::<PathParameters>()
            .map(|params| params.0.clone())
            .unwrap_or_default()
    }

    fn stage_variables(&self) -> QueryMap {
        self.extensions()
            .get::<StageVariables>()
            .map(|params| params.0.clone())
            .unwrap_or_default()
    }

    fn request_context(&self) -> Option<RequestContext> {
        self.extensions().get::<RequestContext>().cloned()
    }

    fn payload<D>(&self) -> Result<Option<D>, PayloadError>
    where
        D: DeserializeOwned,
    {
        let body: &[u8] = self.body();
        if body.is_empty() {
            return Ok(None);
        }
        let content_type = match self
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            Some(value) => value,
            None => return Ok(None),
        };
        if content_type.starts_with("application/x-www-form-urlencoded") {
            serde_urlencoded::from_bytes::<D>(body)
                .map(Some)
                .map_err(PayloadError::WwwFormUrlEncoded)
        } else if content_type.starts_with("application/json") {
            serde_json::from_slice::<D>(body)
                .map(Some)
                .map_err(PayloadError::Json)
        } else {
            Ok(None)
        }
    }
}
