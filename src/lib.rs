//! Event router and dispatch layer for AWS Lambda functions fronted by
//! Amazon API Gateway.
//!
//! A deployed function receives every request for its API as one JSON event.
//! This crate turns that event into an `http::Request<Body>`, selects a
//! handler from a [`Router`] built once at process start, and serializes the
//! handler's response in the shape the request origin expects. Handlers are
//! plain async functions (or [`Handler`] implementations) with the signature
//! `(Request, Context) -> Result<R, E>`; adding a feature means registering
//! one more route.
//!
//! # Example
//!
//! ```rust,no_run
//! use lambda_router::{handler_fn, http::Method, Context, Entrypoint, Error, Request, Router};
//! use serde_json::{json, Value};
//!
//! async fn hello(_: Request, _: Context) -> Result<Value, Error> {
//!     Ok(json!({ "message": "hello" }))
//! }
//!
//! # async fn run() -> Result<(), Error> {
//! let router = Router::new().route(Method::GET, "/hello", handler_fn(hello));
//! let entrypoint = Entrypoint::new(router);
//!
//! // invoked by the hosting runtime with (event, context)
//! let response = entrypoint
//!     .handle(json!({ "httpMethod": "GET", "path": "/hello" }), Context::default())
//!     .await?;
//! assert_eq!(response["statusCode"], 200);
//! # Ok(())
//! # }
//! ```
//!
//! # Error behavior
//!
//! [`Router::dispatch`] propagates a handler's error to its caller unchanged.
//! [`Entrypoint::handle`] catches it and answers with a generic 500 JSON
//! response instead, so the front door always receives a well-formed response
//! with a stable status code. An event that matches no route (including an
//! event missing its routing fields) receives the deterministic 404 fallback.

pub mod context;
pub mod ext;
pub mod query;
pub mod request;
pub mod response;
pub mod router;

use crate::request::{GatewayEvent, RequestOrigin};
use crate::response::GatewayResponse;
use http::{Method, StatusCode};
use serde_json::{json, Value};
use std::future::Future;

pub use crate::{
    context::{Config, Context},
    ext::{PayloadError, RequestExt},
    query::QueryMap,
    response::IntoResponse,
    router::Router,
};
pub use aws_lambda_events::encodings::Body;
pub use http::{self, Response};

/// Error type that handlers and the dispatch layer may result in
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Type alias for `http::Request`s with a fixed `Body` type
pub type Request = http::Request<Body>;

/// Functions serving as Lambda route handlers
pub trait Handler {
    /// The type of response this handler responds with
    type Response: IntoResponse;
    /// The type of error this handler may result in
    type Error: Into<Error>;
    /// The future this handler resolves to
    type Fut: Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
    /// Invoke the handler with a request and its invocation context.
    ///
    /// Takes `&self` so one handler instance can serve concurrent
    /// invocations; per-invocation state belongs in the returned future.
    fn call(&self, request: Request, context: Context) -> Self::Fut;
}

/// A [Handler] implemented by a closure or async function.
pub struct HandlerFn<F> {
    f: F,
}

/// Adapts a function with the signature
/// `async fn(Request, Context) -> Result<R, E>` into a [Handler].
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

impl<F, Fut, R, E> Handler for HandlerFn<F>
where
    F: Fn(Request, Context) -> Fut,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse,
    E: Into<Error>,
{
    type Response = R;
    type Error = E;
    type Fut = Fut;

    fn call(&self, request: Request, context: Context) -> Self::Fut {
        (self.f)(request, context)
    }
}

/// The callable the hosting runtime invokes with `(event, context)`.
///
/// Wraps a [Router] and owns the crate's error policy: a handler failure is
/// logged and converted into a generic 500 JSON response rather than being
/// surfaced to the runtime as an invocation error.
pub struct Entrypoint {
    router: Router,
}

impl Entrypoint {
    /// Wrap a fully registered router.
    pub fn new(router: Router) -> Self {
        Entrypoint { router }
    }

    /// Dispatch one event and return the serialized response.
    ///
    /// The only error this returns is a response serialization failure; route
    /// misses and handler failures are folded into the response itself.
    pub async fn handle(&self, event: Value, context: Context) -> Result<Value, Error> {
        let event: GatewayEvent = match serde_json::from_value(event) {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(error = %error, "event is missing routing fields");
                let response = self.router.not_found(&Method::GET, "");
                let response = GatewayResponse::from_response(&RequestOrigin::RestApi, response);
                return Ok(serde_json::to_value(response)?);
            }
        };
        let origin = event.origin();
        let request: Request = event.into();

        let response = match self.router.dispatch(request, context).await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(error = %error, "handler failed during dispatch");
                let mut response = response::json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                );
                self.router.apply_default_headers(&mut response);
                response
            }
        };
        Ok(serde_json::to_value(GatewayResponse::from_response(
            &origin, response,
        ))?)
    }
}
