//! Route registration and dispatch
//!
//! A [Router] owns an ordered set of routes built once at process start. Each
//! route pairs a method + path predicate with a handler; dispatch scans the
//! routes in registration order and invokes the first match. The route table
//! is read-only after construction, so a single router can serve concurrent
//! invocations.

use crate::{response::IntoResponse, Context, Error, Handler, Request};
use aws_lambda_events::encodings::Body;
use futures_util::future::BoxFuture;
use http::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, Response, StatusCode,
};

type BoxHandler =
    Box<dyn Fn(Request, Context) -> BoxFuture<'static, Result<Response<Body>, Error>> + Send + Sync>;

/// An association between a method + path predicate and a handler.
struct Route {
    method: Method,
    path: String,
    handler: BoxHandler,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.path == normalize_path(path)
    }
}

/// Trailing slashes are insignificant for routing, so `/invoice/` and
/// `/invoice` select the same handler.
fn normalize_path(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Selects a handler for an incoming request and invokes it.
///
/// Routes are tried in registration order; when two predicates overlap, the
/// first registered handler wins. A request matching no route yields a 404
/// response without invoking any handler.
///
/// # Example
///
/// ```rust,no_run
/// use lambda_router::{handler_fn, http::Method, Context, Error, Request, Router};
/// use serde_json::{json, Value};
///
/// async fn invoice(_: Request, _: Context) -> Result<Value, Error> {
///     Ok(json!({ "status": "ok" }))
/// }
///
/// let router = Router::new().route(Method::GET, "/invoice", handler_fn(invoice));
/// ```
pub struct Router {
    routes: Vec<Route>,
    default_headers: HeaderMap,
}

impl Router {
    /// Create a router with no registered routes.
    pub fn new() -> Self {
        Router {
            routes: Vec::new(),
            default_headers: HeaderMap::new(),
        }
    }

    /// Register a handler for the given method and path.
    pub fn route<H>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Handler + Send + Sync + 'static,
    {
        let handler: BoxHandler = Box::new(
            move |request: Request, context: Context| -> BoxFuture<'static, Result<Response<Body>, Error>> {
                let fut = handler.call(request, context);
                Box::pin(async move { fut.await.map(IntoResponse::into_response).map_err(Into::into) })
            },
        );
        self.routes.push(Route {
            method,
            path: normalize_path(path).to_owned(),
            handler,
        });
        self
    }

    /// Add a header applied to every response this router produces, unless
    /// the selected handler already set it. Useful for CORS headers shared by
    /// all routes.
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.append(name, value);
        self
    }

    /// Select and invoke the handler for `request`, returning its response.
    ///
    /// A handler error propagates to the caller unchanged; converting it into
    /// an error response is the entrypoint's concern.
    pub async fn dispatch(&self, request: Request, context: Context) -> Result<Response<Body>, Error> {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        for route in &self.routes {
            if route.matches(&method, &path) {
                tracing::debug!(method = %method, path = %path, "dispatching to registered handler");
                let mut response = (route.handler)(request, context).await?;
                self.apply_default_headers(&mut response);
                return Ok(response);
            }
        }
        tracing::warn!(method = %method, path = %path, "no handler registered");
        Ok(self.not_found(&method, &path))
    }

    pub(crate) fn not_found(&self, method: &Method, path: &str) -> Response<Body> {
        let mut response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from(format!(
                "No handler for path {} and method {}",
                path, method
            )))
            .expect("unable to build http::Response");
        self.apply_default_headers(&mut response);
        response
    }

    pub(crate) fn apply_default_headers(&self, response: &mut Response<Body>) {
        for (name, value) in &self.default_headers {
            if !response.headers().contains_key(name) {
                response.headers_mut().append(name, value.clone());
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Router;
    use crate::{handler_fn, Body, Context, Error, Request};
    use http::{header::HeaderValue, Method, Response, StatusCode};
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn request(method: &str, path: &str) -> Request {
        crate::request::from_value(json!({
            "httpMethod": method,
            "path": path
        }))
        .expect("failed to build request")
    }

    async fn ok(_: Request, _: Context) -> Result<Response<Body>, Error> {
        Ok(Response::new(Body::from("ok")))
    }

    #[tokio::test]
    async fn dispatch_invokes_the_matching_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let router = Router::new().route(
            Method::GET,
            "/invoice",
            handler_fn(move |_: Request, _: Context| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>("ok")
                }
            }),
        );

        let response = router
            .dispatch(request("GET", "/invoice"), Context::default())
            .await
            .expect("dispatch failed");
        assert_eq!(response.status(), StatusCode::OK);
        match response.body() {
            Body::Text(text) => assert_eq!(text, "ok"),
            other => panic!("unexpected body {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unmatched_requests_fall_back_without_invoking_handlers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let router = Router::new().route(
            Method::GET,
            "/hello",
            handler_fn(move |_: Request, _: Context| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>("hello")
                }
            }),
        );

        let response = router
            .dispatch(request("GET", "/test"), Context::default())
            .await
            .expect("dispatch failed");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        match response.body() {
            Body::Text(text) => assert_eq!(text, "No handler for path /test and method GET"),
            other => panic!("unexpected body {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn first_registered_route_wins() {
        async fn first(_: Request, _: Context) -> Result<&'static str, Error> {
            Ok("first")
        }
        async fn second(_: Request, _: Context) -> Result<&'static str, Error> {
            Ok("second")
        }
        let router = Router::new()
            .route(Method::GET, "/overlap", handler_fn(first))
            .route(Method::GET, "/overlap", handler_fn(second));

        let response = router
            .dispatch(request("GET", "/overlap"), Context::default())
            .await
            .expect("dispatch failed");
        match response.body() {
            Body::Text(text) => assert_eq!(text, "first"),
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn methods_disambiguate_routes() {
        async fn created(_: Request, _: Context) -> Result<Response<Body>, Error> {
            Ok(Response::builder()
                .status(StatusCode::CREATED)
                .body(Body::from("created"))
                .expect("failed to build response"))
        }
        let router = Router::new()
            .route(Method::GET, "/invoice", handler_fn(ok))
            .route(Method::POST, "/invoice", handler_fn(created));

        let response = router
            .dispatch(request("POST", "/invoice"), Context::default())
            .await
            .expect("dispatch failed");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn trailing_slashes_are_insignificant() {
        let router = Router::new().route(Method::GET, "/invoice/", handler_fn(ok));

        let response = router
            .dispatch(request("GET", "/invoice"), Context::default())
            .await
            .expect("dispatch failed");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dispatch_is_idempotent_for_side_effect_free_handlers() {
        let router = Router::new().route(Method::GET, "/invoice", handler_fn(ok));

        let first = router
            .dispatch(request("GET", "/invoice"), Context::default())
            .await
            .expect("dispatch failed");
        let second = router
            .dispatch(request("GET", "/invoice"), Context::default())
            .await
            .expect("dispatch failed");
        assert_eq!(first.status(), second.status());
        assert_eq!(
            format!("{:?}", first.body()),
            format!("{:?}", second.body())
        );
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        async fn failing(_: Request, _: Context) -> Result<&'static str, Error> {
            Err("boom".into())
        }
        let router = Router::new().route(Method::GET, "/fail", handler_fn(failing));

        let result = router
            .dispatch(request("GET", "/fail"), Context::default())
            .await;
        assert_eq!(result.err().map(|e| e.to_string()), Some("boom".to_string()));
    }

    #[tokio::test]
    async fn default_headers_apply_to_all_responses() {
        async fn custom(_: Request, _: Context) -> Result<Response<Body>, Error> {
            Ok(Response::builder()
                .header("access-control-allow-origin", "https://example.com")
                .body(Body::from("ok"))
                .expect("failed to build response"))
        }
        let router = Router::new()
            .route(Method::GET, "/hello", handler_fn(ok))
            .route(Method::GET, "/custom", handler_fn(custom))
            .default_header(
                http::header::HeaderName::from_static("access-control-allow-origin"),
                HeaderValue::from_static("*"),
            );

        let matched = router
            .dispatch(request("GET", "/hello"), Context::default())
            .await
            .expect("dispatch failed");
        assert_eq!(
            matched.headers().get("access-control-allow-origin"),
            Some(&HeaderValue::from_static("*"))
        );

        let fallback = router
            .dispatch(request("GET", "/missing"), Context::default())
            .await
            .expect("dispatch failed");
        assert_eq!(
            fallback.headers().get("access-control-allow-origin"),
            Some(&HeaderValue::from_static("*"))
        );

        // a handler that sets the header itself is not clobbered
        let custom = router
            .dispatch(request("GET", "/custom"), Context::default())
            .await
            .expect("dispatch failed");
        assert_eq!(
            custom.headers().get("access-control-allow-origin"),
            Some(&HeaderValue::from_static("https://example.com"))
        );
    }
}
