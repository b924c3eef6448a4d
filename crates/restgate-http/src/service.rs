//! The gateway HTTP service implementing hyper's `Service` trait.
//!
//! [`GatewayHttpService`] handles, in order:
//!
//! 1. Health check interception (`GET /health`, `GET /_health`)
//! 2. CORS preflight requests (`OPTIONS`), when CORS is enabled
//! 3. Request body collection
//! 4. Dispatch through the [`Dispatcher`]
//! 5. Controller invocation through the [`RouteHandler`]
//! 6. Common response headers (`x-request-id`, `server`, CORS)
//! 7. Error response formatting in the negotiated [`DeliveryFormat`]

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::body::ResponseBody;
use crate::dispatch::Dispatcher;
use crate::error::{ApiError, ApiErrorCode};
use crate::request::InboundRequest;
use crate::response::{DeliveryFormat, error_to_response};
use crate::route::RouteHandler;

/// Value of the `server` response header.
const SERVER_NAME: &str = "restgate";

/// Configuration for the gateway HTTP service.
#[derive(Debug, Clone, Default)]
pub struct GatewayHttpConfig {
    /// Answer CORS preflight requests and add CORS headers to responses.
    pub allow_cors: bool,
}

/// Hyper `Service` that dispatches requests and hands the routing decision to
/// a [`RouteHandler`].
pub struct GatewayHttpService<R: RouteHandler> {
    dispatcher: Arc<Dispatcher>,
    handler: Arc<R>,
    config: Arc<GatewayHttpConfig>,
}

impl<R: RouteHandler> fmt::Debug for GatewayHttpService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayHttpService")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R: RouteHandler> GatewayHttpService<R> {
    /// Create a new service.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, handler: R, config: GatewayHttpConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            handler: Arc::new(handler),
            config: Arc::new(config),
        }
    }
}

impl<R: RouteHandler> Clone for GatewayHttpService<R> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R: RouteHandler> Service<http::Request<Incoming>> for GatewayHttpService<R> {
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = service.process_request(req, &request_id).await;
            Ok(add_common_headers(
                response,
                &request_id,
                service.config.allow_cors,
            ))
        })
    }
}

impl<R: RouteHandler> GatewayHttpService<R> {
    /// Run one request through the full pipeline.
    async fn process_request<B>(
        &self,
        req: http::Request<B>,
        request_id: &str,
    ) -> http::Response<ResponseBody>
    where
        B: http_body::Body<Data = Bytes>,
        B::Error: fmt::Display,
    {
        let (parts, incoming) = req.into_parts();
        debug!(request_id, method = %parts.method, path = parts.uri.path(), "received request");

        // 1. Health check interception.
        if is_health_check(&parts.method, parts.uri.path()) {
            return health_check_response();
        }

        // 2. CORS preflight.
        if self.config.allow_cors && parts.method == http::Method::OPTIONS {
            return cors_preflight_response();
        }

        let format = DeliveryFormat::from_accept(
            parts
                .headers
                .get(http::header::ACCEPT)
                .and_then(|v| v.to_str().ok()),
        );

        // 3. Collect body.
        let body = match collect_body(incoming).await {
            Ok(body) => body,
            Err(err) => return error_to_response(&err, format),
        };
        let request = InboundRequest::from_parts(&parts, body);

        // 4. Dispatch.
        let decision = match self.dispatcher.dispatch(&request) {
            Ok(decision) => decision,
            Err(err) => {
                if err.code == ApiErrorCode::Unauthorized {
                    warn!(request_id, kind = err.client_code(), "authentication failed");
                }
                return error_to_response(&err, format);
            }
        };

        // 5. Invoke the controller.
        match self.handler.handle_route(decision, request, format).await {
            Ok(response) => response,
            Err(err) => {
                warn!(request_id, error = %err, "route handler failed");
                error_to_response(&err, format)
            }
        }
    }
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body<B>(incoming: B) -> Result<Bytes, ApiError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: fmt::Display,
{
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| ApiError::internal_error(format!("Failed to read request body: {e}")))
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/health" || path == "/_health")
}

/// Produce a health check response.
fn health_check_response() -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", "application/json")
        .body(ResponseBody::from_string(
            r#"{"status":"running","service":"restgate"}"#,
        ))
        .expect("static health response should be valid")
}

/// Produce a CORS preflight response.
fn cors_preflight_response() -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("access-control-allow-origin", "*")
        .header(
            "access-control-allow-methods",
            "GET, PUT, POST, DELETE, OPTIONS",
        )
        .header("access-control-allow-headers", "*, Content-Type, Accept")
        .header("access-control-max-age", "86400")
        .body(ResponseBody::empty())
        .expect("static CORS response should be valid")
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<ResponseBody>,
    request_id: &str,
    allow_cors: bool,
) -> http::Response<ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }

    headers.insert("server", http::HeaderValue::from_static(SERVER_NAME));

    if allow_cors {
        headers.insert(
            "access-control-allow-origin",
            http::HeaderValue::from_static("*"),
        );
        headers.insert(
            "access-control-expose-headers",
            http::HeaderValue::from_static("x-request-id"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use http_body_util::Full;
    use restgate_auth::{FixedClock, RequestAuthenticator, StaticIdentityResolver, sign_query};
    use restgate_core::Identity;

    use super::*;
    use crate::normalize::BodyNormalizer;
    use crate::request::PathSegments;
    use crate::resource::{AuthRequirement, DescriptorDraft, ResourceHandler, ResourceRegistry};
    use crate::route::EchoRouteHandler;

    const SECRET: &[u8] = b"service-secret";
    const NOW: i64 = 1_700_000_000;

    struct Notes;

    impl ResourceHandler for Notes {
        fn name(&self) -> &str {
            "notes"
        }

        fn get(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
            Ok(DescriptorDraft::new()
                .controller("Note")
                .authenticate(AuthRequirement::Required))
        }

        fn put(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
            Ok(DescriptorDraft::new()
                .controller("Note")
                .method("Update")
                .argument("field", "override"))
        }
    }

    fn service(allow_cors: bool) -> GatewayHttpService<EchoRouteHandler> {
        let resolver = StaticIdentityResolver::new()
            .with_user("alice", "alice@example.com", Identity::from(42));
        let authenticator = RequestAuthenticator::new(
            SECRET.to_vec(),
            300,
            Arc::new(resolver),
            Arc::new(FixedClock::new(NOW)),
        );
        let dispatcher = Dispatcher::new(
            ResourceRegistry::with_builtin().with(Notes),
            authenticator,
            BodyNormalizer::new(),
        );
        GatewayHttpService::new(
            dispatcher,
            EchoRouteHandler,
            GatewayHttpConfig { allow_cors },
        )
    }

    fn request(method: &str, uri: &str, body: &'static str) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .expect("valid request")
    }

    async fn json_body(response: http::Response<ResponseBody>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_should_detect_health_check_paths() {
        assert!(is_health_check(&http::Method::GET, "/health"));
        assert!(is_health_check(&http::Method::GET, "/_health"));
        assert!(!is_health_check(&http::Method::POST, "/health"));
        assert!(!is_health_check(&http::Method::GET, "/notes"));
    }

    #[test]
    fn test_should_produce_cors_preflight_response() {
        let resp = cors_preflight_response();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert!(resp.headers().contains_key("access-control-allow-origin"));
        assert!(resp.headers().contains_key("access-control-allow-methods"));
    }

    #[test]
    fn test_should_add_common_headers() {
        let resp = http::Response::builder()
            .status(http::StatusCode::OK)
            .body(ResponseBody::empty())
            .expect("valid response");
        let resp = add_common_headers(resp, "req-1", false);
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-1");
        assert_eq!(resp.headers().get("server").unwrap(), SERVER_NAME);
        assert!(!resp.headers().contains_key("access-control-allow-origin"));
    }

    #[test]
    fn test_should_add_cors_headers_when_enabled() {
        let resp = add_common_headers(
            http::Response::new(ResponseBody::empty()),
            "req-2",
            true,
        );
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_should_answer_health_check() {
        let resp = service(false)
            .process_request(request("GET", "/health", ""), "req")
            .await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "running");
    }

    #[tokio::test]
    async fn test_should_only_answer_preflight_when_cors_enabled() {
        let resp = service(true)
            .process_request(request("OPTIONS", "/notes", ""), "req")
            .await;
        assert_eq!(resp.status(), http::StatusCode::OK);

        let resp = service(false)
            .process_request(request("OPTIONS", "/notes", ""), "req")
            .await;
        assert_eq!(resp.status(), http::StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_should_render_not_found_error() {
        let resp = service(false)
            .process_request(request("GET", "/unknown-resource", ""), "req")
            .await;
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["code"], "ResourceNotFound");
    }

    #[tokio::test]
    async fn test_should_render_auth_failure_as_xml() {
        let mut req = request("GET", "/notes?username=alice", "");
        req.headers_mut().insert(
            http::header::ACCEPT,
            http::HeaderValue::from_static("application/xml"),
        );
        let resp = service(false).process_request(req, "req").await;
        assert_eq!(resp.status(), http::StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get("content-type").unwrap(), "application/xml");
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let xml = std::str::from_utf8(&bytes).unwrap();
        assert!(xml.contains("<Code>MissingTimestamp</Code>"));
    }

    #[tokio::test]
    async fn test_should_echo_authenticated_decision() {
        let timestamp = NOW.to_string();
        let query = sign_query(
            &[("username", "alice"), ("timestamp", timestamp.as_str())],
            SECRET,
        );
        let resp = service(false)
            .process_request(request("GET", &format!("/notes?{query}"), ""), "req")
            .await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["controller"], "Note");
        assert_eq!(json["method"], "Index");
        assert_eq!(json["identity"], "42");
    }

    #[tokio::test]
    async fn test_should_merge_put_body_under_handler_arguments() {
        let resp = service(false)
            .process_request(request("PUT", "/notes/1", "field=value&extra=1"), "req")
            .await;
        let json = json_body(resp).await;
        assert_eq!(json["arguments"]["field"], "override");
        assert_eq!(json["arguments"]["extra"], "1");
        assert_eq!(json["effectiveMethod"], "POST");
    }
}
