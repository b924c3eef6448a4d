//! The boundary between dispatch and controller invocation.

use std::future::Future;
use std::pin::Pin;

use crate::body::ResponseBody;
use crate::dispatch::RoutingDecision;
use crate::error::ApiError;
use crate::request::InboundRequest;
use crate::response::{DeliveryFormat, decision_to_response};

/// Future returned by [`RouteHandler::handle_route`].
pub type RouteFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<ResponseBody>, ApiError>> + Send>>;

/// Invokes the controller named by a routing decision.
///
/// This is the surrounding framework's side of the gateway: the dispatcher
/// decides where a request goes, the route handler takes it there and produces
/// the response.
pub trait RouteHandler: Send + Sync + 'static {
    /// Produce the response for `decision`.
    fn handle_route(
        &self,
        decision: RoutingDecision,
        request: InboundRequest,
        format: DeliveryFormat,
    ) -> RouteFuture;
}

/// Answers every request with the routing decision itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoRouteHandler;

impl RouteHandler for EchoRouteHandler {
    fn handle_route(
        &self,
        decision: RoutingDecision,
        _request: InboundRequest,
        format: DeliveryFormat,
    ) -> RouteFuture {
        Box::pin(async move { Ok(decision_to_response(&decision, format)) })
    }
}
