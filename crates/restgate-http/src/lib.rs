//! Request dispatch and HTTP service layer for restgate.
//!
//! This crate turns an authenticated-or-not HTTP request into a routing
//! decision for the controller layer:
//!
//! - **Resources**: named handlers returning declarative routing drafts
//! - **Dispatcher**: the resolve, invoke, validate, authenticate, route pipeline
//! - **Body normalization**: URL-encoded and multipart bodies for POST and PUT
//! - **Uploads**: `userfile` parts written to an [`UploadStore`]
//! - **Service**: hyper `Service` with health checks, CORS and error formatting

pub mod body;
pub mod dispatch;
pub mod error;
pub mod multipart;
pub mod normalize;
pub mod request;
pub mod resource;
pub mod resources;
pub mod response;
pub mod route;
pub mod service;
pub mod upload;

pub use body::ResponseBody;
pub use dispatch::{
    ApplicationLoader, DispatchStage, Dispatcher, NoopApplicationLoader, NoopSessionStarter,
    RoutingDecision, SessionStarter,
};
pub use error::{ApiError, ApiErrorCode};
pub use normalize::{BodyNormalizer, NormalizedBody, StoredUpload};
pub use request::{InboundRequest, PathSegments, Verb};
pub use resource::{
    Arguments, AuthRequirement, DescriptorDraft, DispatchDescriptor, ResourceHandler,
    ResourceRegistry,
};
pub use response::DeliveryFormat;
pub use route::{EchoRouteHandler, RouteFuture, RouteHandler};
pub use service::{GatewayHttpConfig, GatewayHttpService};
pub use upload::{DirectoryUploadStore, UploadError, UploadStore};
