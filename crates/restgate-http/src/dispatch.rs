//! The dispatch pipeline.
//!
//! [`Dispatcher::dispatch`] drives a request through five stages, each of
//! which may end the request with an [`ApiError`]:
//!
//! 1. [`DispatchStage::PathResolved`]: the first path segment names a
//!    registered resource, else `ResourceNotFound`.
//! 2. [`DispatchStage::HandlerInvoked`]: the resource routes the verb, else
//!    `NotImplemented`.
//! 3. [`DispatchStage::DescriptorValidated`]: the draft names a controller,
//!    else `NoController`.
//! 4. [`DispatchStage::AuthDecided`]: the descriptor's [`AuthRequirement`] is
//!    applied, else `Unauthorized`.
//! 5. [`DispatchStage::Routed`]: POST and PUT bodies are normalized and merged
//!    under the handler's arguments, the application module is attached, and
//!    a [`RoutingDecision`] is returned.
//!
//! Body normalization runs after authentication so that uploads from
//! rejected requests never reach the upload store.

use std::fmt;
use std::sync::Arc;

use restgate_auth::{RequestAuthenticator, RequestParameters};
use restgate_auth::authenticator::Principal;
use restgate_core::Identity;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::normalize::{BodyNormalizer, StoredUpload};
use crate::request::{InboundRequest, PathSegments, Verb};
use crate::resource::{
    Arguments, AuthRequirement, DescriptorDraft, DispatchDescriptor, ResourceHandler,
    ResourceRegistry, merge_fields,
};

/// Establishes a session for an authenticated identity.
pub trait SessionStarter: Send + Sync {
    /// Called once per successful authentication.
    fn start_session(&self, identity: &Identity, persistent: bool);
}

/// A [`SessionStarter`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionStarter;

impl SessionStarter for NoopSessionStarter {
    fn start_session(&self, _identity: &Identity, _persistent: bool) {}
}

/// Attaches an application module before the controller runs.
pub trait ApplicationLoader: Send + Sync {
    /// Make `application` available to the controller invocation.
    fn attach(&self, application: &str);
}

/// An [`ApplicationLoader`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopApplicationLoader;

impl ApplicationLoader for NoopApplicationLoader {
    fn attach(&self, _application: &str) {}
}

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    /// The resource handler was found.
    PathResolved,
    /// The handler produced a draft.
    HandlerInvoked,
    /// The draft names a controller.
    DescriptorValidated,
    /// The authentication policy was applied.
    AuthDecided,
    /// The routing decision was produced.
    Routed,
}

impl DispatchStage {
    /// Stage name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PathResolved => "PathResolved",
            Self::HandlerInvoked => "HandlerInvoked",
            Self::DescriptorValidated => "DescriptorValidated",
            Self::AuthDecided => "AuthDecided",
            Self::Routed => "Routed",
        }
    }
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a successful dispatch, consumed by the controller layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    /// Target controller.
    pub controller: String,
    /// Target controller method.
    pub method: String,
    /// Merged controller arguments.
    pub arguments: Arguments,
    /// Application module, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    /// Authenticated identity, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    /// The verb the client sent.
    pub request_method: Verb,
    /// The verb downstream processing should see (`POST` for PUT and DELETE).
    pub effective_method: Verb,
    /// Files written from the request body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<StoredUpload>,
}

/// Resolves, authenticates and routes inbound requests.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ResourceRegistry>,
    authenticator: Arc<RequestAuthenticator>,
    normalizer: BodyNormalizer,
    sessions: Arc<dyn SessionStarter>,
    loader: Arc<dyn ApplicationLoader>,
    persistent_sessions: bool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("authenticator", &self.authenticator)
            .field("normalizer", &self.normalizer)
            .field("persistent_sessions", &self.persistent_sessions)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher with no-op session and application collaborators.
    #[must_use]
    pub fn new(
        registry: ResourceRegistry,
        authenticator: RequestAuthenticator,
        normalizer: BodyNormalizer,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            authenticator: Arc::new(authenticator),
            normalizer,
            sessions: Arc::new(NoopSessionStarter),
            loader: Arc::new(NoopApplicationLoader),
            persistent_sessions: false,
        }
    }

    /// Use `sessions` to start sessions after authentication.
    #[must_use]
    pub fn with_session_starter(mut self, sessions: Arc<dyn SessionStarter>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Use `loader` to attach application modules.
    #[must_use]
    pub fn with_application_loader(mut self, loader: Arc<dyn ApplicationLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Value of the `persistent` flag passed to the session starter.
    #[must_use]
    pub fn with_persistent_sessions(mut self, persistent: bool) -> Self {
        self.persistent_sessions = persistent;
        self
    }

    /// Run `request` through every stage.
    pub fn dispatch(&self, request: &InboundRequest) -> Result<RoutingDecision, ApiError> {
        let path = PathSegments::parse(&request.path);
        let resource = path.resource().unwrap_or_default();

        let result = self.run(request, &path);
        match &result {
            Ok(decision) => info!(
                resource,
                verb = %decision.request_method,
                controller = %decision.controller,
                method = %decision.method,
                identity = decision.identity.as_ref().map(Identity::as_str),
                "routed request"
            ),
            Err(err) => debug!(
                resource,
                method = %request.method,
                error = %err,
                "dispatch failed"
            ),
        }
        result
    }

    fn run(
        &self,
        request: &InboundRequest,
        path: &PathSegments,
    ) -> Result<RoutingDecision, ApiError> {
        let (resource, handler) = self.resolve_path(path)?;
        trace_stage(DispatchStage::PathResolved, resource);

        let verb = Verb::parse(&request.method)
            .ok_or_else(|| ApiError::not_implemented(resource, &request.method))?;
        let draft = invoke_handler(handler.as_ref(), verb, path)?;
        trace_stage(DispatchStage::HandlerInvoked, resource);

        let descriptor = draft.validate(resource)?;
        trace_stage(DispatchStage::DescriptorValidated, resource);

        let identity = self.decide_auth(descriptor.authenticate, request)?;
        trace_stage(DispatchStage::AuthDecided, resource);

        let decision = self.route(descriptor, verb, identity, request);
        trace_stage(DispatchStage::Routed, resource);
        Ok(decision)
    }

    fn resolve_path<'p>(
        &self,
        path: &'p PathSegments,
    ) -> Result<(&'p str, Arc<dyn ResourceHandler>), ApiError> {
        let resource = path.resource().unwrap_or_default();
        self.registry
            .get(resource)
            .map(|handler| (resource, handler))
            .ok_or_else(|| ApiError::resource_not_found(resource))
    }

    fn decide_auth(
        &self,
        requirement: AuthRequirement,
        request: &InboundRequest,
    ) -> Result<Option<Identity>, ApiError> {
        if let Some(identity) = &request.identity {
            debug!(identity = %identity, "request already carries an identity");
            return Ok(Some(identity.clone()));
        }

        match requirement {
            AuthRequirement::None => Ok(None),
            AuthRequirement::Optional => {
                let params = RequestParameters::parse(&request.query);
                if Principal::from_params(&params).is_none() {
                    debug!("no principal in query, proceeding unauthenticated");
                    return Ok(None);
                }
                self.authenticate(request).map(Some)
            }
            AuthRequirement::Required => self.authenticate(request).map(Some),
        }
    }

    fn authenticate(&self, request: &InboundRequest) -> Result<Identity, ApiError> {
        let identity = self.authenticator.authenticate(&request.query)?;
        self.sessions
            .start_session(&identity, self.persistent_sessions);
        Ok(identity)
    }

    fn route(
        &self,
        descriptor: DispatchDescriptor,
        verb: Verb,
        identity: Option<Identity>,
        request: &InboundRequest,
    ) -> RoutingDecision {
        let DispatchDescriptor {
            controller,
            method,
            mut arguments,
            application,
            ..
        } = descriptor;

        let mut uploads = Vec::new();
        if matches!(verb, Verb::Post | Verb::Put) {
            let body = self
                .normalizer
                .normalize(&request.body, request.content_type.as_deref());
            merge_fields(&mut arguments, body.fields);
            uploads = body.uploads;
        }

        if let Some(application) = &application {
            debug!(application = application.as_str(), "attaching application");
            self.loader.attach(application);
        }

        RoutingDecision {
            controller,
            method,
            arguments,
            application,
            identity,
            request_method: verb,
            effective_method: verb.effective(),
            uploads,
        }
    }
}

fn invoke_handler(
    handler: &dyn ResourceHandler,
    verb: Verb,
    path: &PathSegments,
) -> Result<DescriptorDraft, ApiError> {
    debug!(resource = handler.name(), verb = %verb, "invoking resource handler");
    handler.handle(verb, path)
}

fn trace_stage(stage: DispatchStage, resource: &str) {
    tracing::trace!(stage = %stage, resource, "dispatch stage complete");
}
