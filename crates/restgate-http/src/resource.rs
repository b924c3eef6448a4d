//! The resource handler contract and its registry.
//!
//! A resource is a named API surface (`/locales`, `/themes`, ...). Its handler
//! never writes a response. For each verb it implements, it returns a
//! [`DescriptorDraft`] naming the controller, method and arguments the
//! surrounding framework should invoke. Verbs it leaves alone answer
//! [`ApiErrorCode::NotImplemented`](crate::error::ApiErrorCode::NotImplemented).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::request::{PathSegments, Verb};

/// Arguments handed to the downstream controller.
pub type Arguments = BTreeMap<String, serde_json::Value>;

/// Method used when a descriptor names none.
pub const DEFAULT_METHOD: &str = "Index";

/// Whether a request must, may, or need not carry credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AuthRequirement {
    /// Authenticate; any failure rejects the request.
    Required,
    /// Authenticate only when the query names a username or email.
    Optional,
    /// Never authenticate.
    #[default]
    None,
}

/// A handler's routing instruction before validation.
///
/// # Examples
///
/// ```
/// use restgate_http::{AuthRequirement, DescriptorDraft};
///
/// let draft = DescriptorDraft::new()
///     .controller("Locale")
///     .argument("code", "en")
///     .authenticate(AuthRequirement::Optional);
/// let descriptor = draft.validate("locales").unwrap();
/// assert_eq!(descriptor.method, "Index");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorDraft {
    /// Target controller.
    pub controller: Option<String>,
    /// Target controller method.
    pub method: Option<String>,
    /// Handler-declared arguments.
    pub arguments: Arguments,
    /// Application module to attach before invoking the controller.
    pub application: Option<String>,
    /// Authentication policy.
    pub authenticate: AuthRequirement,
}

impl DescriptorDraft {
    /// An empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the controller.
    #[must_use]
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Set the controller method.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Declare one argument.
    #[must_use]
    pub fn argument(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Set the application module.
    #[must_use]
    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    /// Set the authentication policy.
    #[must_use]
    pub fn authenticate(mut self, requirement: AuthRequirement) -> Self {
        self.authenticate = requirement;
        self
    }

    /// Check that a controller is named and fill in defaults.
    pub fn validate(self, resource: &str) -> Result<DispatchDescriptor, ApiError> {
        let controller = self
            .controller
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::no_controller(resource))?;
        Ok(DispatchDescriptor {
            controller,
            method: self
                .method
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_METHOD.to_owned()),
            arguments: self.arguments,
            application: self.application.filter(|a| !a.is_empty()),
            authenticate: self.authenticate,
        })
    }
}

/// Merge decoded body fields into `arguments`. Existing entries, declared by
/// the handler, win on collision.
pub fn merge_fields(arguments: &mut Arguments, fields: BTreeMap<String, String>) {
    for (key, value) in fields {
        arguments
            .entry(key)
            .or_insert(serde_json::Value::String(value));
    }
}

/// A validated routing instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchDescriptor {
    /// Target controller.
    pub controller: String,
    /// Target controller method.
    pub method: String,
    /// Arguments for the controller.
    pub arguments: Arguments,
    /// Application module to attach.
    pub application: Option<String>,
    /// Authentication policy.
    pub authenticate: AuthRequirement,
}

/// A named resource with per-verb routing.
///
/// Every verb defaults to `NotImplemented`; implementors override the verbs
/// they support.
pub trait ResourceHandler: Send + Sync {
    /// The resource name as it appears in the first path segment.
    fn name(&self) -> &str;

    /// Route a `GET`.
    fn get(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Err(ApiError::not_implemented(self.name(), Verb::Get.as_str()))
    }

    /// Route a `POST`.
    fn post(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Err(ApiError::not_implemented(self.name(), Verb::Post.as_str()))
    }

    /// Route a `PUT`.
    fn put(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Err(ApiError::not_implemented(self.name(), Verb::Put.as_str()))
    }

    /// Route a `DELETE`.
    fn delete(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Err(ApiError::not_implemented(self.name(), Verb::Delete.as_str()))
    }

    /// Route any verb to the matching operation.
    fn handle(&self, verb: Verb, path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        match verb {
            Verb::Get => self.get(path),
            Verb::Post => self.post(path),
            Verb::Put => self.put(path),
            Verb::Delete => self.delete(path),
        }
    }
}

/// Resource handlers by name. Lookup is an exact match on the lower-cased name.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("ResourceRegistry")
            .field("resources", &names)
            .finish()
    }
}

impl ResourceRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in resources.
    #[must_use]
    pub fn with_builtin() -> Self {
        Self::new()
            .with(crate::resources::LocalesResource)
            .with(crate::resources::ThemesResource)
    }

    /// Register `handler`, replacing any handler of the same name.
    pub fn register(&mut self, handler: impl ResourceHandler + 'static) {
        let name = handler.name().to_lowercase();
        debug!(resource = %name, "registering resource handler");
        self.handlers.insert(name, Arc::new(handler));
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, handler: impl ResourceHandler + 'static) -> Self {
        self.register(handler);
        self
    }

    /// Look up a handler. `name` is expected lower-cased, as produced by
    /// [`PathSegments`].
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no resource is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
