//! Resources served by the standalone gateway.

use restgate_http::{
    ApiError, AuthRequirement, DescriptorDraft, PathSegments, ResourceHandler, ResourceRegistry,
};

/// The built-in resources plus the demo resources below.
pub fn registry() -> ResourceRegistry {
    ResourceRegistry::with_builtin()
        .with(ProfileResource)
        .with(ArticlesResource)
        .with(FilesResource)
}

/// `/profile`: the caller's own account. Always authenticated.
#[derive(Debug, Clone, Copy)]
pub struct ProfileResource;

impl ResourceHandler for ProfileResource {
    fn name(&self) -> &str {
        "profile"
    }

    fn get(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Ok(DescriptorDraft::new()
            .controller("Profile")
            .application("accounts")
            .authenticate(AuthRequirement::Required))
    }

    fn put(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Ok(DescriptorDraft::new()
            .controller("Profile")
            .method("Update")
            .application("accounts")
            .authenticate(AuthRequirement::Required))
    }
}

/// `/articles[/<slug>]`: public, personalized when the caller signs in.
#[derive(Debug, Clone, Copy)]
pub struct ArticlesResource;

impl ResourceHandler for ArticlesResource {
    fn name(&self) -> &str {
        "articles"
    }

    fn get(&self, path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        let draft = DescriptorDraft::new()
            .controller("Article")
            .authenticate(AuthRequirement::Optional);
        Ok(match path.get(1) {
            Some(slug) => draft.method("Show").argument("slug", slug),
            None => draft,
        })
    }

    fn post(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Ok(DescriptorDraft::new()
            .controller("Article")
            .method("Create")
            .authenticate(AuthRequirement::Required))
    }

    fn delete(&self, path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Ok(DescriptorDraft::new()
            .controller("Article")
            .method("Destroy")
            .argument("slug", path.get(1).unwrap_or_default())
            .authenticate(AuthRequirement::Required))
    }
}

/// `/files`: `userfile` uploads.
#[derive(Debug, Clone, Copy)]
pub struct FilesResource;

impl ResourceHandler for FilesResource {
    fn name(&self) -> &str {
        "files"
    }

    fn put(&self, _path: &PathSegments) -> Result<DescriptorDraft, ApiError> {
        Ok(DescriptorDraft::new()
            .controller("File")
            .method("Store")
            .authenticate(AuthRequirement::Required))
    }
}
