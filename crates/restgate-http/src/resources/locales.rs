use crate::resource::ResourceHandler;

/// `/locales`. Reserved; every verb answers `NotImplemented`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalesResource;

impl ResourceHandler for LocalesResource {
    fn name(&self) -> &str {
        "locales"
    }
}
