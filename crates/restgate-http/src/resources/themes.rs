use crate::resource::ResourceHandler;

/// `/themes`. Reserved; every verb answers `NotImplemented`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThemesResource;

impl ResourceHandler for ThemesResource {
    fn name(&self) -> &str {
        "themes"
    }
}
