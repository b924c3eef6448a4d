//! Built-in resources.

mod locales;
mod themes;

pub use locales::LocalesResource;
pub use themes::ThemesResource;
