//! Content loader adapters.

pub mod static_content;
pub mod toml_content;

pub use static_content::StaticContentLoader;
pub use toml_content::TomlContentLoader;
