pub mod artifact;
pub mod config;
pub mod element;
pub mod errors;
pub mod records;
pub mod template;

pub use artifact::*;
pub use config::*;
pub use element::*;
pub use errors::*;
pub use records::*;
pub use template::ObjectTemplate;
