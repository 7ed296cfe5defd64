//! # Component Loggers
//!
//! Each component receives its own named logger instead of reaching for a
//! global one. A [`ComponentLogger`] is a `tracing` span carrying
//! `component = <name>`; work done under it inherits the field, so the
//! subscriber configured by the runtime can filter and group by component.
//!
//! ```ignore
//! let log = ComponentLogger::named("prize-handler");
//! async { info!("spawned") }.instrument(log.span()).await;
//! ```

use tracing::{info_span, Span};

#[derive(Debug, Clone)]
pub struct ComponentLogger {
    name: String,
    span: Span,
}

impl ComponentLogger {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let span = info_span!("component", component = %name);
        Self { name, span }
    }

    /// Logger for a sub-component, e.g. `service/did:world:0x..`.
    pub fn child(&self, suffix: impl std::fmt::Display) -> Self {
        Self::named(format!("{}/{suffix}", self.name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Span to enter or instrument work with.
    pub fn span(&self) -> Span {
        self.span.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_names() {
        let log = ComponentLogger::named("service");
        assert_eq!(log.child("did:world:0x1").name(), "service/did:world:0x1");
    }
}
