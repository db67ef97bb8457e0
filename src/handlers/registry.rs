//! Explicit handler registry.
//!
//! # Responsibilities
//! - Hold every handler registered at bootstrap
//! - Reject duplicate names and malformed templates
//! - Answer "which handlers respond to this method?"

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::handlers::handler::Handler;
use crate::routing::template::{TemplateError, UriTemplate};

/// Identity of a registered handler.
pub type HandlerType = Arc<HandlerRegistration>;

/// Errors raised while registering handlers.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("handler '{0}' is already registered")]
    DuplicateName(String),

    #[error("invalid template for handler '{name}': {source}")]
    InvalidTemplate {
        name: String,
        #[source]
        source: TemplateError,
    },
}

/// A handler together with the method and URI template it responds to.
pub struct HandlerRegistration {
    name: String,
    method: String,
    template: UriTemplate,
    consumes: Vec<String>,
    produces: Vec<String>,
    handler: Arc<dyn Handler>,
}

impl HandlerRegistration {
    pub fn new(
        name: impl Into<String>,
        method: impl Into<String>,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let template = UriTemplate::parse(template).map_err(|source| RegistryError::InvalidTemplate {
            name: name.clone(),
            source,
        })?;

        Ok(Self {
            name,
            method: method.into(),
            template,
            consumes: Vec::new(),
            produces: Vec::new(),
            handler: Arc::new(handler),
        })
    }

    /// Request content types this handler accepts.
    pub fn consumes<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes = types.into_iter().map(Into::into).collect();
        self
    }

    /// Response content types this handler can produce, preferred first.
    pub fn produces<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    pub fn consumed_types(&self) -> &[String] {
        &self.consumes
    }

    pub fn produced_types(&self) -> &[String] {
        &self.produces
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    pub fn responds_to(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }
}

impl fmt::Debug for HandlerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

/// All handlers known to the application.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: Vec<HandlerType>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, registration: HandlerRegistration) -> Result<(), RegistryError> {
        if self.handlers.iter().any(|h| h.name == registration.name) {
            return Err(RegistryError::DuplicateName(registration.name));
        }

        tracing::debug!(
            handler = %registration.name,
            method = %registration.method,
            template = %registration.template.as_str(),
            "Handler registered"
        );
        self.handlers.push(Arc::new(registration));
        Ok(())
    }

    /// Handlers declared for `method` (case-insensitive), in registration order.
    pub fn handlers_for(&self, method: &str) -> Vec<HandlerType> {
        self.handlers
            .iter()
            .filter(|h| h.responds_to(method))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandlerType> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
