//! Handler execution pipelines.
//!
//! # Responsibilities
//! - Compose the steps run around a handler
//! - Cache one pipeline per handler type
//!
//! # Design Decisions
//! - Default Content-Type is negotiated before the handler runs; handlers may overwrite it
//! - A pipeline that finishes synchronously returns no future

use dashmap::DashMap;
use std::sync::Arc;

use crate::content::negotiation::negotiate_produced;
use crate::handlers::descriptor::HandlerDescriptor;
use crate::handlers::handler::{HandlerError, HandlerFuture};
use crate::handlers::registry::HandlerType;
use crate::host::context::Context;

/// An invocable execution sequence for one handler type.
pub trait Pipeline: Send + Sync {
    fn invoke<'a>(
        &'a self,
        descriptor: &'a HandlerDescriptor,
        context: &'a mut Context,
    ) -> Result<Option<HandlerFuture<'a>>, HandlerError>;
}

/// Produces the pipeline for a resolved handler.
pub trait PipelineFactory: Send + Sync {
    fn pipeline_for(&self, descriptor: &HandlerDescriptor) -> Arc<dyn Pipeline>;
}

/// Default pipeline: negotiate the content type, then run the handler.
#[derive(Debug)]
pub struct HandlerPipeline {
    handler_type: HandlerType,
}

impl HandlerPipeline {
    pub fn new(handler_type: HandlerType) -> Self {
        Self { handler_type }
    }
}

impl Pipeline for HandlerPipeline {
    fn invoke<'a>(
        &'a self,
        descriptor: &'a HandlerDescriptor,
        context: &'a mut Context,
    ) -> Result<Option<HandlerFuture<'a>>, HandlerError> {
        if context.response.content_type().is_none() {
            let content_type =
                negotiate_produced(self.handler_type.produced_types(), context.request.accept());
            context.response.set_content_type(&content_type)?;
        }

        Ok(self
            .handler_type
            .handler()
            .handle(descriptor.variables(), context))
    }
}

/// Builds `HandlerPipeline`s and caches them by handler name.
#[derive(Default)]
pub struct CachingPipelineFactory {
    pipelines: DashMap<String, Arc<dyn Pipeline>>,
}

impl CachingPipelineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

impl PipelineFactory for CachingPipelineFactory {
    fn pipeline_for(&self, descriptor: &HandlerDescriptor) -> Arc<dyn Pipeline> {
        let handler_type = descriptor.handler_type();
        if let Some(pipeline) = self.pipelines.get(handler_type.name()) {
            return Arc::clone(pipeline.value());
        }

        let entry = self
            .pipelines
            .entry(handler_type.name().to_string())
            .or_insert_with(|| {
                tracing::debug!(handler = %handler_type.name(), "Building handler pipeline");
                let pipeline: Arc<dyn Pipeline> =
                    Arc::new(HandlerPipeline::new(Arc::clone(handler_type)));
                pipeline
            });
        Arc::clone(entry.value())
    }
}
