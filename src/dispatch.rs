//! Request dispatch.
//!
//! # Data Flow
//! ```text
//! Context
//!     → StartupGate::ensure_started
//!     → StaticContentResolver::try_serve   ──▶ Completed (file)
//!     → RoutingTableCache::table_for(method).get(path, content type, accept)
//!         → none                            ──▶ NoMatch
//!     → HandlerDescriptor + query-string variables
//!     → PipelineFactory::pipeline_for → Pipeline::invoke ──▶ Completed
//! ```
//!
//! # Design Decisions
//! - Static content and routing are mutually exclusive: a served file never reaches routing
//! - Query-string values are appended after path variables, never replacing them
//! - The startup gate and routing cache are owned here, not process globals

use std::sync::Arc;
use thiserror::Error;

use crate::config::StaticContentConfig;
use crate::content::StaticContentResolver;
use crate::handlers::{
    CachingPipelineFactory, HandlerDescriptor, HandlerError, HandlerRegistry, PipelineFactory,
};
use crate::host::context::{Context, ContextError};
use crate::lifecycle::{StartupError, StartupGate, StartupRunner, StartupTask};
use crate::observability::metrics;
use crate::routing::RoutingTableCache;

/// Result of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response is populated and ready to emit.
    Completed,
    /// Nothing here serves this request.
    NoMatch,
}

/// Failures surfaced by a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("startup failed: {0}")]
    Startup(#[from] StartupError),

    #[error("response error: {0}")]
    Context(#[from] ContextError),

    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Sequences startup, static content, routing and handler invocation.
pub struct Dispatcher {
    startup: StartupGate,
    static_content: StaticContentResolver,
    routing: RoutingTableCache,
    pipelines: Arc<dyn PipelineFactory>,
}

impl Dispatcher {
    pub fn builder(registry: HandlerRegistry) -> DispatcherBuilder {
        DispatcherBuilder::new(registry)
    }

    pub fn static_content(&self) -> &StaticContentResolver {
        &self.static_content
    }

    pub fn routing(&self) -> &RoutingTableCache {
        &self.routing
    }

    pub fn is_started(&self) -> bool {
        self.startup.is_started()
    }

    /// Dispatch one request.
    pub async fn dispatch(&self, context: &mut Context) -> Result<Outcome, DispatchError> {
        let result = self.dispatch_inner(context).await;
        match &result {
            Ok(Outcome::NoMatch) => metrics::record_dispatch("no_match"),
            Ok(Outcome::Completed) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Dispatch failed");
                metrics::record_dispatch("error");
            }
        }
        result
    }

    async fn dispatch_inner(&self, context: &mut Context) -> Result<Outcome, DispatchError> {
        self.startup
            .ensure_started(|runner| runner.run_all(&self.static_content))?;

        if self.static_content.try_serve(context).await? {
            metrics::record_dispatch("static");
            return Ok(Outcome::Completed);
        }

        let request = &context.request;
        let table = self.routing.table_for(request.method());
        let Some(route) = table.get(request.path(), request.content_type(), request.accept()) else {
            tracing::debug!("No handler matched");
            return Ok(Outcome::NoMatch);
        };

        let mut descriptor = HandlerDescriptor::new(route.handler_type, route.variables, request.method());
        descriptor.variables_mut().extend_from_query(request.query());
        tracing::debug!(handler = %descriptor.handler_type().name(), "Handler resolved");

        let pipeline = self.pipelines.pipeline_for(&descriptor);
        if let Some(task) = pipeline.invoke(&descriptor, context)? {
            task.await?;
        }

        metrics::record_dispatch("handler");
        Ok(Outcome::Completed)
    }
}

/// Assembles a `Dispatcher` at application bootstrap.
pub struct DispatcherBuilder {
    registry: HandlerRegistry,
    static_content: StaticContentConfig,
    startup: StartupRunner,
    pipelines: Option<Arc<dyn PipelineFactory>>,
}

impl DispatcherBuilder {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            static_content: StaticContentConfig::default(),
            startup: StartupRunner::new(),
            pipelines: None,
        }
    }

    pub fn static_content(mut self, config: StaticContentConfig) -> Self {
        self.static_content = config;
        self
    }

    pub fn startup_task(mut self, task: impl StartupTask + 'static) -> Self {
        self.startup.add(task);
        self
    }

    pub fn pipeline_factory(mut self, factory: Arc<dyn PipelineFactory>) -> Self {
        self.pipelines = Some(factory);
        self
    }

    pub fn build(self) -> Dispatcher {
        tracing::info!(
            handlers = self.registry.len(),
            startup_tasks = self.startup.len(),
            "Dispatcher ready"
        );

        let pipelines: Arc<dyn PipelineFactory> = match self.pipelines {
            Some(factory) => factory,
            None => Arc::new(CachingPipelineFactory::new()),
        };

        Dispatcher {
            startup: StartupGate::new(self.startup),
            static_content: StaticContentResolver::new(self.static_content),
            routing: RoutingTableCache::from_registry(Arc::new(self.registry)),
            pipelines,
        }
    }
}
