//! Handler discovery and execution.
//!
//! # Data Flow
//! ```text
//! Bootstrap:
//!     HandlerRegistration (name, method, template, consumes, produces, handler)
//!     → registry.rs (explicit registry, queryable by method)
//!
//! Per request:
//!     RouteMatch → HandlerDescriptor (type + variables + method)
//!     → pipeline.rs (cached per handler type)
//!     → Handler::handle
//! ```
//!
//! # Design Decisions
//! - Registry is filled at bootstrap, read-only afterwards
//! - A handler may finish synchronously (no future returned)

pub mod descriptor;
pub mod handler;
pub mod pipeline;
pub mod registry;

pub use descriptor::{HandlerDescriptor, Variables};
pub use handler::{handler_fn, FnHandler, Handler, HandlerError, HandlerFuture};
pub use pipeline::{CachingPipelineFactory, HandlerPipeline, Pipeline, PipelineFactory};
pub use registry::{HandlerRegistration, HandlerRegistry, HandlerType, RegistryError};
