//! Host calling convention.
//!
//! # Data Flow
//! ```text
//! host invokes App(env, headers, body, cancel, respond, next)
//!     → adapter.rs (build Context from env + headers + body)
//!     → Dispatcher
//!     → Completed: respond(status, headers, body writer)
//!     → NoMatch:   next(env, headers, body, cancel, respond, None) or done
//! ```
//!
//! # Design Decisions
//! - NoMatch is a value, never an error
//! - The body is produced lazily by a one-shot writer the host drives
//! - Request context is built once and never shared between requests

pub mod adapter;
pub mod body;
pub mod context;

pub use adapter::{keys, App, Completion, Environment, HostAdapter, HostError, ResponseHandler};
pub use body::{copy_cancellable, BytesBody, WriteBody};
pub use context::{Context, ContextError, QueryString, RequestBody, RequestContext, ResponseContext, Status};
