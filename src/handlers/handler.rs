//! Application handler trait.

use futures_util::future::BoxFuture;
use std::io;
use thiserror::Error;

use crate::handlers::descriptor::Variables;
use crate::host::context::{Context, ContextError};

/// Errors raised by handlers and their pipelines.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Future returned by asynchronous handlers.
pub type HandlerFuture<'a> = BoxFuture<'a, Result<(), HandlerError>>;

/// Application-defined request handling logic.
pub trait Handler: Send + Sync {
    /// Handle a request.
    ///
    /// Returns `None` when the work finished synchronously.
    fn handle<'a>(
        &'a self,
        variables: &'a Variables,
        context: &'a mut Context,
    ) -> Option<HandlerFuture<'a>>;
}

/// Handler backed by a synchronous closure.
pub struct FnHandler<F> {
    f: F,
}

/// Wrap a synchronous closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&Variables, &mut Context) -> Result<(), HandlerError> + Send + Sync,
{
    FnHandler { f }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&Variables, &mut Context) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle<'a>(
        &'a self,
        variables: &'a Variables,
        context: &'a mut Context,
    ) -> Option<HandlerFuture<'a>> {
        match (self.f)(variables, context) {
            Ok(()) => None,
            Err(e) => Some(Box::pin(futures_util::future::ready(Err(e)))),
        }
    }
}
