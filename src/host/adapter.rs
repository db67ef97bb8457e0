//! Host calling-convention adapter.
//!
//! # Responsibilities
//! - Translate the host tuple into a `Context`
//! - Run the dispatcher inside a `dispatch` span
//! - Emit the response, or forward to the next stage on NoMatch
//!
//! # Design Decisions
//! - The original arguments are forwarded to the next stage unchanged
//! - Without a next stage, NoMatch completes without emitting anything

use axum::http::HeaderMap;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::dispatch::{DispatchError, Dispatcher, Outcome};
use crate::host::body::WriteBody;
use crate::host::context::{
    accept_types, declared_content_type, Context, QueryString, RequestBody, RequestContext, Status,
};

/// Well-known environment keys.
pub mod keys {
    pub const REQUEST_METHOD: &str = "host.RequestMethod";
    pub const REQUEST_PATH: &str = "host.RequestPath";
    pub const REQUEST_PATH_BASE: &str = "host.RequestPathBase";
    pub const REQUEST_QUERY_STRING: &str = "host.RequestQueryString";
    pub const REQUEST_SCHEME: &str = "host.RequestScheme";
    pub const REQUEST_ID: &str = "host.RequestId";
}

/// Request environment supplied by the host.
pub type Environment = HashMap<String, String>;

/// Completion signal returned to the host.
pub type Completion = BoxFuture<'static, Result<(), HostError>>;

/// Response emission callback: (status, headers, body writer) → completion.
pub type ResponseHandler =
    Box<dyn FnOnce(Status, HeaderMap, Option<Box<dyn WriteBody>>) -> Completion + Send>;

type AppFn = dyn Fn(
        Environment,
        HeaderMap,
        RequestBody,
        CancellationToken,
        ResponseHandler,
        Option<App>,
    ) -> Completion
    + Send
    + Sync;

/// One stage of a host middleware chain.
///
/// A stage receives the request tuple plus an optional next stage, and
/// either emits a response through `respond` or hands everything on.
#[derive(Clone)]
pub struct App(Arc<AppFn>);

impl App {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(
                Environment,
                HeaderMap,
                RequestBody,
                CancellationToken,
                ResponseHandler,
                Option<App>,
            ) -> Completion
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke this stage.
    pub fn call(
        &self,
        env: Environment,
        headers: HeaderMap,
        body: RequestBody,
        cancel: CancellationToken,
        respond: ResponseHandler,
        next: Option<App>,
    ) -> Completion {
        (self.0)(env, headers, body, cancel, respond, next)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App").finish_non_exhaustive()
    }
}

/// Errors surfaced at the host boundary.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host environment is missing '{0}'")]
    MissingEnvironment(&'static str),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("invalid response status {0}")]
    InvalidStatus(u16),

    #[error("response receiver dropped before the response was emitted")]
    ResponseDropped,
}

/// Exposes a `Dispatcher` through the host calling convention.
#[derive(Clone)]
pub struct HostAdapter {
    dispatcher: Arc<Dispatcher>,
}

impl HostAdapter {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Handle one request.
    pub async fn run(
        &self,
        env: Environment,
        headers: HeaderMap,
        body: RequestBody,
        cancel: CancellationToken,
        respond: ResponseHandler,
        next: Option<App>,
    ) -> Result<(), HostError> {
        let request = request_from_environment(&env, &headers, body)?;
        let request_id = env
            .get(keys::REQUEST_ID)
            .cloned()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id,
            method = %request.method(),
            path = %request.path(),
        );

        let mut context = Context::new(request);
        let outcome = self
            .dispatcher
            .dispatch(&mut context)
            .instrument(span.clone())
            .await?;

        match outcome {
            Outcome::NoMatch => {
                let body = context.request.into_body();
                match next {
                    Some(app) => {
                        span.in_scope(|| tracing::debug!("No match, forwarding to next stage"));
                        app.call(env, headers, body, cancel, respond, None).await
                    }
                    None => Ok(()),
                }
            }
            Outcome::Completed => {
                let (status, headers, writer) = context.response.into_parts();
                span.in_scope(|| tracing::debug!(status = status.code(), "Emitting response"));
                respond(status, headers, writer).await
            }
        }
    }

    /// Wrap this adapter as a host `App`.
    pub fn into_app(self) -> App {
        let adapter = Arc::new(self);
        App::new(
            move |env: Environment,
                  headers: HeaderMap,
                  body: RequestBody,
                  cancel: CancellationToken,
                  respond: ResponseHandler,
                  next: Option<App>|
                  -> Completion {
                let adapter = Arc::clone(&adapter);
                Box::pin(async move { adapter.run(env, headers, body, cancel, respond, next).await })
            },
        )
    }
}

/// Build the request context from the host environment.
pub fn request_from_environment(
    env: &Environment,
    headers: &HeaderMap,
    body: RequestBody,
) -> Result<RequestContext, HostError> {
    let method = env
        .get(keys::REQUEST_METHOD)
        .ok_or(HostError::MissingEnvironment(keys::REQUEST_METHOD))?;
    let path = env
        .get(keys::REQUEST_PATH)
        .ok_or(HostError::MissingEnvironment(keys::REQUEST_PATH))?;
    let base = env.get(keys::REQUEST_PATH_BASE).map(String::as_str).unwrap_or("");

    let mut absolute_path = format!("{base}{path}");
    if absolute_path.is_empty() {
        absolute_path.push('/');
    }

    let query = env
        .get(keys::REQUEST_QUERY_STRING)
        .map(|q| QueryString::parse(q))
        .unwrap_or_default();

    let mut request = RequestContext::new(method.as_str(), absolute_path)
        .with_query(query)
        .with_body(body);
    if let Some(content_type) = declared_content_type(headers) {
        request = request.with_content_type(content_type);
    }
    if let Some(accept) = accept_types(headers) {
        request = request.with_accept(accept);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_request_from_environment() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("accept", HeaderValue::from_static("text/html, */*"));

        let request = request_from_environment(
            &env(&[
                (keys::REQUEST_METHOD, "POST"),
                (keys::REQUEST_PATH_BASE, "/app"),
                (keys::REQUEST_PATH, "/widgets"),
                (keys::REQUEST_QUERY_STRING, "page=2&page=3"),
            ]),
            &headers,
            Box::new(tokio::io::empty()),
        )
        .unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(request.path(), "/app/widgets");
        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(
            request.accept(),
            Some(&["text/html".to_string(), "*/*".to_string()][..])
        );
        assert_eq!(request.query().get_all("page").collect::<Vec<_>>(), vec!["2", "3"]);
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let request = request_from_environment(
            &env(&[(keys::REQUEST_METHOD, "GET"), (keys::REQUEST_PATH, "")]),
            &HeaderMap::new(),
            Box::new(tokio::io::empty()),
        )
        .unwrap();
        assert_eq!(request.path(), "/");
        assert_eq!(request.accept(), None);
    }

    #[test]
    fn test_missing_method_is_error() {
        let err = request_from_environment(
            &env(&[(keys::REQUEST_PATH, "/")]),
            &HeaderMap::new(),
            Box::new(tokio::io::empty()),
        )
        .unwrap_err();
        assert!(matches!(err, HostError::MissingEnvironment(keys::REQUEST_METHOD)));
    }
}
