//! HTTP server bridging axum requests into the host calling convention.
//!
//! # Responsibilities
//! - Accept connections via Axum
//! - Translate each request into the host environment tuple
//! - Stream the emitted body back through a duplex pipe
//! - Answer 404 when no stage emitted a response
//! - Cancel in-flight body writers on shutdown

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use futures_util::TryStreamExt;
use std::future::Future;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::io::{ReaderStream, StreamReader};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::host::body::COPY_BUFFER_SIZE;
use crate::host::{keys, App, Completion, Environment, HostError, RequestBody, ResponseHandler, Status, WriteBody};

/// State injected into the bridge handler.
#[derive(Clone)]
struct ServerState {
    app: App,
    shutdown: CancellationToken,
}

/// HTTP server hosting one `App`.
pub struct HttpServer {
    router: Router,
    shutdown: CancellationToken,
}

impl HttpServer {
    pub fn new(app: App) -> Self {
        let shutdown = CancellationToken::new();
        let state = ServerState {
            app,
            shutdown: shutdown.clone(),
        };
        Self {
            router: Self::build_router(state),
            shutdown,
        }
    }

    fn build_router(state: ServerState) -> Router {
        Router::new()
            .fallback(host_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `signal` resolves, then cancel in-flight body writers.
    pub async fn run<F>(self, listener: TcpListener, signal: F) -> Result<(), io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                signal.await;
                tracing::info!("Shutdown signal received");
                shutdown.cancel();
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn host_handler(State(state): State<ServerState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let env = environment(&parts.method, &parts.uri, &parts.headers);

    let body: RequestBody = Box::new(StreamReader::new(Box::pin(
        body.into_data_stream().map_err(io::Error::other),
    )));

    let cancel = state.shutdown.child_token();
    let (tx, rx) = oneshot::channel::<Response>();
    let writer_cancel = cancel.clone();
    let respond: ResponseHandler = Box::new(
        move |status: Status, headers: HeaderMap, writer: Option<Box<dyn WriteBody>>| -> Completion {
            Box::pin(async move {
                let code = StatusCode::from_u16(status.code())
                    .map_err(|_| HostError::InvalidStatus(status.code()))?;
                let body = match writer {
                    Some(writer) => stream_body(writer, writer_cancel),
                    None => Body::empty(),
                };

                let mut response = Response::new(body);
                *response.status_mut() = code;
                *response.headers_mut() = headers;
                tx.send(response).map_err(|_| HostError::ResponseDropped)
            })
        },
    );

    match state.app.call(env, parts.headers, body, cancel, respond, None).await {
        Ok(()) => rx
            .await
            .unwrap_or_else(|_| (StatusCode::NOT_FOUND, "Not Found").into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn environment(method: &axum::http::Method, uri: &axum::http::Uri, headers: &HeaderMap) -> Environment {
    let mut env = Environment::new();
    env.insert(keys::REQUEST_METHOD.to_string(), method.as_str().to_string());
    env.insert(keys::REQUEST_PATH.to_string(), decode_path(uri.path()));
    env.insert(keys::REQUEST_PATH_BASE.to_string(), String::new());
    env.insert(
        keys::REQUEST_QUERY_STRING.to_string(),
        uri.query().unwrap_or_default().to_string(),
    );
    env.insert(
        keys::REQUEST_SCHEME.to_string(),
        uri.scheme_str().unwrap_or("http").to_string(),
    );
    if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        env.insert(keys::REQUEST_ID.to_string(), id.to_string());
    }
    env
}

/// Decode `%XX` escapes in a path; malformed escapes are kept as-is.
fn decode_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                decoded.push(value);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

/// Run the body writer on its own task, feeding a streamed response body.
fn stream_body(writer: Box<dyn WriteBody>, cancel: CancellationToken) -> Body {
    let (mut sink, source) = tokio::io::duplex(COPY_BUFFER_SIZE);

    tokio::spawn(async move {
        if let Err(e) = writer.write_to(&mut sink, cancel).await {
            tracing::warn!(error = %e, "Response body write failed");
        }
        let _ = sink.shutdown().await;
    });

    Body::from_stream(ReaderStream::new(source))
}
