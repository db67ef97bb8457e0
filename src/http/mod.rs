//! Demo HTTP host.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, tracing layer)
//!     → bridge: axum Request → (env, headers, body, cancel, respond, next)
//!     → host App (HostAdapter → Dispatcher)
//!     → respond(): status + headers + streamed body → axum Response
//!     → nothing emitted → 404
//! ```

pub mod server;

pub use server::HttpServer;
