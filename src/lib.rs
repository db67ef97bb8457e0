//! Embeddable HTTP application host library.

pub mod config;
pub mod content;
pub mod dispatch;
pub mod handlers;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::HostConfig;
pub use dispatch::{DispatchError, Dispatcher, DispatcherBuilder, Outcome};
pub use host::{App, HostAdapter};
pub use http::HttpServer;
