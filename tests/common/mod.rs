//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use app_host::config::StaticContentConfig;
use app_host::handlers::{
    handler_fn, CachingPipelineFactory, HandlerDescriptor, HandlerRegistration, HandlerRegistry,
    Pipeline, PipelineFactory,
};
use app_host::host::{BytesBody, Context, RequestContext, WriteBody};
use tokio_util::sync::CancellationToken;

/// Create an application root with an index page and a public stylesheet.
pub fn web_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    fs::create_dir(dir.path().join("public")).unwrap();
    fs::write(dir.path().join("public").join("style.css"), "body { margin: 0 }").unwrap();
    dir
}

/// Static content serving `/public` and mapping `/` to the index page.
pub fn static_content(root: &TempDir) -> StaticContentConfig {
    let mut config = StaticContentConfig {
        app_root: root.path().to_path_buf(),
        ..StaticContentConfig::default()
    };
    config.add_public_folder("/public");
    config.add_file_mapping("/", "/index.html");
    config
}

pub fn get(path: &str) -> Context {
    Context::new(RequestContext::new("GET", path))
}

pub fn get_accepting(path: &str, accept: &[&str]) -> Context {
    Context::new(RequestContext::new("GET", path).with_accept(accept.iter().copied()))
}

/// Drain a body writer into memory.
pub async fn collect_body(writer: Box<dyn WriteBody>) -> Vec<u8> {
    let mut out = Vec::new();
    writer
        .write_to(&mut out, CancellationToken::new())
        .await
        .unwrap();
    out
}

/// Registry with a widget lookup handler and a catch-all under `/public`.
pub fn widget_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register(
            HandlerRegistration::new(
                "widget",
                "GET",
                "/api/widgets/{id}",
                handler_fn(|variables, context| {
                    let id = variables.first("id").unwrap_or_default().to_string();
                    context.response.set_body(BytesBody::new(format!("widget {id}")))?;
                    Ok(())
                }),
            )
            .unwrap()
            .produces(["text/plain"]),
        )
        .unwrap();
    registry
        .register(
            HandlerRegistration::new(
                "public-fallback",
                "GET",
                "/public/{*rest}",
                handler_fn(|_, context| {
                    context.response.set_body(BytesBody::new("from handler"))?;
                    Ok(())
                }),
            )
            .unwrap(),
        )
        .unwrap();
    registry
}

/// Descriptor as seen by the pipeline factory: (handler name, method, variables).
pub type RecordedDescriptor = (String, String, Vec<(String, Vec<String>)>);

/// Pipeline factory that records every descriptor before delegating.
#[derive(Default)]
pub struct RecordingFactory {
    inner: CachingPipelineFactory,
    seen: Mutex<Vec<RecordedDescriptor>>,
}

impl RecordingFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<RecordedDescriptor> {
        self.seen.lock().unwrap().clone()
    }
}

impl PipelineFactory for RecordingFactory {
    fn pipeline_for(&self, descriptor: &HandlerDescriptor) -> Arc<dyn Pipeline> {
        let variables = descriptor
            .variables()
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect();
        self.seen.lock().unwrap().push((
            descriptor.handler_type().name().to_string(),
            descriptor.method().to_string(),
            variables,
        ));
        self.inner.pipeline_for(descriptor)
    }
}
