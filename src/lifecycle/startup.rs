//! Deferred, run-once application startup.
//!
//! # Responsibilities
//! - Hold the startup tasks registered at bootstrap
//! - Run them before the first dispatch, exactly once
//! - Publish the static content configuration they produce
//!
//! # Design Decisions
//! - Fast path is a single atomic load once startup has completed
//! - The mutex is held only while the tasks run, never for per-request work
//! - The runner is cleared only after a successful run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::config::validation::{validate_static_content, ValidationError};
use crate::config::StaticContentConfig;
use crate::content::StaticContentResolver;
use crate::observability::metrics;

/// Errors raised by the startup routine.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("startup task '{task}' failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("startup produced an invalid static content configuration: {0:?}")]
    InvalidConfig(Vec<ValidationError>),
}

impl StartupError {
    pub fn task_failed(task: impl Into<String>, reason: impl ToString) -> Self {
        Self::TaskFailed {
            task: task.into(),
            reason: reason.to_string(),
        }
    }
}

/// One unit of application bootstrap work.
pub trait StartupTask: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn run(&self, config: &mut StaticContentConfig) -> Result<(), StartupError>;
}

impl<F> StartupTask for F
where
    F: Fn(&mut StaticContentConfig) -> Result<(), StartupError> + Send + Sync,
{
    fn run(&self, config: &mut StaticContentConfig) -> Result<(), StartupError> {
        self(config)
    }
}

/// Startup tasks, run in registration order.
#[derive(Default)]
pub struct StartupRunner {
    tasks: Vec<Box<dyn StartupTask>>,
}

impl StartupRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: impl StartupTask + 'static) {
        self.tasks.push(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task against a copy of the current static content
    /// configuration, then publish the result.
    pub fn run_all(&self, static_content: &StaticContentResolver) -> Result<(), StartupError> {
        static_content.update(|config| {
            for task in &self.tasks {
                tracing::debug!(task = %task.name(), "Running startup task");
                task.run(config)?;
            }

            validate_static_content(config).map_err(StartupError::InvalidConfig)
        })
    }
}

/// Runs the startup routine once, before the first dispatch.
pub struct StartupGate {
    completed: AtomicBool,
    pending: Mutex<Option<StartupRunner>>,
}

impl StartupGate {
    pub fn new(runner: StartupRunner) -> Self {
        Self {
            completed: AtomicBool::new(false),
            pending: Mutex::new(Some(runner)),
        }
    }

    pub fn is_started(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Run `routine` with the pending runner unless startup already completed.
    ///
    /// Concurrent first callers serialize on the lock; only one runs the
    /// routine. On failure the error goes to that caller and the runner stays
    /// pending for the next call.
    pub fn ensure_started<F>(&self, routine: F) -> Result<(), StartupError>
    where
        F: FnOnce(&StartupRunner) -> Result<(), StartupError>,
    {
        if self.completed.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(runner) = pending.as_ref() else {
            return Ok(());
        };

        let result = routine(runner);
        metrics::record_startup_run(result.is_ok());
        if let Err(e) = result {
            tracing::error!(error = %e, "Application startup failed");
            return Err(e);
        }

        *pending = None;
        self.completed.store(true, Ordering::Release);
        tracing::info!("Application startup complete");
        Ok(())
    }
}
