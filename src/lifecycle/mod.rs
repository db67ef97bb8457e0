//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     first dispatch → StartupGate::ensure_started
//!         → StartupRunner runs tasks in order on a copy of the static content config
//!         → validate → publish → gate completed
//! ```
//!
//! # Design Decisions
//! - Startup is deferred to the first dispatch and runs exactly once
//! - A failed startup leaves the gate pending; the next dispatch retries

pub mod startup;

pub use startup::{StartupError, StartupGate, StartupRunner, StartupTask};
