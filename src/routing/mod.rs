//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, content type, accept)
//!     → cache.rs (routing table for the method, built on first use)
//!     → table.rs (route lookup)
//!     → template.rs (segment matching, variable extraction)
//!     → Return: handler type + variables, or NoMatch
//!
//! Table Compilation (first request per method):
//!     HandlerRegistry::handlers_for(method)
//!     → Sort by specificity (literal segments)
//!     → Freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Tables are immutable once built and never rebuilt
//! - At most one build per method, even under concurrent first requests
//! - No regex in hot path (segment comparison only)
//! - Explicit NoMatch rather than silent default

pub mod cache;
pub mod table;
pub mod template;

pub use cache::RoutingTableCache;
pub use table::{RouteMatch, RoutingTable, RoutingTableBuilder};
pub use template::{TemplateError, UriTemplate};
