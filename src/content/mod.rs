//! Static content and content negotiation.
//!
//! # Data Flow
//! ```text
//! request path
//!     → static_files.rs (literal mapping? public folder prefix?)
//!     → path.rs (virtual path → file under app_root)
//!     → exists as file? → 200 + negotiation.rs content type + FileBody
//!     → otherwise: not static, continue to routing
//! ```
//!
//! # Design Decisions
//! - Literal mappings are checked before folder prefixes
//! - Folder prefixes compare ASCII case-insensitively and need a following '/'
//! - Files are reopened at write time; a vanished file is an I/O error then

pub mod negotiation;
pub mod path;
pub mod static_files;

pub use negotiation::{guess_type, media_type, negotiate_produced, resolve_content_type};
pub use path::PathMapper;
pub use static_files::{FileBody, StaticContentResolver};
