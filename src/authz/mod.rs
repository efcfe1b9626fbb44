// Role-based route authorization
//
// pattern -> policy -> engine. Everything here is built once at startup and
// read-only afterwards; configuration problems surface as ConfigError before
// the listener binds.

pub mod engine;
pub mod error;
pub mod pattern;
pub mod policy;

pub use engine::{AuthorizationEngine, Decision, DenyReason, PathKind};
pub use error::{AuthzError, ConfigError, PatternError};
pub use pattern::{normalize_path, PathPattern};
pub use policy::{PolicyEntry, PolicyTable};
