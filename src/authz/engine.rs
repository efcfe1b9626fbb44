use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::error::{AuthzError, ConfigError};
use super::pattern::PathPattern;
use super::policy::PolicyTable;
use crate::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NoRole,
    NoPolicyForRole,
    PathNotPermitted,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NoRole => "no_role",
            DenyReason::NoPolicyForRole => "no_policy_for_role",
            DenyReason::PathNotPermitted => "path_not_permitted",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Request-level error for a denial, `None` when allowed
    pub fn into_error(self, role: Option<Role>, path: &str) -> Option<AuthzError> {
        match self {
            Decision::Allow => None,
            Decision::Deny(DenyReason::NoRole) => Some(AuthzError::NoRole),
            Decision::Deny(_) => Some(AuthzError::PolicyDenied {
                role: role.map(|r| r.to_string()).unwrap_or_default(),
                path: path.to_string(),
            }),
        }
    }
}

/// Observability-only classification of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Api,
    Ui,
}

impl PathKind {
    pub fn of(path: &str) -> Self {
        if path == "/api" || path.starts_with("/api/") {
            PathKind::Api
        } else {
            PathKind::Ui
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::Api => "api",
            PathKind::Ui => "ui",
        }
    }
}

/// Path-level authorization. Stateless apart from the read-only policy,
/// so one instance is shared by every request.
#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    policy: Arc<PolicyTable>,
    public_paths: Vec<PathPattern>,
    enrollment_paths: Vec<PathPattern>,
}

impl AuthorizationEngine {
    pub fn new(policy: Arc<PolicyTable>, public_paths: &[String]) -> Result<Self, ConfigError> {
        let public_paths = public_paths
            .iter()
            .map(|p| PathPattern::compile(p).map_err(ConfigError::InvalidPublicPath))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            policy,
            public_paths,
            enrollment_paths: Vec::new(),
        })
    }

    /// Paths that need a verified identity but no role, such as first sign-in
    /// account creation
    pub fn with_enrollment_paths(mut self, paths: &[String]) -> Result<Self, ConfigError> {
        self.enrollment_paths = paths
            .iter()
            .map(|p| PathPattern::compile(p).map_err(ConfigError::InvalidEnrollmentPath))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self)
    }

    /// Hard-coded allow-list checked before any identity or role work
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p.matches(path))
    }

    pub fn is_enrollment(&self, path: &str) -> bool {
        self.enrollment_paths.iter().any(|p| p.matches(path))
    }

    pub fn authorize(&self, role: Option<Role>, path: &str) -> Decision {
        let kind = PathKind::of(path);

        let Some(role) = role else {
            tracing::warn!(role = "none", path, kind = kind.as_str(), reason = "no_role", "access denied");
            return Decision::Deny(DenyReason::NoRole);
        };

        let patterns = self.policy.patterns_for(role);
        if patterns.is_empty() {
            tracing::warn!(role = %role, path, kind = kind.as_str(), reason = "no_policy_for_role", "access denied");
            return Decision::Deny(DenyReason::NoPolicyForRole);
        }

        match patterns.iter().find(|p| p.matches(path)) {
            Some(pattern) => {
                tracing::debug!(role = %role, path, pattern = pattern.as_str(), "access allowed");
                Decision::Allow
            }
            None => {
                tracing::warn!(role = %role, path, kind = kind.as_str(), reason = "path_not_permitted", "access denied");
                Decision::Deny(DenyReason::PathNotPermitted)
            }
        }
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }
}
