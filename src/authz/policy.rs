use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::error::ConfigError;
use super::pattern::PathPattern;
use crate::types::Role;

/// Built-in allow-lists. Pages and API routes share one pattern space.
const BUILTIN_POLICY: &[(Role, &[&str])] = &[
    (Role::Admin, &["/**"]),
    (
        Role::Support,
        &[
            "/dashboard/**",
            "/support/**",
            "/missions/**",
            "/api/me",
            "/api/missions/**",
            "/api/contracts/**",
            "/api/payments/**",
            "/api/support/**",
        ],
    ),
    (
        Role::Client,
        &[
            "/dashboard/**",
            "/missions/**",
            "/api/me",
            "/api/missions/**",
            "/api/contracts/**",
            "/api/payments/**",
        ],
    ),
    (
        Role::Freelancer,
        &[
            "/dashboard/**",
            "/missions",
            "/missions/*",
            "/api/me",
            "/api/missions",
            "/api/missions/*",
            "/api/contracts/**",
        ],
    ),
];

/// One role's allow-list as written in a policy file
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyEntry {
    pub role: String,
    pub patterns: Vec<String>,
}

/// Immutable role -> ordered allow-list mapping, built once at startup
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    entries: HashMap<Role, Vec<PathPattern>>,
}

impl PolicyTable {
    /// Compile a policy. Duplicate roles, unknown roles and malformed
    /// patterns are all rejected.
    pub fn from_entries(entries: Vec<PolicyEntry>) -> Result<Self, ConfigError> {
        let mut table = HashMap::with_capacity(entries.len());

        for entry in entries {
            let role: Role = entry
                .role
                .parse()
                .map_err(|_| ConfigError::UnknownRole(entry.role.clone()))?;

            if table.contains_key(&role) {
                return Err(ConfigError::DuplicateRole(role.to_string()));
            }

            let patterns = entry
                .patterns
                .iter()
                .map(|pattern| {
                    PathPattern::compile(pattern).map_err(|source| ConfigError::InvalidPattern {
                        role: role.to_string(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            table.insert(role, patterns);
        }

        Ok(Self { entries: table })
    }

    pub fn builtin() -> Result<Self, ConfigError> {
        let entries = BUILTIN_POLICY
            .iter()
            .map(|(role, patterns)| PolicyEntry {
                role: role.as_str().to_string(),
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Parse a YAML list of `{ role, patterns }` entries
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let entries: Vec<PolicyEntry> = serde_yaml::from_str(yaml)?;
        Self::from_entries(entries)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Load from the given file, or fall back to the built-in table
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    /// Allow-list for a role, in configuration order. Empty when the role has no entry.
    pub fn patterns_for(&self, role: Role) -> &[PathPattern] {
        self.entries.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Roles with an entry, in declaration order of the `Role` enum
    pub fn roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.entries.contains_key(role))
            .collect()
    }
}
