use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub authz: AuthzConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Absent means the in-memory store (development only)
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthzConfig {
    pub role_cache_ttl_secs: u64,
    pub role_lookup_timeout_ms: u64,
    pub policy_file: Option<PathBuf>,
    pub public_paths: Vec<String>,
    /// Paths open to any verified identity, with or without a role
    pub enrollment_paths: Vec<String>,
    /// Identity created or promoted to ADMIN at startup
    pub bootstrap_admin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing, default)]
    pub jwt_secret: String,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("JWT_SECRET must be set outside development")]
    MissingJwtSecret,

    #[error("DATABASE_URL must be set in production")]
    MissingDatabaseUrl,

    #[error("role lookup timeout must be greater than zero")]
    ZeroLookupTimeout,
}

const DEV_JWT_SECRET: &str = "development-only-secret";

impl AuthzConfig {
    pub fn default_public_paths() -> Vec<String> {
        ["/", "/health", "/sign-in/**", "/sign-up/**"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn default_enrollment_paths() -> Vec<String> {
        vec!["/api/me/sync".to_string()]
    }

    pub fn role_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.role_cache_ttl_secs)
    }

    pub fn role_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.role_lookup_timeout_ms)
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            role_cache_ttl_secs: 60,
            role_lookup_timeout_ms: 500,
            policy_file: None,
            public_paths: Self::default_public_paths(),
            enrollment_paths: Self::default_enrollment_paths(),
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("FREELANCE_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Authorization overrides
        if let Ok(v) = env::var("AUTHZ_ROLE_CACHE_TTL_SECS") {
            self.authz.role_cache_ttl_secs = v.parse().unwrap_or(self.authz.role_cache_ttl_secs);
        }
        if let Ok(v) = env::var("AUTHZ_ROLE_LOOKUP_TIMEOUT_MS") {
            self.authz.role_lookup_timeout_ms = v.parse().unwrap_or(self.authz.role_lookup_timeout_ms);
        }
        if let Ok(v) = env::var("AUTHZ_POLICY_FILE") {
            if !v.trim().is_empty() {
                self.authz.policy_file = Some(PathBuf::from(v));
            }
        }
        if let Ok(v) = env::var("AUTHZ_PUBLIC_PATHS") {
            self.authz.public_paths = split_list(&v);
        }
        if let Ok(v) = env::var("AUTHZ_ENROLLMENT_PATHS") {
            self.authz.enrollment_paths = split_list(&v);
        }
        if let Ok(v) = env::var("AUTHZ_BOOTSTRAP_ADMIN") {
            if !v.trim().is_empty() {
                self.authz.bootstrap_admin = Some(v.trim().to_string());
            }
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    /// Reject settings the server must not start with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.environment != Environment::Development && self.security.jwt_secret.is_empty() {
            return Err(SettingsError::MissingJwtSecret);
        }
        if self.environment == Environment::Production && self.database.url.is_none() {
            return Err(SettingsError::MissingDatabaseUrl);
        }
        if self.authz.role_lookup_timeout_ms == 0 {
            return Err(SettingsError::ZeroLookupTimeout);
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            authz: AuthzConfig::default(),
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            authz: AuthzConfig::default(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_expiry_hours: 24,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            authz: AuthzConfig::default(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_expiry_hours: 4,
            },
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
