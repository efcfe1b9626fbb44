/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse-grained permission class assigned to an account.
/// One role per account at a time; changed only by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Support,
    Client,
    Freelancer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Support, Role::Client, Role::Freelancer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Support => "SUPPORT",
            Role::Client => "CLIENT",
            Role::Freelancer => "FREELANCER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "SUPPORT" => Ok(Role::Support),
            "CLIENT" => Ok(Role::Client),
            "FREELANCER" => Ok(Role::Freelancer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Opaque subject identifier issued by the external identity provider
    Identity
);
string_id!(
    /// Client record reference; owner of missions
    ClientId
);
string_id!(MissionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("freelancer".parse::<Role>().unwrap(), Role::Freelancer);
        assert_eq!(" Client ".parse::<Role>().unwrap(), Role::Client);
        assert!("ROOT".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_as_screaming_case() {
        let json = serde_json::to_string(&Role::Support).unwrap();
        assert_eq!(json, "\"SUPPORT\"");
        let back: Role = serde_json::from_str("\"CLIENT\"").unwrap();
        assert_eq!(back, Role::Client);
    }
}
