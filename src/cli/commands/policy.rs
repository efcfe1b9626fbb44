use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::authz::{normalize_path, AuthorizationEngine, Decision, PolicyTable};
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::types::Role;

#[derive(Subcommand)]
pub enum PolicyCommands {
    #[command(about = "Compile a policy file (or the built-in table) and report errors")]
    Validate {
        #[arg(long, help = "Policy YAML file (defaults to the built-in table)")]
        file: Option<PathBuf>,
    },

    #[command(about = "Show whether a role may reach a path")]
    Check {
        #[arg(long, help = "Role: ADMIN, SUPPORT, CLIENT or FREELANCER")]
        role: Role,
        #[arg(long, help = "Request path, e.g. /api/missions/42")]
        path: String,
        #[arg(long, help = "Policy YAML file (defaults to the built-in table)")]
        file: Option<PathBuf>,
    },
}

pub fn handle(cmd: PolicyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PolicyCommands::Validate { file } => {
            let policy = PolicyTable::load(file.as_deref())?;
            // Public and enrollment lists come from the same settings the server reads
            let authz = AppConfig::from_env().authz;
            AuthorizationEngine::new(Arc::new(policy.clone()), &authz.public_paths)?
                .with_enrollment_paths(&authz.enrollment_paths)?;
            let summary: serde_json::Map<_, _> = policy
                .roles()
                .into_iter()
                .map(|role| {
                    let patterns: Vec<&str> = policy.patterns_for(role).iter().map(|p| p.as_str()).collect();
                    (role.to_string(), json!(patterns))
                })
                .collect();

            if output_format == OutputFormat::Text {
                for (role, patterns) in &summary {
                    println!("{}: {}", role, patterns);
                }
            }
            output_success(
                output_format,
                "Policy is valid",
                Some(json!({
                    "roles": summary,
                    "public_paths": authz.public_paths,
                    "enrollment_paths": authz.enrollment_paths,
                })),
            )
        }
        PolicyCommands::Check { role, path, file } => {
            let policy = PolicyTable::load(file.as_deref())?;
            let authz = AppConfig::from_env().authz;
            let engine = AuthorizationEngine::new(Arc::new(policy), &authz.public_paths)?
                .with_enrollment_paths(&authz.enrollment_paths)?;
            let path = normalize_path(&path);

            if engine.is_public(&path) {
                return output_success(
                    output_format,
                    &format!("{} is public", path),
                    Some(json!({ "path": path, "allowed": true, "public": true })),
                );
            }
            if engine.is_enrollment(&path) {
                return output_success(
                    output_format,
                    &format!("{} is open to any signed-in identity", path),
                    Some(json!({ "path": path, "allowed": true, "enrollment": true })),
                );
            }

            match engine.authorize(Some(role), &path) {
                Decision::Allow => output_success(
                    output_format,
                    &format!("{} may access {}", role, path),
                    Some(json!({ "path": path, "role": role, "allowed": true })),
                ),
                Decision::Deny(reason) => {
                    output_error(
                        output_format,
                        &format!("{} may not access {}", role, path),
                        Some(reason.as_str()),
                    )?;
                    std::process::exit(2);
                }
            }
        }
    }
}
