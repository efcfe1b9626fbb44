use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::types::Identity;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign an identity token with JWT_SECRET")]
    Issue {
        #[arg(help = "Identity-provider subject to put in the token")]
        identity: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { identity, hours } => {
            let config = AppConfig::from_env();
            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let identity = Identity::new(identity);
            let token = generate_jwt(&config.security.jwt_secret, &Claims::new(&identity, hours)?)?;

            match output_format {
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
                OutputFormat::Json => output_success(
                    output_format,
                    &format!("Issued token for {}", identity),
                    Some(json!({ "identity": identity, "token": token, "expires_in_hours": hours })),
                ),
            }
        }
    }
}
