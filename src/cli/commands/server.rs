use clap::Subcommand;
use serde_json::Value;

use crate::cli::utils::{output_error, output_success, server_url};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the /health endpoint")]
    Health {
        #[arg(long, default_value = "http://localhost:3000", help = "Server URL")]
        server: String,
    },

    #[command(about = "Show server information from the root endpoint")]
    Info {
        #[arg(long, default_value = "http://localhost:3000", help = "Server URL")]
        server: String,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { server } => {
            let url = format!("{}/health", server_url(&server));
            let response = reqwest::get(&url).await?;
            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);

            if status.is_success() {
                output_success(output_format, &format!("{} is healthy", server), Some(body))
            } else {
                output_error(
                    output_format,
                    &format!("{} is unhealthy ({})", server, status),
                    Some("SERVICE_UNAVAILABLE"),
                )?;
                anyhow::bail!("health check failed")
            }
        }
        ServerCommands::Info { server } => {
            let url = format!("{}/", server_url(&server));
            let body: Value = reqwest::get(&url).await?.error_for_status()?.json().await?;

            if output_format == OutputFormat::Text {
                println!("{}", serde_json::to_string_pretty(&body["data"])?);
            }
            output_success(output_format, &format!("Connected to {}", server), Some(body))
        }
    }
}
