use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{api_error, output_success, server_url, user_resource_url};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AccountCommands {
    #[command(about = "Create the account behind a token (no role until one is assigned)")]
    Sync {
        #[arg(long, default_value = "http://localhost:3000", help = "Server URL")]
        server: String,
        #[arg(long, help = "Identity token of the account to create")]
        token: String,
    },

    #[command(about = "Give an existing account its client record")]
    CreateClient {
        #[arg(help = "Identity-provider subject")]
        identity: String,
        #[arg(long, default_value = "http://localhost:3000", help = "Server URL")]
        server: String,
        #[arg(long, help = "Administrator identity token")]
        token: String,
    },
}

pub async fn handle(cmd: AccountCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    match cmd {
        AccountCommands::Sync { server, token } => {
            let url = format!("{}/api/me/sync", server_url(&server));
            let response = client.post(&url).bearer_auth(&token).send().await?;
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let body: Value = response.json().await?;
            let data = &body["data"];
            let identity = data["identity"].as_str().unwrap_or("unknown");
            let message = match (data["isNewAccount"].as_bool(), data["role"].as_str()) {
                (Some(true), _) => format!("Created account {} (no role assigned yet)", identity),
                (_, Some(role)) => format!("Account {} exists with role {}", identity, role),
                _ => format!("Account {} exists without a role", identity),
            };
            output_success(output_format, &message, Some(data.clone()))
        }
        AccountCommands::CreateClient { identity, server, token } => {
            let url = user_resource_url(&server, &identity, "client")?;
            let response = client.post(url).bearer_auth(&token).send().await?;
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let body: Value = response.json().await?;
            let client_id = body["data"]["clientId"].as_str().unwrap_or("unknown").to_string();
            let created = body["data"]["created"].as_bool().unwrap_or(false);
            let message = if created {
                format!("Created client {} for {}", client_id, identity)
            } else {
                format!("{} already owns client {}", identity, client_id)
            };
            output_success(
                output_format,
                &message,
                Some(json!({ "identity": identity, "clientId": client_id, "created": created })),
            )
        }
    }
}
