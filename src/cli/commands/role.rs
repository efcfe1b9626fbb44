use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{api_error, output_success, user_resource_url};
use crate::cli::OutputFormat;
use crate::types::Role;

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "Show the role assigned to an identity")]
    Get {
        #[arg(help = "Identity-provider subject")]
        identity: String,
        #[arg(long, default_value = "http://localhost:3000", help = "Server URL")]
        server: String,
        #[arg(long, help = "Administrator identity token")]
        token: String,
    },

    #[command(about = "Change the role of an identity (takes effect immediately)")]
    Set {
        #[arg(help = "Identity-provider subject")]
        identity: String,
        #[arg(help = "New role: ADMIN, SUPPORT, CLIENT or FREELANCER")]
        role: Role,
        #[arg(long, default_value = "http://localhost:3000", help = "Server URL")]
        server: String,
        #[arg(long, help = "Administrator identity token")]
        token: String,
    },
}

pub async fn handle(cmd: RoleCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    match cmd {
        RoleCommands::Get { identity, server, token } => {
            let url = user_resource_url(&server, &identity, "role")?;
            let response = client.get(url).bearer_auth(&token).send().await?;
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let body: Value = response.json().await?;
            let role = body["data"]["role"].as_str().unwrap_or("unknown").to_string();
            output_success(
                output_format,
                &format!("{} has role {}", identity, role),
                Some(json!({ "identity": identity, "role": role })),
            )
        }
        RoleCommands::Set {
            identity,
            role,
            server,
            token,
        } => {
            // Through the API so the server evicts its cached role right away
            let url = user_resource_url(&server, &identity, "role")?;
            let response = client
                .put(url)
                .bearer_auth(&token)
                .json(&json!({ "role": role }))
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            output_success(
                output_format,
                &format!("{} is now {}", identity, role),
                Some(json!({ "identity": identity, "role": role })),
            )
        }
    }
}
