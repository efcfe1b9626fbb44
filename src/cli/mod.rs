pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "freelance")]
#[command(about = "Freelance CLI - operator tooling for the Freelance API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Validate and query the authorization policy")]
    Policy {
        #[command(subcommand)]
        cmd: commands::policy::PolicyCommands,
    },

    #[command(about = "Issue identity tokens for local testing")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Inspect and change account roles through the API")]
    Role {
        #[command(subcommand)]
        cmd: commands::role::RoleCommands,
    },

    #[command(about = "Provision accounts and client records through the API")]
    Account {
        #[command(subcommand)]
        cmd: commands::account::AccountCommands,
    },

    #[command(about = "Remote server checks")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Policy { cmd } => commands::policy::handle(cmd, output_format),
        Commands::Token { cmd } => commands::token::handle(cmd, output_format),
        Commands::Role { cmd } => commands::role::handle(cmd, output_format).await,
        Commands::Account { cmd } => commands::account::handle(cmd, output_format).await,
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
    }
}
