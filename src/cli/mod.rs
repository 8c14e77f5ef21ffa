pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Client Portal CLI - operator tasks for the portal API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Secure field key management")]
    Key {
        #[command(subcommand)]
        cmd: commands::key::KeyCommands,
    },

    #[command(about = "Development token minting")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Create the first admin account (idempotent)")]
    Bootstrap {
        #[arg(long, help = "Admin email address")]
        email: String,
        #[arg(long, help = "Display name")]
        name: Option<String>,
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
        Commands::Key { cmd } => commands::key::handle(cmd, output_format),
        Commands::Token { cmd } => commands::token::handle(cmd, output_format),
        Commands::Bootstrap { email, name } => commands::bootstrap::handle(email, name, output_format).await,
    }
}
