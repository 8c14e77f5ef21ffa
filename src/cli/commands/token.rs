use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::JwtKeys;
use crate::cli::OutputFormat;
use crate::config;
use crate::types::{Actor, Role};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a bearer token for an existing user")]
    Issue {
        #[arg(long, help = "User id (UUID)")]
        user_id: Uuid,
        #[arg(long, help = "ADMIN, MANAGER or CLIENT")]
        role: String,
        #[arg(long, help = "Email used for client affiliation")]
        email: Option<String>,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { user_id, role, email } => {
            let role: Role = role.to_uppercase().parse().context("invalid --role")?;
            let security = &config::config().security;
            let keys = JwtKeys::new(security.jwt_secret.clone(), security.jwt_expiry_hours);

            let token = keys.issue_token(&Actor::new(user_id, role, email))?;

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "token": token, "expires_in_hours": security.jwt_expiry_hours })
                ),
                OutputFormat::Text => println!("{}", token),
            }
            Ok(())
        }
    }
}
