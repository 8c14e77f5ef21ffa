use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::config;
use crate::secure::{self, SecureFieldCodec};

#[derive(Subcommand)]
pub enum KeyCommands {
    #[command(about = "Generate a new FIELD_ENCRYPTION_KEY")]
    Generate,

    #[command(about = "Check that the configured FIELD_ENCRYPTION_KEY is usable")]
    Check,
}

pub fn handle(cmd: KeyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        KeyCommands::Generate => {
            let key = secure::generate_secret();
            match output_format {
                OutputFormat::Json => println!("{}", json!({ "field_encryption_key": key })),
                OutputFormat::Text => println!("FIELD_ENCRYPTION_KEY={}", key),
            }
            Ok(())
        }
        KeyCommands::Check => {
            let configured = config::config().security.field_encryption_key.as_deref();
            let codec = SecureFieldCodec::from_encoded_secret(configured)?;

            // Prove the key works end to end before reporting success
            let probe = codec.encrypt("probe")?;
            codec.decrypt(&probe)?;

            match output_format {
                OutputFormat::Json => println!("{}", json!({ "field_encryption_key": "ok" })),
                OutputFormat::Text => println!("FIELD_ENCRYPTION_KEY is valid"),
            }
            Ok(())
        }
    }
}
