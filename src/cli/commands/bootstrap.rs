use serde_json::json;

use crate::cli::OutputFormat;
use crate::config;
use crate::database::{DatabaseManager, PgPortalStore};
use crate::services::{bootstrap_admin, BootstrapOutcome};

pub async fn handle(email: String, name: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config::config().database).await?;
    DatabaseManager::migrate(&pool).await?;
    let store = PgPortalStore::new(pool);

    let outcome = bootstrap_admin(&store, &email, name).await?;

    match (outcome, output_format) {
        (BootstrapOutcome::Created(user), OutputFormat::Json) => {
            println!("{}", json!({ "created": true, "user": user }))
        }
        (BootstrapOutcome::Created(user), OutputFormat::Text) => {
            println!("Created admin {} ({})", user.email, user.id)
        }
        (BootstrapOutcome::AlreadyBootstrapped { existing_users }, OutputFormat::Json) => {
            println!("{}", json!({ "created": false, "existing_users": existing_users }))
        }
        (BootstrapOutcome::AlreadyBootstrapped { existing_users }, OutputFormat::Text) => {
            println!("Already bootstrapped ({} existing users), nothing to do", existing_users)
        }
    }
    Ok(())
}
