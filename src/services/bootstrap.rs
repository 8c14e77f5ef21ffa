use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, PortalStore};
use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created(User),
    AlreadyBootstrapped { existing_users: i64 },
}

/// Create the first admin. Running it again once any user exists is a no-op,
/// including when two runs race each other.
pub async fn bootstrap_admin(
    store: &dyn PortalStore,
    email: &str,
    name: Option<String>,
) -> Result<BootstrapOutcome, DatabaseError> {
    let admin = NewUser {
        email: email.to_string(),
        name,
        role: Role::Admin,
    };

    match store.insert_first_user(admin).await? {
        Some(user) => {
            tracing::info!("Bootstrapped admin user {} ({})", user.email, user.id);
            Ok(BootstrapOutcome::Created(user))
        }
        None => {
            let existing_users = store.count_users().await?;
            tracing::info!("Bootstrap skipped: {} user(s) already exist", existing_users);
            Ok(BootstrapOutcome::AlreadyBootstrapped { existing_users })
        }
    }
}
