pub mod bootstrap;
pub mod project_progress;

pub use bootstrap::{bootstrap_admin, BootstrapOutcome};
pub use project_progress::refresh_project_progress;
