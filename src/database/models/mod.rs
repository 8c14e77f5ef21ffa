pub mod action_item;
pub mod form_response;
pub mod project;
pub mod user;

pub use action_item::{ActionItem, ActionItemPatch, ActionItemRow};
pub use form_response::{FormResponseRecord, FormResponseRow, NewFormResponse};
pub use project::{ProjectProgress, ProjectProgressRow};
pub use user::{NewUser, User, UserRow};
