//! Who may see and change action items, project progress and form responses.
//!
//! Visibility and mutation are decoupled from plain ownership: an item can be
//! visible to a client without being completable by them, and completable by
//! an assignee who is not the project's client contact.
//!
//! Every check takes the acting identity explicitly and returns a decision;
//! enforcing (and logging) the decision is left to the caller.

use thiserror::Error;
use uuid::Uuid;

use crate::database::models::ActionItem;
use crate::types::{Actor, Role};

/// A policy check evaluated false
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PolicyDenied {
    #[error("You do not have access to this action item")]
    NotVisible,

    #[error("You are not allowed to complete this action item")]
    ClientCompletionNotAllowed,

    #[error("Only staff members can modify action items")]
    StaffOnly,

    #[error("You do not have access to this project")]
    ProjectNotVisible,

    #[error("You do not have access to this form response")]
    ResponseNotVisible,
}

/// True when `actor` is a client whose email matches the project's client record
pub fn is_client_affiliated(actor: &Actor, client_email: Option<&str>) -> bool {
    if actor.role != Role::Client {
        return false;
    }
    match (actor.email.as_deref(), client_email) {
        (Some(mine), Some(theirs)) if !mine.is_empty() && !theirs.is_empty() => {
            mine.to_lowercase() == theirs.to_lowercase()
        }
        _ => false,
    }
}

fn is_assignee(actor: &Actor, item: &ActionItem) -> bool {
    item.assigned_to == Some(actor.id)
}

pub fn can_view(actor: &Actor, item: &ActionItem) -> bool {
    if actor.is_staff() {
        return true;
    }
    is_assignee(actor, item)
        || (item.visible_to_client && is_client_affiliated(actor, item.client_email.as_deref()))
}

/// Completion path for client users. Staff never go through this check.
pub fn can_client_complete(actor: &Actor, item: &ActionItem) -> bool {
    if actor.role != Role::Client || !item.visible_to_client {
        return false;
    }
    let assignee = is_assignee(actor, item);
    let owner = is_client_affiliated(actor, item.client_email.as_deref());

    (item.client_can_complete || assignee) && (owner || assignee)
}

pub fn authorize_view(actor: &Actor, item: &ActionItem) -> Result<(), PolicyDenied> {
    if can_view(actor, item) {
        Ok(())
    } else {
        Err(PolicyDenied::NotVisible)
    }
}

pub fn authorize_client_completion(actor: &Actor, item: &ActionItem) -> Result<(), PolicyDenied> {
    if can_client_complete(actor, item) {
        Ok(())
    } else {
        Err(PolicyDenied::ClientCompletionNotAllowed)
    }
}

/// General edits are staff-only regardless of any per-item client flags
pub fn authorize_staff_mutation(actor: &Actor) -> Result<(), PolicyDenied> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(PolicyDenied::StaffOnly)
    }
}

/// Keep only the items `actor` may see, preserving order
pub fn visible_items(actor: &Actor, items: Vec<ActionItem>) -> Vec<ActionItem> {
    items.into_iter().filter(|item| can_view(actor, item)).collect()
}

pub fn can_view_project(actor: &Actor, client_email: Option<&str>) -> bool {
    actor.is_staff() || is_client_affiliated(actor, client_email)
}

pub fn can_read_form_response(actor: &Actor, respondent_id: Uuid) -> bool {
    actor.is_staff() || actor.id == respondent_id
}
