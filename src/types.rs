/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Returned when a stored or submitted value is not one of an enum's variants
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {kind} value: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Access role carried by every authenticated identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Client,
}

impl Role {
    /// Admins and managers are staff; everyone else is external
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Client => "CLIENT",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "CLIENT" => Ok(Role::Client),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionItemStatus {
    Open,
    InProgress,
    Blocked,
    Completed,
}

impl ActionItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionItemStatus::Open => "OPEN",
            ActionItemStatus::InProgress => "IN_PROGRESS",
            ActionItemStatus::Blocked => "BLOCKED",
            ActionItemStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ActionItemStatus::Completed)
    }
}

impl FromStr for ActionItemStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(ActionItemStatus::Open),
            "IN_PROGRESS" => Ok(ActionItemStatus::InProgress),
            "BLOCKED" => Ok(ActionItemStatus::Blocked),
            "COMPLETED" => Ok(ActionItemStatus::Completed),
            other => Err(UnknownVariant::new("action item status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "PLANNING",
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::OnHold => "ON_HOLD",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }

    /// Only an explicit COMPLETED state reports a finished project
    pub fn is_terminal_complete(&self) -> bool {
        matches!(self, ProjectStatus::Completed)
    }
}

impl FromStr for ProjectStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLANNING" => Ok(ProjectStatus::Planning),
            "ACTIVE" => Ok(ProjectStatus::Active),
            "ON_HOLD" => Ok(ProjectStatus::OnHold),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "CANCELLED" => Ok(ProjectStatus::Cancelled),
            other => Err(UnknownVariant::new("project status", other)),
        }
    }
}

/// The identity making a request. Passed explicitly to every policy check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub email: Option<String>,
}

impl Actor {
    pub fn new(id: Uuid, role: Role, email: Option<String>) -> Self {
        Self { id, role, email }
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}
