// handlers/mod.rs - route handlers
//
// Every protected handler follows the same shape: the JWT middleware has
// already injected the acting `Actor`, the handler loads what it needs from
// the store, asks the policy module for a decision and returns an envelope.
//
// Public (no auth): system
// Protected (JWT auth): action_items, projects, forms

pub mod action_items;
pub mod forms;
pub mod projects;
pub mod system;
