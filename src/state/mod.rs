//! State machine module for recording sessions
//!
//! Subscribes to hotkey events and dispatches on their kind:
//! - Idle: waiting for the hotkey
//! - Recording: while the hotkey is held
//! - PermissionRequired: the OS refused the hotkey hook

mod machine;

pub use machine::{State, StateMachine};
