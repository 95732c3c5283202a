//! # draft-core
//!
//! Core types, traits, and abstractions for the Draft Zero service.
//!
//! This crate provides the foundational data structures, the role/permission
//! resolver, and the trait definitions that other Draft Zero crates depend on.

pub mod defaults;
pub mod error;
pub mod flow;
pub mod logging;
pub mod models;
pub mod permissions;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use flow::{compute_segment_flow, FlowStats};
pub use models::*;
pub use permissions::{
    all_permissions_for, all_permissions_from, any_has_permission, has_permission,
    ActionPermission, PermissionRole, PermissionScope, Role, TypedRole,
};
pub use traits::*;
