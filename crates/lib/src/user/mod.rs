//! User system for Gatehouse
//!
//! Creates and removes users, manages their SSH keys, and keeps the
//! `authorized_keys` file in step with the store.

pub mod errors;
pub mod manager;
pub mod validation;

pub use errors::UserError;
pub use manager::UserManager;
pub use validation::{is_valid_user_name, validate_user_name};
