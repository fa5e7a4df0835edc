//! User module integration tests

mod key_management_tests;
mod user_lifecycle_tests;
