//! Business logic services for user account management.

pub mod user_service;
#[cfg(test)]
mod mock_repositories;

pub use user_service::{SqliteUserStore, UserRepo, UserService};
