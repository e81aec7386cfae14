//! # userdesk Users Crate
//!
//! The user-account capability behind the `/v1/user` endpoints: lookup,
//! paginated listing, create, update, delete, enable/disable, role
//! assignment and duplicate checks. Every operation answers with an
//! [`ApiResponse`] envelope.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use userdesk_config::PaginationConfig;
//! use userdesk_users::{NewUser, UserService};
//!
//! # async fn run(pool: sqlx::SqlitePool) {
//! let service = UserService::new(pool, PaginationConfig::default());
//! let response = service
//!     .insert(NewUser {
//!         username: "alice".into(),
//!         ..Default::default()
//!     })
//!     .await;
//! assert!(response.is_success());
//! # }
//! ```

pub mod services;
pub mod types;
pub mod utils;

pub use userdesk_database::{User, UserError, UserFilter, UserLookup, UserResult};

pub use services::{SqliteUserStore, UserRepo, UserService};
pub use types::{
    ApiResponse, NewUser, PageInfo, PageMeta, ResultCode, UserDetail, UserRef, UserUpdate,
};
