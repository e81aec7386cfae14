//! Request and response types for the user management service.

pub mod requests;
pub mod responses;

pub use requests::{NewUser, PageInfo, UserRef, UserUpdate};
pub use responses::{ApiResponse, PageMeta, ResultCode, UserDetail};
