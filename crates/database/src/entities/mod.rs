//! Domain entities for the database layer

pub mod operation_log;
pub mod role;
pub mod session;
pub mod user;

pub use operation_log::{CreateOperationLogRequest, OperationLog};
pub use role::Role;
pub use session::{AuthSession, CreateSessionRequest};
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserFilter, UserLookup};
