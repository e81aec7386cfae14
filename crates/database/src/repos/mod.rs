//! Database repository implementations

pub mod operation_log_repository;
pub mod role_repository;
pub mod session_repository;
pub mod user_repository;

pub use operation_log_repository::OperationLogRepository;
pub use role_repository::RoleRepository;
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;
