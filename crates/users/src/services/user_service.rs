//! User service for managing user operations.

use std::collections::BTreeSet;
use std::future::Future;

use sqlx::sqlite::SqlitePool;
use tracing::{info, warn};
use userdesk_config::PaginationConfig;
use userdesk_database::{
    CreateUserRequest, RoleRepository, UpdateUserRequest, User, UserError, UserFilter, UserLookup,
    UserRepository, UserResult,
};

use crate::types::{
    ApiResponse, NewUser, PageInfo, PageMeta, ResultCode, UserDetail, UserRef, UserUpdate,
};
use crate::utils::validation::{
    normalize, normalize_idcard, validate_contact, validate_password, validate_username,
};

/// Service for managing user operations.
///
/// Every operation returns a finished [`ApiResponse`]; domain failures are
/// encoded in the envelope rather than returned as errors.
pub struct UserService<R> {
    repository: R,
    pagination: PaginationConfig,
}

impl UserService<SqliteUserStore> {
    /// Create a new user service backed by SQLite
    pub fn new(pool: SqlitePool, pagination: PaginationConfig) -> Self {
        Self::with_repository(SqliteUserStore::new(pool), pagination)
    }
}

impl<R> UserService<R>
where
    R: UserRepo,
{
    pub fn with_repository(repository: R, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            pagination,
        }
    }

    /// Page selection for optional `page`/`limit` query values
    pub fn page_info(&self, page: Option<u32>, limit: Option<u32>) -> PageInfo {
        PageInfo::resolve(page, limit, &self.pagination)
    }

    /// True when any supplied field already belongs to a live account
    pub async fn check_user_info(&self, lookup: UserLookup) -> ApiResponse<bool> {
        let lookup = UserLookup {
            idcard: normalize_idcard(lookup.idcard),
            ..lookup
        };
        if lookup.is_empty() {
            return ApiResponse::failure(
                ResultCode::InvalidArgument,
                "at least one of username, phone, idcard or email is required",
            );
        }

        self.repository
            .find_matching(&lookup, None)
            .await
            .map(|matches| !matches.is_empty())
            .into()
    }

    /// Replace the role set of a user, returning the new set
    pub async fn update_role(&self, user_id: i64, role_ids: Vec<i64>) -> ApiResponse<Vec<i64>> {
        self.replace_roles(user_id, role_ids).await.into()
    }

    /// Get a user and its roles by ID
    pub async fn get_by_id(&self, user_id: i64) -> ApiResponse<UserDetail> {
        self.load_detail(user_id).await.into()
    }

    /// One page of users matching the filter, ordered by id
    pub async fn list(&self, filter: UserFilter, page: PageInfo) -> ApiResponse<Vec<User>> {
        let total = match self.repository.count(&filter).await {
            Ok(total) => total,
            Err(err) => return err.into(),
        };

        match self
            .repository
            .list(&filter, page.offset(), i64::from(page.limit))
            .await
        {
            Ok(users) => ApiResponse::paged(
                users,
                PageMeta {
                    page: page.page,
                    limit: page.limit,
                    total,
                },
            ),
            Err(err) => err.into(),
        }
    }

    /// Create a new user
    pub async fn insert(&self, new_user: NewUser) -> ApiResponse<User> {
        self.create_user(new_user).await.into()
    }

    /// Delete a user
    pub async fn delete(&self, target: UserRef) -> ApiResponse<bool> {
        match self.repository.delete(target.id).await {
            Ok(()) => {
                warn!(user_id = target.id, "deleted user");
                ApiResponse::success(true)
            }
            Err(err) => err.into(),
        }
    }

    /// Replace a user record
    pub async fn update(&self, update: UserUpdate) -> ApiResponse<User> {
        self.update_user(update).await.into()
    }

    /// Enable or disable a user
    pub async fn set_enabled(&self, user_id: i64, enabled: bool) -> ApiResponse<User> {
        let result = self.repository.set_enabled(user_id, enabled).await;
        if result.is_ok() {
            info!(user_id, enabled, "changed user state");
        }
        result.into()
    }

    async fn load_detail(&self, user_id: i64) -> UserResult<UserDetail> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound)?;
        let role_ids = self.repository.role_ids(user_id).await?;

        Ok(UserDetail { user, role_ids })
    }

    async fn replace_roles(&self, user_id: i64, role_ids: Vec<i64>) -> UserResult<Vec<i64>> {
        let requested: Vec<i64> = role_ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        if requested.is_empty() {
            return Err(UserError::ValidationFailed(
                "roleIds must not be empty".to_string(),
            ));
        }

        if self.repository.find_by_id(user_id).await?.is_none() {
            return Err(UserError::UserNotFound);
        }

        let existing = self.repository.existing_roles(&requested).await?;
        let unknown: Vec<i64> = requested
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect();
        if !unknown.is_empty() {
            return Err(UserError::UnknownRoles(unknown));
        }

        self.repository.replace_roles(user_id, &requested).await?;
        info!(user_id, roles = ?requested, "replaced user roles");

        self.repository.role_ids(user_id).await
    }

    async fn create_user(&self, new_user: NewUser) -> UserResult<User> {
        let username = new_user.username.trim().to_string();
        let phone = normalize(new_user.phone);
        let idcard = normalize_idcard(new_user.idcard);
        let email = normalize(new_user.email);

        validate_username(&username)?;
        validate_contact(phone.as_deref(), idcard.as_deref(), email.as_deref())?;
        let password_hash = hash_optional_password(new_user.password.as_deref())?;

        let lookup = UserLookup {
            username: Some(username.clone()),
            phone: phone.clone(),
            idcard: idcard.clone(),
            email: email.clone(),
        };
        self.ensure_unique(&lookup, None).await?;

        let user = self
            .repository
            .create(&CreateUserRequest {
                username,
                password_hash,
                phone,
                idcard,
                email,
                enabled: new_user.enabled.unwrap_or(true),
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "created user");
        Ok(user)
    }

    async fn update_user(&self, update: UserUpdate) -> UserResult<User> {
        let username = update.username.trim().to_string();
        let phone = normalize(update.phone);
        let idcard = normalize_idcard(update.idcard);
        let email = normalize(update.email);

        validate_username(&username)?;
        validate_contact(phone.as_deref(), idcard.as_deref(), email.as_deref())?;
        let password_hash = hash_optional_password(update.password.as_deref())?;

        if self.repository.find_by_id(update.id).await?.is_none() {
            return Err(UserError::UserNotFound);
        }

        let lookup = UserLookup {
            username: Some(username.clone()),
            phone: phone.clone(),
            idcard: idcard.clone(),
            email: email.clone(),
        };
        self.ensure_unique(&lookup, Some(update.id)).await?;

        let user = self
            .repository
            .update(
                update.id,
                &UpdateUserRequest {
                    username,
                    password_hash,
                    phone,
                    idcard,
                    email,
                    enabled: update.enabled,
                },
            )
            .await?;

        info!(user_id = user.id, "updated user");
        Ok(user)
    }

    async fn ensure_unique(&self, lookup: &UserLookup, exclude_id: Option<i64>) -> UserResult<()> {
        let matches = self.repository.find_matching(lookup, exclude_id).await?;

        match matches
            .iter()
            .find_map(|user| lookup.matching_fields(user).first().copied())
        {
            Some(field) => Err(UserError::duplicate(field)),
            None => Ok(()),
        }
    }
}

fn hash_optional_password(password: Option<&str>) -> UserResult<Option<String>> {
    let Some(password) = password else {
        return Ok(None);
    };

    validate_password(password)?;
    userdesk_auth::hash_password(password)
        .map(Some)
        .map_err(|e| UserError::PasswordHashing(e.to_string()))
}

/// Storage capability the service is generic over
pub trait UserRepo: Send + Sync {
    fn find_by_id(&self, id: i64) -> impl Future<Output = UserResult<Option<User>>> + Send;
    fn find_matching(
        &self,
        lookup: &UserLookup,
        exclude_id: Option<i64>,
    ) -> impl Future<Output = UserResult<Vec<User>>> + Send;
    fn list(
        &self,
        filter: &UserFilter,
        offset: i64,
        limit: i64,
    ) -> impl Future<Output = UserResult<Vec<User>>> + Send;
    fn count(&self, filter: &UserFilter) -> impl Future<Output = UserResult<i64>> + Send;
    fn create(&self, request: &CreateUserRequest) -> impl Future<Output = UserResult<User>> + Send;
    fn update(
        &self,
        user_id: i64,
        request: &UpdateUserRequest,
    ) -> impl Future<Output = UserResult<User>> + Send;
    fn set_enabled(&self, user_id: i64, enabled: bool) -> impl Future<Output = UserResult<User>> + Send;
    fn delete(&self, user_id: i64) -> impl Future<Output = UserResult<()>> + Send;
    fn role_ids(&self, user_id: i64) -> impl Future<Output = UserResult<Vec<i64>>> + Send;
    fn existing_roles(&self, role_ids: &[i64]) -> impl Future<Output = UserResult<Vec<i64>>> + Send;
    fn replace_roles(
        &self,
        user_id: i64,
        role_ids: &[i64],
    ) -> impl Future<Output = UserResult<()>> + Send;
}

/// SQLite-backed [`UserRepo`] combining the user and role repositories
#[derive(Clone)]
pub struct SqliteUserStore {
    users: UserRepository,
    roles: RoleRepository,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            roles: RoleRepository::new(pool),
        }
    }
}

impl UserRepo for SqliteUserStore {
    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_matching(&self, lookup: &UserLookup, exclude_id: Option<i64>) -> UserResult<Vec<User>> {
        self.users.find_matching(lookup, exclude_id).await
    }

    async fn list(&self, filter: &UserFilter, offset: i64, limit: i64) -> UserResult<Vec<User>> {
        self.users.list(filter, offset, limit).await
    }

    async fn count(&self, filter: &UserFilter) -> UserResult<i64> {
        self.users.count(filter).await
    }

    async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        self.users.create(request).await
    }

    async fn update(&self, user_id: i64, request: &UpdateUserRequest) -> UserResult<User> {
        self.users.update(user_id, request).await
    }

    async fn set_enabled(&self, user_id: i64, enabled: bool) -> UserResult<User> {
        self.users.set_enabled(user_id, enabled).await
    }

    async fn delete(&self, user_id: i64) -> UserResult<()> {
        self.users.delete(user_id).await
    }

    async fn role_ids(&self, user_id: i64) -> UserResult<Vec<i64>> {
        self.users.role_ids(user_id).await
    }

    async fn existing_roles(&self, role_ids: &[i64]) -> UserResult<Vec<i64>> {
        self.roles
            .find_existing(role_ids)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))
    }

    async fn replace_roles(&self, user_id: i64, role_ids: &[i64]) -> UserResult<()> {
        self.users.replace_roles(user_id, role_ids).await
    }
}
