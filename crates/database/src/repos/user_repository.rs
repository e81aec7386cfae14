//! User repository for database operations.

use crate::entities::{CreateUserRequest, UpdateUserRequest, User, UserFilter, UserLookup};
use crate::types::{UserError, UserResult};
use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row, SqlitePool};

const USER_COLUMNS: &str =
    "id, username, password_hash, phone, idcard, email, enabled, created_at, updated_at";

/// Repository for user database operations.
///
/// Deleted users are kept with `deleted = 1` and are invisible to every
/// read in this repository.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted = 0"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Find user by username
    pub async fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? AND deleted = 0"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Live users matching any supplied lookup field, optionally excluding one id
    pub async fn find_matching(
        &self,
        lookup: &UserLookup,
        exclude_id: Option<i64>,
    ) -> UserResult<Vec<User>> {
        let fields = lookup.fields();
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted = 0 AND ("
        ));
        let mut separated = builder.separated(" OR ");
        for (column, value) in fields {
            separated.push(format!("{column} = "));
            separated.push_bind_unseparated(value.to_string());
        }
        builder.push(")");

        if let Some(id) = exclude_id {
            builder.push(" AND id != ").push_bind(id);
        }
        builder.push(" ORDER BY id ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    /// One page of live users matching the filter, ordered by id
    pub async fn list(&self, filter: &UserFilter, offset: i64, limit: i64) -> UserResult<Vec<User>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted = 0"
        ));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    /// Number of live users matching the filter
    pub async fn count(&self, filter: &UserFilter) -> UserResult<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE deleted = 0");
        push_filter(&mut builder, filter);

        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Create new user
    pub async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, phone, idcard, email, enabled, deleted, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, false, ?, ?)",
        )
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(&request.phone)
        .bind(&request.idcard)
        .bind(&request.email)
        .bind(request.enabled)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();

        self.find_by_id(user_id).await?.ok_or_else(|| {
            UserError::DatabaseError("Failed to retrieve created user".to_string())
        })
    }

    /// Replace the stored record of a live user
    pub async fn update(&self, user_id: i64, request: &UpdateUserRequest) -> UserResult<User> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = ?,
                password_hash = COALESCE(?, password_hash),
                phone = ?,
                idcard = ?,
                email = ?,
                enabled = COALESCE(?, enabled),
                updated_at = ?
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(&request.phone)
        .bind(&request.idcard)
        .bind(&request.email)
        .bind(request.enabled)
        .bind(&now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        self.find_by_id(user_id).await?.ok_or(UserError::UserNotFound)
    }

    /// Enable or disable a live user
    pub async fn set_enabled(&self, user_id: i64, enabled: bool) -> UserResult<User> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE users SET enabled = ?, updated_at = ? WHERE id = ? AND deleted = 0",
        )
        .bind(enabled)
        .bind(&now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        self.find_by_id(user_id).await?.ok_or(UserError::UserNotFound)
    }

    /// Delete user (soft delete); also drops its role assignments and sessions
    pub async fn delete(&self, id: i64) -> UserResult<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET deleted = true, updated_at = ? WHERE id = ? AND deleted = 0",
        )
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM auth_sessions WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Role ids assigned to a user, ascending
    pub async fn role_ids(&self, user_id: i64) -> UserResult<Vec<i64>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT role_id FROM user_roles WHERE user_id = ? ORDER BY role_id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }

    /// Replace the full role set of a live user
    pub async fn replace_roles(&self, user_id: i64, role_ids: &[i64]) -> UserResult<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = ? AND deleted = 0")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_none() {
            return Err(UserError::UserNotFound);
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role_id in role_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO user_roles (user_id, role_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(role_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    let text_filters = [
        ("username", &filter.username),
        ("phone", &filter.phone),
        ("idcard", &filter.idcard),
        ("email", &filter.email),
    ];

    for (column, value) in text_filters {
        if let Some(value) = value {
            builder
                .push(format!(" AND {column} = "))
                .push_bind(value.clone());
        }
    }

    if let Some(enabled) = filter.enabled {
        builder.push(" AND enabled = ").push_bind(enabled);
    }
}

fn user_from_row(row: &SqliteRow) -> UserResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        phone: row.try_get("phone")?,
        idcard: row.try_get("idcard")?,
        email: row.try_get("email")?,
        enabled: row.try_get("enabled")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_pool;

    fn create_request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password_hash: Some("hash".to_string()),
            phone: None,
            idcard: None,
            email: Some(email.to_string()),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_user_creation_and_retrieval() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        let created = repo.create(&create_request("alice", "a@x.com")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.username, "alice");
        assert_eq!(created.email.as_deref(), Some("a@x.com"));
        assert!(created.enabled);

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);

        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_maps_to_duplicate_error() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        repo.create(&create_request("alice", "a@x.com")).await.unwrap();
        let result = repo.create(&create_request("alice", "b@x.com")).await;

        assert_eq!(result.unwrap_err(), UserError::duplicate("username"));
    }

    #[tokio::test]
    async fn test_deleted_user_is_invisible_and_frees_unique_fields() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        let user = repo.create(&create_request("alice", "a@x.com")).await.unwrap();
        repo.delete(user.id).await.unwrap();

        assert!(repo.find_by_id(user.id).await.unwrap().is_none());
        assert_eq!(repo.delete(user.id).await.unwrap_err(), UserError::UserNotFound);
        assert_eq!(repo.count(&UserFilter::default()).await.unwrap(), 0);

        let again = repo.create(&create_request("alice", "a@x.com")).await.unwrap();
        assert_ne!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_paged() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        for i in 0..5 {
            repo.create(&create_request(&format!("user{i}"), &format!("u{i}@x.com")))
                .await
                .unwrap();
        }

        let filter = UserFilter::default();
        let first = repo.list(&filter, 0, 2).await.unwrap();
        let second = repo.list(&filter, 2, 2).await.unwrap();
        let last = repo.list(&filter, 4, 2).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(last.len(), 1);
        assert!(first[1].id < second[0].id);
        assert_eq!(repo.list(&filter, 0, 2).await.unwrap(), first);
        assert_eq!(repo.count(&filter).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_list_applies_filter() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        let alice = repo.create(&create_request("alice", "a@x.com")).await.unwrap();
        repo.create(&create_request("bob", "b@x.com")).await.unwrap();
        repo.set_enabled(alice.id, false).await.unwrap();

        let disabled = UserFilter {
            enabled: Some(false),
            ..Default::default()
        };
        let users = repo.list(&disabled, 0, 10).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");

        let by_email = UserFilter {
            email: Some("b@x.com".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.count(&by_email).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_matching_any_field() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        let alice = repo.create(&create_request("alice", "a@x.com")).await.unwrap();

        let lookup = UserLookup {
            username: Some("nobody".to_string()),
            email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        let matches = repo.find_matching(&lookup, None).await.unwrap();
        assert_eq!(matches.len(), 1);

        let excluded = repo.find_matching(&lookup, Some(alice.id)).await.unwrap();
        assert!(excluded.is_empty());

        assert!(repo
            .find_matching(&UserLookup::default(), None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_password() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        let user = repo.create(&create_request("alice", "a@x.com")).await.unwrap();
        let request = UpdateUserRequest {
            username: "alice2".to_string(),
            password_hash: None,
            phone: Some("13800000000".to_string()),
            idcard: None,
            email: None,
            enabled: None,
        };

        let updated = repo.update(user.id, &request).await.unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.phone.as_deref(), Some("13800000000"));
        assert!(updated.email.is_none());
        assert!(updated.enabled);
        assert_eq!(updated.password_hash.as_deref(), Some("hash"));

        let missing = repo.update(9_999, &request).await;
        assert_eq!(missing.unwrap_err(), UserError::UserNotFound);
    }

    #[tokio::test]
    async fn test_replace_roles() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        let user = repo.create(&create_request("alice", "a@x.com")).await.unwrap();

        repo.replace_roles(user.id, &[3, 1]).await.unwrap();
        assert_eq!(repo.role_ids(user.id).await.unwrap(), vec![1, 3]);

        repo.replace_roles(user.id, &[2]).await.unwrap();
        assert_eq!(repo.role_ids(user.id).await.unwrap(), vec![2]);

        let missing = repo.replace_roles(9_999, &[1]).await;
        assert_eq!(missing.unwrap_err(), UserError::UserNotFound);

        repo.delete(user.id).await.unwrap();
        assert!(repo.role_ids(user.id).await.unwrap().is_empty());
    }
}
