//! Role repository for database operations.

use crate::entities::Role;
use crate::types::DatabaseResult;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

#[derive(Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All roles ordered by id
    pub async fn list_all(&self) -> DatabaseResult<Vec<Role>> {
        let rows = sqlx::query("SELECT id, name, description, created_at FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(role_from_row).collect()
    }

    /// Find role by name
    pub async fn find_id_by_name(&self, name: &str) -> DatabaseResult<Option<i64>> {
        let id = sqlx::query_scalar("SELECT id FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    /// Subset of `ids` that name an existing role, ascending
    pub async fn find_existing(&self, ids: &[i64]) -> DatabaseResult<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM roles WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        builder.push(") ORDER BY id");

        let existing = builder
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await?;

        Ok(existing)
    }
}

fn role_from_row(row: &SqliteRow) -> DatabaseResult<Role> {
    Ok(Role {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn test_seeded_roles() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = RoleRepository::new(pool);

        let roles = repo.list_all().await.unwrap();
        let names: Vec<_> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["admin", "operator", "user"]);

        assert_eq!(repo.find_id_by_name("admin").await.unwrap(), Some(1));
        assert_eq!(repo.find_id_by_name("root").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_existing() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = RoleRepository::new(pool);

        assert_eq!(repo.find_existing(&[3, 99, 1]).await.unwrap(), vec![1, 3]);
        assert!(repo.find_existing(&[]).await.unwrap().is_empty());
    }
}
