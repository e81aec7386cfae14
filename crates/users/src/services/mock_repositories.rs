//! In-memory user store for exercising the service without SQLite

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use userdesk_database::{
    CreateUserRequest, UpdateUserRequest, User, UserError, UserFilter, UserLookup, UserResult,
};

use super::user_service::UserRepo;

/// Mock user repository for testing
pub struct MockUserRepository {
    users: Arc<RwLock<HashMap<i64, User>>>,
    assignments: Arc<RwLock<HashMap<i64, BTreeSet<i64>>>>,
    next_id: Arc<RwLock<i64>>,
    known_roles: BTreeSet<i64>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            assignments: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(1)),
            known_roles: [1, 2, 3].into_iter().collect(),
        }
    }

    fn conflict(users: &HashMap<i64, User>, lookup: &UserLookup, exclude_id: Option<i64>) -> Option<&'static str> {
        users
            .values()
            .filter(|u| Some(u.id) != exclude_id)
            .find_map(|u| lookup.matching_fields(u).first().copied())
    }

    fn matches_filter(user: &User, filter: &UserFilter) -> bool {
        let text = |wanted: &Option<String>, actual: Option<&str>| {
            wanted.as_deref().map_or(true, |w| actual == Some(w))
        };

        text(&filter.username, Some(user.username.as_str()))
            && text(&filter.phone, user.phone.as_deref())
            && text(&filter.idcard, user.idcard.as_deref())
            && text(&filter.email, user.email.as_deref())
            && filter.enabled.map_or(true, |e| user.enabled == e)
    }
}

impl UserRepo for MockUserRepository {
    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_matching(&self, lookup: &UserLookup, exclude_id: Option<i64>) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut matches: Vec<User> = users
            .values()
            .filter(|u| Some(u.id) != exclude_id && !lookup.matching_fields(u).is_empty())
            .cloned()
            .collect();
        matches.sort_by_key(|u| u.id);
        Ok(matches)
    }

    async fn list(&self, filter: &UserFilter, offset: i64, limit: i64) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut matching: Vec<User> = users
            .values()
            .filter(|u| Self::matches_filter(u, filter))
            .cloned()
            .collect();
        matching.sort_by_key(|u| u.id);

        Ok(matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> UserResult<i64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| Self::matches_filter(u, filter)).count() as i64)
    }

    async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        let mut users = self.users.write().await;

        let candidate = UserLookup {
            username: Some(request.username.clone()),
            phone: request.phone.clone(),
            idcard: request.idcard.clone(),
            email: request.email.clone(),
        };
        if let Some(field) = Self::conflict(&users, &candidate, None) {
            return Err(UserError::duplicate(field));
        }

        let mut next_id = self.next_id.write().await;
        let user_id = *next_id;
        *next_id += 1;

        let now = chrono::Utc::now().to_rfc3339();
        let user = User {
            id: user_id,
            username: request.username.clone(),
            password_hash: request.password_hash.clone(),
            phone: request.phone.clone(),
            idcard: request.idcard.clone(),
            email: request.email.clone(),
            enabled: request.enabled,
            created_at: now.clone(),
            updated_at: now,
        };

        users.insert(user_id, user.clone());
        Ok(user)
    }

    async fn update(&self, user_id: i64, request: &UpdateUserRequest) -> UserResult<User> {
        let mut users = self.users.write().await;

        let candidate = UserLookup {
            username: Some(request.username.clone()),
            phone: request.phone.clone(),
            idcard: request.idcard.clone(),
            email: request.email.clone(),
        };
        if let Some(field) = Self::conflict(&users, &candidate, Some(user_id)) {
            return Err(UserError::duplicate(field));
        }

        let user = users.get_mut(&user_id).ok_or(UserError::UserNotFound)?;
        user.username = request.username.clone();
        if let Some(hash) = &request.password_hash {
            user.password_hash = Some(hash.clone());
        }
        user.phone = request.phone.clone();
        user.idcard = request.idcard.clone();
        user.email = request.email.clone();
        if let Some(enabled) = request.enabled {
            user.enabled = enabled;
        }
        user.updated_at = chrono::Utc::now().to_rfc3339();

        Ok(user.clone())
    }

    async fn set_enabled(&self, user_id: i64, enabled: bool) -> UserResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or(UserError::UserNotFound)?;
        user.enabled = enabled;
        user.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(user.clone())
    }

    async fn delete(&self, user_id: i64) -> UserResult<()> {
        let mut users = self.users.write().await;
        users.remove(&user_id).ok_or(UserError::UserNotFound)?;

        self.assignments.write().await.remove(&user_id);
        Ok(())
    }

    async fn role_ids(&self, user_id: i64) -> UserResult<Vec<i64>> {
        let assignments = self.assignments.read().await;
        Ok(assignments
            .get(&user_id)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn existing_roles(&self, role_ids: &[i64]) -> UserResult<Vec<i64>> {
        let existing: BTreeSet<i64> = role_ids
            .iter()
            .copied()
            .filter(|id| self.known_roles.contains(id))
            .collect();
        Ok(existing.into_iter().collect())
    }

    async fn replace_roles(&self, user_id: i64, role_ids: &[i64]) -> UserResult<()> {
        if !self.users.read().await.contains_key(&user_id) {
            return Err(UserError::UserNotFound);
        }

        self.assignments
            .write()
            .await
            .insert(user_id, role_ids.iter().copied().collect());
        Ok(())
    }
}
