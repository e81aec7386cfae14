//! User entity definitions

use serde::{Deserialize, Serialize};

/// User account as stored in the `users` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Request for creating a new user. The password is already hashed.
#[derive(Debug, Clone, Default)]
pub struct CreateUserRequest {
    pub username: String,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
}

/// Full-record replacement of an existing user.
///
/// `password_hash` and `enabled` keep their stored value when `None`; the
/// contact fields are overwritten as given.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub username: String,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
    pub enabled: Option<bool>,
}

/// Exact-match filter for listings. An empty filter matches every live user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFilter {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
    pub enabled: Option<bool>,
}

/// Identifying fields used for duplicate detection; matches on any field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserLookup {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
}

impl UserLookup {
    /// Supplied fields as `(column, value)` pairs, blanks skipped.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("username", self.username.as_deref()),
            ("phone", self.phone.as_deref()),
            ("idcard", self.idcard.as_deref()),
            ("email", self.email.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (column, v))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Columns of `user` that equal one of the supplied fields.
    pub fn matching_fields(&self, user: &User) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(column, value)| {
                let stored = match *column {
                    "username" => Some(user.username.as_str()),
                    "phone" => user.phone.as_deref(),
                    "idcard" => user.idcard.as_deref(),
                    "email" => user.email.as_deref(),
                    _ => None,
                };
                stored == Some(*value)
            })
            .map(|(column, _)| column)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "alice".to_string(),
            password_hash: Some("secret".to_string()),
            phone: Some("13800000000".to_string()),
            idcard: None,
            email: Some("a@x.com".to_string()),
            enabled: true,
            created_at: "2024-03-23T00:00:00+00:00".to_string(),
            updated_at: "2024-03-23T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_user_serializes_camel_case_without_password() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_lookup_fields_skip_blank_values() {
        let lookup = UserLookup {
            username: Some("  ".to_string()),
            phone: None,
            idcard: Some("11010519491231002X".to_string()),
            email: Some("".to_string()),
        };

        assert_eq!(lookup.fields(), vec![("idcard", "11010519491231002X")]);
        assert!(!lookup.is_empty());
        assert!(UserLookup::default().is_empty());
    }

    #[test]
    fn test_matching_fields() {
        let user = sample_user();
        let lookup = UserLookup {
            username: Some("bob".to_string()),
            email: Some("a@x.com".to_string()),
            phone: Some("13800000000".to_string()),
            ..Default::default()
        };

        assert_eq!(lookup.matching_fields(&user), vec!["phone", "email"]);
    }
}
