//! Request types accepted by [`UserService`](crate::UserService).

use serde::{Deserialize, Serialize};
use userdesk_config::PaginationConfig;

/// Page selection after defaulting and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
}

impl PageInfo {
    /// Resolve optional query values against the pagination policy.
    ///
    /// ```
    /// use userdesk_config::PaginationConfig;
    /// use userdesk_users::PageInfo;
    ///
    /// let policy = PaginationConfig::default();
    /// assert_eq!(PageInfo::resolve(None, None, &policy), PageInfo { page: 1, limit: 10 });
    /// assert_eq!(PageInfo::resolve(Some(0), Some(500), &policy), PageInfo { page: 1, limit: 100 });
    /// ```
    pub fn resolve(page: Option<u32>, limit: Option<u32>, policy: &PaginationConfig) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(policy.default_limit)
            .min(policy.max_limit)
            .max(1);

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// New account. The password arrives in clear text and is hashed by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
    pub enabled: Option<bool>,
}

/// Full replacement of an existing account identified by `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub id: i64,
    pub username: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
    pub enabled: Option<bool>,
}

/// Identifies a user by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
}

impl From<i64> for UserRef {
    fn from(id: i64) -> Self {
        Self { id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_info_defaults() {
        let policy = PaginationConfig::default();

        assert_eq!(
            PageInfo::resolve(Some(3), Some(20), &policy),
            PageInfo { page: 3, limit: 20 }
        );
        assert_eq!(
            PageInfo::resolve(None, Some(0), &policy),
            PageInfo { page: 1, limit: 10 }
        );
    }

    #[test]
    fn page_info_respects_custom_policy() {
        let policy = PaginationConfig {
            default_limit: 5,
            max_limit: 7,
        };

        assert_eq!(PageInfo::resolve(None, None, &policy).limit, 5);
        assert_eq!(PageInfo::resolve(None, Some(8), &policy).limit, 7);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageInfo { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageInfo { page: 3, limit: 25 }.offset(), 50);
    }
}
