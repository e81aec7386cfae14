//! Response envelope shared by every user operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;
use userdesk_database::{User, UserError};

/// Numeric outcome carried in every envelope.
///
/// The HTTP status of a response is derived from the code: `code / 10`, with
/// `200` for success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ResultCode {
    Success,
    InvalidArgument,
    Unauthenticated,
    NotFound,
    Conflict,
    Internal,
}

impl ResultCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ResultCode::Success => 0,
            ResultCode::InvalidArgument => 4000,
            ResultCode::Unauthenticated => 4010,
            ResultCode::NotFound => 4040,
            ResultCode::Conflict => 4090,
            ResultCode::Internal => 5000,
        }
    }

    pub const fn http_status(self) -> u16 {
        match self {
            ResultCode::Success => 200,
            other => (other.as_i32() / 10) as u16,
        }
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.as_i32()
    }
}

impl TryFrom<i32> for ResultCode {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ResultCode::Success),
            4000 => Ok(ResultCode::InvalidArgument),
            4010 => Ok(ResultCode::Unauthenticated),
            4040 => Ok(ResultCode::NotFound),
            4090 => Ok(ResultCode::Conflict),
            5000 => Ok(ResultCode::Internal),
            other => Err(format!("unknown result code {other}")),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// `{ code, message, data, page? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: ResultCode,
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: ResultCode::Success,
            message: "success".to_string(),
            data: Some(data),
            page: None,
        }
    }

    pub fn paged(data: T, page: PageMeta) -> Self {
        Self {
            page: Some(page),
            ..Self::success(data)
        }
    }

    pub fn failure(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            page: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }
}

impl<T> From<UserError> for ApiResponse<T> {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound => Self::failure(ResultCode::NotFound, "user not found"),
            UserError::Duplicate { .. } => Self::failure(ResultCode::Conflict, err.to_string()),
            UserError::UnknownRoles(_) | UserError::ValidationFailed(_) => {
                Self::failure(ResultCode::InvalidArgument, err.to_string())
            }
            UserError::PasswordHashing(_) | UserError::DatabaseError(_) => {
                error!(error = %err, "user operation failed");
                Self::failure(ResultCode::Internal, "internal server error")
            }
        }
    }
}

impl<T> From<Result<T, UserError>> for ApiResponse<T> {
    fn from(result: Result<T, UserError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => err.into(),
        }
    }
}

/// A user together with its assigned role ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub role_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn http_status_follows_code() {
        assert_eq!(ResultCode::Success.http_status(), 200);
        assert_eq!(ResultCode::InvalidArgument.http_status(), 400);
        assert_eq!(ResultCode::Unauthenticated.http_status(), 401);
        assert_eq!(ResultCode::NotFound.http_status(), 404);
        assert_eq!(ResultCode::Conflict.http_status(), 409);
        assert_eq!(ResultCode::Internal.http_status(), 500);
    }

    #[test]
    fn envelope_serializes_numeric_code_and_null_data() {
        let failure: ApiResponse<bool> = ApiResponse::failure(ResultCode::NotFound, "user not found");
        let value = serde_json::to_value(&failure).unwrap();

        assert_eq!(
            value,
            json!({ "code": 4040, "message": "user not found", "data": null })
        );
    }

    #[test]
    fn paged_envelope_carries_page_meta() {
        let meta = PageMeta {
            page: 2,
            limit: 10,
            total: 11,
        };
        let value = serde_json::to_value(ApiResponse::paged(vec![1, 2], meta)).unwrap();

        assert_eq!(value["code"], 0);
        assert_eq!(value["page"], json!({ "page": 2, "limit": 10, "total": 11 }));
    }

    #[test]
    fn envelope_deserializes() {
        let parsed: ApiResponse<bool> =
            serde_json::from_str(r#"{"code":4090,"message":"email already registered","data":null}"#)
                .unwrap();
        assert_eq!(parsed.code, ResultCode::Conflict);
        assert!(parsed.data.is_none());

        let unknown = serde_json::from_str::<ApiResponse<bool>>(r#"{"code":1,"message":"","data":null}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn user_errors_map_to_codes() {
        let cases: Vec<(UserError, ResultCode)> = vec![
            (UserError::UserNotFound, ResultCode::NotFound),
            (UserError::duplicate("email"), ResultCode::Conflict),
            (UserError::UnknownRoles(vec![9]), ResultCode::InvalidArgument),
            (UserError::ValidationFailed("bad".into()), ResultCode::InvalidArgument),
            (UserError::DatabaseError("disk".into()), ResultCode::Internal),
        ];

        for (err, code) in cases {
            let response: ApiResponse<()> = err.into();
            assert_eq!(response.code, code);
            assert!(response.data.is_none());
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let response: ApiResponse<()> = UserError::DatabaseError("disk I/O error".into()).into();
        assert_eq!(response.message, "internal server error");
    }
}
