//! OpenAPI document for the user endpoints.
//!
//! The envelope schemas below mirror the JSON produced by
//! `userdesk_users::ApiResponse` for each payload type; they exist for
//! documentation only.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::rest::user::check_user_info,
        crate::rest::user::assign_roles,
        crate::rest::user::set_enabled,
        crate::rest::user::get_user,
        crate::rest::user::list_users,
        crate::rest::user::create_user,
        crate::rest::user::delete_user,
        crate::rest::user::update_user,
    ),
    components(
        schemas(
            crate::rest::user::CreateUserBody,
            crate::rest::user::UpdateUserBody,
            schemas::User,
            schemas::UserDetail,
            schemas::PageMeta,
            schemas::UserEnvelope,
            schemas::UserDetailEnvelope,
            schemas::UserListEnvelope,
            schemas::BoolEnvelope,
            schemas::RoleIdsEnvelope,
            schemas::ErrorEnvelope,
        )
    ),
    tags(
        (name = "users", description = "User account management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("opaque session token".to_string());
        }

        components
            .security_schemes
            .insert("bearerAuth".to_string(), scheme);
    }
}

/// Documentation-only mirrors of the JSON bodies.
pub mod schemas {
    use serde::Serialize;
    use utoipa::ToSchema;

    /// A user account. The password is never returned.
    #[derive(Serialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct User {
        pub id: i64,
        pub username: String,
        pub phone: Option<String>,
        pub idcard: Option<String>,
        pub email: Option<String>,
        pub enabled: bool,
        pub created_at: String,
        pub updated_at: String,
    }

    /// A user account with its assigned role ids.
    #[derive(Serialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct UserDetail {
        pub id: i64,
        pub username: String,
        pub phone: Option<String>,
        pub idcard: Option<String>,
        pub email: Option<String>,
        pub enabled: bool,
        pub created_at: String,
        pub updated_at: String,
        pub role_ids: Vec<i64>,
    }

    #[derive(Serialize, ToSchema)]
    pub struct PageMeta {
        pub page: u32,
        pub limit: u32,
        pub total: i64,
    }

    #[derive(Serialize, ToSchema)]
    pub struct UserEnvelope {
        #[schema(example = 0)]
        pub code: i32,
        pub message: String,
        pub data: Option<User>,
    }

    #[derive(Serialize, ToSchema)]
    pub struct UserDetailEnvelope {
        #[schema(example = 0)]
        pub code: i32,
        pub message: String,
        pub data: Option<UserDetail>,
    }

    #[derive(Serialize, ToSchema)]
    pub struct UserListEnvelope {
        #[schema(example = 0)]
        pub code: i32,
        pub message: String,
        pub data: Option<Vec<User>>,
        pub page: PageMeta,
    }

    #[derive(Serialize, ToSchema)]
    pub struct BoolEnvelope {
        #[schema(example = 0)]
        pub code: i32,
        pub message: String,
        pub data: Option<bool>,
    }

    #[derive(Serialize, ToSchema)]
    pub struct RoleIdsEnvelope {
        #[schema(example = 0)]
        pub code: i32,
        pub message: String,
        pub data: Option<Vec<i64>>,
    }

    /// Failure envelope. `code` is one of 4000, 4010, 4040, 4090 or 5000.
    #[derive(Serialize, ToSchema)]
    pub struct ErrorEnvelope {
        #[schema(example = 4040)]
        pub code: i32,
        #[schema(example = "user not found")]
        pub message: String,
        #[schema(value_type = Option<Object>)]
        pub data: Option<()>,
    }
}
