//! User management REST endpoints under `/v1/user`
//!
//! Handlers only bind parameters, call the user service once and return its
//! envelope. Binding failures are answered before the service is reached.

use axum::{
    extract::{Path, Query, State},
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::{Query as MultiQuery, WithRejection};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use userdesk_users::{NewUser, User, UserDetail, UserFilter, UserLookup, UserRef, UserUpdate};

use super::Envelope;
use crate::docs::schemas::{
    BoolEnvelope, ErrorEnvelope, RoleIdsEnvelope, UserDetailEnvelope, UserEnvelope, UserListEnvelope,
};
use crate::error::GatewayError;
use crate::middleware::{auth_middleware, operation_middleware, Operation, OperationContext};
use crate::state::GatewayState;

pub const CHECK_USER_INFO: Operation = Operation::new("check user info");
pub const ASSIGN_ROLES: Operation = Operation::new("assign user roles");
pub const SET_ENABLED: Operation = Operation::new("set user enabled");
pub const GET_USER: Operation = Operation::new("get user");
pub const LIST_USERS: Operation = Operation::new("list users");
pub const CREATE_USER: Operation = Operation::audited("create user");
pub const DELETE_USER: Operation = Operation::new("delete user");
pub const UPDATE_USER: Operation = Operation::new("update user");

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckUserInfoQuery {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
}

impl From<CheckUserInfoQuery> for UserLookup {
    fn from(query: CheckUserInfoQuery) -> Self {
        Self {
            username: query.username,
            phone: query.phone,
            idcard: query.idcard,
            email: query.email,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RoleIdsQuery {
    /// Repeated (`roleIds=1&roleIds=2`) or comma-separated (`roleIds=1,2`)
    #[serde(default)]
    #[param(value_type = Vec<i64>)]
    pub role_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnabledQuery {
    pub enabled: bool,
}

/// New user. A client-supplied `id` is ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    #[schema(example = "alice")]
    pub username: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    #[schema(example = "a@x.com")]
    pub email: Option<String>,
    pub enabled: Option<bool>,
}

impl From<CreateUserBody> for NewUser {
    fn from(body: CreateUserBody) -> Self {
        Self {
            username: body.username,
            password: body.password,
            phone: body.phone,
            idcard: body.idcard,
            email: body.email,
            enabled: body.enabled,
        }
    }
}

/// Full replacement of an existing user
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    pub id: i64,
    pub username: String,
    /// Keeps the stored password when omitted
    pub password: Option<String>,
    pub phone: Option<String>,
    pub idcard: Option<String>,
    pub email: Option<String>,
    /// Keeps the stored state when omitted
    pub enabled: Option<bool>,
}

impl From<UpdateUserBody> for UserUpdate {
    fn from(body: UpdateUserBody) -> Self {
        Self {
            id: body.id,
            username: body.username,
            password: body.password,
            phone: body.phone,
            idcard: body.idcard,
            email: body.email,
            enabled: body.enabled,
        }
    }
}

/// Create user routes
pub fn create_user_routes(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    let op = |operation: Operation| {
        from_fn_with_state(
            OperationContext {
                state: state.clone(),
                operation,
            },
            operation_middleware,
        )
    };

    Router::new()
        .route(
            "/v1/user",
            get(list_users.layer(op(LIST_USERS)))
                .post(create_user.layer(op(CREATE_USER)))
                .put(update_user.layer(op(UPDATE_USER))),
        )
        .route(
            "/v1/user/checkUserInfo",
            post(check_user_info.layer(op(CHECK_USER_INFO))),
        )
        .route(
            "/v1/user/:user_id",
            get(get_user.layer(op(GET_USER))).delete(delete_user.layer(op(DELETE_USER))),
        )
        .route(
            "/v1/user/:user_id/role",
            patch(assign_roles.layer(op(ASSIGN_ROLES))),
        )
        .route(
            "/v1/user/:user_id/enabled",
            patch(set_enabled.layer(op(SET_ENABLED))),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}

#[utoipa::path(
    post,
    path = "/v1/user/checkUserInfo",
    tag = "users",
    params(CheckUserInfoQuery),
    responses(
        (status = 200, description = "True when any supplied field is already registered", body = BoolEnvelope),
        (status = 400, description = "No field supplied", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn check_user_info(
    State(state): State<Arc<GatewayState>>,
    WithRejection(Query(query), _): WithRejection<Query<CheckUserInfoQuery>, GatewayError>,
) -> Envelope<bool> {
    Envelope(state.user_service().check_user_info(query.into()).await)
}

#[utoipa::path(
    patch,
    path = "/v1/user/{userId}/role",
    tag = "users",
    params(
        ("userId" = i64, Path, description = "User ID"),
        RoleIdsQuery
    ),
    responses(
        (status = 200, description = "The user's new role set", body = RoleIdsEnvelope),
        (status = 400, description = "Missing or unknown role ids", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn assign_roles(
    State(state): State<Arc<GatewayState>>,
    WithRejection(Path(user_id), _): WithRejection<Path<i64>, GatewayError>,
    WithRejection(MultiQuery(query), _): WithRejection<MultiQuery<RoleIdsQuery>, GatewayError>,
) -> Result<Envelope<Vec<i64>>, GatewayError> {
    let role_ids = parse_role_ids(&query.role_ids)?;
    Ok(Envelope(state.user_service().update_role(user_id, role_ids).await))
}

#[utoipa::path(
    patch,
    path = "/v1/user/{userId}/enabled",
    tag = "users",
    params(
        ("userId" = i64, Path, description = "User ID"),
        EnabledQuery
    ),
    responses(
        (status = 200, description = "Updated user", body = UserEnvelope),
        (status = 400, description = "Invalid parameters", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn set_enabled(
    State(state): State<Arc<GatewayState>>,
    WithRejection(Path(user_id), _): WithRejection<Path<i64>, GatewayError>,
    WithRejection(Query(query), _): WithRejection<Query<EnabledQuery>, GatewayError>,
) -> Envelope<User> {
    Envelope(state.user_service().set_enabled(user_id, query.enabled).await)
}

#[utoipa::path(
    get,
    path = "/v1/user/{userId}",
    tag = "users",
    params(("userId" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User with role ids", body = UserDetailEnvelope),
        (status = 400, description = "Invalid user id", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_user(
    State(state): State<Arc<GatewayState>>,
    WithRejection(Path(user_id), _): WithRejection<Path<i64>, GatewayError>,
) -> Envelope<UserDetail> {
    Envelope(state.user_service().get_by_id(user_id).await)
}

#[utoipa::path(
    get,
    path = "/v1/user",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "One page of users ordered by id", body = UserListEnvelope),
        (status = 400, description = "Invalid paging parameters", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<Arc<GatewayState>>,
    WithRejection(Query(query), _): WithRejection<Query<ListUsersQuery>, GatewayError>,
) -> Envelope<Vec<User>> {
    let service = state.user_service();
    let page = service.page_info(query.page, query.limit);
    Envelope(service.list(UserFilter::default(), page).await)
}

#[utoipa::path(
    post,
    path = "/v1/user",
    tag = "users",
    request_body = CreateUserBody,
    responses(
        (status = 200, description = "Created user", body = UserEnvelope),
        (status = 400, description = "Invalid user", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 409, description = "Identifying field already registered", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_user(
    State(state): State<Arc<GatewayState>>,
    WithRejection(Json(body), _): WithRejection<Json<CreateUserBody>, GatewayError>,
) -> Envelope<User> {
    Envelope(state.user_service().insert(body.into()).await)
}

#[utoipa::path(
    delete,
    path = "/v1/user/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = BoolEnvelope),
        (status = 400, description = "Invalid user id", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_user(
    State(state): State<Arc<GatewayState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, GatewayError>,
) -> Envelope<bool> {
    Envelope(state.user_service().delete(UserRef::from(id)).await)
}

#[utoipa::path(
    put,
    path = "/v1/user",
    tag = "users",
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "Updated user", body = UserEnvelope),
        (status = 400, description = "Invalid user", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope),
        (status = 409, description = "Identifying field already registered", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_user(
    State(state): State<Arc<GatewayState>>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateUserBody>, GatewayError>,
) -> Envelope<User> {
    Envelope(state.user_service().update(body.into()).await)
}

/// Flatten repeated and comma-separated `roleIds` values.
fn parse_role_ids(raw: &[String]) -> Result<Vec<i64>, GatewayError> {
    let role_ids = raw
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<i64>()
                .map_err(|_| GatewayError::InvalidRequest(format!("invalid role id `{value}`")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if role_ids.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "roleIds must not be empty".to_string(),
        ));
    }

    Ok(role_ids)
}
