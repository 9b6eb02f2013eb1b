use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use sondeo_application::{
    AssignmentId, CreateRoleInput, GrantPermissionInput, UpdateRoleInput,
};
use sondeo_core::{AppResult, UserIdentity};
use sondeo_domain::{PermissionId, RoleId};

use crate::dto::{
    CreateRoleRequest, GrantPermissionRequest, PermissionAssignmentResponse, PermissionResponse,
    RoleMemberRequest, RoleMembersResponse, RoleResponse, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{parse_declared_tenant, parse_uuid};

/// Optional tenant scope carried on read and delete requests.
#[derive(Debug, Deserialize)]
pub struct TenantQuery {
    pub tenant_id: Option<String>,
}

fn parse_permission_ids(values: &[String]) -> AppResult<Vec<PermissionId>> {
    values
        .iter()
        .map(|value| parse_uuid(value, "permission id").map(PermissionId::from_uuid))
        .collect()
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let declared_tenant = parse_declared_tenant(query.tenant_id.as_deref())?;
    let roles = state
        .role_service
        .list_roles(&user, declared_tenant)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .role_service
        .create_role(
            &user,
            CreateRoleInput {
                name: payload.name,
                description: payload.description,
                permission_ids: parse_permission_ids(&payload.permission_ids)?,
                declared_tenant: parse_declared_tenant(payload.tenant_id.as_deref())?,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role_id = RoleId::from_uuid(parse_uuid(&role_id, "role id")?);
    let permission_ids = payload
        .permission_ids
        .as_deref()
        .map(parse_permission_ids)
        .transpose()?;

    let role = state
        .role_service
        .update_role(
            &user,
            role_id,
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
                permission_ids,
                declared_tenant: parse_declared_tenant(payload.tenant_id.as_deref())?,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::from_uuid(parse_uuid(&role_id, "role id")?);
    let declared_tenant = parse_declared_tenant(query.tenant_id.as_deref())?;
    state
        .role_service
        .delete_role(&user, role_id, declared_tenant)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_role_members_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<Json<RoleMembersResponse>> {
    let role_id = RoleId::from_uuid(parse_uuid(&role_id, "role id")?);
    let declared_tenant = parse_declared_tenant(query.tenant_id.as_deref())?;
    let members = state
        .role_service
        .list_role_members(&user, role_id, declared_tenant)
        .await?;

    Ok(Json(RoleMembersResponse { members }))
}

pub async fn assign_role_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<RoleMemberRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::from_uuid(parse_uuid(&role_id, "role id")?);
    let declared_tenant = parse_declared_tenant(payload.tenant_id.as_deref())?;
    state
        .role_service
        .assign_role(&user, role_id, payload.subject.as_str(), declared_tenant)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unassign_role_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<RoleMemberRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::from_uuid(parse_uuid(&role_id, "role id")?);
    let declared_tenant = parse_declared_tenant(payload.tenant_id.as_deref())?;
    state
        .role_service
        .unassign_role(&user, role_id, payload.subject.as_str(), declared_tenant)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_permissions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .authorization_service
        .catalog()
        .list()
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<GrantPermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionAssignmentResponse>)> {
    let assignment = state
        .assignment_service
        .grant(
            &user,
            GrantPermissionInput {
                subject: payload.subject,
                permission_id: PermissionId::from_uuid(parse_uuid(
                    &payload.permission_id,
                    "permission id",
                )?),
                declared_tenant: parse_declared_tenant(payload.tenant_id.as_deref())?,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionAssignmentResponse::from(assignment)),
    ))
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(assignment_id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<StatusCode> {
    let assignment_id = AssignmentId::from_uuid(parse_uuid(&assignment_id, "assignment id")?);
    let declared_tenant = parse_declared_tenant(query.tenant_id.as_deref())?;
    state
        .assignment_service
        .revoke(&user, assignment_id, declared_tenant)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_permission_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<Json<Vec<PermissionAssignmentResponse>>> {
    let declared_tenant = parse_declared_tenant(query.tenant_id.as_deref())?;
    let assignments = state
        .assignment_service
        .list(&user, declared_tenant)
        .await?
        .into_iter()
        .map(PermissionAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}
