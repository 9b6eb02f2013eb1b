use serde::{Deserialize, Serialize};
use serde_json::Value;
use sondeo_application::{PermissionAssignment, RoleSummary};
use sondeo_core::UserIdentity;
use sondeo_domain::PermissionDefinition;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role_tier: String,
    pub tenant_id: Option<String>,
}

impl From<UserIdentity> for UserIdentityResponse {
    fn from(value: UserIdentity) -> Self {
        Self {
            subject: value.subject().to_owned(),
            display_name: value.display_name().to_owned(),
            email: value.email().map(str::to_owned),
            role_tier: value.tier().as_str().to_owned(),
            tenant_id: value.tenant_id().map(|tenant_id| tenant_id.to_string()),
        }
    }
}

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub permission_ids: Vec<String>,
    pub tenant_id: Option<String>,
}

/// Incoming payload for custom role updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permission_ids: Option<Vec<String>>,
    pub tenant_id: Option<String>,
}

/// Incoming payload for role membership changes.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-member-request.ts"
)]
pub struct RoleMemberRequest {
    pub subject: String,
    pub tenant_id: Option<String>,
}

/// API representation of a custom role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub permissions_signature: String,
    pub is_active: bool,
    pub member_count: u64,
}

impl From<RoleSummary> for RoleResponse {
    fn from(value: RoleSummary) -> Self {
        Self {
            role_id: value.role.id().to_string(),
            tenant_id: value.role.tenant_id().to_string(),
            name: value.role.name().to_owned(),
            description: value.role.description().to_owned(),
            permissions: value
                .role
                .permissions()
                .iter()
                .map(|grant| grant.name.as_str().to_owned())
                .collect(),
            permissions_signature: value.role.permissions_signature().to_owned(),
            is_active: value.role.is_effective(),
            member_count: value.member_count,
        }
    }
}

/// API representation of the members holding a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-members-response.ts"
)]
pub struct RoleMembersResponse {
    pub members: Vec<String>,
}

/// API representation of a catalog permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub permission_id: String,
    pub name: String,
    pub description: String,
    pub group: Option<String>,
}

impl From<PermissionDefinition> for PermissionResponse {
    fn from(value: PermissionDefinition) -> Self {
        Self {
            permission_id: value.id.to_string(),
            name: value.name.as_str().to_owned(),
            description: value.description,
            group: value.group,
        }
    }
}

/// Incoming payload for a direct permission grant.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/grant-permission-request.ts"
)]
pub struct GrantPermissionRequest {
    pub subject: String,
    pub permission_id: String,
    pub tenant_id: Option<String>,
}

/// API representation of a direct permission assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-assignment-response.ts"
)]
pub struct PermissionAssignmentResponse {
    pub assignment_id: String,
    pub subject: String,
    pub permission_id: String,
    pub tenant_id: String,
}

impl From<PermissionAssignment> for PermissionAssignmentResponse {
    fn from(value: PermissionAssignment) -> Self {
        Self {
            assignment_id: value.id.to_string(),
            subject: value.subject,
            permission_id: value.permission_id.to_string(),
            tenant_id: value.tenant_id.to_string(),
        }
    }
}

/// Incoming payload carrying a respondent's answer to a question.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/next-question-request.ts"
)]
pub struct NextQuestionRequest {
    #[ts(type = "unknown")]
    pub answer: Value,
    pub tenant_id: Option<String>,
}

/// Branching outcome for a submitted answer.
///
/// `next_question_id` is `None` when no rule matched and the client should
/// advance sequentially.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/next-question-response.ts"
)]
pub struct NextQuestionResponse {
    pub next_question_id: Option<String>,
}
