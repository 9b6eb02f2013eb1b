//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_service;
mod audit;
mod authorization_service;
mod role_service;
mod survey_service;
mod tenant_context;

pub use assignment_service::{
    AssignmentId, AssignmentRepository, AssignmentService, GrantPermissionInput,
    PermissionAssignment,
};
pub use audit::{AuditEvent, AuditRepository};
pub use authorization_service::{
    AccessDecision, AuthorizationRepository, AuthorizationService, UserDirectory, UserRecord,
};
pub use role_service::{
    CreateRoleInput, RoleRepository, RoleService, RoleSummary, UpdateRoleInput,
};
pub use survey_service::{SurveyRepository, SurveyService};
pub use tenant_context::resolve_tenant;
