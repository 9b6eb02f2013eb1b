//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod logic;
mod role;
mod security;
mod survey;

pub use logic::next_question;
pub use role::{CustomRole, PermissionGrant, RoleDerivedGrant, RoleId, permissions_signature};
pub use security::{
    AuditAction, PermissionCatalog, PermissionDefinition, PermissionId, PermissionName,
};
pub use survey::{
    LogicCondition, LogicOperator, LogicRule, Question, QuestionId, QuestionType, SurveyId,
};
