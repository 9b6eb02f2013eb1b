//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_permission_catalog;
mod postgres_role_repository;
mod postgres_survey_repository;
mod postgres_user_directory;

pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_permission_catalog::{load_permission_catalog, seed_permission_catalog};
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_survey_repository::PostgresSurveyRepository;
pub use postgres_user_directory::PostgresUserDirectory;
