use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use sondeo_application::{AssignmentId, AssignmentRepository, PermissionAssignment};
use sondeo_core::{AppError, AppResult, TenantId};
use sondeo_domain::PermissionId;

/// PostgreSQL-backed repository for direct permission assignments.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    subject: String,
    permission_id: uuid::Uuid,
}

impl From<AssignmentRow> for PermissionAssignment {
    fn from(row: AssignmentRow) -> Self {
        Self {
            id: AssignmentId::from_uuid(row.id),
            subject: row.subject,
            permission_id: PermissionId::from_uuid(row.permission_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
        }
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn find_triple(
        &self,
        tenant_id: TenantId,
        subject: &str,
        permission_id: PermissionId,
    ) -> AppResult<Option<PermissionAssignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, tenant_id, subject, permission_id
            FROM permission_assignments
            WHERE tenant_id = $1 AND subject = $2 AND permission_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to look up permission assignment: {error}"))
        })?;

        Ok(row.map(PermissionAssignment::from))
    }

    async fn find_by_id(
        &self,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<PermissionAssignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, tenant_id, subject, permission_id
            FROM permission_assignments
            WHERE id = $1
            "#,
        )
        .bind(assignment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load permission assignment: {error}"))
        })?;

        Ok(row.map(PermissionAssignment::from))
    }

    async fn insert(&self, assignment: &PermissionAssignment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_assignments (id, tenant_id, subject, permission_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(assignment.id.as_uuid())
        .bind(assignment.tenant_id.as_uuid())
        .bind(assignment.subject.as_str())
        .bind(assignment.permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(
                    "Permission already assigned to this user".to_owned(),
                );
            }

            AppError::Internal(format!("failed to persist permission assignment: {error}"))
        })?;

        Ok(())
    }

    async fn delete(&self, assignment_id: AssignmentId) -> AppResult<()> {
        sqlx::query("DELETE FROM permission_assignments WHERE id = $1")
            .bind(assignment_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete permission assignment: {error}"))
            })?;

        Ok(())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, tenant_id, subject, permission_id
            FROM permission_assignments
            WHERE tenant_id = $1
            ORDER BY subject
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission assignments: {error}"))
        })?;

        Ok(rows.into_iter().map(PermissionAssignment::from).collect())
    }

    async fn list_all(&self) -> AppResult<Vec<PermissionAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, tenant_id, subject, permission_id
            FROM permission_assignments
            ORDER BY tenant_id, subject
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission assignments: {error}"))
        })?;

        Ok(rows.into_iter().map(PermissionAssignment::from).collect())
    }
}
