use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use sondeo_application::AuthorizationRepository;
use sondeo_core::{AppError, AppResult, TenantId};
use sondeo_domain::{PermissionGrant, PermissionId, PermissionName, RoleDerivedGrant};

/// PostgreSQL-backed repository for permission lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    permission_id: uuid::Uuid,
    permission_name: String,
    role_is_active: bool,
    role_deleted: bool,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_role_permissions_for_subject(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Vec<RoleDerivedGrant>> {
        // Lifecycle filtering happens in the authorization service.
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT DISTINCT
                role_permissions.permission_id,
                role_permissions.permission_name,
                roles.is_active AS role_is_active,
                roles.deleted AS role_deleted
            FROM role_memberships AS memberships
            INNER JOIN custom_roles AS roles
                ON roles.id = memberships.role_id
            INNER JOIN role_permissions
                ON role_permissions.role_id = roles.id
            WHERE memberships.tenant_id = $1
                AND memberships.subject = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role permissions: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(RoleDerivedGrant {
                    grant: PermissionGrant {
                        id: PermissionId::from_uuid(row.permission_id),
                        name: PermissionName::new(row.permission_name)?,
                    },
                    role_is_active: row.role_is_active,
                    role_deleted: row.role_deleted,
                })
            })
            .collect()
    }

    async fn direct_assignment_exists(
        &self,
        tenant_id: TenantId,
        subject: &str,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM permission_assignments
            WHERE tenant_id = $1
                AND subject = $2
                AND permission_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .bind(permission_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to check direct assignment: {error}"))
        })?;

        Ok(count > 0)
    }
}
