use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use sondeo_application::RoleRepository;
use sondeo_core::{AppError, AppResult, NonEmptyString, TenantId};
use sondeo_domain::{CustomRole, PermissionGrant, PermissionId, PermissionName, RoleId};

/// PostgreSQL-backed repository for custom roles and the role/member
/// relation.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_grants(&self, role_id: RoleId) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT permission_id, permission_name
            FROM role_permissions
            WHERE role_id = $1
            ORDER BY permission_name
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role grants: {error}")))?;

        rows.into_iter().map(GrantRow::into_grant).collect()
    }

    async fn replace_grants(
        transaction: &mut Transaction<'_, Postgres>,
        role: &CustomRole,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role.id().as_uuid())
            .execute(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear role grants: {error}"))
            })?;

        for grant in role.permissions() {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id, permission_name)
                VALUES ($1, $2, $3)
                ON CONFLICT (role_id, permission_id) DO NOTHING
                "#,
            )
            .bind(role.id().as_uuid())
            .bind(grant.id.as_uuid())
            .bind(grant.name.as_str())
            .execute(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role grants: {error}"))
            })?;
        }

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    name: String,
    description: String,
    permissions_signature: String,
    created_by: String,
    is_active: bool,
    deleted: bool,
}

impl RoleRow {
    fn into_role(self, permissions: Vec<PermissionGrant>) -> AppResult<CustomRole> {
        Ok(CustomRole::from_parts(
            RoleId::from_uuid(self.id),
            TenantId::from_uuid(self.tenant_id),
            NonEmptyString::new(self.name)?,
            self.description,
            permissions,
            self.permissions_signature,
            self.created_by,
            self.is_active,
            self.deleted,
        ))
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    permission_id: uuid::Uuid,
    permission_name: String,
}

impl GrantRow {
    fn into_grant(self) -> AppResult<PermissionGrant> {
        Ok(PermissionGrant {
            id: PermissionId::from_uuid(self.permission_id),
            name: PermissionName::new(self.permission_name)?,
        })
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<CustomRole>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, permissions_signature,
                   created_by, is_active, deleted
            FROM custom_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let grants = self.load_grants(role_id).await?;
        row.into_role(grants).map(Some)
    }

    async fn find_duplicate(
        &self,
        tenant_id: TenantId,
        name: &str,
        signature: &str,
        excluding: Option<RoleId>,
    ) -> AppResult<Option<RoleId>> {
        let row = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM custom_roles
            WHERE tenant_id = $1
                AND name = $2
                AND permissions_signature = $3
                AND ($4::uuid IS NULL OR id <> $4)
            LIMIT 1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(name)
        .bind(signature)
        .bind(excluding.map(|role_id| role_id.as_uuid()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to check for duplicate role: {error}"))
        })?;

        Ok(row.map(RoleId::from_uuid))
    }

    async fn insert(&self, role: &CustomRole) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO custom_roles (
                id, tenant_id, name, description, permissions_signature,
                created_by, is_active, deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.tenant_id().as_uuid())
        .bind(role.name())
        .bind(role.description())
        .bind(role.permissions_signature())
        .bind(role.created_by())
        .bind(role.is_effective())
        .bind(false)
        .execute(&mut *transaction)
        .await
        .map_err(map_role_conflict)?;

        Self::replace_grants(&mut transaction, role).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn update(&self, role: &CustomRole) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE custom_roles
            SET name = $2,
                description = $3,
                permissions_signature = $4,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.description())
        .bind(role.permissions_signature())
        .execute(&mut *transaction)
        .await
        .map_err(map_role_conflict)?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound("Role not found".to_owned()));
        }

        Self::replace_grants(&mut transaction, role).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        sqlx::query("DELETE FROM custom_roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        Ok(())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, permissions_signature,
                   created_by, is_active, deleted
            FROM custom_roles
            WHERE tenant_id = $1 AND NOT deleted
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in rows {
            let grants = self.load_grants(RoleId::from_uuid(row.id)).await?;
            roles.push(row.into_role(grants)?);
        }

        Ok(roles)
    }

    async fn list_all(&self) -> AppResult<Vec<CustomRole>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, permissions_signature,
                   created_by, is_active, deleted
            FROM custom_roles
            WHERE NOT deleted
            ORDER BY tenant_id, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in rows {
            let grants = self.load_grants(RoleId::from_uuid(row.id)).await?;
            roles.push(row.into_role(grants)?);
        }

        Ok(roles)
    }

    async fn add_member(&self, role_id: RoleId, subject: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_memberships (role_id, tenant_id, subject)
            SELECT id, tenant_id, $2
            FROM custom_roles
            WHERE id = $1
            ON CONFLICT (role_id, subject) DO NOTHING
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(subject)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to add role member: {error}")))?;

        Ok(())
    }

    async fn remove_member(&self, role_id: RoleId, subject: &str) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM role_memberships
            WHERE role_id = $1 AND subject = $2
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(subject)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove role member: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn remove_all_members(&self, role_id: RoleId) -> AppResult<()> {
        sqlx::query("DELETE FROM role_memberships WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to detach role members: {error}"))
            })?;

        Ok(())
    }

    async fn list_members(&self, role_id: RoleId) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT subject
            FROM role_memberships
            WHERE role_id = $1
            ORDER BY subject
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role members: {error}")))
    }

    async fn member_count(&self, role_id: RoleId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT subject)
            FROM role_memberships
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count role members: {error}"))
        })?;

        Ok(count.max(0) as u64)
    }
}

fn map_role_conflict(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(
            "Role with same name and permissions already exists".to_owned(),
        );
    }

    AppError::Internal(format!("failed to persist role: {error}"))
}
