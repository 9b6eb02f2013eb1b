use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use sondeo_application::{UserDirectory, UserRecord};
use sondeo_core::{AppError, AppResult, RoleTier, TenantId};

/// PostgreSQL-backed directory of known principals.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    subject: String,
    role_tier: String,
    tenant_id: Option<uuid::Uuid>,
}

impl UserRow {
    fn into_record(self) -> AppResult<UserRecord> {
        let tier = RoleTier::from_str(&self.role_tier).map_err(|_| {
            AppError::Internal(format!(
                "unknown role tier '{}' for subject {}",
                self.role_tier, self.subject
            ))
        })?;

        Ok(UserRecord {
            subject: self.subject,
            tier,
            tenant_id: self.tenant_id.map(TenantId::from_uuid),
        })
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user(&self, subject: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT subject, role_tier, tenant_id
            FROM tenant_users
            WHERE subject = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up user: {error}")))?;

        row.map(UserRow::into_record).transpose()
    }
}
