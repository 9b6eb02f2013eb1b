use sqlx::{FromRow, PgPool};
use tracing::info;

use sondeo_core::{AppError, AppResult};
use sondeo_domain::{PermissionCatalog, PermissionDefinition, PermissionId, PermissionName};

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: uuid::Uuid,
    name: String,
    description: String,
    group_label: Option<String>,
}

/// Upserts the seed permission definitions.
///
/// Permissions are never deleted here; existing rows keep their ids so
/// role and assignment references stay valid across deploys.
pub async fn seed_permission_catalog(pool: &PgPool) -> AppResult<()> {
    let seed = PermissionCatalog::seed_definitions();
    for (name, description, group_label) in &seed {
        sqlx::query(
            r#"
            INSERT INTO permissions (id, name, description, group_label)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
            SET description = EXCLUDED.description,
                group_label = EXCLUDED.group_label
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(group_label)
        .execute(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to seed permissions: {error}")))?;
    }

    info!(count = seed.len(), "permission catalog seeded");
    Ok(())
}

/// Loads the full permission catalog into memory for O(1) resolution.
pub async fn load_permission_catalog(pool: &PgPool) -> AppResult<PermissionCatalog> {
    let rows = sqlx::query_as::<_, PermissionRow>(
        r#"
        SELECT id, name, description, group_label
        FROM permissions
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

    let definitions = rows
        .into_iter()
        .map(|row| {
            Ok(PermissionDefinition {
                id: PermissionId::from_uuid(row.id),
                name: PermissionName::new(row.name)?,
                description: row.description,
                group: row.group_label,
            })
        })
        .collect::<AppResult<Vec<PermissionDefinition>>>()?;

    PermissionCatalog::new(definitions)
}
