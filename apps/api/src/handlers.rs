pub mod health;
pub mod security;
pub mod surveys;

use sondeo_core::{AppError, AppResult, TenantId};
use uuid::Uuid;

fn parse_uuid(value: &str, label: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|error| AppError::Validation(format!("invalid {label}: {error}")))
}

fn parse_declared_tenant(value: Option<&str>) -> AppResult<Option<TenantId>> {
    value
        .map(|raw| parse_uuid(raw, "tenant id").map(TenantId::from_uuid))
        .transpose()
}
