use sondeo_core::{AppError, AppResult, RoleTier, TenantId, UserIdentity};

/// Resolves the effective tenant for an authenticated identity.
///
/// Every tenant-scoped operation passes through here before touching
/// persistence. A request payload may declare an explicit tenant; a
/// `CompanyAdmin` declaring a tenant other than their own is rejected, which
/// blocks spoofing another tenant in a request body. Top-tier admins are
/// validated by their callers instead, since they operate across tenants.
pub fn resolve_tenant(
    identity: &UserIdentity,
    declared: Option<TenantId>,
) -> AppResult<TenantId> {
    let tenant_id = identity.tenant_id().ok_or_else(|| {
        AppError::Forbidden("Access denied: No tenant associated with this user".to_owned())
    })?;

    if identity.tier() == RoleTier::CompanyAdmin
        && declared.is_some_and(|declared| declared != tenant_id)
    {
        return Err(AppError::Forbidden(
            "Access denied: Invalid tenant".to_owned(),
        ));
    }

    Ok(tenant_id)
}

#[cfg(test)]
mod tests {
    use sondeo_core::{AppError, RoleTier, TenantId, UserIdentity};

    use super::resolve_tenant;

    fn identity(tier: RoleTier, tenant_id: Option<TenantId>) -> UserIdentity {
        UserIdentity::new("alice", "Alice", None, tier, tenant_id)
    }

    #[test]
    fn resolves_the_identity_tenant() {
        let tenant_id = TenantId::new();
        let resolved = resolve_tenant(&identity(RoleTier::Member, Some(tenant_id)), None);
        assert_eq!(resolved.ok(), Some(tenant_id));
    }

    #[test]
    fn missing_tenant_is_denied() {
        let result = resolve_tenant(&identity(RoleTier::Member, None), None);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn company_admin_cannot_declare_a_foreign_tenant() {
        let tenant_id = TenantId::new();
        let result = resolve_tenant(
            &identity(RoleTier::CompanyAdmin, Some(tenant_id)),
            Some(TenantId::new()),
        );
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn company_admin_may_declare_their_own_tenant() {
        let tenant_id = TenantId::new();
        let resolved = resolve_tenant(
            &identity(RoleTier::CompanyAdmin, Some(tenant_id)),
            Some(tenant_id),
        );
        assert_eq!(resolved.ok(), Some(tenant_id));
    }

    #[test]
    fn member_declared_tenant_is_ignored() {
        let tenant_id = TenantId::new();
        let resolved = resolve_tenant(
            &identity(RoleTier::Member, Some(tenant_id)),
            Some(TenantId::new()),
        );
        assert_eq!(resolved.ok(), Some(tenant_id));
    }
}
