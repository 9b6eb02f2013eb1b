use std::sync::Arc;

use async_trait::async_trait;
use sondeo_core::{AppError, AppResult, RoleTier, TenantId, UserIdentity};
use sondeo_domain::{PermissionCatalog, PermissionId, RoleDerivedGrant};

/// Outcome of one decider in the authorization chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The decider grants access; later deciders are not consulted.
    Allow,
    /// The decider refuses access; later deciders are not consulted.
    Deny,
    /// The decider has no opinion; evaluation continues.
    Abstain,
}

/// Repository port for permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists the permission grants attached to the subject's roles in the
    /// tenant, with each role's lifecycle flags. Grants from inactive or
    /// soft-deleted roles are filtered by the caller, not here.
    async fn list_role_permissions_for_subject(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Vec<RoleDerivedGrant>>;

    /// Returns whether a direct assignment exists for the triple.
    async fn direct_assignment_exists(
        &self,
        tenant_id: TenantId,
        subject: &str,
        permission_id: PermissionId,
    ) -> AppResult<bool>;
}

/// Directory record of a known principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Stable subject identifier.
    pub subject: String,
    /// Coarse role tier.
    pub tier: RoleTier,
    /// Tenant the principal belongs to, if any.
    pub tenant_id: Option<TenantId>,
}

/// Lookup port for principals referenced by grants and assignments.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a principal by subject.
    async fn find_user(&self, subject: &str) -> AppResult<Option<UserRecord>>;
}

/// Application service deciding allow/deny for permission checks.
///
/// Authorization is an ordered chain: the coarse-tier decider runs first and
/// short-circuits for administrative tiers; the fine-grained decider then
/// unions role-derived and directly-assigned permissions for everyone else.
/// The precedence is deliberate and load-bearing.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    catalog: Arc<PermissionCatalog>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>, catalog: Arc<PermissionCatalog>) -> Self {
        Self { repository, catalog }
    }

    /// Returns the permission catalog shared by this service.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        self.catalog.as_ref()
    }

    /// Ensures the identity may perform the named permission.
    ///
    /// `declared_tenant` is the tenant a request payload claims to act on,
    /// if it claims one. Even after a grant, a `CompanyAdmin` declaring a
    /// tenant other than their own is denied.
    pub async fn require_permission(
        &self,
        identity: &UserIdentity,
        declared_tenant: Option<TenantId>,
        permission_name: &str,
    ) -> AppResult<()> {
        let decision = match Self::tier_decision(identity.tier()) {
            AccessDecision::Abstain => self.fine_grained_decision(identity, permission_name).await?,
            decided => decided,
        };

        if decision == AccessDecision::Deny {
            return Err(AppError::Forbidden(
                "Permission denied: Insufficient permissions".to_owned(),
            ));
        }

        // Tenant-boundary recheck runs even when permission was granted.
        if identity.tier() == RoleTier::CompanyAdmin {
            crate::tenant_context::resolve_tenant(identity, declared_tenant)?;
        }

        Ok(())
    }

    /// Returns whether the permission name appears in the union of the
    /// identity's role-derived and directly-assigned permissions.
    ///
    /// This is the raw union; the coarse-tier short-circuit belongs to
    /// [`Self::require_permission`].
    pub async fn has_permission(
        &self,
        identity: &UserIdentity,
        permission_name: &str,
    ) -> AppResult<bool> {
        // No tenant means no roles and no assignments; the union is empty.
        if identity.tenant_id().is_none() {
            return Ok(false);
        }

        match self.fine_grained_decision(identity, permission_name).await? {
            AccessDecision::Allow => Ok(true),
            AccessDecision::Deny | AccessDecision::Abstain => Ok(false),
        }
    }

    /// Coarse-tier decider. Administrative tiers are allowed outright;
    /// fine-grained permissions are primarily a member-tier concern.
    #[must_use]
    pub fn tier_decision(tier: RoleTier) -> AccessDecision {
        match tier {
            RoleTier::Admin | RoleTier::CompanyAdmin => AccessDecision::Allow,
            RoleTier::Member | RoleTier::User => AccessDecision::Abstain,
        }
    }

    async fn fine_grained_decision(
        &self,
        identity: &UserIdentity,
        permission_name: &str,
    ) -> AppResult<AccessDecision> {
        // The permission must exist to be grantable; fail closed otherwise.
        let definition = self
            .catalog
            .resolve_name(permission_name)
            .ok_or_else(|| AppError::NotFound("Permission not found".to_owned()))?;

        let tenant_id = identity.tenant_id().ok_or_else(|| {
            AppError::Forbidden("Access denied: No tenant associated with this user".to_owned())
        })?;

        let role_permissions = self
            .repository
            .list_role_permissions_for_subject(tenant_id, identity.subject())
            .await?;

        if role_permissions
            .iter()
            .filter(|derived| derived.is_effective())
            .any(|derived| derived.grant.name.as_str() == permission_name)
        {
            return Ok(AccessDecision::Allow);
        }

        let directly_granted = self
            .repository
            .direct_assignment_exists(tenant_id, identity.subject(), definition.id)
            .await?;

        Ok(if directly_granted {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    use async_trait::async_trait;
    use sondeo_core::{AppError, AppResult, RoleTier, TenantId, UserIdentity};
    use sondeo_domain::{
        PermissionCatalog, PermissionDefinition, PermissionGrant, PermissionId, PermissionName,
        RoleDerivedGrant,
    };

    use super::{AccessDecision, AuthorizationRepository, AuthorizationService};

    #[derive(Default)]
    struct FakeAuthorizationRepository {
        role_grants: HashMap<(TenantId, String), Vec<RoleDerivedGrant>>,
        direct_grants: HashSet<(TenantId, String, PermissionId)>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_role_permissions_for_subject(
            &self,
            tenant_id: TenantId,
            subject: &str,
        ) -> AppResult<Vec<RoleDerivedGrant>> {
            Ok(self
                .role_grants
                .get(&(tenant_id, subject.to_owned()))
                .cloned()
                .unwrap_or_default())
        }

        async fn direct_assignment_exists(
            &self,
            tenant_id: TenantId,
            subject: &str,
            permission_id: PermissionId,
        ) -> AppResult<bool> {
            Ok(self
                .direct_grants
                .contains(&(tenant_id, subject.to_owned(), permission_id)))
        }
    }

    fn permission_name(value: &str) -> PermissionName {
        PermissionName::new(value)
            .unwrap_or_else(|_| panic!("test permission name '{value}' must be valid"))
    }

    fn catalog_with(names: &[&str]) -> (Arc<PermissionCatalog>, HashMap<String, PermissionId>) {
        let definitions: Vec<PermissionDefinition> = names
            .iter()
            .map(|name| PermissionDefinition {
                id: PermissionId::new(),
                name: permission_name(name),
                description: String::new(),
                group: None,
            })
            .collect();
        let ids = definitions
            .iter()
            .map(|definition| (definition.name.as_str().to_owned(), definition.id))
            .collect();
        let catalog = PermissionCatalog::new(definitions).unwrap_or_default();
        (Arc::new(catalog), ids)
    }

    fn identity(tier: RoleTier, tenant_id: TenantId) -> UserIdentity {
        UserIdentity::new("alice", "Alice", None, tier, Some(tenant_id))
    }

    fn derived_grant(
        id: PermissionId,
        name: &str,
        role_is_active: bool,
        role_deleted: bool,
    ) -> RoleDerivedGrant {
        RoleDerivedGrant {
            grant: PermissionGrant {
                id,
                name: permission_name(name),
            },
            role_is_active,
            role_deleted,
        }
    }

    #[tokio::test]
    async fn role_derived_permission_is_granted() {
        let tenant_id = TenantId::new();
        let (catalog, ids) = catalog_with(&["ticket:read"]);
        let repository = FakeAuthorizationRepository {
            role_grants: HashMap::from([(
                (tenant_id, "alice".to_owned()),
                vec![derived_grant(ids["ticket:read"], "ticket:read", true, false)],
            )]),
            direct_grants: HashSet::new(),
        };
        let service = AuthorizationService::new(Arc::new(repository), catalog);

        let result = service
            .require_permission(&identity(RoleTier::Member, tenant_id), None, "ticket:read")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn grants_through_inactive_or_deleted_roles_do_not_count() {
        let tenant_id = TenantId::new();
        let (catalog, ids) = catalog_with(&["ticket:read", "ticket:update"]);
        let repository = FakeAuthorizationRepository {
            role_grants: HashMap::from([(
                (tenant_id, "alice".to_owned()),
                vec![
                    derived_grant(ids["ticket:read"], "ticket:read", false, false),
                    derived_grant(ids["ticket:update"], "ticket:update", true, true),
                ],
            )]),
            direct_grants: HashSet::new(),
        };
        let service = AuthorizationService::new(Arc::new(repository), catalog);
        let member = identity(RoleTier::Member, tenant_id);

        let result = service.require_permission(&member, None, "ticket:read").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let granted = service.has_permission(&member, "ticket:update").await;
        assert_eq!(granted.ok(), Some(false));
    }

    #[tokio::test]
    async fn direct_assignment_is_granted() {
        let tenant_id = TenantId::new();
        let (catalog, ids) = catalog_with(&["ticket:read"]);
        let repository = FakeAuthorizationRepository {
            role_grants: HashMap::new(),
            direct_grants: HashSet::from([(
                tenant_id,
                "alice".to_owned(),
                ids["ticket:read"],
            )]),
        };
        let service = AuthorizationService::new(Arc::new(repository), catalog);

        let granted = service
            .has_permission(&identity(RoleTier::Member, tenant_id), "ticket:read")
            .await;
        assert_eq!(granted.ok(), Some(true));
    }

    #[tokio::test]
    async fn missing_grant_is_denied() {
        let tenant_id = TenantId::new();
        let (catalog, _) = catalog_with(&["ticket:read"]);
        let service =
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository::default()), catalog);

        let result = service
            .require_permission(&identity(RoleTier::Member, tenant_id), None, "ticket:read")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn unknown_permission_fails_closed() {
        let tenant_id = TenantId::new();
        let (catalog, _) = catalog_with(&["ticket:read"]);
        let service =
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository::default()), catalog);

        let result = service
            .require_permission(
                &identity(RoleTier::Member, tenant_id),
                None,
                "ticket:escalate",
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn administrative_tiers_short_circuit() {
        let tenant_id = TenantId::new();
        let (catalog, _) = catalog_with(&["ticket:read"]);
        let service =
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository::default()), catalog);

        for tier in [RoleTier::Admin, RoleTier::CompanyAdmin] {
            let result = service
                .require_permission(&identity(tier, tenant_id), None, "ticket:read")
                .await;
            assert!(result.is_ok(), "tier {tier:?} must be allowed");
        }
    }

    #[tokio::test]
    async fn company_admin_declaring_foreign_tenant_is_denied_after_grant() {
        let tenant_id = TenantId::new();
        let (catalog, _) = catalog_with(&["ticket:read"]);
        let service =
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository::default()), catalog);

        let result = service
            .require_permission(
                &identity(RoleTier::CompanyAdmin, tenant_id),
                Some(TenantId::new()),
                "ticket:read",
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn has_permission_ignores_the_tier_short_circuit() {
        let tenant_id = TenantId::new();
        let (catalog, _) = catalog_with(&["ticket:read"]);
        let service =
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository::default()), catalog);

        let granted = service
            .has_permission(&identity(RoleTier::CompanyAdmin, tenant_id), "ticket:read")
            .await;
        assert_eq!(granted.ok(), Some(false));
    }

    #[tokio::test]
    async fn has_permission_is_false_without_a_tenant() {
        let (catalog, _) = catalog_with(&["ticket:read"]);
        let service =
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository::default()), catalog);
        let admin = UserIdentity::new("root", "Root", None, RoleTier::Admin, None);

        let granted = service.has_permission(&admin, "ticket:read").await;
        assert_eq!(granted.ok(), Some(false));
    }

    #[test]
    fn tier_decisions_are_ordered_before_fine_grained_checks() {
        assert_eq!(
            AuthorizationService::tier_decision(RoleTier::Admin),
            AccessDecision::Allow
        );
        assert_eq!(
            AuthorizationService::tier_decision(RoleTier::CompanyAdmin),
            AccessDecision::Allow
        );
        assert_eq!(
            AuthorizationService::tier_decision(RoleTier::Member),
            AccessDecision::Abstain
        );
        assert_eq!(
            AuthorizationService::tier_decision(RoleTier::User),
            AccessDecision::Abstain
        );
    }
}
