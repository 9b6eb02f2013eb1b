use std::sync::Arc;

use async_trait::async_trait;
use sondeo_core::{AppError, AppResult, RoleTier, TenantId, UserIdentity};
use sondeo_domain::{AuditAction, CustomRole, PermissionGrant, PermissionId, RoleId};

use crate::{AuditEvent, AuditRepository, AuthorizationService, UserDirectory};


/// Input payload for creating a custom role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name, unique per (tenant, permission signature).
    pub name: String,
    /// Role description.
    pub description: String,
    /// Catalog permission ids to attach.
    pub permission_ids: Vec<PermissionId>,
    /// Tenant declared by the request payload, if any.
    pub declared_tenant: Option<TenantId>,
}

/// Patch payload for updating a custom role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateRoleInput {
    /// Replacement name, when supplied.
    pub name: Option<String>,
    /// Replacement description, when supplied.
    pub description: Option<String>,
    /// Replacement permission set, when supplied.
    pub permission_ids: Option<Vec<PermissionId>>,
    /// Tenant declared by the request payload, if any.
    pub declared_tenant: Option<TenantId>,
}

/// Role projection returned by listings, with the derived member count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSummary {
    /// The role aggregate.
    pub role: CustomRole,
    /// Number of distinct members holding the role.
    pub member_count: u64,
}

/// Repository port for role persistence and the role/member relation.
///
/// Membership is one relation looked up from either side; there are no
/// mirrored per-aggregate lists to keep in sync.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by id.
    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<CustomRole>>;

    /// Finds a role in the tenant sharing both name and permission
    /// signature, excluding `excluding` when supplied.
    async fn find_duplicate(
        &self,
        tenant_id: TenantId,
        name: &str,
        signature: &str,
        excluding: Option<RoleId>,
    ) -> AppResult<Option<RoleId>>;

    /// Persists a new role.
    async fn insert(&self, role: &CustomRole) -> AppResult<()>;

    /// Persists role mutations, including the recomputed signature.
    async fn update(&self, role: &CustomRole) -> AppResult<()>;

    /// Removes a role row. Members must already be detached.
    async fn delete(&self, role_id: RoleId) -> AppResult<()>;

    /// Lists roles in one tenant.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>>;

    /// Lists roles across all tenants.
    async fn list_all(&self) -> AppResult<Vec<CustomRole>>;

    /// Adds a member to a role. Idempotent.
    async fn add_member(&self, role_id: RoleId, subject: &str) -> AppResult<()>;

    /// Removes a member from a role. Returns whether a row was removed.
    async fn remove_member(&self, role_id: RoleId, subject: &str) -> AppResult<bool>;

    /// Detaches every member from a role.
    async fn remove_all_members(&self, role_id: RoleId) -> AppResult<()>;

    /// Lists the subjects holding a role.
    async fn list_members(&self, role_id: RoleId) -> AppResult<Vec<String>>;

    /// Counts distinct members holding a role.
    async fn member_count(&self, role_id: RoleId) -> AppResult<u64>;
}

/// Application service for custom role administration.
#[derive(Clone)]
pub struct RoleService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn RoleRepository>,
    directory: Arc<dyn UserDirectory>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn RoleRepository>,
        directory: Arc<dyn UserDirectory>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            directory,
            audit_repository,
        }
    }

    /// Creates a custom role after validating permissions and the duplicate
    /// (tenant, name, signature) invariant, then emits an audit event.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateRoleInput,
    ) -> AppResult<RoleSummary> {
        let scope = self
            .authorize(actor, input.declared_tenant, "role:create")
            .await?;
        let tenant_id = match scope {
            Some(tenant_id) => tenant_id,
            // Top-tier admins create roles for the tenant the payload names.
            None => input
                .declared_tenant
                .or_else(|| actor.tenant_id())
                .ok_or_else(|| {
                    AppError::Validation("a tenant must be specified for the role".to_owned())
                })?,
        };

        let grants = self.resolve_grants(&input.permission_ids)?;
        let role = CustomRole::new(
            tenant_id,
            input.name,
            input.description,
            grants,
            actor.subject(),
        )?;

        // The duplicate check must complete before anything is persisted.
        self.ensure_no_duplicate(&role, None).await?;
        self.repository.insert(&role).await?;

        self.append_role_event(
            actor,
            &role,
            AuditAction::RoleCreated,
            format!("created role '{}'", role.name()),
        )
        .await?;

        Ok(RoleSummary {
            member_count: 0,
            role,
        })
    }

    /// Applies a patch to a role. The permission signature is recomputed
    /// before every persist.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        patch: UpdateRoleInput,
    ) -> AppResult<RoleSummary> {
        let scope = self
            .authorize(actor, patch.declared_tenant, "role:update")
            .await?;
        let mut role = self.load_scoped_role(role_id, scope).await?;

        if let Some(name) = patch.name {
            role.rename(name)?;
        }
        if let Some(description) = patch.description {
            role.set_description(description);
        }
        if let Some(permission_ids) = patch.permission_ids {
            let grants = self.resolve_grants(&permission_ids)?;
            role.replace_permissions(grants)?;
        }

        self.ensure_no_duplicate(&role, Some(role.id())).await?;
        self.repository.update(&role).await?;

        self.append_role_event(
            actor,
            &role,
            AuditAction::RoleUpdated,
            format!("updated role '{}'", role.name()),
        )
        .await?;

        let member_count = self.repository.member_count(role.id()).await?;
        Ok(RoleSummary { role, member_count })
    }

    /// Deletes a role, detaching it from every member first so no dangling
    /// references survive the removal.
    pub async fn delete_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        declared_tenant: Option<TenantId>,
    ) -> AppResult<()> {
        let scope = self.authorize(actor, declared_tenant, "role:delete").await?;
        let role = self.load_scoped_role(role_id, scope).await?;

        // Detach before delete; the order matters.
        self.repository.remove_all_members(role.id()).await?;
        self.repository.delete(role.id()).await?;

        self.append_role_event(
            actor,
            &role,
            AuditAction::RoleDeleted,
            format!("deleted role '{}'", role.name()),
        )
        .await
    }

    /// Assigns a role to a member-tier principal. Idempotent.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        subject: &str,
        declared_tenant: Option<TenantId>,
    ) -> AppResult<()> {
        let scope = self.authorize(actor, declared_tenant, "role:assign").await?;
        let role = self.load_scoped_role(role_id, scope).await?;
        self.ensure_assignable_target(&role, subject).await?;

        self.repository.add_member(role.id(), subject).await?;

        self.append_role_event(
            actor,
            &role,
            AuditAction::RoleAssigned,
            format!("assigned role '{}' to '{subject}'", role.name()),
        )
        .await
    }

    /// Removes a role from a principal.
    pub async fn unassign_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        subject: &str,
        declared_tenant: Option<TenantId>,
    ) -> AppResult<()> {
        let scope = self.authorize(actor, declared_tenant, "role:remove").await?;
        let role = self.load_scoped_role(role_id, scope).await?;

        let removed = self.repository.remove_member(role.id(), subject).await?;
        if !removed {
            return Err(AppError::NotFound("Role assignment not found".to_owned()));
        }

        self.append_role_event(
            actor,
            &role,
            AuditAction::RoleUnassigned,
            format!("removed role '{}' from '{subject}'", role.name()),
        )
        .await
    }

    /// Lists roles visible to the actor: all tenants for top-tier admins,
    /// the resolved tenant for everyone else.
    pub async fn list_roles(
        &self,
        actor: &UserIdentity,
        declared_tenant: Option<TenantId>,
    ) -> AppResult<Vec<RoleSummary>> {
        let scope = self.authorize(actor, declared_tenant, "role:read").await?;
        let roles = match scope {
            Some(tenant_id) => self.repository.list_by_tenant(tenant_id).await?,
            None => self.repository.list_all().await?,
        };

        let mut summaries = Vec::with_capacity(roles.len());
        for role in roles {
            let member_count = self.repository.member_count(role.id()).await?;
            summaries.push(RoleSummary { role, member_count });
        }

        Ok(summaries)
    }

    /// Lists the subjects holding a role.
    pub async fn list_role_members(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        declared_tenant: Option<TenantId>,
    ) -> AppResult<Vec<String>> {
        let scope = self.authorize(actor, declared_tenant, "role:read").await?;
        let role = self.load_scoped_role(role_id, scope).await?;

        self.repository.list_members(role.id()).await
    }

    /// Gate shared by every operation: top-tier admins bypass tenant-match
    /// and fine-grained checks (`None` scope); everyone else is scoped to
    /// their resolved tenant, with member-tier actors additionally holding
    /// the named permission.
    async fn authorize(
        &self,
        actor: &UserIdentity,
        declared_tenant: Option<TenantId>,
        permission_name: &str,
    ) -> AppResult<Option<TenantId>> {
        if actor.tier() == RoleTier::Admin {
            return Ok(None);
        }

        self.authorization_service
            .require_permission(actor, declared_tenant, permission_name)
            .await?;

        crate::tenant_context::resolve_tenant(actor, declared_tenant).map(Some)
    }

    async fn load_scoped_role(
        &self,
        role_id: RoleId,
        scope: Option<TenantId>,
    ) -> AppResult<CustomRole> {
        let role = self
            .repository
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".to_owned()))?;

        if scope.is_some_and(|tenant_id| tenant_id != role.tenant_id()) {
            return Err(AppError::Forbidden(
                "Access denied: Invalid tenant".to_owned(),
            ));
        }

        Ok(role)
    }

    fn resolve_grants(&self, permission_ids: &[PermissionId]) -> AppResult<Vec<PermissionGrant>> {
        let catalog = self.authorization_service.catalog();
        permission_ids
            .iter()
            .map(|id| {
                catalog
                    .resolve_id(*id)
                    .map(|definition| PermissionGrant {
                        id: definition.id,
                        name: definition.name.clone(),
                    })
                    .ok_or_else(|| {
                        AppError::Validation("Invalid permissions provided".to_owned())
                    })
            })
            .collect()
    }

    async fn ensure_no_duplicate(
        &self,
        role: &CustomRole,
        excluding: Option<RoleId>,
    ) -> AppResult<()> {
        let duplicate = self
            .repository
            .find_duplicate(
                role.tenant_id(),
                role.name(),
                role.permissions_signature(),
                excluding,
            )
            .await?;

        if duplicate.is_some() {
            return Err(AppError::Conflict(
                "Role with same name and permissions already exists".to_owned(),
            ));
        }

        Ok(())
    }

    async fn ensure_assignable_target(&self, role: &CustomRole, subject: &str) -> AppResult<()> {
        let target = self
            .directory
            .find_user(subject)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

        // Roles refine member-tier access only.
        if target.tier != RoleTier::Member {
            return Err(AppError::Validation(
                "Roles can only be assigned to member-tier users".to_owned(),
            ));
        }

        if target.tenant_id != Some(role.tenant_id()) {
            return Err(AppError::Forbidden(
                "Access denied: Invalid tenant".to_owned(),
            ));
        }

        Ok(())
    }

    async fn append_role_event(
        &self,
        actor: &UserIdentity,
        role: &CustomRole,
        action: AuditAction,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: role.tenant_id(),
                subject: actor.subject().to_owned(),
                action,
                resource_type: "custom_role".to_owned(),
                resource_id: role.id().to_string(),
                detail: Some(detail),
            })
            .await
    }
}
