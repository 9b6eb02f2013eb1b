use std::fmt::{Display, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use sondeo_core::{AppError, AppResult, RoleTier, TenantId, UserIdentity};
use sondeo_domain::{AuditAction, PermissionId};
use uuid::Uuid;

use crate::{AuditEvent, AuditRepository, AuthorizationService, UserDirectory};

/// Stable identifier of a direct permission assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    /// Creates a random assignment identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an assignment identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AssignmentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A tenant-scoped grant of one permission directly to one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionAssignment {
    /// Stable assignment identifier.
    pub id: AssignmentId,
    /// Subject holding the grant.
    pub subject: String,
    /// Granted catalog permission.
    pub permission_id: PermissionId,
    /// Tenant the grant applies in.
    pub tenant_id: TenantId,
}

/// Input payload for granting a permission directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantPermissionInput {
    /// Target subject.
    pub subject: String,
    /// Catalog permission id to grant.
    pub permission_id: PermissionId,
    /// Tenant declared by the request payload, if any.
    pub declared_tenant: Option<TenantId>,
}

/// Repository port for direct permission assignments.
///
/// The (subject, permission, tenant) triple carries a true uniqueness
/// constraint in storage.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Finds an assignment matching the exact triple.
    async fn find_triple(
        &self,
        tenant_id: TenantId,
        subject: &str,
        permission_id: PermissionId,
    ) -> AppResult<Option<PermissionAssignment>>;

    /// Finds an assignment by id.
    async fn find_by_id(&self, assignment_id: AssignmentId)
    -> AppResult<Option<PermissionAssignment>>;

    /// Persists a new assignment.
    async fn insert(&self, assignment: &PermissionAssignment) -> AppResult<()>;

    /// Removes an assignment. No cascading side effects.
    async fn delete(&self, assignment_id: AssignmentId) -> AppResult<()>;

    /// Lists assignments in one tenant.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionAssignment>>;

    /// Lists assignments across all tenants.
    async fn list_all(&self) -> AppResult<Vec<PermissionAssignment>>;
}

/// Application service for direct permission grants.
#[derive(Clone)]
pub struct AssignmentService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn AssignmentRepository>,
    directory: Arc<dyn UserDirectory>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn AssignmentRepository>,
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

    /// Grants a permission directly to a principal.
    pub async fn grant(
        &self,
        actor: &UserIdentity,
        input: GrantPermissionInput,
    ) -> AppResult<PermissionAssignment> {
        let scope = self
            .authorize(actor, input.declared_tenant, "permission:assign")
            .await?;

        let definition = self
            .authorization_service
            .catalog()
            .resolve_id(input.permission_id)
            .ok_or_else(|| AppError::NotFound("Permission not found".to_owned()))?;

        let target = self
            .directory
            .find_user(input.subject.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

        let target_tenant = target.tenant_id.ok_or_else(|| {
            AppError::Forbidden("Access denied: No tenant associated with this user".to_owned())
        })?;

        if scope.is_some_and(|tenant_id| tenant_id != target_tenant) {
            return Err(AppError::Forbidden(
                "Access denied: Invalid tenant".to_owned(),
            ));
        }

        let existing = self
            .repository
            .find_triple(target_tenant, target.subject.as_str(), definition.id)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "Permission already assigned to this user".to_owned(),
            ));
        }

        let assignment = PermissionAssignment {
            id: AssignmentId::new(),
            subject: target.subject,
            permission_id: definition.id,
            tenant_id: target_tenant,
        };
        self.repository.insert(&assignment).await?;

        self.append_grant_event(
            actor,
            &assignment,
            AuditAction::PermissionGranted,
            format!(
                "granted permission '{}' to '{}'",
                definition.name, assignment.subject
            ),
        )
        .await?;

        Ok(assignment)
    }

    /// Revokes a direct grant by id. A tenant mismatch is reported as
    /// Forbidden, distinct from a missing assignment.
    pub async fn revoke(
        &self,
        actor: &UserIdentity,
        assignment_id: AssignmentId,
        declared_tenant: Option<TenantId>,
    ) -> AppResult<()> {
        let scope = self
            .authorize(actor, declared_tenant, "permission:remove")
            .await?;

        let assignment = self
            .repository
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Permission assignment not found".to_owned()))?;

        if scope.is_some_and(|tenant_id| tenant_id != assignment.tenant_id) {
            return Err(AppError::Forbidden(
                "Access denied: Invalid tenant".to_owned(),
            ));
        }

        self.repository.delete(assignment.id).await?;

        self.append_grant_event(
            actor,
            &assignment,
            AuditAction::PermissionRevoked,
            format!("revoked permission grant from '{}'", assignment.subject),
        )
        .await
    }

    /// Lists grants visible to the actor: all tenants for top-tier admins,
    /// the resolved tenant for everyone else.
    pub async fn list(
        &self,
        actor: &UserIdentity,
        declared_tenant: Option<TenantId>,
    ) -> AppResult<Vec<PermissionAssignment>> {
        let scope = self
            .authorize(actor, declared_tenant, "permission:read")
            .await?;

        match scope {
            Some(tenant_id) => self.repository.list_by_tenant(tenant_id).await,
            None => self.repository.list_all().await,
        }
    }

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

    async fn append_grant_event(
        &self,
        actor: &UserIdentity,
        assignment: &PermissionAssignment,
        action: AuditAction,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: assignment.tenant_id,
                subject: actor.subject().to_owned(),
                action,
                resource_type: "permission_assignment".to_owned(),
                resource_id: assignment.id.to_string(),
                detail: Some(detail),
            })
            .await
    }
}
