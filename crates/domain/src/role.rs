use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sondeo_core::{AppError, AppResult, NonEmptyString, TenantId};
use uuid::Uuid;

use crate::security::{PermissionId, PermissionName};

/// Stable identifier of a custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A permission reference carried by a role, denormalized with the catalog
/// name for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Catalog permission id.
    pub id: PermissionId,
    /// Cached permission name at grant time.
    pub name: PermissionName,
}

/// A permission grant reached through a role membership, carrying the
/// role's lifecycle flags so callers can drop grants from roles that no
/// longer take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDerivedGrant {
    /// The grant itself.
    pub grant: PermissionGrant,
    /// Whether the carrying role is active.
    pub role_is_active: bool,
    /// Whether the carrying role is soft-deleted.
    pub role_deleted: bool,
}

impl RoleDerivedGrant {
    /// Whether the carrying role still takes effect.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.role_is_active && !self.role_deleted
    }
}

/// Computes the deterministic signature of a permission-id set.
///
/// The ids are deduplicated and sorted before hashing so that any two sets
/// that are equal as sets produce the same signature regardless of input
/// order. The sort step is what makes duplicate-role detection work; do not
/// remove it.
#[must_use]
pub fn permissions_signature(permission_ids: &[PermissionId]) -> String {
    let mut sorted: Vec<PermissionId> = permission_ids.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut hasher = Sha256::new();
    for id in sorted {
        hasher.update(id.as_uuid().as_bytes());
    }

    let digest = hasher.finalize();
    digest.iter().fold(
        String::with_capacity(digest.len() * 2),
        |mut output, byte| {
            use std::fmt::Write;
            let _ = write!(output, "{byte:02x}");
            output
        },
    )
}

/// A tenant-scoped named bundle of permissions assignable to member-tier
/// principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRole {
    id: RoleId,
    tenant_id: TenantId,
    name: NonEmptyString,
    description: String,
    permissions: Vec<PermissionGrant>,
    permissions_signature: String,
    created_by: String,
    is_active: bool,
    deleted: bool,
}

impl CustomRole {
    /// Creates a validated role with a freshly computed signature.
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: Vec<PermissionGrant>,
        created_by: impl Into<String>,
    ) -> AppResult<Self> {
        if permissions.is_empty() {
            return Err(AppError::Validation(
                "a role must carry at least one permission".to_owned(),
            ));
        }

        let signature = signature_of(&permissions);
        Ok(Self {
            id: RoleId::new(),
            tenant_id,
            name: NonEmptyString::new(name)?,
            description: description.into(),
            permissions,
            permissions_signature: signature,
            created_by: created_by.into(),
            is_active: true,
            deleted: false,
        })
    }

    /// Rehydrates a role from persisted state without recomputing anything.
    #[must_use]
    pub fn from_parts(
        id: RoleId,
        tenant_id: TenantId,
        name: NonEmptyString,
        description: String,
        permissions: Vec<PermissionGrant>,
        permissions_signature: String,
        created_by: String,
        is_active: bool,
        deleted: bool,
    ) -> Self {
        Self {
            id,
            tenant_id,
            name,
            description,
            permissions,
            permissions_signature,
            created_by,
            is_active,
            deleted,
        }
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the role description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the attached permission grants.
    #[must_use]
    pub fn permissions(&self) -> &[PermissionGrant] {
        self.permissions.as_slice()
    }

    /// Returns the current permission signature.
    #[must_use]
    pub fn permissions_signature(&self) -> &str {
        self.permissions_signature.as_str()
    }

    /// Returns the creator subject.
    #[must_use]
    pub fn created_by(&self) -> &str {
        self.created_by.as_str()
    }

    /// Returns whether the role participates in authorization.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.is_active && !self.deleted
    }

    /// Renames the role.
    pub fn rename(&mut self, name: impl Into<String>) -> AppResult<()> {
        self.name = NonEmptyString::new(name)?;
        Ok(())
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Replaces the permission set and recomputes the signature.
    ///
    /// The signature is recomputed on every save regardless of which field
    /// changed; callers route all permission edits through here.
    pub fn replace_permissions(&mut self, permissions: Vec<PermissionGrant>) -> AppResult<()> {
        if permissions.is_empty() {
            return Err(AppError::Validation(
                "a role must carry at least one permission".to_owned(),
            ));
        }

        self.permissions_signature = signature_of(&permissions);
        self.permissions = permissions;
        Ok(())
    }
}

fn signature_of(permissions: &[PermissionGrant]) -> String {
    let ids: Vec<PermissionId> = permissions.iter().map(|grant| grant.id).collect();
    permissions_signature(&ids)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sondeo_core::TenantId;
    use uuid::Uuid;

    use crate::security::{PermissionId, PermissionName};

    use super::{CustomRole, PermissionGrant, permissions_signature};

    fn grant(name: &str) -> PermissionGrant {
        PermissionGrant {
            id: PermissionId::new(),
            name: PermissionName::new(name)
                .unwrap_or_else(|_| panic!("test permission name '{name}' must be valid")),
        }
    }

    #[test]
    fn signature_ignores_input_order_and_duplicates() {
        let first = PermissionId::new();
        let second = PermissionId::new();

        let forward = permissions_signature(&[first, second]);
        let backward = permissions_signature(&[second, first]);
        let repeated = permissions_signature(&[first, second, first]);

        assert_eq!(forward, backward);
        assert_eq!(forward, repeated);
    }

    #[test]
    fn signature_differs_for_different_sets() {
        let shared = PermissionId::new();
        let left = permissions_signature(&[shared, PermissionId::new()]);
        let right = permissions_signature(&[shared, PermissionId::new()]);

        assert_ne!(left, right);
    }

    #[test]
    fn role_requires_at_least_one_permission() {
        let result = CustomRole::new(TenantId::new(), "Support Lead", "", Vec::new(), "alice");
        assert!(result.is_err());
    }

    #[test]
    fn replacing_permissions_recomputes_signature() {
        let role = CustomRole::new(
            TenantId::new(),
            "Support Lead",
            "",
            vec![grant("ticket:read")],
            "alice",
        );
        assert!(role.is_ok());
        let Ok(mut role) = role else {
            return;
        };

        let before = role.permissions_signature().to_owned();
        let replaced = role.replace_permissions(vec![grant("ticket:read"), grant("ticket:update")]);
        assert!(replaced.is_ok());
        assert_ne!(role.permissions_signature(), before);
    }

    proptest! {
        #[test]
        fn signature_is_permutation_invariant(raw in proptest::collection::vec(any::<u128>(), 1..8)) {
            let ids: Vec<PermissionId> = raw
                .iter()
                .map(|value| PermissionId::from_uuid(Uuid::from_u128(*value)))
                .collect();

            let mut reversed = ids.clone();
            reversed.reverse();

            prop_assert_eq!(permissions_signature(&ids), permissions_signature(&reversed));
        }
    }
}
