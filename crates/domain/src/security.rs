use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sondeo_core::{AppError, AppResult};
use uuid::Uuid;

/// Stable identifier of a catalog permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
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

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A validated `resource:action` capability name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionName(String);

impl PermissionName {
    /// Creates a validated permission name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let Some((resource, action)) = trimmed.split_once(':') else {
            return Err(AppError::Validation(format!(
                "permission name '{value}' must use the 'resource:action' format"
            )));
        };

        if resource.is_empty() || action.is_empty() {
            return Err(AppError::Validation(format!(
                "permission name '{value}' must name both a resource and an action"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for PermissionName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl Display for PermissionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A catalog entry describing one named capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// Stable permission identifier.
    pub id: PermissionId,
    /// Unique `resource:action` name.
    pub name: PermissionName,
    /// Human-readable description.
    pub description: String,
    /// Optional group label for display.
    pub group: Option<String>,
}

/// The global, tenant-independent set of permissions.
///
/// Loaded once at startup and read-only in the authorization hot path.
/// Resolution by name and by id is O(1).
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    by_name: HashMap<String, PermissionDefinition>,
    by_id: HashMap<PermissionId, PermissionDefinition>,
}

impl PermissionCatalog {
    /// Builds a catalog from loaded definitions.
    pub fn new(definitions: Vec<PermissionDefinition>) -> AppResult<Self> {
        let mut by_name = HashMap::with_capacity(definitions.len());
        let mut by_id = HashMap::with_capacity(definitions.len());

        for definition in definitions {
            if by_name
                .insert(definition.name.as_str().to_owned(), definition.clone())
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "duplicate permission name '{}' in catalog",
                    definition.name
                )));
            }

            let id = definition.id;
            if by_id.insert(id, definition).is_some() {
                return Err(AppError::Conflict(format!(
                    "duplicate permission id '{id}' in catalog"
                )));
            }
        }

        Ok(Self { by_name, by_id })
    }

    /// Resolves a permission definition by name.
    #[must_use]
    pub fn resolve_name(&self, name: &str) -> Option<&PermissionDefinition> {
        self.by_name.get(name)
    }

    /// Resolves a permission definition by id.
    #[must_use]
    pub fn resolve_id(&self, id: PermissionId) -> Option<&PermissionDefinition> {
        self.by_id.get(&id)
    }

    /// Returns whether every supplied id exists in the catalog.
    #[must_use]
    pub fn contains_all(&self, ids: &[PermissionId]) -> bool {
        ids.iter().all(|id| self.by_id.contains_key(id))
    }

    /// Returns all catalog entries sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<PermissionDefinition> {
        let mut definitions: Vec<PermissionDefinition> = self.by_name.values().cloned().collect();
        definitions.sort_by(|left, right| left.name.as_str().cmp(right.name.as_str()));
        definitions
    }

    /// Returns the seed permission names and descriptions shipped with the
    /// system. Ids are assigned by the persistence seeder on first insert.
    #[must_use]
    pub fn seed_definitions() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("role:create", "Create custom roles", "roles"),
            ("role:read", "List custom roles and their members", "roles"),
            ("role:update", "Update custom roles", "roles"),
            ("role:delete", "Delete custom roles", "roles"),
            ("role:assign", "Assign custom roles to members", "roles"),
            ("role:remove", "Remove custom roles from members", "roles"),
            ("permission:assign", "Grant permissions directly to members", "permissions"),
            ("permission:remove", "Revoke directly granted permissions", "permissions"),
            ("permission:read", "List permission grants", "permissions"),
            ("survey:create", "Create surveys", "surveys"),
            ("survey:read", "Read surveys and responses", "surveys"),
            ("survey:update", "Update surveys", "surveys"),
            ("survey:delete", "Delete surveys", "surveys"),
            ("ticket:read", "Read support tickets", "tickets"),
            ("ticket:update", "Update support tickets", "tickets"),
        ]
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a custom role is updated.
    RoleUpdated,
    /// Emitted when a custom role is deleted.
    RoleDeleted,
    /// Emitted when a role is assigned to a member.
    RoleAssigned,
    /// Emitted when a role is removed from a member.
    RoleUnassigned,
    /// Emitted when a permission is granted directly to a member.
    PermissionGranted,
    /// Emitted when a direct permission grant is revoked.
    PermissionRevoked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "security.role.created",
            Self::RoleUpdated => "security.role.updated",
            Self::RoleDeleted => "security.role.deleted",
            Self::RoleAssigned => "security.role.assigned",
            Self::RoleUnassigned => "security.role.unassigned",
            Self::PermissionGranted => "security.permission.granted",
            Self::PermissionRevoked => "security.permission.revoked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PermissionCatalog, PermissionDefinition, PermissionId, PermissionName};

    fn definition(name: &str) -> PermissionDefinition {
        PermissionDefinition {
            id: PermissionId::new(),
            name: PermissionName::new(name)
                .unwrap_or_else(|_| panic!("test permission name '{name}' must be valid")),
            description: String::new(),
            group: None,
        }
    }

    #[test]
    fn permission_name_requires_resource_and_action() {
        assert!(PermissionName::new("role:create").is_ok());
        assert!(PermissionName::new("rolecreate").is_err());
        assert!(PermissionName::new(":create").is_err());
        assert!(PermissionName::new("role:").is_err());
    }

    #[test]
    fn catalog_resolves_by_name_and_id() {
        let entry = definition("role:create");
        let catalog = PermissionCatalog::new(vec![entry.clone()]).unwrap_or_default();

        assert_eq!(catalog.resolve_name("role:create"), Some(&entry));
        assert_eq!(catalog.resolve_id(entry.id), Some(&entry));
        assert!(catalog.resolve_name("role:delete").is_none());
    }

    #[test]
    fn catalog_rejects_duplicate_names() {
        let result = PermissionCatalog::new(vec![
            definition("role:create"),
            definition("role:create"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn catalog_rejects_duplicate_ids() {
        let first = definition("role:create");
        let mut second = definition("role:delete");
        second.id = first.id;

        let result = PermissionCatalog::new(vec![first, second]);
        assert!(result.is_err());
    }

    #[test]
    fn contains_all_detects_unknown_ids() {
        let entry = definition("role:create");
        let catalog = PermissionCatalog::new(vec![entry.clone()]).unwrap_or_default();

        assert!(catalog.contains_all(&[entry.id]));
        assert!(!catalog.contains_all(&[entry.id, PermissionId::new()]));
    }

    #[test]
    fn seed_definitions_are_well_formed() {
        for (name, _, _) in PermissionCatalog::seed_definitions() {
            assert!(PermissionName::new(name).is_ok(), "bad seed name '{name}'");
        }
    }
}
