use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, TenantId};

/// Coarse role tier used for fast-path authorization gating.
///
/// `Admin` is the top administrative tier and bypasses tenant-match and
/// fine-grained permission checks. `CompanyAdmin` administers one tenant.
/// `Member` access is refined by custom roles and direct grants. `User` is
/// an end respondent with no administrative surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    /// Platform operator with unrestricted access.
    Admin,
    /// Tenant administrator.
    CompanyAdmin,
    /// Tenant member subject to fine-grained permissions.
    Member,
    /// Survey respondent.
    User,
}

impl RoleTier {
    /// Returns a stable storage value for this tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::CompanyAdmin => "company_admin",
            Self::Member => "member",
            Self::User => "user",
        }
    }

    /// Returns whether this tier bypasses tenant-match checks.
    #[must_use]
    pub fn is_top_tier(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for RoleTier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "company_admin" => Ok(Self::CompanyAdmin),
            "member" => Ok(Self::Member),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown role tier '{value}'"
            ))),
        }
    }
}

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: Option<String>,
    tier: RoleTier,
    tenant_id: Option<TenantId>,
}

impl UserIdentity {
    /// Creates a user identity from authentication and tenancy data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        tier: RoleTier,
        tenant_id: Option<TenantId>,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email,
            tier,
            tenant_id,
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the coarse role tier.
    #[must_use]
    pub fn tier(&self) -> RoleTier {
        self.tier
    }

    /// Returns the tenant linked to the identity, if one is associated.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }
}
