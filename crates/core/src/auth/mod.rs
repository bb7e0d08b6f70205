//! Authentication primitives.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Random opaque tokens
//! - Account and team role definitions

mod password;
mod token;

pub use password::{PasswordError, hash_password, verify_password};
pub use token::generate_token;

use serde::{Deserialize, Serialize};

/// Lifetime of an email verification token, in hours.
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// Lifetime of a password reset token, in hours.
pub const PASSWORD_RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Account-level role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular customer.
    #[default]
    User,
    /// Operator with access to payment administration.
    Admin,
}

impl UserRole {
    /// Returns true if this role can register IPN URLs and issue refunds.
    #[must_use]
    pub const fn can_manage_payments(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Claim string for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a member inside a team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Created the team.
    Owner,
    /// Can invite and manage members.
    Admin,
    /// Collaborator.
    #[default]
    Member,
}

impl TeamRole {
    /// Returns true if this role can add members.
    #[must_use]
    pub const fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Column value for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl std::str::FromStr for TeamRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(format!("Unknown team role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.can_manage_payments());
        assert!(!UserRole::User.can_manage_payments());

        assert!(TeamRole::Owner.can_manage_members());
        assert!(TeamRole::Admin.can_manage_members());
        assert!(!TeamRole::Member.can_manage_members());
    }

    #[test]
    fn test_team_role_parse() {
        assert_eq!(TeamRole::from_str("Owner").unwrap(), TeamRole::Owner);
        assert_eq!(TeamRole::from_str("member").unwrap(), TeamRole::Member);
        assert!(TeamRole::from_str("viewer").is_err());
        assert_eq!(TeamRole::Admin.as_str(), "admin");
    }
}
