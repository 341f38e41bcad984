//! Status, priority and role enums.
//!
//! Wire values are the lowercase snake-case strings the backend uses; labels
//! and badge classes are what the console shows.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Where an enquiry sits in its lifecycle.
///
/// The lifecycle is `New -> InProgress -> Closed`, but any authorized actor
/// may set any value; the console does not enforce transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    #[default]
    New,
    InProgress,
    Closed,
}

impl EnquiryStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 3] = [Self::New, Self::InProgress, Self::Closed];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
        }
    }

    /// Tailwind classes for the status badge.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::New => "bg-blue-100 text-blue-800",
            Self::InProgress => "bg-yellow-100 text-yellow-800",
            Self::Closed => "bg-green-100 text-green-800",
        }
    }
}

impl std::fmt::Display for EnquiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnquiryStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError::new("enquiry status", s)),
        }
    }
}

/// Enquiry priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// All priorities in display order.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Tailwind classes for the priority badge.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Low => "bg-gray-100 text-gray-800",
            Self::Medium => "bg-orange-100 text-orange-800",
            Self::High => "bg-red-100 text-red-800",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError::new("priority", s)),
        }
    }
}

/// Access tier of a console user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control, including user management and deletion.
    Admin,
    /// Limited enquiry edits (status and message).
    Staff,
    /// Reserved; treated like staff by the console.
    User,
}

impl Role {
    /// All roles in display order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Staff, Self::User];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::User => "user",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Staff => "Staff",
            Self::User => "User",
        }
    }

    /// Whether this role may edit every enquiry field, assign enquiries,
    /// delete records, and manage users.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "user" => Ok(Self::User),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_values() {
        for status in EnquiryStatus::ALL {
            assert_eq!(status.as_str().parse::<EnquiryStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status.as_str())
            );
        }
        assert_eq!(EnquiryStatus::InProgress.label(), "In Progress");
    }

    #[test]
    fn test_unknown_values_rejected() {
        let err = "pending".parse::<EnquiryStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid enquiry status: pending");
        assert!("urgent".parse::<Priority>().is_err());
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_defaults_match_new_enquiry_form() {
        assert_eq!(EnquiryStatus::default(), EnquiryStatus::New);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_only_admin_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Staff.is_admin());
        assert!(!Role::User.is_admin());
    }
}
