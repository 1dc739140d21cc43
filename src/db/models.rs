use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Domain Enums
// ============================================================================

/// Consumption semantics of an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum InvitationType {
    /// Consumable exactly once; transitions to `used` on first registration
    Single,
    /// Reusable within its validity window; `used` is not terminal
    Recurring,
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum InvitationStatus {
    Active,
    Used,
    Expired,
    Cancelled,
}

impl std::str::FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "used" => Ok(Self::Used),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown invitation status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AccessDirection {
    Entry,
    Exit,
}

/// How an access was authorized at the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AccessMethod {
    Qr,
    Code,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    Resident,
    Guard,
    Admin,
}

// ============================================================================
// Row Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub organization_id: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Guards and admins can operate the gate (validate codes, register access)
    pub fn is_gate_staff(&self) -> bool {
        matches!(self.role, UserRole::Guard | UserRole::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Invitation {
    pub id: i64,
    pub organization_id: String,
    pub created_by: i64,
    pub visitor_name: String,
    pub visitor_phone: Option<String>,
    pub visitor_email: Option<String>,
    #[serde(rename = "type")]
    pub kind: InvitationType,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub qr_token: String,
    pub short_code: String,
    pub notes: Option<String>,
    pub used_at: Option<DateTime<Utc>>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a physical access event at the gate
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: i64,
    pub invitation_id: Option<i64>,
    pub authorized_by: i64,
    pub visitor_name: String,
    pub direction: AccessDirection,
    pub method: AccessMethod,
    pub created_at: DateTime<Utc>,
}
