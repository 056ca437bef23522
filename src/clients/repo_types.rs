use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Access level of a client account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "client_role", rename_all = "UPPERCASE")]
pub enum ClientRole {
    Client,
    Admin,
}

/// Account status. A plain value field: any status may be set directly,
/// there are no enforced transitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "client_status", rename_all = "UPPERCASE")]
pub enum ClientStatus {
    Active,
    Inactive,
    Suspended,
}

/// Client record as persisted.
///
/// Deliberately not serializable: the only shape that ever leaves the
/// service is the password-free `ClientProfile` projection.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: ClientRole,
    pub status: ClientStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Insert payload. Id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: ClientRole,
    pub status: ClientStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_and_status_use_uppercase_wire_names() {
        assert_eq!(serde_json::to_string(&ClientRole::Client).unwrap(), "\"CLIENT\"");
        assert_eq!(serde_json::to_string(&ClientStatus::Suspended).unwrap(), "\"SUSPENDED\"");

        let role: ClientRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, ClientRole::Admin);
        let status: ClientStatus = serde_json::from_str("\"INACTIVE\"").unwrap();
        assert_eq!(status, ClientStatus::Inactive);
    }

    #[test]
    fn lowercase_role_is_rejected() {
        assert!(serde_json::from_str::<ClientRole>("\"client\"").is_err());
    }
}
