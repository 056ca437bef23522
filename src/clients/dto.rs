use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::clients::repo_types::{Client, ClientRole, ClientStatus};

/// Request body for client registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<ClientRole>,
}

/// Request body for login. Fields are optional so a missing field produces
/// a domain validation error instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Partial update: only the fields present overwrite the stored record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<ClientRole>,
    pub status: Option<ClientStatus>,
}

/// Request body for a password change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// Public projection of a client: everything except the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: ClientRole,
    pub status: ClientStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Client> for ClientProfile {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            email: client.email,
            first_name: client.first_name,
            last_name: client.last_name,
            username: client.username,
            phone: client.phone,
            address: client.address,
            role: client.role,
            status: client.status,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

/// Envelope returned by the non-list endpoints.
#[derive(Debug, Serialize)]
pub struct ClientEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientProfile>,
}

impl ClientEnvelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            client: None,
        }
    }

    pub fn with_client(message: impl Into<String>, client: ClientProfile) -> Self {
        Self {
            success: true,
            message: message.into(),
            client: Some(client),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_client() -> Client {
        Client {
            id: Uuid::new_v4(),
            email: "jane.doe@example.com".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            username: "janedoe".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            phone: Some("555-0100".into()),
            address: None,
            role: ClientRole::Client,
            status: ClientStatus::Active,
            created_at: datetime!(2024-05-01 12:00 UTC),
            updated_at: datetime!(2024-05-02 08:30 UTC),
        }
    }

    #[test]
    fn profile_never_contains_the_password_hash() {
        let profile = ClientProfile::from(sample_client());
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("jane.doe@example.com"));
        assert!(json.contains("\"role\":\"CLIENT\""));
    }

    #[test]
    fn profile_timestamps_are_rfc3339() {
        let profile = ClientProfile::from(sample_client());
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"createdAt\":\"2024-05-01T12:00:00Z\""));
        assert!(json.contains("\"updatedAt\":\"2024-05-02T08:30:00Z\""));
    }

    #[test]
    fn envelope_without_client_omits_the_field() {
        let json = serde_json::to_string(&ClientEnvelope::ok("Client deleted successfully")).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(!json.contains("\"client\""));
    }

    #[test]
    fn register_request_accepts_camel_case_fields() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "JANE@example.com",
                "username": "janedoe",
                "password": "hunter2hunter2",
                "role": "ADMIN"
            }"#,
        )
        .unwrap();
        assert_eq!(req.first_name, "Jane");
        assert_eq!(req.role, Some(ClientRole::Admin));
        assert!(req.phone.is_none());
    }

    #[test]
    fn update_request_defaults_every_field_to_absent() {
        let req: UpdateClientRequest = serde_json::from_str(r#"{"phone": "123"}"#).unwrap();
        assert_eq!(req.phone.as_deref(), Some("123"));
        assert!(req.email.is_none());
        assert!(req.username.is_none());
        assert!(req.status.is_none());
    }
}
