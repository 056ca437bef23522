use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::dto::{ClientProfile, RegisterRequest, UpdateClientRequest};
use crate::clients::password::{hash_password, verify_password};
use crate::clients::repo::ClientStore;
use crate::clients::repo_types::{ClientRole, ClientStatus, NewClient};
use crate::error::ClientError;

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn require_field(value: &str, name: &str) -> Result<(), ClientError> {
    if value.is_empty() {
        return Err(ClientError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

fn check_password_length(password: &str) -> Result<(), ClientError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ClientError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// All client logic in one place: normalization, uniqueness checks, password
/// hashing and the record-to-projection mapping. The store is a
/// constructor-passed collaborator, never a process-wide singleton.
#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn ClientStore>,
}

impl ClientService {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<ClientProfile, ClientError> {
        let email = req.email.trim().to_lowercase();
        let username = req.username.trim().to_string();
        let first_name = req.first_name.trim().to_string();
        let last_name = req.last_name.trim().to_string();

        if !is_valid_email(&email) {
            return Err(ClientError::Validation(format!("Invalid email: {email}")));
        }
        require_field(&username, "Username")?;
        require_field(&first_name, "First name")?;
        require_field(&last_name, "Last name")?;
        check_password_length(&req.password)?;

        if self.store.email_exists(&email).await? {
            return Err(ClientError::AlreadyExists(format!(
                "Email already exists: {email}"
            )));
        }
        if self.store.username_exists(&username).await? {
            return Err(ClientError::AlreadyExists(format!(
                "Username already exists: {username}"
            )));
        }

        let password_hash = hash_password(&req.password)?;
        let client = self
            .store
            .insert(NewClient {
                email,
                first_name,
                last_name,
                username,
                password_hash,
                phone: req.phone.map(|p| p.trim().to_string()),
                address: req.address.map(|a| a.trim().to_string()),
                role: req.role.unwrap_or(ClientRole::Client),
                status: ClientStatus::Active,
            })
            .await?;

        info!(client_id = %client.id, username = %client.username, "client registered");
        Ok(client.into())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ClientProfile, ClientError> {
        self.store
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ClientError::NotFound(format!("Client not found with id: {id}")))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<ClientProfile, ClientError> {
        let email = email.trim().to_lowercase();
        self.store
            .find_by_email(&email)
            .await?
            .map(Into::into)
            .ok_or_else(|| ClientError::NotFound(format!("Client not found with email: {email}")))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<ClientProfile, ClientError> {
        self.store
            .find_by_username(username.trim())
            .await?
            .map(Into::into)
            .ok_or_else(|| {
                ClientError::NotFound(format!("Client not found with username: {username}"))
            })
    }

    pub async fn list_all(&self) -> Result<Vec<ClientProfile>, ClientError> {
        let clients = self.store.list_all().await?;
        Ok(clients.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_role(&self, role: ClientRole) -> Result<Vec<ClientProfile>, ClientError> {
        let clients = self.store.list_by_role(role).await?;
        Ok(clients.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_status(
        &self,
        status: ClientStatus,
    ) -> Result<Vec<ClientProfile>, ClientError> {
        let clients = self.store.list_by_status(status).await?;
        Ok(clients.into_iter().map(Into::into).collect())
    }

    /// Partial update: only fields present in the request overwrite the
    /// stored record. Email and username changes re-run the uniqueness
    /// check against all other records.
    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateClientRequest,
    ) -> Result<ClientProfile, ClientError> {
        let mut client = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("Client not found with id: {id}")))?;

        if let Some(email) = req.email {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err(ClientError::Validation(format!("Invalid email: {email}")));
            }
            if email != client.email && self.store.email_exists(&email).await? {
                return Err(ClientError::AlreadyExists(format!(
                    "Email already exists: {email}"
                )));
            }
            client.email = email;
        }

        if let Some(username) = req.username {
            let username = username.trim().to_string();
            require_field(&username, "Username")?;
            if username != client.username && self.store.username_exists(&username).await? {
                return Err(ClientError::AlreadyExists(format!(
                    "Username already exists: {username}"
                )));
            }
            client.username = username;
        }

        if let Some(first_name) = req.first_name {
            let first_name = first_name.trim().to_string();
            require_field(&first_name, "First name")?;
            client.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            let last_name = last_name.trim().to_string();
            require_field(&last_name, "Last name")?;
            client.last_name = last_name;
        }
        if let Some(phone) = req.phone {
            client.phone = Some(phone.trim().to_string());
        }
        if let Some(address) = req.address {
            client.address = Some(address.trim().to_string());
        }
        if let Some(role) = req.role {
            client.role = role;
        }
        if let Some(status) = req.status {
            client.status = status;
        }

        let updated = self.store.update(&client).await?;
        info!(client_id = %updated.id, "client updated");
        Ok(updated.into())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        if !self.store.delete(id).await? {
            return Err(ClientError::NotFound(format!(
                "Client not found with id: {id}"
            )));
        }
        info!(client_id = %id, "client deleted");
        Ok(())
    }

    pub async fn change_password(
        &self,
        id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let client = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("Client not found with id: {id}")))?;

        if !verify_password(old_password, &client.password_hash)? {
            warn!(client_id = %id, "password change with wrong old password");
            return Err(ClientError::InvalidCredential);
        }
        check_password_length(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.store.update_password(id, &password_hash).await?;
        info!(client_id = %id, "password changed");
        Ok(())
    }

    /// Credential check for login. Unknown username and wrong password are
    /// indistinguishable to the caller so accounts cannot be enumerated;
    /// the log line carries the actual reason.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ClientProfile, ClientError> {
        let Some(client) = self.store.find_by_username(username.trim()).await? else {
            warn!(username = %username, "login with unknown username");
            return Err(ClientError::InvalidCredential);
        };

        if !verify_password(password, &client.password_hash)? {
            warn!(client_id = %client.id, "login with wrong password");
            return Err(ClientError::InvalidCredential);
        }

        info!(client_id = %client.id, "client logged in");
        Ok(client.into())
    }
}
