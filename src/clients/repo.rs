use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::clients::repo_types::{Client, ClientRole, ClientStatus, NewClient};
use crate::error::ClientError;

/// Persistence seam for client records.
///
/// The service only talks to this trait; `PgClientStore` is the production
/// implementation and `MemoryClientStore` backs tests and local wiring.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn insert(&self, new: NewClient) -> Result<Client, ClientError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, ClientError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, ClientError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Client>, ClientError>;
    async fn email_exists(&self, email: &str) -> Result<bool, ClientError>;
    async fn username_exists(&self, username: &str) -> Result<bool, ClientError>;
    async fn list_all(&self) -> Result<Vec<Client>, ClientError>;
    async fn list_by_role(&self, role: ClientRole) -> Result<Vec<Client>, ClientError>;
    async fn list_by_status(&self, status: ClientStatus) -> Result<Vec<Client>, ClientError>;
    /// Persist the mutable fields of `client` and advance `updated_at`.
    /// The password hash is not touched here; see `update_password`.
    async fn update(&self, client: &Client) -> Result<Client, ClientError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), ClientError>;
    /// Returns whether a record was actually removed.
    async fn delete(&self, id: Uuid) -> Result<bool, ClientError>;
}

const CLIENT_COLUMNS: &str = "id, email, first_name, last_name, username, password_hash, \
     phone, address, role, status, created_at, updated_at";

pub struct PgClientStore {
    db: PgPool,
}

impl PgClientStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// The unique indexes are the authoritative uniqueness guard; a violation
/// slipping past the service pre-check surfaces as `AlreadyExists`.
fn map_unique_violation(e: sqlx::Error) -> ClientError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("clients_email_key") => {
                    ClientError::AlreadyExists("Email already exists".into())
                }
                Some("clients_username_key") => {
                    ClientError::AlreadyExists("Username already exists".into())
                }
                _ => ClientError::AlreadyExists("Client already exists".into()),
            };
        }
    }
    e.into()
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn insert(&self, new: NewClient) -> Result<Client, ClientError> {
        sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients
                (email, first_name, last_name, username, password_hash,
                 phone, address, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(new.role)
        .bind(new.status)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, ClientError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(client)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, ClientError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(client)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Client>, ClientError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(client)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, ClientError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM clients WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.db)
                .await?;
        Ok(exists.0)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ClientError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM clients WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.db)
                .await?;
        Ok(exists.0)
    }

    async fn list_all(&self) -> Result<Vec<Client>, ClientError> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(clients)
    }

    async fn list_by_role(&self, role: ClientRole) -> Result<Vec<Client>, ClientError> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE role = $1 ORDER BY created_at ASC"
        ))
        .bind(role)
        .fetch_all(&self.db)
        .await?;
        Ok(clients)
    }

    async fn list_by_status(&self, status: ClientStatus) -> Result<Vec<Client>, ClientError> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE status = $1 ORDER BY created_at ASC"
        ))
        .bind(status)
        .fetch_all(&self.db)
        .await?;
        Ok(clients)
    }

    async fn update(&self, client: &Client) -> Result<Client, ClientError> {
        let updated = sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET email = $2, first_name = $3, last_name = $4, username = $5,
                phone = $6, address = $7, role = $8, status = $9,
                updated_at = now()
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(client.id)
        .bind(&client.email)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.username)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.role)
        .bind(client.status)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique_violation)?;

        updated.ok_or_else(|| {
            ClientError::NotFound(format!("Client not found with id: {}", client.id))
        })
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), ClientError> {
        let result =
            sqlx::query("UPDATE clients SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(ClientError::NotFound(format!(
                "Client not found with id: {id}"
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ClientError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory store used by tests and offline wiring. Mirrors the unique
/// indexes of the real table so uniqueness races behave the same way.
#[derive(Default)]
pub struct MemoryClientStore {
    clients: Mutex<Vec<Client>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Client>>, ClientError> {
        self.clients
            .lock()
            .map_err(|_| ClientError::Unexpected(anyhow::anyhow!("client store mutex poisoned")))
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn insert(&self, new: NewClient) -> Result<Client, ClientError> {
        let mut clients = self.lock()?;
        if clients.iter().any(|c| c.email == new.email) {
            return Err(ClientError::AlreadyExists("Email already exists".into()));
        }
        if clients.iter().any(|c| c.username == new.username) {
            return Err(ClientError::AlreadyExists("Username already exists".into()));
        }

        let now = OffsetDateTime::now_utc();
        let client = Client {
            id: Uuid::new_v4(),
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            username: new.username,
            password_hash: new.password_hash,
            phone: new.phone,
            address: new.address,
            role: new.role,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        clients.push(client.clone());
        Ok(client)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, ClientError> {
        Ok(self.lock()?.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, ClientError> {
        Ok(self.lock()?.iter().find(|c| c.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Client>, ClientError> {
        Ok(self.lock()?.iter().find(|c| c.username == username).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, ClientError> {
        Ok(self.lock()?.iter().any(|c| c.email == email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ClientError> {
        Ok(self.lock()?.iter().any(|c| c.username == username))
    }

    async fn list_all(&self) -> Result<Vec<Client>, ClientError> {
        Ok(self.lock()?.clone())
    }

    async fn list_by_role(&self, role: ClientRole) -> Result<Vec<Client>, ClientError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|c| c.role == role)
            .cloned()
            .collect())
    }

    async fn list_by_status(&self, status: ClientStatus) -> Result<Vec<Client>, ClientError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|c| c.status == status)
            .cloned()
            .collect())
    }

    async fn update(&self, client: &Client) -> Result<Client, ClientError> {
        let mut clients = self.lock()?;
        if clients
            .iter()
            .any(|c| c.id != client.id && c.email == client.email)
        {
            return Err(ClientError::AlreadyExists("Email already exists".into()));
        }
        if clients
            .iter()
            .any(|c| c.id != client.id && c.username == client.username)
        {
            return Err(ClientError::AlreadyExists("Username already exists".into()));
        }

        let stored = clients
            .iter_mut()
            .find(|c| c.id == client.id)
            .ok_or_else(|| {
                ClientError::NotFound(format!("Client not found with id: {}", client.id))
            })?;

        stored.email = client.email.clone();
        stored.first_name = client.first_name.clone();
        stored.last_name = client.last_name.clone();
        stored.username = client.username.clone();
        stored.phone = client.phone.clone();
        stored.address = client.address.clone();
        stored.role = client.role;
        stored.status = client.status;
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), ClientError> {
        let mut clients = self.lock()?;
        let stored = clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("Client not found with id: {id}")))?;
        stored.password_hash = password_hash.to_string();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ClientError> {
        let mut clients = self.lock()?;
        let before = clients.len();
        clients.retain(|c| c.id != id);
        Ok(clients.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client(email: &str, username: &str) -> NewClient {
        NewClient {
            email: email.into(),
            first_name: "Test".into(),
            last_name: "Client".into(),
            username: username.into(),
            password_hash: "hash".into(),
            phone: None,
            address: None,
            role: ClientRole::Client,
            status: ClientStatus::Active,
        }
    }

    #[tokio::test]
    async fn memory_store_enforces_unique_email_and_username() {
        let store = MemoryClientStore::new();
        store.insert(new_client("a@x.com", "alice")).await.unwrap();

        let err = store
            .insert(new_client("a@x.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AlreadyExists(_)));

        let err = store
            .insert(new_client("b@x.com", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn memory_store_update_rejects_a_taken_email_from_another_record() {
        let store = MemoryClientStore::new();
        store.insert(new_client("a@x.com", "alice")).await.unwrap();
        let bob = store.insert(new_client("b@x.com", "bob")).await.unwrap();

        let mut renamed = bob.clone();
        renamed.email = "a@x.com".into();
        let err = store.update(&renamed).await.unwrap_err();
        assert!(matches!(err, ClientError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn memory_store_lists_in_insertion_order() {
        let store = MemoryClientStore::new();
        let a = store.insert(new_client("a@x.com", "alice")).await.unwrap();
        let b = store.insert(new_client("b@x.com", "bob")).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn memory_store_delete_reports_whether_a_row_was_removed() {
        let store = MemoryClientStore::new();
        let a = store.insert(new_client("a@x.com", "alice")).await.unwrap();

        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
        assert!(store.find_by_id(a.id).await.unwrap().is_none());
    }
}
