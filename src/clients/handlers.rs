use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    clients::dto::{
        ChangePasswordRequest, ClientEnvelope, ClientProfile, LoginRequest, RegisterRequest,
        UpdateClientRequest,
    },
    clients::repo_types::{ClientRole, ClientStatus},
    error::ClientError,
    state::AppState,
};

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/clients/register", post(register))
        .route("/clients/login", post(login))
        .route("/clients", get(list_clients))
        .route(
            "/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/clients/email/:email", get(get_client_by_email))
        .route("/clients/username/:username", get(get_client_by_username))
        .route("/clients/role/:role", get(list_clients_by_role))
        .route("/clients/status/:status", get(list_clients_by_status))
        .route("/clients/change-password/:id", post(change_password))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ClientEnvelope>), ClientError> {
    let client = state.clients.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ClientEnvelope::with_client(
            "Client registered successfully",
            client,
        )),
    ))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ClientEnvelope>, ClientError> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(ClientError::Validation(
            "Username and password are required".into(),
        ));
    };

    let client = state.clients.authenticate(&username, &password).await?;
    Ok(Json(ClientEnvelope::with_client("Login successful", client)))
}

#[instrument(skip(state))]
async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientEnvelope>, ClientError> {
    let client = state.clients.get_by_id(id).await?;
    Ok(Json(ClientEnvelope::with_client("Client found", client)))
}

#[instrument(skip(state))]
async fn get_client_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ClientEnvelope>, ClientError> {
    let client = state.clients.get_by_email(&email).await?;
    Ok(Json(ClientEnvelope::with_client("Client found", client)))
}

#[instrument(skip(state))]
async fn get_client_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ClientEnvelope>, ClientError> {
    let client = state.clients.get_by_username(&username).await?;
    Ok(Json(ClientEnvelope::with_client("Client found", client)))
}

#[instrument(skip(state))]
async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientProfile>>, ClientError> {
    Ok(Json(state.clients.list_all().await?))
}

#[instrument(skip(state))]
async fn list_clients_by_role(
    State(state): State<AppState>,
    Path(role): Path<ClientRole>,
) -> Result<Json<Vec<ClientProfile>>, ClientError> {
    Ok(Json(state.clients.list_by_role(role).await?))
}

#[instrument(skip(state))]
async fn list_clients_by_status(
    State(state): State<AppState>,
    Path(status): Path<ClientStatus>,
) -> Result<Json<Vec<ClientProfile>>, ClientError> {
    Ok(Json(state.clients.list_by_status(status).await?))
}

#[instrument(skip(state, payload))]
async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> Result<Json<ClientEnvelope>, ClientError> {
    let client = state.clients.update(id, payload).await?;
    Ok(Json(ClientEnvelope::with_client(
        "Client updated successfully",
        client,
    )))
}

#[instrument(skip(state))]
async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientEnvelope>, ClientError> {
    state.clients.delete(id).await?;
    Ok(Json(ClientEnvelope::ok("Client deleted successfully")))
}

#[instrument(skip(state, payload))]
async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ClientEnvelope>, ClientError> {
    let (Some(old_password), Some(new_password)) = (payload.old_password, payload.new_password)
    else {
        return Err(ClientError::Validation(
            "Old password and new password are required".into(),
        ));
    };

    state
        .clients
        .change_password(id, &old_password, &new_password)
        .await?;
    Ok(Json(ClientEnvelope::ok("Password changed successfully")))
}
