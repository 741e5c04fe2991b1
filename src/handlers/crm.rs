// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::WithWarning,
    middleware::i18n::Locale,
    models::crm::{
        ActiveCustomer, Activity, Customer, CustomerDetail, CustomerListItem, CustomerPatch, CustomerQuery,
        NewCustomer, NotePayload,
    },
};

// =============================================================================
//  ÁREA 1: CLIENTES
// =============================================================================

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(CustomerQuery),
    responses(
        (status = 200, description = "Clientes, mais novos primeiro", body = Vec<CustomerListItem>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filters): Query<CustomerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let crm = &app_state.crm_service;

    // A busca textual tem prioridade sobre o filtro de status
    let customers = match (filters.q.as_deref().map(str::trim), filters.status) {
        (Some(term), _) if !term.is_empty() => crm.search(term).await,
        (_, Some(status)) => crm.filter_by_status(status).await,
        _ => crm.list().await,
    }
    .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customers)))
}

// GET /api/customers/active
#[utoipa::path(
    get,
    path = "/api/customers/active",
    tag = "Customers",
    responses(
        (status = 200, description = "Clientes ativos com os serviços contratados", body = Vec<ActiveCustomer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_active_customers(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .crm_service
        .list_active()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customers)))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Ficha completa do cliente", body = CustomerDetail),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .crm_service
        .get_by_id(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = NewCustomer,
    responses(
        (status = 201, description = "Cliente criado (status inicial new_contact)", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<NewCustomer>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let written = app_state
        .crm_service
        .create(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(WithWarning::from(written))))
}

// PATCH /api/customers/{id}
#[utoipa::path(
    patch,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPatch,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPatch>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let written = app_state
        .crm_service
        .update(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(WithWarning::from(written))))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente removido junto com reuniões, propostas, follow-ups e histórico")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state
        .crm_service
        .delete(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "success": deleted }))))
}

// =============================================================================
//  ÁREA 2: HISTÓRICO
// =============================================================================

// GET /api/customers/{id}/activities
#[utoipa::path(
    get,
    path = "/api/customers/{id}/activities",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Histórico do cliente, mais recente primeiro", body = Vec<Activity>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_activities(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let activities = app_state
        .crm_service
        .activities(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(activities)))
}

// POST /api/customers/{id}/notes
#[utoipa::path(
    post,
    path = "/api/customers/{id}/notes",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = NotePayload,
    responses(
        (status = 201, description = "Nota registrada no histórico", body = Activity),
        (status = 400, description = "Nota vazia")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_note(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<NotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let activity = app_state
        .crm_service
        .add_note(id, payload.text.trim())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(activity)))
}

// GET /api/activities/pending
#[utoipa::path(
    get,
    path = "/api/activities/pending",
    tag = "Activities",
    responses(
        (status = 200, description = "Registros de histórico aguardando reenvio")
    ),
    security(("api_jwt" = []))
)]
pub async fn pending_activities(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "pending": app_state.crm_service.pending_activities() }))
}
