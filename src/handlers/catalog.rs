// src/handlers/catalog.rs

use axum::{
    extract::{Path, State},
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
    models::services::{
        AssignServicePayload, CustomerService, CustomerServiceInput, CustomerServicePatch,
        CustomerServiceWithRelations, CustomerServiceWithService, NewService, Service,
    },
};

// =============================================================================
//  ÁREA 1: CATÁLOGO
// =============================================================================

// GET /api/services
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Services",
    responses(
        (status = 200, description = "Serviços ativos do catálogo, por nome", body = Vec<Service>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_catalog(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .catalog_service
        .list_catalog()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(services)))
}

// POST /api/services
#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Services",
    request_body = NewService,
    responses(
        (status = 201, description = "Serviço adicionado ao catálogo", body = Service),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_catalog_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<NewService>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .catalog_service
        .create_catalog_service(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service)))
}

// =============================================================================
//  ÁREA 2: SERVIÇOS CONTRATADOS
// =============================================================================

// GET /api/customer-services
#[utoipa::path(
    get,
    path = "/api/customer-services",
    tag = "Services",
    responses(
        (status = 200, description = "Todos os serviços contratados", body = Vec<CustomerServiceWithRelations>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_all_customer_services(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .catalog_service
        .list_all_customer_services()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(services)))
}

// GET /api/customers/{id}/services
#[utoipa::path(
    get,
    path = "/api/customers/{id}/services",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Serviços do cliente", body = Vec<CustomerServiceWithService>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customer_services(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .catalog_service
        .list_customer_services(customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(services)))
}

// POST /api/customers/{id}/services
#[utoipa::path(
    post,
    path = "/api/customers/{id}/services",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerServiceInput,
    responses(
        (status = 201, description = "Serviço criado no catálogo e vinculado ao cliente", body = CustomerService),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CustomerServiceInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let written = app_state
        .catalog_service
        .create_for_customer(customer_id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(WithWarning::from(written))))
}

// POST /api/customers/{id}/services/assign
#[utoipa::path(
    post,
    path = "/api/customers/{id}/services/assign",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = AssignServicePayload,
    responses(
        (status = 201, description = "Serviço do catálogo vinculado a partir de hoje", body = CustomerService),
        (status = 404, description = "Serviço não existe no catálogo")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<AssignServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let written = app_state
        .catalog_service
        .assign(customer_id, payload.service_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(WithWarning::from(written))))
}

// PATCH /api/customer-services/{id}
#[utoipa::path(
    patch,
    path = "/api/customer-services/{id}",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do serviço contratado")),
    request_body = CustomerServicePatch,
    responses(
        (status = 200, description = "Serviço contratado atualizado", body = CustomerService),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerServicePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let service = app_state
        .catalog_service
        .update_customer_service(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(service)))
}

// DELETE /api/customer-services/{id}
#[utoipa::path(
    delete,
    path = "/api/customer-services/{id}",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do serviço contratado")),
    responses((status = 200, description = "Serviço contratado removido")),
    security(("api_jwt" = []))
)]
pub async fn remove_customer_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .remove_customer_service(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
