// src/handlers/quotations.rs

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
    models::quotations::{NewQuotation, Quotation, QuotationPatch, QuotationWithCustomer},
};

// GET /api/quotations
#[utoipa::path(
    get,
    path = "/api/quotations",
    tag = "Quotations",
    responses(
        (status = 200, description = "Propostas com o resumo do cliente", body = Vec<QuotationWithCustomer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_quotations(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let quotations = app_state
        .quotation_service
        .list_all()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quotations)))
}

// GET /api/customers/{id}/quotations
#[utoipa::path(
    get,
    path = "/api/customers/{id}/quotations",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Propostas do cliente", body = Vec<Quotation>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customer_quotations(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quotations = app_state
        .quotation_service
        .list_by_customer(customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quotations)))
}

// POST /api/quotations
#[utoipa::path(
    post,
    path = "/api/quotations",
    tag = "Quotations",
    request_body = NewQuotation,
    responses(
        (status = 201, description = "Proposta criada com número Q-00001, Q-00002, ...", body = Quotation),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<NewQuotation>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let written = app_state
        .quotation_service
        .create(payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(WithWarning::from(written))))
}

// PATCH /api/quotations/{id}
#[utoipa::path(
    patch,
    path = "/api/quotations/{id}",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID da proposta")),
    request_body = QuotationPatch,
    responses(
        (status = 200, description = "Proposta atualizada", body = Quotation),
        (status = 404, description = "Proposta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuotationPatch>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let written = app_state
        .quotation_service
        .update(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(WithWarning::from(written))))
}

// DELETE /api/quotations/{id}
#[utoipa::path(
    delete,
    path = "/api/quotations/{id}",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID da proposta")),
    responses((status = 200, description = "Proposta removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .quotation_service
        .delete(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
