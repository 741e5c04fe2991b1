// src/handlers/followups.rs

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
    models::followups::{Followup, FollowupPatch, FollowupUpdate, FollowupWithCustomer, NewFollowup},
};

// GET /api/followups
#[utoipa::path(
    get,
    path = "/api/followups",
    tag = "Followups",
    responses(
        (status = 200, description = "Follow-ups com o resumo do cliente", body = Vec<FollowupWithCustomer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_followups(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let followups = app_state
        .followup_service
        .list_all()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(followups)))
}

// GET /api/followups/today
#[utoipa::path(
    get,
    path = "/api/followups/today",
    tag = "Followups",
    responses(
        (status = 200, description = "Pendentes de hoje (horário local)", body = Vec<FollowupWithCustomer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_today_followups(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let followups = app_state
        .followup_service
        .today()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(followups)))
}

// GET /api/followups/overdue
#[utoipa::path(
    get,
    path = "/api/followups/overdue",
    tag = "Followups",
    responses(
        (status = 200, description = "Pendentes com data já vencida", body = Vec<FollowupWithCustomer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_overdue_followups(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let followups = app_state
        .followup_service
        .overdue()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(followups)))
}

// GET /api/customers/{id}/followups
#[utoipa::path(
    get,
    path = "/api/customers/{id}/followups",
    tag = "Followups",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Follow-ups do cliente", body = Vec<Followup>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customer_followups(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let followups = app_state
        .followup_service
        .list_by_customer(customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(followups)))
}

// POST /api/followups
#[utoipa::path(
    post,
    path = "/api/followups",
    tag = "Followups",
    request_body = NewFollowup,
    responses(
        (status = 201, description = "Follow-up agendado", body = Followup),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_followup(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<NewFollowup>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let written = app_state
        .followup_service
        .create(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(WithWarning::from(written))))
}

// PATCH /api/followups/{id}
#[utoipa::path(
    patch,
    path = "/api/followups/{id}",
    tag = "Followups",
    params(("id" = Uuid, Path, description = "ID do follow-up")),
    request_body = FollowupPatch,
    responses(
        (status = 200, description = "Follow-up atualizado; `warning` quando o histórico falhou", body = FollowupUpdate),
        (status = 404, description = "Follow-up não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_followup(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<FollowupPatch>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .followup_service
        .update(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

// POST /api/followups/{id}/complete
#[utoipa::path(
    post,
    path = "/api/followups/{id}/complete",
    tag = "Followups",
    params(("id" = Uuid, Path, description = "ID do follow-up")),
    responses(
        (status = 200, description = "Follow-up marcado como feito", body = FollowupUpdate),
        (status = 404, description = "Follow-up não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_followup(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .followup_service
        .complete(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

// DELETE /api/followups/{id}
#[utoipa::path(
    delete,
    path = "/api/followups/{id}",
    tag = "Followups",
    params(("id" = Uuid, Path, description = "ID do follow-up")),
    responses((status = 200, description = "Follow-up removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_followup(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .followup_service
        .delete(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
