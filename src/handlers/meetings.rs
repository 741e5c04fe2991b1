// src/handlers/meetings.rs

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
    models::meetings::{Meeting, MeetingPatch, MeetingWithCustomer, NewMeeting},
};

// GET /api/meetings
#[utoipa::path(
    get,
    path = "/api/meetings",
    tag = "Meetings",
    responses(
        (status = 200, description = "Todas as reuniões com o resumo do cliente", body = Vec<MeetingWithCustomer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_meetings(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let meetings = app_state
        .meeting_service
        .list_all()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(meetings)))
}

// GET /api/customers/{id}/meetings
#[utoipa::path(
    get,
    path = "/api/customers/{id}/meetings",
    tag = "Meetings",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Reuniões do cliente", body = Vec<Meeting>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customer_meetings(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let meetings = app_state
        .meeting_service
        .list_by_customer(customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(meetings)))
}

// POST /api/meetings
#[utoipa::path(
    post,
    path = "/api/meetings",
    tag = "Meetings",
    request_body = NewMeeting,
    responses(
        (status = 201, description = "Reunião agendada", body = Meeting),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Cliente inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_meeting(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<NewMeeting>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let written = app_state
        .meeting_service
        .create(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(WithWarning::from(written))))
}

// PATCH /api/meetings/{id}
#[utoipa::path(
    patch,
    path = "/api/meetings/{id}",
    tag = "Meetings",
    params(("id" = Uuid, Path, description = "ID da reunião")),
    request_body = MeetingPatch,
    responses(
        (status = 200, description = "Reunião atualizada", body = Meeting),
        (status = 404, description = "Reunião não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_meeting(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<MeetingPatch>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let meeting = app_state
        .meeting_service
        .update(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(meeting)))
}

// DELETE /api/meetings/{id}
#[utoipa::path(
    delete,
    path = "/api/meetings/{id}",
    tag = "Meetings",
    params(("id" = Uuid, Path, description = "ID da reunião")),
    responses((status = 200, description = "Reunião removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_meeting(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .meeting_service
        .delete(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
