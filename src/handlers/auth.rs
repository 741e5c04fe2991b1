// src/handlers/auth.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::{Query, Table},
    middleware::i18n::Locale,
    models::auth::{LoginPayload, LoginResponse},
};

// POST /api/login
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login do administrador", body = LoginResponse),
        (status = 401, description = "Usuário ou senha incorretos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Response {
    // Corpo ausente ou incompleto cai no mesmo 401 de credenciais erradas
    let result = match &payload {
        Ok(Json(payload)) if payload.validate().is_ok() => {
            app_state.auth_service.login(&payload.email, &payload.password).await
        }
        Ok(_) => Err(AppError::InvalidCredentials),
        Err(rejection) => {
            tracing::debug!("Corpo de login rejeitado: {}", rejection.body_text());
            Err(AppError::InvalidCredentials)
        }
    };

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(AppError::InvalidCredentials) => {
            let user = payload.as_ref().map(|Json(p)| p.email.as_str()).unwrap_or_default();
            tracing::warn!("⚠️ Tentativa de login recusada para '{}'", user);
            let message = app_state.i18n_store.translate(&locale, "invalid_credentials");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response()
        }
        Err(e) => e.to_api_error(&locale, &app_state.i18n_store).into_response(),
    }
}

// GET /api/test
#[utoipa::path(
    get,
    path = "/api/test",
    tag = "Health",
    responses(
        (status = 200, description = "Uma linha de customers, para testar a conexão com o banco"),
        (status = 500, description = "Banco inacessível")
    )
)]
pub async fn connection_test(State(app_state): State<AppState>) -> Response {
    let query = Query::table(Table::Customers).limit(1);

    match app_state.gateway.select(&query).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "data": rows }))).into_response(),
        Err(e) => {
            tracing::error!("🔥 Teste de conexão falhou: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
