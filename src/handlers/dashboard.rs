// src/handlers/dashboard.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    // Importamos os models para referenciar no Swagger
    models::dashboard::{
        ConversionRate, DailyCount, DashboardStats, EmployeePerformance, FollowupCompletion, MonthlyCount,
        QuotationStats, ReasonCount, ReportBundle, SourceCount, StatusCount,
    },
};

// GET /api/dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Cards do dashboard e distribuição por status", body = DashboardStats),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .dashboard_service
        .dashboard_stats()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/reports
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    responses(
        (status = 200, description = "Todos os relatórios numa resposta", body = ReportBundle)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_reports(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let bundle = app_state
        .dashboard_service
        .reports()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(bundle)))
}

// GET /api/reports/sources
#[utoipa::path(
    get,
    path = "/api/reports/sources",
    tag = "Reports",
    responses((status = 200, description = "Clientes por origem", body = Vec<SourceCount>)),
    security(("api_jwt" = []))
)]
pub async fn get_source_stats(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .source_stats()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/statuses
#[utoipa::path(
    get,
    path = "/api/reports/statuses",
    tag = "Reports",
    responses((status = 200, description = "Clientes por etapa do funil", body = Vec<StatusCount>)),
    security(("api_jwt" = []))
)]
pub async fn get_status_stats(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .status_stats()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/conversion
#[utoipa::path(
    get,
    path = "/api/reports/conversion",
    tag = "Reports",
    responses((status = 200, description = "Taxa de conversão em clientes ativos", body = ConversionRate)),
    security(("api_jwt" = []))
)]
pub async fn get_conversion_rate(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .conversion_rate()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/quotations
#[utoipa::path(
    get,
    path = "/api/reports/quotations",
    tag = "Reports",
    responses((status = 200, description = "Totais de propostas por status", body = QuotationStats)),
    security(("api_jwt" = []))
)]
pub async fn get_quotation_stats(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .quotation_stats()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/rejection-reasons
#[utoipa::path(
    get,
    path = "/api/reports/rejection-reasons",
    tag = "Reports",
    responses((status = 200, description = "Motivos de recusa, mais frequentes primeiro", body = Vec<ReasonCount>)),
    security(("api_jwt" = []))
)]
pub async fn get_rejection_reasons(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .rejection_reasons()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/monthly-growth
#[utoipa::path(
    get,
    path = "/api/reports/monthly-growth",
    tag = "Reports",
    responses((status = 200, description = "Novos clientes por mês", body = Vec<MonthlyCount>)),
    security(("api_jwt" = []))
)]
pub async fn get_monthly_growth(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .monthly_growth()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/weekly-new-customers
#[utoipa::path(
    get,
    path = "/api/reports/weekly-new-customers",
    tag = "Reports",
    responses((status = 200, description = "Novos clientes nos últimos 7 dias", body = Vec<DailyCount>)),
    security(("api_jwt" = []))
)]
pub async fn get_weekly_new_customers(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .weekly_new_customers()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/followup-completion
#[utoipa::path(
    get,
    path = "/api/reports/followup-completion",
    tag = "Reports",
    responses((status = 200, description = "Follow-ups concluídos", body = FollowupCompletion)),
    security(("api_jwt" = []))
)]
pub async fn get_followup_completion(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .followup_completion()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/employee-performance
#[utoipa::path(
    get,
    path = "/api/reports/employee-performance",
    tag = "Reports",
    responses((status = 200, description = "Clientes por responsável", body = Vec<EmployeePerformance>)),
    security(("api_jwt" = []))
)]
pub async fn get_employee_performance(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .employee_performance()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}
