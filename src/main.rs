//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

pub fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/login", post(handlers::auth::login))
        .route("/test", get(handlers::auth::connection_test));

    let customer_routes = Router::new()
        .route(
            "/customers",
            get(handlers::crm::list_customers).post(handlers::crm::create_customer),
        )
        .route("/customers/active", get(handlers::crm::list_active_customers))
        .route(
            "/customers/{id}",
            get(handlers::crm::get_customer)
                .patch(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        )
        .route("/customers/{id}/activities", get(handlers::crm::list_activities))
        .route("/customers/{id}/notes", post(handlers::crm::add_note))
        .route("/customers/{id}/meetings", get(handlers::meetings::list_customer_meetings))
        .route("/customers/{id}/quotations", get(handlers::quotations::list_customer_quotations))
        .route("/customers/{id}/followups", get(handlers::followups::list_customer_followups))
        .route(
            "/customers/{id}/services",
            get(handlers::catalog::list_customer_services).post(handlers::catalog::create_customer_service),
        )
        .route("/customers/{id}/services/assign", post(handlers::catalog::assign_service))
        .route("/activities/pending", get(handlers::crm::pending_activities));

    let pipeline_routes = Router::new()
        .route(
            "/meetings",
            get(handlers::meetings::list_meetings).post(handlers::meetings::create_meeting),
        )
        .route(
            "/meetings/{id}",
            patch(handlers::meetings::update_meeting).delete(handlers::meetings::delete_meeting),
        )
        .route(
            "/quotations",
            get(handlers::quotations::list_quotations).post(handlers::quotations::create_quotation),
        )
        .route(
            "/quotations/{id}",
            patch(handlers::quotations::update_quotation).delete(handlers::quotations::delete_quotation),
        )
        .route(
            "/followups",
            get(handlers::followups::list_followups).post(handlers::followups::create_followup),
        )
        .route("/followups/today", get(handlers::followups::list_today_followups))
        .route("/followups/overdue", get(handlers::followups::list_overdue_followups))
        .route(
            "/followups/{id}",
            patch(handlers::followups::update_followup).delete(handlers::followups::delete_followup),
        )
        .route("/followups/{id}/complete", post(handlers::followups::complete_followup));

    let catalog_routes = Router::new()
        .route(
            "/services",
            get(handlers::catalog::list_catalog).post(handlers::catalog::create_catalog_service),
        )
        .route("/customer-services", get(handlers::catalog::list_all_customer_services))
        .route(
            "/customer-services/{id}",
            patch(handlers::catalog::update_customer_service)
                .delete(handlers::catalog::remove_customer_service),
        );

    let team_routes = Router::new()
        .route("/me", get(handlers::users::get_me))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            patch(handlers::users::update_user).delete(handlers::users::delete_user),
        );

    let report_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/reports", get(handlers::dashboard::get_reports))
        .route("/reports/sources", get(handlers::dashboard::get_source_stats))
        .route("/reports/statuses", get(handlers::dashboard::get_status_stats))
        .route("/reports/conversion", get(handlers::dashboard::get_conversion_rate))
        .route("/reports/quotations", get(handlers::dashboard::get_quotation_stats))
        .route("/reports/rejection-reasons", get(handlers::dashboard::get_rejection_reasons))
        .route("/reports/monthly-growth", get(handlers::dashboard::get_monthly_growth))
        .route("/reports/weekly-new-customers", get(handlers::dashboard::get_weekly_new_customers))
        .route("/reports/followup-completion", get(handlers::dashboard::get_followup_completion))
        .route("/reports/employee-performance", get(handlers::dashboard::get_employee_performance));

    // Tudo que não é público passa pelo auth_guard
    let protected_routes = Router::new()
        .merge(customer_routes)
        .merge(pipeline_routes)
        .merge(catalog_routes)
        .merge(team_routes)
        .merge(report_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(app_state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Sem configuração válida a aplicação não sobe
    let app_state = match AppState::new().await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("🔥 Falha ao inicializar o estado da aplicação: {:#}", e);
            std::process::exit(1);
        }
    };

    let addr = app_state.settings.bind_addr.clone();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("🔥 Falha ao iniciar o listener TCP em {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("🚀 Servidor escutando em {}", addr);
    tracing::info!("📚 Documentação em http://{}/swagger-ui", addr);

    if let Err(e) = axum::serve(listener, app(app_state)).await {
        tracing::error!("🔥 Erro no servidor Axum: {}", e);
        std::process::exit(1);
    }
}
