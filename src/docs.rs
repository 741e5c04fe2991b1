// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::connection_test,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Customers ---
        handlers::crm::list_customers,
        handlers::crm::list_active_customers,
        handlers::crm::get_customer,
        handlers::crm::create_customer,
        handlers::crm::update_customer,
        handlers::crm::delete_customer,

        // --- Activities ---
        handlers::crm::list_activities,
        handlers::crm::add_note,
        handlers::crm::pending_activities,

        // --- Meetings ---
        handlers::meetings::list_meetings,
        handlers::meetings::list_customer_meetings,
        handlers::meetings::create_meeting,
        handlers::meetings::update_meeting,
        handlers::meetings::delete_meeting,

        // --- Quotations ---
        handlers::quotations::list_quotations,
        handlers::quotations::list_customer_quotations,
        handlers::quotations::create_quotation,
        handlers::quotations::update_quotation,
        handlers::quotations::delete_quotation,

        // --- Followups ---
        handlers::followups::list_followups,
        handlers::followups::list_today_followups,
        handlers::followups::list_overdue_followups,
        handlers::followups::list_customer_followups,
        handlers::followups::create_followup,
        handlers::followups::update_followup,
        handlers::followups::complete_followup,
        handlers::followups::delete_followup,

        // --- Services ---
        handlers::catalog::list_catalog,
        handlers::catalog::create_catalog_service,
        handlers::catalog::list_all_customer_services,
        handlers::catalog::list_customer_services,
        handlers::catalog::create_customer_service,
        handlers::catalog::assign_service,
        handlers::catalog::update_customer_service,
        handlers::catalog::remove_customer_service,

        // --- Dashboard / Reports ---
        handlers::dashboard::get_dashboard,
        handlers::dashboard::get_reports,
        handlers::dashboard::get_source_stats,
        handlers::dashboard::get_status_stats,
        handlers::dashboard::get_conversion_rate,
        handlers::dashboard::get_quotation_stats,
        handlers::dashboard::get_rejection_reasons,
        handlers::dashboard::get_monthly_growth,
        handlers::dashboard::get_weekly_new_customers,
        handlers::dashboard::get_followup_completion,
        handlers::dashboard::get_employee_performance,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::UserSummary,
            models::auth::NewUser,
            models::auth::UserPatch,
            models::auth::LoginPayload,
            models::auth::AdminIdentity,
            models::auth::LoginResponse,

            // --- CRM ---
            models::crm::CustomerStatus,
            models::crm::CustomerSource,
            models::crm::ActivityType,
            models::crm::Customer,
            models::crm::CustomerListItem,
            models::crm::ActiveCustomer,
            models::crm::CustomerDetail,
            models::crm::CustomerSummary,
            models::crm::NewCustomer,
            models::crm::CustomerPatch,
            models::crm::Activity,
            models::crm::NotePayload,

            // --- Meetings ---
            models::meetings::MeetingType,
            models::meetings::Meeting,
            models::meetings::MeetingWithCustomer,
            models::meetings::NewMeeting,
            models::meetings::MeetingPatch,

            // --- Quotations ---
            models::quotations::QuotationStatus,
            models::quotations::Quotation,
            models::quotations::QuotationWithCustomer,
            models::quotations::NewQuotation,
            models::quotations::QuotationPatch,

            // --- Followups ---
            models::followups::FollowupMethod,
            models::followups::Followup,
            models::followups::FollowupWithCustomer,
            models::followups::NewFollowup,
            models::followups::FollowupPatch,
            models::followups::FollowupUpdate,

            // --- Services ---
            models::services::Service,
            models::services::ServiceSummary,
            models::services::NewService,
            models::services::ServiceStatus,
            models::services::CustomerService,
            models::services::CustomerServiceWithService,
            models::services::CustomerServiceWithRelations,
            models::services::AssignServicePayload,
            models::services::CustomerServiceInput,
            models::services::CustomerServicePatch,

            // --- DASHBOARD ---
            models::dashboard::DashboardStats,
            models::dashboard::SourceCount,
            models::dashboard::StatusCount,
            models::dashboard::ReasonCount,
            models::dashboard::MonthlyCount,
            models::dashboard::DailyCount,
            models::dashboard::ConversionRate,
            models::dashboard::FollowupCompletion,
            models::dashboard::QuotationStats,
            models::dashboard::EmployeePerformance,
            models::dashboard::ReportBundle,
        )
    ),
    tags(
        (name = "Auth", description = "Login do administrador"),
        (name = "Health", description = "Conexão com o banco"),
        (name = "Users", description = "Equipe (tela de configurações)"),
        (name = "Customers", description = "Leads e clientes"),
        (name = "Activities", description = "Histórico de atividades e notas"),
        (name = "Meetings", description = "Reuniões"),
        (name = "Quotations", description = "Propostas comerciais"),
        (name = "Followups", description = "Follow-ups"),
        (name = "Services", description = "Catálogo e serviços contratados"),
        (name = "Dashboard", description = "Indicadores do dia"),
        (name = "Reports", description = "Relatórios agregados")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
