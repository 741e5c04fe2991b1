pub mod auth;
pub mod catalog_service;
pub mod crm_service;
pub mod dashboard_service;
pub mod followup_service;
pub mod meeting_service;
pub mod quotation_service;
pub mod user_service;
