pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod followups;
pub mod meetings;
pub mod quotations;
pub mod services;
