// src/models/services.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_ext::{double_option, null_as_default};
use crate::db::query::Table;
use crate::db::repository::{text, AuditRule, AuditTrigger, Entity};
use crate::models::crm::{ActivityType, CustomerSummary};

// --- CATÁLOGO ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Service {
    const TABLE: Table = Table::Services;
    const ORDER: (&'static str, bool) = ("name", true);
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewService {
    #[validate(length(min = 1, message = "O nome do serviço é obrigatório"))]
    #[schema(example = "Gestão de redes sociais")]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// --- SERVIÇOS CONTRATADOS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Active,
    Completed,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerService {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    #[serde(default)]
    pub service_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ServiceStatus,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for CustomerService {
    const TABLE: Table = Table::CustomerServices;
    const ORDER: (&'static str, bool) = ("start_date", false);
    const AUDIT: &'static [AuditRule] = &[AuditRule {
        trigger: AuditTrigger::Created,
        kind: ActivityType::ServiceAdded,
        describe: |row| format!("تم إضافة خدمة: {}", text(row, "service_name")),
    }];
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerServiceWithService {
    #[serde(flatten)]
    pub assignment: CustomerService,
    pub service: Option<ServiceSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerServiceWithRelations {
    #[serde(flatten)]
    pub assignment: CustomerService,
    pub service: Option<ServiceSummary>,
    pub customer: Option<CustomerSummary>,
}

// Linha gravada em customer_services
#[derive(Debug, Clone, Serialize)]
pub struct NewCustomerService {
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// POST /api/customers/{id}/services/assign
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignServicePayload {
    pub service_id: Uuid,
}

// POST /api/customers/{id}/services: cria o serviço no catálogo e já vincula
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CustomerServiceInput {
    #[validate(length(min = 1, message = "O nome do serviço é obrigatório"))]
    pub service_name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ServiceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomerServicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<NaiveDate>)]
    pub end_date: Option<Option<NaiveDate>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}
