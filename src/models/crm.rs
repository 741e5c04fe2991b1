// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_ext::double_option;
use crate::db::query::Table;
use crate::db::repository::{text, AuditRule, AuditTrigger, Entity};
use crate::models::auth::UserSummary;
use crate::models::followups::Followup;
use crate::models::meetings::Meeting;
use crate::models::quotations::Quotation;
use crate::models::services::CustomerServiceWithService;

// --- ENUMS ---

// Etapas do funil de vendas. Transições livres, sem máquina de estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    NewContact,
    AppointmentSet,
    QuotationSent,
    FollowUp,
    ActiveClient,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 5] = [
        CustomerStatus::NewContact,
        CustomerStatus::AppointmentSet,
        CustomerStatus::QuotationSent,
        CustomerStatus::FollowUp,
        CustomerStatus::ActiveClient,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CustomerStatus::NewContact => "new_contact",
            CustomerStatus::AppointmentSet => "appointment_set",
            CustomerStatus::QuotationSent => "quotation_sent",
            CustomerStatus::FollowUp => "follow_up",
            CustomerStatus::ActiveClient => "active_client",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSource {
    Instagram,
    Whatsapp,
    Referral,
    Website,
    Advertisement,
    Other,
}

impl CustomerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerSource::Instagram => "instagram",
            CustomerSource::Whatsapp => "whatsapp",
            CustomerSource::Referral => "referral",
            CustomerSource::Website => "website",
            CustomerSource::Advertisement => "advertisement",
            CustomerSource::Other => "other",
        }
    }
}

/// Tipos aceitos pelo check constraint `activities_type_check`.
///
/// Qualquer outro valor é rejeitado na desserialização, antes de chegar ao banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Created,
    StatusChanged,
    MeetingAdded,
    QuotationSent,
    QuotationStatusChanged,
    FollowupAdded,
    FollowupCompleted,
    ServiceAdded,
    NoteAdded,
}

impl ActivityType {
    pub const ALL: [ActivityType; 9] = [
        ActivityType::Created,
        ActivityType::StatusChanged,
        ActivityType::MeetingAdded,
        ActivityType::QuotationSent,
        ActivityType::QuotationStatusChanged,
        ActivityType::FollowupAdded,
        ActivityType::FollowupCompleted,
        ActivityType::ServiceAdded,
        ActivityType::NoteAdded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Created => "created",
            ActivityType::StatusChanged => "status_changed",
            ActivityType::MeetingAdded => "meeting_added",
            ActivityType::QuotationSent => "quotation_sent",
            ActivityType::QuotationStatusChanged => "quotation_status_changed",
            ActivityType::FollowupAdded => "followup_added",
            ActivityType::FollowupCompleted => "followup_completed",
            ActivityType::ServiceAdded => "service_added",
            ActivityType::NoteAdded => "note_added",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: String, // Não é único: o mesmo número pode aparecer em dois leads
    pub email: Option<String>,
    pub source: CustomerSource,
    pub city: Option<String>,
    pub country: Option<String>,
    pub business_type: Option<String>,
    pub status: CustomerStatus,
    pub notes: Option<String>,
    pub reason_closed: Option<String>,
    pub assigned_to: Option<Uuid>, // null = sem responsável
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Customer {
    const TABLE: Table = Table::Customers;
    const ORDER: (&'static str, bool) = ("created_at", false);
    const SUBJECT: &'static str = "id";
    const AUDIT: &'static [AuditRule] = &[
        AuditRule {
            trigger: AuditTrigger::Created,
            kind: ActivityType::Created,
            describe: |row| format!("تم إضافة العميل: {}", text(row, "name")),
        },
        AuditRule {
            trigger: AuditTrigger::FieldChanged("status"),
            kind: ActivityType::StatusChanged,
            describe: |row| format!("تم تغيير الحالة إلى: {}", text(row, "status")),
        },
    ];
}

// Linha da listagem: cliente + responsável embutido
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerListItem {
    #[serde(flatten)]
    pub customer: Customer,
    pub assigned_user: Option<UserSummary>,
}

// Cliente ativo com os serviços contratados
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActiveCustomer {
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(default)]
    pub customer_services: Vec<CustomerServiceWithService>,
}

/// Ficha completa do cliente, montada numa única chamada com todos os joins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub assigned_user: Option<UserSummary>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    #[serde(default)]
    pub quotations: Vec<Quotation>,
    #[serde(default)]
    pub followups: Vec<Followup>,
    #[serde(default)]
    pub customer_services: Vec<CustomerServiceWithService>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

// Resumo embutido nas listagens de reuniões, propostas, etc.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewCustomer {
    #[validate(length(min = 1, message = "O nome é obrigatório"))]
    #[schema(example = "Acme")]
    pub name: String,

    #[validate(length(min = 1, message = "O telefone é obrigatório"))]
    #[schema(example = "0500000000")]
    pub phone: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub source: CustomerSource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,

    // Ausente = default do banco (new_contact)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
}

// PATCH: só os campos presentes vão para o banco; `null` limpa a coluna
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomerPatch {
    #[validate(length(min = 1, message = "O nome é obrigatório"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "O telefone é obrigatório"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<CustomerSource>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub city: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub country: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub business_type: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerStatus>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub reason_closed: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to: Option<Option<Uuid>>,
}

// Filtros de GET /api/customers
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerQuery {
    /// Busca em nome, telefone e e-mail
    pub q: Option<String>,
    pub status: Option<CustomerStatus>,
}

// --- HISTÓRICO ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Activity {
    const TABLE: Table = Table::Activities;
    const ORDER: (&'static str, bool) = ("created_at", false);
}

// Linha enviada ao banco pelo ActivityLog
#[derive(Debug, Clone, Serialize)]
pub struct NewActivity {
    pub customer_id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NotePayload {
    #[validate(length(min = 1, message = "A nota não pode ficar vazia"))]
    #[schema(example = "Cliente pediu retorno na próxima semana")]
    pub text: String,
}
