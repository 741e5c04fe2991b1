// src/models/followups.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_ext::{double_option, null_as_default};
use crate::db::query::Table;
use crate::db::repository::{text, AuditRule, AuditTrigger, Entity};
use crate::models::crm::{ActivityType, CustomerSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FollowupMethod {
    Call,
    Whatsapp,
    Email,
    Meeting,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Followup {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub followup_date: DateTime<Utc>,
    pub method: FollowupMethod,
    #[serde(default)]
    pub notes: String,
    pub next_followup: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_done: bool,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Followup {
    const TABLE: Table = Table::Followups;
    const ORDER: (&'static str, bool) = ("followup_date", false);
    const AUDIT: &'static [AuditRule] = &[
        AuditRule {
            trigger: AuditTrigger::Created,
            kind: ActivityType::FollowupAdded,
            describe: |row| format!("تم إضافة متابعة: {}", text(row, "method")),
        },
        AuditRule {
            trigger: AuditTrigger::FlagRaised("is_done"),
            kind: ActivityType::FollowupCompleted,
            describe: |_| "تم إكمال المتابعة".to_string(),
        },
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowupWithCustomer {
    #[serde(flatten)]
    pub followup: Followup,
    pub customer: Option<CustomerSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewFollowup {
    pub customer_id: Uuid,
    pub followup_date: DateTime<Utc>,
    pub method: FollowupMethod,

    #[serde(default)]
    pub notes: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_followup: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct FollowupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followup_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<FollowupMethod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub next_followup: Option<Option<DateTime<Utc>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to: Option<Option<Uuid>>,
}

/// Resultado de uma atualização cujo registro no histórico pode ter falhado.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FollowupUpdate {
    pub followup: Followup,
    /// Aviso para o usuário quando o histórico não pôde ser gravado
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
