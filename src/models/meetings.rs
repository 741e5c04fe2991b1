// src/models/meetings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_ext::double_option;
use crate::db::query::Table;
use crate::db::repository::{text, AuditRule, AuditTrigger, Entity};
use crate::models::crm::{ActivityType, CustomerSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    InPerson,
    Online,
    Phone,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Meeting {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub meeting_date: DateTime<Utc>,
    pub meeting_type: MeetingType,
    pub purpose: String,
    pub goal: Option<String>,
    pub summary: Option<String>,
    pub attachments: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Meeting {
    const TABLE: Table = Table::Meetings;
    const ORDER: (&'static str, bool) = ("meeting_date", false);
    const AUDIT: &'static [AuditRule] = &[AuditRule {
        trigger: AuditTrigger::Created,
        kind: ActivityType::MeetingAdded,
        describe: |row| format!("تم إضافة اجتماع: {}", text(row, "meeting_type")),
    }];
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeetingWithCustomer {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub customer: Option<CustomerSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewMeeting {
    pub customer_id: Uuid,
    pub meeting_date: DateTime<Utc>,
    pub meeting_type: MeetingType,

    #[validate(length(min = 1, message = "Informe o objetivo da reunião"))]
    pub purpose: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct MeetingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_type: Option<MeetingType>,

    #[validate(length(min = 1, message = "Informe o objetivo da reunião"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub goal: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub summary: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub attachments: Option<Option<String>>,
}
