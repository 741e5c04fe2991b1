// src/models/quotations.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_ext::double_option;
use crate::db::query::Table;
use crate::db::repository::{text, AuditRule, AuditTrigger, Entity};
use crate::models::crm::{ActivityType, CustomerSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Quotation {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub quotation_no: String, // Q-00001
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: Option<String>, // SAR, AED, USD, EUR (texto livre)
    #[serde(default)]
    pub services: Vec<String>,
    pub status: QuotationStatus,
    pub send_date: NaiveDate,
    pub validity_date: Option<NaiveDate>,
    pub reason: Option<String>, // motivo da recusa
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Quotation {
    const TABLE: Table = Table::Quotations;
    const ORDER: (&'static str, bool) = ("send_date", false);
    const AUDIT: &'static [AuditRule] = &[
        AuditRule {
            trigger: AuditTrigger::Created,
            kind: ActivityType::QuotationSent,
            describe: |row| format!("تم إرسال عرض رقم: {}", text(row, "quotation_no")),
        },
        AuditRule {
            trigger: AuditTrigger::FieldChanged("status"),
            kind: ActivityType::QuotationStatusChanged,
            describe: |row| {
                format!(
                    "تم تحديث حالة العرض {} إلى: {}",
                    text(row, "quotation_no"),
                    text(row, "status")
                )
            },
        },
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuotationWithCustomer {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub customer: Option<CustomerSummary>,
}

// O número é gerado pelo serviço; o cliente nunca o envia
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewQuotation {
    pub customer_id: Uuid,

    #[schema(value_type = f64, example = 15000.0)]
    pub amount: Decimal,

    #[schema(example = "SAR")]
    pub currency: Option<String>,

    #[serde(default)]
    pub services: Vec<String>,

    pub status: Option<QuotationStatus>,
    pub send_date: NaiveDate,
    pub validity_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

// Linha efetivamente gravada (entrada + número calculado)
#[derive(Debug, Clone, Serialize)]
pub struct QuotationRow {
    pub customer_id: Uuid,
    pub quotation_no: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub services: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QuotationStatus>,
    pub send_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QuotationRow {
    pub fn new(input: NewQuotation, quotation_no: String) -> Self {
        Self {
            customer_id: input.customer_id,
            quotation_no,
            amount: input.amount,
            currency: input.currency,
            services: input.services,
            status: input.status,
            send_date: input.send_date,
            validity_date: input.validity_date,
            reason: input.reason,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuotationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub currency: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuotationStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<NaiveDate>)]
    pub validity_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub reason: Option<Option<String>>,
}

/// `Q-00001`, `Q-00042`, ...
pub fn format_quotation_no(n: i64) -> String {
    format!("Q-{n:05}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotation_numbers_are_zero_padded() {
        assert_eq!(format_quotation_no(1), "Q-00001");
        assert_eq!(format_quotation_no(42), "Q-00042");
        assert_eq!(format_quotation_no(123456), "Q-123456");
    }
}
