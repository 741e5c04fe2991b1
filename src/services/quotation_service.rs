// src/services/quotation_service.rs

use std::str::FromStr;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ActivityLog, DataGateway, TableRepository, Written},
    models::quotations::{
        format_quotation_no, NewQuotation, Quotation, QuotationPatch, QuotationRow, QuotationWithCustomer,
    },
    services::crm_service::customer_embed,
};

const QUOTATION_SEQUENCE: &str = "quotation_no";

/// Como o próximo `quotation_no` é calculado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotationNumbering {
    /// Sequência atômica do banco (`next_sequence('quotation_no')`).
    #[default]
    Sequence,
    /// Conta as propostas e soma 1. Duas criações simultâneas podem
    /// receber o mesmo número.
    Count,
}

impl FromStr for QuotationNumbering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequence" => Ok(Self::Sequence),
            "count" => Ok(Self::Count),
            other => Err(format!("QUOTATION_NUMBERING inválido: '{other}' (use sequence|count)")),
        }
    }
}

#[derive(Clone)]
pub struct QuotationService {
    quotations: TableRepository<Quotation>,
    gateway: Arc<dyn DataGateway>,
    numbering: QuotationNumbering,
}

impl QuotationService {
    pub fn new(gateway: Arc<dyn DataGateway>, activity_log: ActivityLog, numbering: QuotationNumbering) -> Self {
        Self {
            quotations: TableRepository::new(gateway.clone(), activity_log),
            gateway,
            numbering,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<QuotationWithCustomer>, AppError> {
        let query = self.quotations.query().embed(customer_embed());
        Ok(self.quotations.fetch(&query).await?)
    }

    pub async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Quotation>, AppError> {
        Ok(self.quotations.list_by_customer(customer_id).await?)
    }

    pub async fn next_number(&self) -> Result<String, AppError> {
        let n = match self.numbering {
            QuotationNumbering::Sequence => self.gateway.next_sequence(QUOTATION_SEQUENCE).await?,
            QuotationNumbering::Count => self.quotations.count(&[]).await? as i64 + 1,
        };
        Ok(format_quotation_no(n))
    }

    pub async fn create(&self, input: NewQuotation) -> Result<Written<Quotation>, AppError> {
        let quotation_no = self.next_number().await?;
        let row = QuotationRow::new(input, quotation_no);

        let written = self.quotations.create(&row).await?;
        tracing::info!("✅ Proposta {} criada", written.record.quotation_no);
        Ok(written)
    }

    pub async fn update(&self, id: Uuid, patch: &QuotationPatch) -> Result<Written<Quotation>, AppError> {
        Ok(self.quotations.update(id, patch).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        Ok(self.quotations.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryGateway, ReferentialPolicy, Table};
    use crate::models::quotations::QuotationStatus;
    use crate::services::crm_service::CrmService;
    use crate::test_support::{memory, new_customer, wire};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::HashSet;
    use std::time::Duration;

    fn quotation(customer_id: Uuid) -> NewQuotation {
        NewQuotation {
            customer_id,
            amount: Decimal::new(15000, 0),
            currency: Some("SAR".into()),
            services: vec!["SEO".into(), "Social media".into()],
            status: None,
            send_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            validity_date: None,
            reason: None,
        }
    }

    async fn setup(db: &Arc<MemoryGateway>, numbering: QuotationNumbering) -> (QuotationService, Uuid) {
        let (gateway, log) = wire(db);
        let crm = CrmService::new(gateway.clone(), log.clone());
        let customer = crm.create(&new_customer("Acme")).await.unwrap().record;
        (QuotationService::new(gateway, log, numbering), customer.id)
    }

    #[test]
    fn numbering_parses_from_config() {
        assert_eq!("sequence".parse(), Ok(QuotationNumbering::Sequence));
        assert_eq!(" COUNT ".parse(), Ok(QuotationNumbering::Count));
        assert!("uuid".parse::<QuotationNumbering>().is_err());
    }

    #[tokio::test]
    async fn sequential_creation_numbers_from_one_in_both_modes() {
        for numbering in [QuotationNumbering::Sequence, QuotationNumbering::Count] {
            let db = memory();
            let (quotations, customer) = setup(&db, numbering).await;

            let mut numbers = Vec::new();
            for _ in 0..3 {
                numbers.push(quotations.create(quotation(customer)).await.unwrap().record.quotation_no);
            }

            assert_eq!(numbers, ["Q-00001", "Q-00002", "Q-00003"], "{numbering:?}");
        }
    }

    #[tokio::test]
    async fn concurrent_count_numbering_can_duplicate() {
        let db = Arc::new(MemoryGateway::new(ReferentialPolicy::Cascade).with_latency(Duration::from_millis(10)));
        let (quotations, customer) = setup(&db, QuotationNumbering::Count).await;

        let (a, b) = tokio::join!(quotations.create(quotation(customer)), quotations.create(quotation(customer)));

        assert_eq!(a.unwrap().record.quotation_no, "Q-00001");
        assert_eq!(b.unwrap().record.quotation_no, "Q-00001");
    }

    #[tokio::test]
    async fn concurrent_sequence_numbering_never_duplicates() {
        let db = Arc::new(MemoryGateway::new(ReferentialPolicy::Cascade).with_latency(Duration::from_millis(10)));
        let (quotations, customer) = setup(&db, QuotationNumbering::Sequence).await;

        let (a, b, c) = tokio::join!(
            quotations.create(quotation(customer)),
            quotations.create(quotation(customer)),
            quotations.create(quotation(customer)),
        );

        let numbers: HashSet<String> = [a, b, c]
            .into_iter()
            .map(|r| r.unwrap().record.quotation_no)
            .collect();
        assert_eq!(numbers.len(), 3);
    }

    #[tokio::test]
    async fn create_and_status_change_are_logged() {
        let db = memory();
        let (quotations, customer) = setup(&db, QuotationNumbering::Sequence).await;

        let created = quotations.create(quotation(customer)).await.unwrap().record;
        assert_eq!(created.status, QuotationStatus::Draft);

        let patch = QuotationPatch {
            status: Some(QuotationStatus::Accepted),
            ..Default::default()
        };
        let updated = quotations.update(created.id, &patch).await.unwrap();
        assert_eq!(updated.record.status, QuotationStatus::Accepted);
        assert!(updated.warning().is_none());

        let activities = db.rows(Table::Activities);
        let sent = activities.iter().find(|a| a["type"] == "quotation_sent").unwrap();
        assert_eq!(sent["description"], "تم إرسال عرض رقم: Q-00001");
        let changed = activities.iter().find(|a| a["type"] == "quotation_status_changed").unwrap();
        assert!(changed["description"].as_str().unwrap().contains("accepted"));

        let listed = quotations.list_all().await.unwrap();
        assert_eq!(listed[0].customer.as_ref().unwrap().name, "Acme");
    }
}
