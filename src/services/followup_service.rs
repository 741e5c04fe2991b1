// src/services/followup_service.rs

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    common::{error::AppError, time::day_bounds},
    db::{query::Filter, ActivityLog, DataGateway, Query, Table, TableRepository, Written},
    models::followups::{Followup, FollowupPatch, FollowupUpdate, FollowupWithCustomer, NewFollowup},
    services::crm_service::customer_embed,
};

/// Follow-ups pendentes de hoje: `[00:00 de hoje, 00:00 de amanhã)` no fuso de `now`.
pub fn due_today_filters<Tz>(now: &DateTime<Tz>) -> Vec<Filter>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (start, end) = day_bounds(now);
    vec![
        Filter::Gte("followup_date".into(), start.to_rfc3339().into()),
        Filter::Lt("followup_date".into(), end.to_rfc3339().into()),
        Filter::Eq("is_done".into(), false.into()),
    ]
}

#[derive(Clone)]
pub struct FollowupService {
    followups: TableRepository<Followup>,
}

impl FollowupService {
    pub fn new(gateway: Arc<dyn DataGateway>, activity_log: ActivityLog) -> Self {
        Self {
            followups: TableRepository::new(gateway, activity_log),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<FollowupWithCustomer>, AppError> {
        let query = self.followups.query().embed(customer_embed());
        Ok(self.followups.fetch(&query).await?)
    }

    pub async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Followup>, AppError> {
        Ok(self.followups.list_by_customer(customer_id).await?)
    }

    pub async fn today(&self) -> Result<Vec<FollowupWithCustomer>, AppError> {
        self.today_at(&Local::now()).await
    }

    pub async fn today_at<Tz>(&self, now: &DateTime<Tz>) -> Result<Vec<FollowupWithCustomer>, AppError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut query = Query::table(Table::Followups)
            .embed(customer_embed())
            .order("followup_date", true);
        query.filters = due_today_filters(now);

        Ok(self.followups.fetch(&query).await?)
    }

    // Atrasados: data já passou e ainda não foram feitos, o mais antigo primeiro
    pub async fn overdue(&self) -> Result<Vec<FollowupWithCustomer>, AppError> {
        self.overdue_at(Utc::now()).await
    }

    pub async fn overdue_at(&self, now: DateTime<Utc>) -> Result<Vec<FollowupWithCustomer>, AppError> {
        let query = Query::table(Table::Followups)
            .embed(customer_embed())
            .lt("followup_date", now.to_rfc3339())
            .eq("is_done", false)
            .order("followup_date", true);

        Ok(self.followups.fetch(&query).await?)
    }

    pub async fn create(&self, input: &NewFollowup) -> Result<Written<Followup>, AppError> {
        Ok(self.followups.create(input).await?)
    }

    /// Marcar `is_done = true` registra "followup_completed". Se o histórico
    /// falhar, o update vale e volta um aviso para o usuário.
    pub async fn update(&self, id: Uuid, patch: &FollowupPatch) -> Result<FollowupUpdate, AppError> {
        let written = self.followups.update(id, patch).await?;
        let warning = written.warning();

        if let Some(reason) = &warning {
            tracing::warn!("⚠️ Follow-up {} atualizado sem histórico: {}", id, reason);
        }

        Ok(FollowupUpdate {
            followup: written.record,
            warning,
        })
    }

    pub async fn complete(&self, id: Uuid) -> Result<FollowupUpdate, AppError> {
        let patch = FollowupPatch {
            is_done: Some(true),
            ..Default::default()
        };
        self.update(id, &patch).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        Ok(self.followups.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryGateway, ReferentialPolicy};
    use crate::models::followups::FollowupMethod;
    use crate::services::crm_service::CrmService;
    use crate::test_support::{memory, new_customer, wire};
    use chrono::FixedOffset;

    fn riyadh() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn followup(customer_id: Uuid, at: DateTime<Utc>) -> NewFollowup {
        NewFollowup {
            customer_id,
            followup_date: at,
            method: FollowupMethod::Call,
            notes: "Ligar para confirmar".into(),
            next_followup: None,
            assigned_to: None,
        }
    }

    async fn setup(db: &Arc<MemoryGateway>) -> (FollowupService, Uuid) {
        let (gateway, log) = wire(db);
        let crm = CrmService::new(gateway.clone(), log.clone());
        let customer = crm.create(&new_customer("Acme")).await.unwrap().record;
        (FollowupService::new(gateway, log), customer.id)
    }

    #[tokio::test]
    async fn today_is_a_half_open_local_day_of_pending_followups() {
        let db = memory();
        let (followups, customer) = setup(&db).await;
        let tz = riyadh();
        let now = tz.with_ymd_and_hms(2026, 10, 16, 15, 0, 0).unwrap();
        let at = |d: u32, h: u32| tz.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap().with_timezone(&Utc);

        let morning = followups.create(&followup(customer, at(16, 0))).await.unwrap().record;
        followups.create(&followup(customer, at(16, 23))).await.unwrap();
        // meia-noite de amanhã fica de fora
        followups.create(&followup(customer, at(17, 0))).await.unwrap();
        followups.create(&followup(customer, at(15, 23))).await.unwrap();
        let done = followups.create(&followup(customer, at(16, 12))).await.unwrap().record;
        followups.complete(done.id).await.unwrap();

        let today = followups.today_at(&now).await.unwrap();

        assert_eq!(today.len(), 2);
        assert_eq!(today[0].followup.id, morning.id);
        assert!(today.iter().all(|f| !f.followup.is_done));
        assert_eq!(today[0].customer.as_ref().unwrap().name, "Acme");
    }

    #[tokio::test]
    async fn overdue_lists_past_pending_oldest_first() {
        let db = memory();
        let (followups, customer) = setup(&db).await;
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();

        let older = followups
            .create(&followup(customer, Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()))
            .await
            .unwrap()
            .record;
        followups
            .create(&followup(customer, Utc.with_ymd_and_hms(2026, 10, 10, 9, 0, 0).unwrap()))
            .await
            .unwrap();
        followups
            .create(&followup(customer, Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap()))
            .await
            .unwrap();

        let overdue = followups.overdue_at(now).await.unwrap();
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].followup.id, older.id);
    }

    #[tokio::test]
    async fn completing_logs_followup_completed() {
        let db = memory();
        let (followups, customer) = setup(&db).await;
        let id = followups.create(&followup(customer, Utc::now())).await.unwrap().record.id;

        let result = followups.complete(id).await.unwrap();

        assert!(result.followup.is_done);
        assert!(result.warning.is_none());
        let kinds: Vec<_> = db
            .rows(Table::Activities)
            .iter()
            .map(|a| a["type"].as_str().unwrap_or_default().to_string())
            .collect();
        assert!(kinds.contains(&"followup_added".to_string()));
        assert!(kinds.contains(&"followup_completed".to_string()));
    }

    #[tokio::test]
    async fn rejected_completion_activity_becomes_a_soft_warning() {
        let db = Arc::new(
            MemoryGateway::new(ReferentialPolicy::Cascade)
                .with_activity_types(&["created", "followup_added"]),
        );
        let (followups, customer) = setup(&db).await;
        let id = followups.create(&followup(customer, Utc::now())).await.unwrap().record.id;

        let result = followups.complete(id).await.unwrap();

        assert!(result.followup.is_done);
        assert!(result.warning.unwrap().contains("activities_type_check"));
    }
}
