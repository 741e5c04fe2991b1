// src/services/meeting_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ActivityLog, DataGateway, TableRepository, Written},
    models::meetings::{Meeting, MeetingPatch, MeetingWithCustomer, NewMeeting},
    services::crm_service::customer_embed,
};

#[derive(Clone)]
pub struct MeetingService {
    meetings: TableRepository<Meeting>,
}

impl MeetingService {
    pub fn new(gateway: Arc<dyn DataGateway>, activity_log: ActivityLog) -> Self {
        Self {
            meetings: TableRepository::new(gateway, activity_log),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<MeetingWithCustomer>, AppError> {
        let query = self.meetings.query().embed(customer_embed());
        Ok(self.meetings.fetch(&query).await?)
    }

    pub async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Meeting>, AppError> {
        Ok(self.meetings.list_by_customer(customer_id).await?)
    }

    pub async fn create(&self, input: &NewMeeting) -> Result<Written<Meeting>, AppError> {
        Ok(self.meetings.create(input).await?)
    }

    pub async fn update(&self, id: Uuid, patch: &MeetingPatch) -> Result<Meeting, AppError> {
        Ok(self.meetings.update(id, patch).await?.record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        Ok(self.meetings.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Table;
    use crate::models::meetings::MeetingType;
    use crate::services::crm_service::CrmService;
    use crate::test_support::{memory, new_customer, wire};
    use chrono::{TimeZone, Utc};

    fn meeting(customer_id: Uuid, day: u32) -> NewMeeting {
        NewMeeting {
            customer_id,
            meeting_date: Utc.with_ymd_and_hms(2026, 10, day, 10, 0, 0).unwrap(),
            meeting_type: MeetingType::InPerson,
            purpose: "Apresentação da proposta".into(),
            goal: None,
            summary: None,
            attachments: None,
        }
    }

    #[tokio::test]
    async fn create_logs_meeting_added_and_lists_newest_first() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let crm = CrmService::new(gateway.clone(), log.clone());
        let meetings = MeetingService::new(gateway, log);

        let customer = crm.create(&new_customer("Acme")).await.unwrap().record;
        meetings.create(&meeting(customer.id, 14)).await.unwrap();
        let written = meetings.create(&meeting(customer.id, 20)).await.unwrap();
        assert!(written.warning().is_none());

        let all = meetings.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].meeting.meeting_date.format("%d").to_string(), "20");
        assert_eq!(all[0].customer.as_ref().unwrap().name, "Acme");

        let activities = db.rows(Table::Activities);
        let added: Vec<_> = activities.iter().filter(|a| a["type"] == "meeting_added").collect();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0]["description"], "تم إضافة اجتماع: in_person");
    }

    #[tokio::test]
    async fn update_and_delete() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let crm = CrmService::new(gateway.clone(), log.clone());
        let meetings = MeetingService::new(gateway, log);

        let customer = crm.create(&new_customer("Acme")).await.unwrap().record;
        let id = meetings.create(&meeting(customer.id, 14)).await.unwrap().record.id;

        let patch = MeetingPatch {
            summary: Some(Some("Cliente aprovou".into())),
            ..Default::default()
        };
        let updated = meetings.update(id, &patch).await.unwrap();
        assert_eq!(updated.summary.as_deref(), Some("Cliente aprovou"));

        meetings.delete(id).await.unwrap();
        assert!(meetings.list_by_customer(customer.id).await.unwrap().is_empty());
    }
}
