// src/services/crm_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ActivityLog, DataGateway, Embed, Query, Table, TableRepository, Written},
    models::crm::{
        ActiveCustomer, Activity, Customer, CustomerDetail, CustomerListItem, CustomerPatch,
        CustomerStatus, NewCustomer,
    },
    services::catalog_service::service_embed,
};

// =============================================================================
//  JOINS COMPARTILHADOS
// =============================================================================

pub fn assigned_user_embed() -> Embed {
    Embed::one("assigned_user", Table::Users, "assigned_to").columns(&["id", "name", "email", "phone"])
}

// Resumo do cliente nas listagens de reuniões, propostas, follow-ups...
pub fn customer_embed() -> Embed {
    Embed::one("customer", Table::Customers, "customer_id").columns(&["id", "name", "phone"])
}

pub fn customer_services_embed() -> Embed {
    Embed::many(Table::CustomerServices, "customer_id")
        .embed(service_embed())
}

#[derive(Clone)]
pub struct CrmService {
    customers: TableRepository<Customer>,
    activities: TableRepository<Activity>,
    activity_log: ActivityLog,
}

impl CrmService {
    pub fn new(gateway: Arc<dyn DataGateway>, activity_log: ActivityLog) -> Self {
        Self {
            customers: TableRepository::new(gateway.clone(), activity_log.clone()),
            activities: TableRepository::new(gateway, activity_log.clone()),
            activity_log,
        }
    }

    // =========================================================================
    //  1. LISTAGENS
    // =========================================================================

    pub async fn list(&self) -> Result<Vec<CustomerListItem>, AppError> {
        let query = self.customers.query().embed(assigned_user_embed());
        Ok(self.customers.fetch(&query).await?)
    }

    // Nome, telefone ou e-mail contendo o termo
    pub async fn search(&self, term: &str) -> Result<Vec<CustomerListItem>, AppError> {
        let query = self
            .customers
            .query()
            .embed(assigned_user_embed())
            .search(&["name", "phone", "email"], term);
        Ok(self.customers.fetch(&query).await?)
    }

    pub async fn filter_by_status(&self, status: CustomerStatus) -> Result<Vec<CustomerListItem>, AppError> {
        let query = self
            .customers
            .query()
            .embed(assigned_user_embed())
            .eq("status", status.as_str());
        Ok(self.customers.fetch(&query).await?)
    }

    // Página "clientes ativos": só active_client, com os serviços contratados
    pub async fn list_active(&self) -> Result<Vec<ActiveCustomer>, AppError> {
        let query = self
            .customers
            .query()
            .eq("status", CustomerStatus::ActiveClient.as_str())
            .embed(customer_services_embed());
        Ok(self.customers.fetch(&query).await?)
    }

    /// Ficha completa numa única ida ao banco.
    pub async fn get_by_id(&self, id: Uuid) -> Result<CustomerDetail, AppError> {
        let query = Query::table(Table::Customers)
            .eq("id", id.to_string())
            .embed(assigned_user_embed())
            .embed(Embed::many(Table::Meetings, "customer_id"))
            .embed(Embed::many(Table::Quotations, "customer_id"))
            .embed(Embed::many(Table::Followups, "customer_id"))
            .embed(customer_services_embed())
            .embed(Embed::many(Table::Activities, "customer_id"));

        let mut detail: CustomerDetail = self.customers.fetch_one(&query).await?;

        // Os arrays embutidos chegam sem ordem garantida
        detail.meetings.sort_by(|a, b| b.meeting_date.cmp(&a.meeting_date));
        detail.quotations.sort_by(|a, b| b.send_date.cmp(&a.send_date));
        detail.followups.sort_by(|a, b| b.followup_date.cmp(&a.followup_date));
        detail
            .customer_services
            .sort_by(|a, b| b.assignment.start_date.cmp(&a.assignment.start_date));
        detail.activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(detail)
    }

    // =========================================================================
    //  2. ESCRITA
    // =========================================================================

    pub async fn create(&self, input: &NewCustomer) -> Result<Written<Customer>, AppError> {
        let written = self.customers.create(input).await?;
        tracing::info!("✅ Cliente '{}' criado ({})", written.record.name, written.record.id);
        Ok(written)
    }

    // Mudança de status gera histórico; falha no histórico não desfaz o update
    pub async fn update(&self, id: Uuid, patch: &CustomerPatch) -> Result<Written<Customer>, AppError> {
        Ok(self.customers.update(id, patch).await?)
    }

    // Apaga de vez. O que acontece com os filhos é regra do banco.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.customers.delete(id).await?;
        tracing::info!("🗑️ Cliente {} removido", id);
        Ok(true)
    }

    // =========================================================================
    //  3. HISTÓRICO
    // =========================================================================

    pub async fn activities(&self, customer_id: Uuid) -> Result<Vec<Activity>, AppError> {
        Ok(self.activities.list_by_customer(customer_id).await?)
    }

    pub async fn add_note(&self, customer_id: Uuid, text: &str) -> Result<Activity, AppError> {
        Ok(self.activity_log.add_note(customer_id, text).await?)
    }

    /// Registros de histórico esperando reenvio.
    pub fn pending_activities(&self) -> usize {
        self.activity_log.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DataGateway, MemoryGateway, ReferentialPolicy};
    use crate::models::crm::{ActivityType, CustomerSource};
    use crate::test_support::{memory, new_customer, wire};
    use serde_json::json;

    fn service(memory: &Arc<MemoryGateway>) -> CrmService {
        let (gateway, log) = wire(memory);
        CrmService::new(gateway, log)
    }

    async fn add_meeting(memory: &MemoryGateway, customer_id: Uuid) -> Uuid {
        let row = memory
            .insert(
                Table::Meetings,
                json!({
                    "customer_id": customer_id,
                    "meeting_date": "2026-10-16T10:00:00Z",
                    "meeting_type": "online",
                    "purpose": "Apresentação"
                }),
            )
            .await
            .unwrap();
        row["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn new_customer_starts_as_new_contact_with_empty_children() {
        let db = memory();
        let crm = service(&db);

        let created = crm.create(&new_customer("Acme")).await.unwrap();
        let detail = crm.get_by_id(created.record.id).await.unwrap();

        assert_eq!(detail.customer.status, CustomerStatus::NewContact);
        assert!(detail.meetings.is_empty());
        assert!(detail.quotations.is_empty());
        assert!(detail.followups.is_empty());
        assert!(detail.customer_services.is_empty());
        assert_eq!(detail.activities.len(), 1);
        assert_eq!(detail.activities[0].activity_type, ActivityType::Created);
        assert!(detail.activities[0].description.contains("Acme"));
    }

    #[tokio::test]
    async fn create_succeeds_even_when_history_is_down() {
        let db = memory();
        let crm = service(&db);
        db.set_failing(Table::Activities, true);

        let created = crm.create(&new_customer("Acme")).await.unwrap();
        assert!(created.warning().is_some());
        assert_eq!(crm.pending_activities(), 1);

        db.set_failing(Table::Activities, false);
        // ainda não houve outra escrita de histórico: nada foi reenviado
        let detail = crm.get_by_id(created.record.id).await.unwrap();
        assert!(detail.activities.is_empty());
    }

    #[tokio::test]
    async fn status_update_sticks_regardless_of_activity_outcome() {
        let db = Arc::new(
            MemoryGateway::new(ReferentialPolicy::Cascade).with_activity_types(&["created"]),
        );
        let crm = service(&db);
        let id = crm.create(&new_customer("Acme")).await.unwrap().record.id;

        let patch = CustomerPatch {
            status: Some(CustomerStatus::QuotationSent),
            ..Default::default()
        };
        let written = crm.update(id, &patch).await.unwrap();

        assert_eq!(written.record.status, CustomerStatus::QuotationSent);
        assert!(written.warning().is_some());
        assert_eq!(crm.get_by_id(id).await.unwrap().customer.status, CustomerStatus::QuotationSent);
    }

    #[tokio::test]
    async fn acme_end_to_end() {
        let db = memory();
        let crm = service(&db);

        let input = NewCustomer {
            phone: "+96890000000".into(),
            source: CustomerSource::Referral,
            city: None,
            ..new_customer("Acme")
        };
        let acme = crm.create(&input).await.unwrap().record;
        assert_eq!(acme.status, CustomerStatus::NewContact);
        assert_eq!(acme.phone, "+96890000000");
        assert_eq!(acme.source, CustomerSource::Referral);

        let patch = CustomerPatch {
            status: Some(CustomerStatus::ActiveClient),
            ..Default::default()
        };
        let updated = crm.update(acme.id, &patch).await.unwrap();
        assert!(updated.warning().is_none());

        let activities = crm.activities(acme.id).await.unwrap();
        let changed = activities
            .iter()
            .find(|a| a.activity_type == ActivityType::StatusChanged)
            .expect("status_changed registrado");
        assert!(changed.description.contains("active_client"));

        let detail = crm.get_by_id(acme.id).await.unwrap();
        assert_eq!(detail.customer.status, CustomerStatus::ActiveClient);
        assert_eq!(crm.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_cascades_under_store_policy() {
        let db = memory();
        let crm = service(&db);
        let id = crm.create(&new_customer("Acme")).await.unwrap().record.id;
        add_meeting(&db, id).await;

        assert!(crm.delete(id).await.unwrap());

        assert!(matches!(
            crm.get_by_id(id).await,
            Err(AppError::GatewayError(crate::db::GatewayError::NotFound(Table::Customers)))
        ));
        assert!(db.rows(Table::Meetings).is_empty());
        assert!(db.rows(Table::Activities).is_empty());
    }

    #[tokio::test]
    async fn delete_without_cascade_leaves_reachable_orphans() {
        let db = Arc::new(MemoryGateway::new(ReferentialPolicy::Unenforced));
        let crm = service(&db);
        let id = crm.create(&new_customer("Acme")).await.unwrap().record.id;
        let meeting_id = add_meeting(&db, id).await;

        crm.delete(id).await.unwrap();

        let orphan = db
            .select_one(&Query::table(Table::Meetings).eq("id", meeting_id.to_string()))
            .await
            .unwrap();
        assert_eq!(orphan["customer_id"], json!(id));
        assert_eq!(crm.activities(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_and_status_filters() {
        let db = memory();
        let crm = service(&db);
        crm.create(&new_customer("Acme")).await.unwrap();
        let mut other = new_customer("Globex");
        other.phone = "0599999999".into();
        other.status = Some(CustomerStatus::FollowUp);
        crm.create(&other).await.unwrap();

        let found = crm.search("glob").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer.name, "Globex");

        let by_phone = crm.search("0599").await.unwrap();
        assert_eq!(by_phone.len(), 1);

        let follow_up = crm.filter_by_status(CustomerStatus::FollowUp).await.unwrap();
        assert_eq!(follow_up.len(), 1);
        assert_eq!(crm.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_embeds_the_assigned_user() {
        let db = memory();
        let crm = service(&db);
        let user = db
            .insert(Table::Users, json!({ "name": "Sara", "email": "sara@agency.sa", "role": "sales" }))
            .await
            .unwrap();

        let mut input = new_customer("Acme");
        input.assigned_to = user["id"].as_str().and_then(|s| s.parse().ok());
        crm.create(&input).await.unwrap();

        let list = crm.list().await.unwrap();
        assert_eq!(list[0].assigned_user.as_ref().unwrap().name, "Sara");
    }

    #[tokio::test]
    async fn notes_are_strict_activities() {
        let db = memory();
        let crm = service(&db);
        let id = crm.create(&new_customer("Acme")).await.unwrap().record.id;

        let note = crm.add_note(id, "ligar amanhã").await.unwrap();
        assert_eq!(note.activity_type, ActivityType::NoteAdded);

        db.set_failing(Table::Activities, true);
        assert!(crm.add_note(id, "outra").await.is_err());
    }
}
