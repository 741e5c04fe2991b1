// src/services/catalog_service.rs

use std::sync::Arc;

use chrono::Local;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ActivityLog, DataGateway, Embed, Table, TableRepository, Written},
    models::services::{
        CustomerService, CustomerServiceInput, CustomerServicePatch, CustomerServiceWithRelations,
        CustomerServiceWithService, NewCustomerService, NewService, Service,
    },
    services::crm_service::customer_embed,
};

pub fn service_embed() -> Embed {
    Embed::one("service", Table::Services, "service_id").columns(&["id", "name", "description"])
}

// Catálogo de serviços + serviços contratados por cliente
#[derive(Clone)]
pub struct CatalogService {
    catalog: TableRepository<Service>,
    assignments: TableRepository<CustomerService>,
}

impl CatalogService {
    pub fn new(gateway: Arc<dyn DataGateway>, activity_log: ActivityLog) -> Self {
        Self {
            catalog: TableRepository::new(gateway.clone(), activity_log.clone()),
            assignments: TableRepository::new(gateway, activity_log),
        }
    }

    // =============================================================================
    //  CATÁLOGO
    // =============================================================================

    pub async fn list_catalog(&self) -> Result<Vec<Service>, AppError> {
        let query = self.catalog.query().eq("is_active", true);
        Ok(self.catalog.fetch(&query).await?)
    }

    pub async fn create_catalog_service(&self, input: &NewService) -> Result<Service, AppError> {
        let service = self.catalog.create(input).await?.record;
        tracing::info!("✅ Serviço '{}' adicionado ao catálogo", service.name);
        Ok(service)
    }

    // =============================================================================
    //  SERVIÇOS DO CLIENTE
    // =============================================================================

    pub async fn list_customer_services(&self, customer_id: Uuid) -> Result<Vec<CustomerServiceWithService>, AppError> {
        let query = self
            .assignments
            .query()
            .eq("customer_id", customer_id.to_string())
            .embed(service_embed());
        Ok(self.assignments.fetch(&query).await?)
    }

    pub async fn list_all_customer_services(&self) -> Result<Vec<CustomerServiceWithRelations>, AppError> {
        let query = self
            .assignments
            .query()
            .embed(service_embed())
            .embed(customer_embed());
        Ok(self.assignments.fetch(&query).await?)
    }

    /// Vincula um serviço do catálogo ao cliente, começando hoje.
    pub async fn assign(&self, customer_id: Uuid, service_id: Uuid) -> Result<Written<CustomerService>, AppError> {
        let service = self.catalog.find(service_id).await?;

        let row = NewCustomerService {
            customer_id,
            service_id: service.id,
            service_name: service.name,
            start_date: Local::now().date_naive(),
            end_date: None,
            status: None,
            notes: None,
        };
        Ok(self.assignments.create(&row).await?)
    }

    /// Cria sempre uma nova linha no catálogo (sem deduplicar pelo nome) e vincula ao cliente.
    pub async fn create_for_customer(
        &self,
        customer_id: Uuid,
        input: CustomerServiceInput,
    ) -> Result<Written<CustomerService>, AppError> {
        let service = self
            .create_catalog_service(&NewService {
                name: input.service_name,
                description: input.description,
            })
            .await?;

        let row = NewCustomerService {
            customer_id,
            service_id: service.id,
            service_name: service.name,
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status,
            notes: input.notes,
        };
        Ok(self.assignments.create(&row).await?)
    }

    pub async fn update_customer_service(
        &self,
        id: Uuid,
        patch: &CustomerServicePatch,
    ) -> Result<CustomerService, AppError> {
        Ok(self.assignments.update(id, patch).await?.record)
    }

    pub async fn remove_customer_service(&self, id: Uuid) -> Result<(), AppError> {
        tracing::info!("🗑️ Removendo serviço contratado {}", id);
        Ok(self.assignments.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::GatewayError;
    use crate::models::services::ServiceStatus;
    use crate::services::crm_service::CrmService;
    use crate::test_support::{memory, new_customer, wire};
    use chrono::NaiveDate;

    fn input(name: &str) -> CustomerServiceInput {
        CustomerServiceInput {
            service_name: name.into(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            end_date: None,
            status: None,
            notes: Some("Plano mensal".into()),
        }
    }

    #[tokio::test]
    async fn create_for_customer_always_adds_a_catalog_row() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let crm = CrmService::new(gateway.clone(), log.clone());
        let catalog = CatalogService::new(gateway, log);
        let customer = crm.create(&new_customer("Acme")).await.unwrap().record;

        catalog.create_for_customer(customer.id, input("SEO")).await.unwrap();
        let written = catalog.create_for_customer(customer.id, input("SEO")).await.unwrap();

        assert_eq!(written.record.status, ServiceStatus::Active);
        assert_eq!(catalog.list_catalog().await.unwrap().len(), 2);

        let listed = catalog.list_customer_services(customer.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].service.as_ref().unwrap().name, "SEO");

        let added: Vec<_> = db
            .rows(Table::Activities)
            .into_iter()
            .filter(|a| a["type"] == "service_added")
            .collect();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0]["description"], "تم إضافة خدمة: SEO");
    }

    #[tokio::test]
    async fn assign_links_an_existing_service_starting_today() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let crm = CrmService::new(gateway.clone(), log.clone());
        let catalog = CatalogService::new(gateway, log);
        let customer = crm.create(&new_customer("Acme")).await.unwrap().record;
        let service = catalog
            .create_catalog_service(&NewService {
                name: "Branding".into(),
                description: Some("Identidade visual completa".into()),
            })
            .await
            .unwrap();

        let assigned = catalog.assign(customer.id, service.id).await.unwrap().record;

        assert_eq!(assigned.service_name, "Branding");
        assert_eq!(assigned.start_date, Local::now().date_naive());

        let all = catalog.list_all_customer_services().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].customer.as_ref().unwrap().name, "Acme");
        let summary = all[0].service.as_ref().unwrap();
        assert_eq!(summary.id, service.id);
        assert_eq!(summary.description.as_deref(), Some("Identidade visual completa"));

        let detail = crm.get_by_id(customer.id).await.unwrap();
        let linked = detail.customer_services[0].service.as_ref().unwrap();
        assert_eq!(linked.description.as_deref(), Some("Identidade visual completa"));
    }

    #[tokio::test]
    async fn assigning_an_unknown_service_is_not_found() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let catalog = CatalogService::new(gateway, log);

        let result = catalog.assign(Uuid::new_v4(), Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::GatewayError(GatewayError::NotFound(Table::Services)))));
    }

    #[tokio::test]
    async fn update_and_remove_customer_service() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let crm = CrmService::new(gateway.clone(), log.clone());
        let catalog = CatalogService::new(gateway, log);
        let customer = crm.create(&new_customer("Acme")).await.unwrap().record;
        let id = catalog.create_for_customer(customer.id, input("Ads")).await.unwrap().record.id;

        let patch = CustomerServicePatch {
            status: Some(ServiceStatus::Paused),
            end_date: Some(Some(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap())),
            ..Default::default()
        };
        let updated = catalog.update_customer_service(id, &patch).await.unwrap();
        assert_eq!(updated.status, ServiceStatus::Paused);
        assert!(updated.end_date.is_some());

        catalog.remove_customer_service(id).await.unwrap();
        assert!(catalog.list_customer_services(customer.id).await.unwrap().is_empty());
    }
}
