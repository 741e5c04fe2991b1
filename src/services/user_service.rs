// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ActivityLog, DataGateway, TableRepository},
    models::auth::{NewUser, User, UserPatch, UserRole},
};

// Equipe exibida na tela de configurações
#[derive(Clone)]
pub struct UserService {
    users: TableRepository<User>,
}

impl UserService {
    pub fn new(gateway: Arc<dyn DataGateway>, activity_log: ActivityLog) -> Self {
        Self {
            users: TableRepository::new(gateway, activity_log),
        }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.list().await?)
    }

    pub async fn create(&self, input: &NewUser) -> Result<User, AppError> {
        let user = self.users.create(input).await?.record;
        tracing::info!("✅ Usuário '{}' criado com o papel {:?}", user.email, user.role);
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<User, AppError> {
        Ok(self.users.update(id, patch).await?.record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let user = self.users.find(id).await?;
        if user.role == UserRole::Admin {
            return Err(AppError::Conflict("Administradores não podem ser removidos".to_string()));
        }

        self.users.delete(id).await?;
        tracing::info!("🗑️ Usuário '{}' removido", user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Table;
    use crate::services::crm_service::CrmService;
    use crate::models::crm::CustomerPatch;
    use crate::test_support::{memory, new_customer, wire};

    fn user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            name: "Sara".into(),
            email: email.into(),
            phone: None,
            role,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_to_active_and_lists() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let users = UserService::new(gateway, log);

        let created = users.create(&user("sara@agency.sa", UserRole::Sales)).await.unwrap();
        assert!(created.is_active);

        let patch = UserPatch {
            role: Some(UserRole::Manager),
            ..Default::default()
        };
        assert_eq!(users.update(created.id, &patch).await.unwrap().role, UserRole::Manager);
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn admins_cannot_be_deleted() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let users = UserService::new(gateway, log);
        let admin = users.create(&user("boss@agency.sa", UserRole::Admin)).await.unwrap();

        let result = users.delete(admin.id).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(db.rows(Table::Users).len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_user_unassigns_their_customers() {
        let db = memory();
        let (gateway, log) = wire(&db);
        let crm = CrmService::new(gateway.clone(), log.clone());
        let users = UserService::new(gateway, log);

        let sales = users.create(&user("sales@agency.sa", UserRole::Sales)).await.unwrap();
        let customer = crm.create(&new_customer("Acme")).await.unwrap().record;
        let patch = CustomerPatch {
            assigned_to: Some(Some(sales.id)),
            ..Default::default()
        };
        crm.update(customer.id, &patch).await.unwrap();

        users.delete(sales.id).await.unwrap();

        let detail = crm.get_by_id(customer.id).await.unwrap();
        assert!(detail.customer.assigned_to.is_none());
    }
}
