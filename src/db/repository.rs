// src/db/repository.rs

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::activity_log::{ActivityLog, ActivityOutcome};
use super::gateway::{DataGateway, GatewayError};
use super::query::{Filter, Query, Table};
use crate::models::crm::ActivityType;

// =============================================================================
//  DESCRIÇÃO DECLARATIVA DAS TABELAS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTrigger {
    /// Toda inserção.
    Created,
    /// A coluna veio no PATCH (mesmo que com o valor antigo).
    FieldChanged(&'static str),
    /// A coluna veio no PATCH com `true`.
    FlagRaised(&'static str),
}

/// Uma linha no histórico do cliente disparada por uma escrita.
#[derive(Debug, Clone, Copy)]
pub struct AuditRule {
    pub trigger: AuditTrigger,
    pub kind: ActivityType,
    pub describe: fn(&Value) -> String,
}

pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;
    /// Ordem padrão das listagens: (coluna, ascendente).
    const ORDER: (&'static str, bool);
    /// Coluna que aponta para o cliente dono do histórico.
    const SUBJECT: &'static str = "customer_id";
    const AUDIT: &'static [AuditRule] = &[];
}

// Texto de uma coluna para montar descrições ("" quando ausente)
pub fn text<'a>(row: &'a Value, column: &str) -> &'a str {
    row.get(column).and_then(Value::as_str).unwrap_or_default()
}

/// Linha gravada + o destino de cada registro de histórico disparado.
#[derive(Debug, Clone)]
pub struct Written<T> {
    pub record: T,
    pub activities: Vec<ActivityOutcome>,
}

impl<T> Written<T> {
    pub fn warning(&self) -> Option<String> {
        self.activities.iter().find_map(ActivityOutcome::warning)
    }
}

// =============================================================================
//  REPOSITÓRIO GENÉRICO
// =============================================================================

pub struct TableRepository<T> {
    gateway: Arc<dyn DataGateway>,
    activity_log: ActivityLog,
    _entity: PhantomData<fn() -> T>,
}

// Manual: derive(Clone) exigiria T: Clone
impl<T> Clone for TableRepository<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            activity_log: self.activity_log.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> TableRepository<T> {
    pub fn new(gateway: Arc<dyn DataGateway>, activity_log: ActivityLog) -> Self {
        Self {
            gateway,
            activity_log,
            _entity: PhantomData,
        }
    }

    /// Query base da tabela já com a ordem padrão.
    pub fn query(&self) -> Query {
        let (column, ascending) = T::ORDER;
        Query::table(T::TABLE).order(column, ascending)
    }

    pub async fn fetch<R: DeserializeOwned>(&self, query: &Query) -> Result<Vec<R>, GatewayError> {
        self.gateway
            .select(query)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
            .collect()
    }

    pub async fn fetch_one<R: DeserializeOwned>(&self, query: &Query) -> Result<R, GatewayError> {
        let row = self.gateway.select_one(query).await?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn list(&self) -> Result<Vec<T>, GatewayError> {
        self.fetch(&self.query()).await
    }

    pub async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<T>, GatewayError> {
        self.fetch(&self.query().eq("customer_id", customer_id.to_string()))
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<T, GatewayError> {
        self.fetch_one(&Query::table(T::TABLE).eq("id", id.to_string()))
            .await
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<u64, GatewayError> {
        self.gateway.count(T::TABLE, filters).await
    }

    pub async fn create<I: Serialize + Sync>(&self, input: &I) -> Result<Written<T>, GatewayError> {
        let row = self
            .gateway
            .insert(T::TABLE, serde_json::to_value(input)?)
            .await?;

        let activities = self.audit(&row, |trigger| trigger == AuditTrigger::Created).await;
        Ok(Written {
            record: serde_json::from_value(row)?,
            activities,
        })
    }

    /// PATCH só com as colunas presentes em `patch`.
    pub async fn update<P: Serialize + Sync>(&self, id: Uuid, patch: &P) -> Result<Written<T>, GatewayError> {
        let patch = serde_json::to_value(patch)?;
        let changed = patch.as_object().cloned().unwrap_or_default();

        // PATCH vazio não toca no banco nem no histórico
        if changed.is_empty() {
            return Ok(Written {
                record: self.find(id).await?,
                activities: Vec::new(),
            });
        }

        let row = self.gateway.update(T::TABLE, id, patch).await?;

        let activities = self
            .audit(&row, |trigger| match trigger {
                AuditTrigger::Created => false,
                AuditTrigger::FieldChanged(column) => changed.contains_key(column),
                AuditTrigger::FlagRaised(column) => changed.get(column) == Some(&json!(true)),
            })
            .await;

        Ok(Written {
            record: serde_json::from_value(row)?,
            activities,
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), GatewayError> {
        self.gateway.delete(T::TABLE, id).await
    }

    // Histórico é best-effort: falhas viram ActivityOutcome, nunca erro
    async fn audit(&self, row: &Value, fires: impl Fn(AuditTrigger) -> bool) -> Vec<ActivityOutcome> {
        let rules: Vec<&AuditRule> = T::AUDIT.iter().filter(|r| fires(r.trigger)).collect();
        if rules.is_empty() {
            return Vec::new();
        }

        let Some(customer_id) = row
            .get(T::SUBJECT)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Uuid>().ok())
        else {
            tracing::warn!("⚠️ Linha de '{}' sem '{}', histórico ignorado", T::TABLE, T::SUBJECT);
            return Vec::new();
        };

        let metadata = json!({ "table": T::TABLE.name(), "record_id": row.get("id") });

        let mut outcomes = Vec::with_capacity(rules.len());
        for rule in rules {
            let outcome = self
                .activity_log
                .record_best_effort(customer_id, rule.kind, (rule.describe)(row), Some(metadata.clone()))
                .await;
            outcomes.push(outcome);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryGateway, ReferentialPolicy};
    use crate::models::crm::{Customer, CustomerPatch, CustomerStatus, NewCustomer, CustomerSource};

    fn setup() -> (Arc<MemoryGateway>, TableRepository<Customer>) {
        let memory = Arc::new(MemoryGateway::new(ReferentialPolicy::Cascade));
        let gateway: Arc<dyn DataGateway> = memory.clone();
        let repo = TableRepository::new(gateway.clone(), ActivityLog::new(gateway));
        (memory, repo)
    }

    fn acme() -> NewCustomer {
        NewCustomer {
            name: "Acme".into(),
            phone: "0500000000".into(),
            email: None,
            source: CustomerSource::Website,
            city: None,
            country: None,
            business_type: None,
            status: None,
            notes: None,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn create_fires_created_rule_for_the_row_itself() {
        let (memory, repo) = setup();
        let written = repo.create(&acme()).await.unwrap();

        assert!(written.warning().is_none());
        let activities = memory.rows(Table::Activities);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0]["type"], "created");
        assert_eq!(activities[0]["customer_id"], json!(written.record.id));
        assert_eq!(activities[0]["metadata"]["table"], "customers");
    }

    #[tokio::test]
    async fn update_fires_only_for_columns_in_the_patch() {
        let (memory, repo) = setup();
        let id = repo.create(&acme()).await.unwrap().record.id;

        let rename = CustomerPatch {
            name: Some("Acme Ltd".into()),
            ..Default::default()
        };
        repo.update(id, &rename).await.unwrap();
        assert_eq!(memory.rows(Table::Activities).len(), 1);

        let promote = CustomerPatch {
            status: Some(CustomerStatus::FollowUp),
            ..Default::default()
        };
        let written = repo.update(id, &promote).await.unwrap();
        assert_eq!(written.record.status, CustomerStatus::FollowUp);
        assert_eq!(written.activities.len(), 1);
        assert_eq!(memory.rows(Table::Activities).len(), 2);
    }

    #[tokio::test]
    async fn empty_patch_returns_current_row() {
        let (memory, repo) = setup();
        let id = repo.create(&acme()).await.unwrap().record.id;

        let written = repo.update(id, &CustomerPatch::default()).await.unwrap();
        assert_eq!(written.record.name, "Acme");
        assert_eq!(memory.rows(Table::Activities).len(), 1);
    }

    #[tokio::test]
    async fn activity_failure_does_not_fail_the_write() {
        let (memory, repo) = setup();
        memory.set_failing(Table::Activities, true);

        let written = repo.create(&acme()).await.unwrap();
        assert_eq!(written.record.status, CustomerStatus::NewContact);
        assert!(written.warning().is_some());
        assert!(memory.rows(Table::Activities).is_empty());
    }
}
