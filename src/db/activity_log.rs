// src/db/activity_log.rs

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::gateway::{DataGateway, GatewayError};
use super::query::Table;
use crate::models::crm::{Activity, ActivityType, NewActivity};

const OUTBOX_LIMIT: usize = 500;

/// Destino de uma escrita best-effort no histórico.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityOutcome {
    Recorded(Uuid),
    /// Falha transitória: a linha ficou na fila e será reenviada.
    Deferred(String),
    /// O banco recusou a linha (constraint); não será reenviada.
    Rejected(String),
}

impl ActivityOutcome {
    pub fn warning(&self) -> Option<String> {
        match self {
            ActivityOutcome::Recorded(_) => None,
            ActivityOutcome::Deferred(reason) | ActivityOutcome::Rejected(reason) => Some(reason.clone()),
        }
    }
}

/// Escritor do histórico (`activities`), só de inserção.
///
/// Falhas transitórias vão para uma fila em memória que é reenviada antes da
/// próxima escrita de histórico. Não existe worker em segundo plano.
#[derive(Clone)]
pub struct ActivityLog {
    gateway: Arc<dyn DataGateway>,
    outbox: Arc<Mutex<VecDeque<NewActivity>>>,
}

impl ActivityLog {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway,
            outbox: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    fn outbox(&self) -> MutexGuard<'_, VecDeque<NewActivity>> {
        self.outbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn insert(&self, entry: &NewActivity) -> Result<Activity, GatewayError> {
        let row = self
            .gateway
            .insert(Table::Activities, serde_json::to_value(entry)?)
            .await?;
        Ok(serde_json::from_value(row)?)
    }

    /// Grava e propaga qualquer erro.
    pub async fn record(
        &self,
        customer_id: Uuid,
        kind: ActivityType,
        description: impl Into<String>,
    ) -> Result<Activity, GatewayError> {
        self.flush().await;

        let entry = NewActivity {
            customer_id,
            activity_type: kind,
            description: description.into(),
            metadata: None,
            created_at: Utc::now(),
        };
        self.insert(&entry).await
    }

    /// Grava sem nunca falhar; o resultado diz o que aconteceu.
    pub async fn record_best_effort(
        &self,
        customer_id: Uuid,
        kind: ActivityType,
        description: impl Into<String>,
        metadata: Option<Value>,
    ) -> ActivityOutcome {
        self.flush().await;

        let entry = NewActivity {
            customer_id,
            activity_type: kind,
            description: description.into(),
            metadata,
            created_at: Utc::now(),
        };

        match self.insert(&entry).await {
            Ok(activity) => ActivityOutcome::Recorded(activity.id),
            Err(e) if e.is_transient() => {
                tracing::warn!("⚠️ Histórico '{}' adiado: {}", kind, e);
                self.enqueue(entry);
                ActivityOutcome::Deferred(e.to_string())
            }
            Err(e) => {
                tracing::warn!("⚠️ Histórico '{}' recusado pelo banco: {}", kind, e);
                ActivityOutcome::Rejected(e.to_string())
            }
        }
    }

    /// Nota manual na ficha do cliente.
    pub async fn add_note(&self, customer_id: Uuid, text: &str) -> Result<Activity, GatewayError> {
        self.record(customer_id, ActivityType::NoteAdded, text).await
    }

    /// Linhas esperando reenvio.
    pub fn pending(&self) -> usize {
        self.outbox().len()
    }

    /// Reenvia a fila em ordem; para na primeira falha transitória.
    pub async fn flush(&self) -> usize {
        let mut delivered = 0;

        loop {
            let Some(entry) = self.outbox().pop_front() else {
                break;
            };

            match self.insert(&entry).await {
                Ok(_) => delivered += 1,
                Err(e) if e.is_transient() => {
                    self.outbox().push_front(entry);
                    break;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Histórico pendente descartado: {}", e);
                }
            }
        }

        if delivered > 0 {
            tracing::info!("✅ {} registro(s) de histórico reenviado(s)", delivered);
        }
        delivered
    }

    fn enqueue(&self, entry: NewActivity) {
        let mut outbox = self.outbox();
        if outbox.len() >= OUTBOX_LIMIT {
            outbox.pop_front();
            tracing::warn!("⚠️ Fila de histórico cheia, descartando o registro mais antigo");
        }
        outbox.push_back(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryGateway, ReferentialPolicy};
    use serde_json::json;

    async fn setup(policy: ReferentialPolicy) -> (Arc<MemoryGateway>, ActivityLog, Uuid) {
        let memory = Arc::new(MemoryGateway::new(policy));
        let customer = memory
            .insert(Table::Customers, json!({ "name": "Acme", "phone": "1", "source": "other" }))
            .await
            .unwrap();
        let id = customer["id"].as_str().unwrap().parse().unwrap();
        let log = ActivityLog::new(memory.clone());
        (memory, log, id)
    }

    #[tokio::test]
    async fn transient_failure_is_queued_and_replayed_with_original_timestamp() {
        let (memory, log, customer) = setup(ReferentialPolicy::Cascade).await;
        memory.set_failing(Table::Activities, true);

        let outcome = log
            .record_best_effort(customer, ActivityType::MeetingAdded, "تم إضافة اجتماع: online", None)
            .await;
        assert!(matches!(outcome, ActivityOutcome::Deferred(_)));
        assert!(outcome.warning().is_some());
        assert_eq!(log.pending(), 1);

        memory.set_failing(Table::Activities, false);
        let outcome = log
            .record_best_effort(customer, ActivityType::FollowupAdded, "تم إضافة متابعة: call", None)
            .await;
        assert!(matches!(outcome, ActivityOutcome::Recorded(_)));
        assert_eq!(log.pending(), 0);

        let rows = memory.rows(Table::Activities);
        assert_eq!(rows.len(), 2);
        // o adiado entra primeiro e mantém a hora em que aconteceu
        assert_eq!(rows[0]["type"], "meeting_added");
        let first = rows[0]["created_at"].as_str().unwrap();
        let second = rows[1]["created_at"].as_str().unwrap();
        assert!(first <= second);
    }

    #[tokio::test]
    async fn constraint_violation_is_rejected_not_queued() {
        let memory = Arc::new(
            MemoryGateway::new(ReferentialPolicy::Unenforced).with_activity_types(&["created"]),
        );
        let log = ActivityLog::new(memory.clone());

        let outcome = log
            .record_best_effort(Uuid::new_v4(), ActivityType::FollowupCompleted, "تم إكمال المتابعة", None)
            .await;

        match outcome {
            ActivityOutcome::Rejected(reason) => assert!(reason.contains("activities_type_check")),
            other => panic!("esperava Rejected, veio {other:?}"),
        }
        assert_eq!(log.pending(), 0);
    }

    #[tokio::test]
    async fn strict_record_propagates_errors() {
        let (memory, log, customer) = setup(ReferentialPolicy::Cascade).await;
        memory.set_failing(Table::Activities, true);

        let err = log.record(customer, ActivityType::NoteAdded, "x").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(log.pending(), 0);
    }

    #[tokio::test]
    async fn add_note_records_note_added() {
        let (_memory, log, customer) = setup(ReferentialPolicy::Cascade).await;

        let activity = log.add_note(customer, "ligar amanhã").await.unwrap();
        assert_eq!(activity.activity_type, ActivityType::NoteAdded);
        assert_eq!(activity.description, "ligar amanhã");
        assert_eq!(activity.customer_id, customer);
    }

    #[tokio::test]
    async fn outbox_is_bounded() {
        let (memory, log, customer) = setup(ReferentialPolicy::Cascade).await;
        memory.set_failing(Table::Activities, true);

        for _ in 0..OUTBOX_LIMIT + 3 {
            log.record_best_effort(customer, ActivityType::NoteAdded, "x", None).await;
        }
        assert_eq!(log.pending(), OUTBOX_LIMIT);
    }
}
