// src/db/gateway.rs

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::query::{Filter, Query, Table};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Falha de transporte: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Registro não encontrado em '{0}'")]
    NotFound(Table),

    // Códigos SQLSTATE da classe 23 (check, not null, FK, unique)
    #[error("Violação de restrição {code}: {message}")]
    Constraint { code: String, message: String },

    #[error("O banco respondeu {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Resposta inválida do banco: {0}")]
    Decode(String),

    #[error("Configuração do banco inválida: {0}")]
    Config(String),
}

impl GatewayError {
    /// Erros que podem sumir numa nova tentativa (rede, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}

/// Contrato genérico de acesso às tabelas do banco remoto.
///
/// Cada chamada é uma ida e volta pela rede: sem cache, sem lote, sem retry.
#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, GatewayError>;

    /// Exatamente uma linha; zero linhas vira `NotFound`.
    async fn select_one(&self, query: &Query) -> Result<Value, GatewayError> {
        let mut rows = self.select(query).await?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(GatewayError::NotFound(query.table)),
            n => Err(GatewayError::Status {
                status: 406,
                code: Some("PGRST116".to_string()),
                message: format!("Esperava uma linha em '{}', vieram {}", query.table, n),
            }),
        }
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, GatewayError>;

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value, GatewayError>;

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError>;

    async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64, GatewayError>;

    /// Próximo valor de uma sequência atômica do lado do banco.
    async fn next_sequence(&self, name: &str) -> Result<i64, GatewayError>;
}
