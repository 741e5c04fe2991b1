// src/db/memory.rs

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::gateway::{DataGateway, GatewayError};
use super::query::{Cardinality, Embed, Filter, Query, Table};
use crate::models::crm::ActivityType;

type Row = Map<String, Value>;

/// O que acontece com as linhas filhas quando o pai é apagado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialPolicy {
    /// Espelha o schema real: FKs validadas, `ON DELETE CASCADE / SET NULL`.
    Cascade,
    /// Sem FKs: filhos ficam órfãos e continuam acessíveis pelo id.
    Unenforced,
}

#[derive(Debug, Clone, Copy)]
enum OnDelete {
    Cascade,
    SetNull,
}

struct ForeignKey {
    child: Table,
    column: &'static str,
    parent: Table,
    on_delete: OnDelete,
}

const FOREIGN_KEYS: &[ForeignKey] = &[
    ForeignKey { child: Table::Meetings, column: "customer_id", parent: Table::Customers, on_delete: OnDelete::Cascade },
    ForeignKey { child: Table::Quotations, column: "customer_id", parent: Table::Customers, on_delete: OnDelete::Cascade },
    ForeignKey { child: Table::Followups, column: "customer_id", parent: Table::Customers, on_delete: OnDelete::Cascade },
    ForeignKey { child: Table::CustomerServices, column: "customer_id", parent: Table::Customers, on_delete: OnDelete::Cascade },
    ForeignKey { child: Table::Activities, column: "customer_id", parent: Table::Customers, on_delete: OnDelete::Cascade },
    ForeignKey { child: Table::CustomerServices, column: "service_id", parent: Table::Services, on_delete: OnDelete::Cascade },
    ForeignKey { child: Table::Customers, column: "assigned_to", parent: Table::Users, on_delete: OnDelete::SetNull },
    ForeignKey { child: Table::Followups, column: "assigned_to", parent: Table::Users, on_delete: OnDelete::SetNull },
];

fn required_columns(table: Table) -> &'static [&'static str] {
    match table {
        Table::Customers => &["name", "phone"],
        Table::Meetings => &["customer_id", "meeting_date", "meeting_type"],
        Table::Quotations => &["customer_id", "quotation_no", "amount"],
        Table::Followups => &["customer_id", "followup_date", "method"],
        Table::CustomerServices => &["customer_id", "service_id"],
        Table::Services => &["name"],
        Table::Users => &["name", "email"],
        Table::Activities => &["customer_id", "type", "description"],
    }
}

fn column_defaults(table: Table) -> Vec<(&'static str, Value)> {
    match table {
        Table::Customers => vec![("status", json!("new_contact"))],
        Table::Quotations => vec![
            ("status", json!("draft")),
            ("services", json!([])),
            ("send_date", json!(Utc::now().date_naive().to_string())),
        ],
        Table::Followups => vec![("is_done", json!(false))],
        Table::CustomerServices => vec![("status", json!("active"))],
        Table::Services => vec![("is_active", json!(true))],
        Table::Users => vec![("is_active", json!(true)), ("role", json!("employee"))],
        Table::Meetings => vec![("purpose", json!(""))],
        Table::Activities => Vec::new(),
    }
}

fn has_updated_at(table: Table) -> bool {
    !matches!(table, Table::Activities | Table::Services)
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<Table, Vec<Row>>,
    sequences: HashMap<String, i64>,
    failing: HashSet<Table>,
}

/// Banco em memória com o mesmo contrato do `RestGateway` e as mesmas regras
/// do lado do servidor (defaults, NOT NULL, check de `activities.type`,
/// e-mail único em `users`, FKs, trigger de `updated_at`, sequências).
#[derive(Debug)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
    policy: ReferentialPolicy,
    activity_types: Vec<String>,
}

impl MemoryGateway {
    pub fn new(policy: ReferentialPolicy) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            latency: None,
            policy,
            activity_types: ActivityType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
        }
    }

    #[cfg(test)]
    /// Atraso artificial antes de cada operação (simula a ida e volta pela rede).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    #[cfg(test)]
    /// Restringe o check constraint de `activities.type`.
    pub fn with_activity_types(mut self, types: &[&str]) -> Self {
        self.activity_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    #[cfg(test)]
    /// Faz a tabela responder 503 até ser liberada.
    pub fn set_failing(&self, table: Table, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(table);
        } else {
            state.failing.remove(&table);
        }
    }

    #[cfg(test)]
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock()
            .rows(table)
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_row(&self, state: &MemoryState, table: Table, row: &Row) -> Result<(), GatewayError> {
        for column in required_columns(table) {
            if row.get(*column).is_none_or(Value::is_null) {
                return Err(GatewayError::Constraint {
                    code: "23502".to_string(),
                    message: format!(
                        "null value in column \"{column}\" of relation \"{table}\" violates not-null constraint"
                    ),
                });
            }
        }

        if table == Table::Activities {
            let kind = row.get("type").and_then(Value::as_str).unwrap_or_default();
            if !self.activity_types.iter().any(|t| t == kind) {
                return Err(GatewayError::Constraint {
                    code: "23514".to_string(),
                    message: "new row for relation \"activities\" violates check constraint \"activities_type_check\"".to_string(),
                });
            }
        }

        if table == Table::Users {
            let email = row.get("email").and_then(Value::as_str);
            let taken = state
                .rows(Table::Users)
                .iter()
                .any(|other| row_id(other) != row_id(row) && other.get("email").and_then(Value::as_str) == email);
            if taken {
                return Err(GatewayError::Constraint {
                    code: "23505".to_string(),
                    message: "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
                });
            }
        }

        if self.policy == ReferentialPolicy::Cascade {
            for fk in FOREIGN_KEYS.iter().filter(|fk| fk.child == table) {
                if let Some(Value::String(id)) = row.get(fk.column) {
                    if state.find(fk.parent, id).is_none() {
                        return Err(GatewayError::Constraint {
                            code: "23503".to_string(),
                            message: format!(
                                "insert or update on table \"{table}\" violates foreign key constraint \"{table}_{}_fkey\"",
                                fk.column
                            ),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl MemoryState {
    fn ensure_available(&self, table: Table) -> Result<(), GatewayError> {
        if self.failing.contains(&table) {
            return Err(GatewayError::Status {
                status: 503,
                code: None,
                message: format!("Tabela '{table}' indisponível"),
            });
        }
        Ok(())
    }

    fn rows(&self, table: Table) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find(&self, table: Table, id: &str) -> Option<&Row> {
        self.rows(table).iter().find(|r| row_id(r) == Some(id))
    }

    fn project(&self, row: &Row, columns: &[String], embeds: &[Embed]) -> Value {
        let mut out: Row = if columns.is_empty() {
            row.clone()
        } else {
            columns
                .iter()
                .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                .collect()
        };

        for embed in embeds {
            let value = match embed.cardinality {
                Cardinality::One => row
                    .get(&embed.via)
                    .and_then(Value::as_str)
                    .and_then(|id| self.find(embed.table, id))
                    .map(|child| self.project(child, &embed.columns, &embed.embeds))
                    .unwrap_or(Value::Null),
                Cardinality::Many => {
                    let children = match row.get("id") {
                        Some(id) => self
                            .rows(embed.table)
                            .iter()
                            .filter(|c| c.get(&embed.via) == Some(id))
                            .map(|c| self.project(c, &embed.columns, &embed.embeds))
                            .collect(),
                        None => Vec::new(),
                    };
                    Value::Array(children)
                }
            };
            out.insert(embed.key().to_string(), value);
        }

        Value::Object(out)
    }

    fn remove(&mut self, table: Table, id: &str, policy: ReferentialPolicy) {
        if let Some(rows) = self.tables.get_mut(&table) {
            rows.retain(|r| row_id(r) != Some(id));
        }

        if policy == ReferentialPolicy::Unenforced {
            return;
        }

        for fk in FOREIGN_KEYS.iter().filter(|fk| fk.parent == table) {
            match fk.on_delete {
                OnDelete::SetNull => {
                    if let Some(rows) = self.tables.get_mut(&fk.child) {
                        rows.iter_mut()
                            .filter(|r| r.get(fk.column).and_then(Value::as_str) == Some(id))
                            .for_each(|r| {
                                r.insert(fk.column.to_string(), Value::Null);
                            });
                    }
                }
                OnDelete::Cascade => {
                    let doomed: Vec<String> = self
                        .rows(fk.child)
                        .iter()
                        .filter(|r| r.get(fk.column).and_then(Value::as_str) == Some(id))
                        .filter_map(|r| row_id(r).map(str::to_string))
                        .collect();
                    for child in doomed {
                        self.remove(fk.child, &child, policy);
                    }
                }
            }
        }
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn into_row(table: Table, value: Value) -> Result<Row, GatewayError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(GatewayError::Decode(format!(
            "Esperava um objeto JSON para '{table}', veio {other}"
        ))),
    }
}

// =============================================================================
//  COMPARAÇÃO DE VALORES (mesma semântica que o Postgres aplicaria)
// =============================================================================

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => {
            // Timestamps com offsets diferentes comparam pelo instante
            if let (Ok(x), Ok(y)) = (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                return Some(x.cmp(&y));
            }
            if let (Ok(x), Ok(y)) = (x.parse::<NaiveDate>(), y.parse::<NaiveDate>()) {
                return Some(x.cmp(&y));
            }
            Some(x.cmp(y))
        }
        _ => None,
    }
}

fn present<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|v| !v.is_null())
}

fn holds(row: &Row, column: &str, value: &Value, accept: fn(Ordering) -> bool) -> bool {
    present(row, column)
        .and_then(|v| compare(v, value))
        .is_some_and(accept)
}

fn matches(row: &Row, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(c, v) => holds(row, c, v, Ordering::is_eq),
        Filter::Neq(c, v) => holds(row, c, v, Ordering::is_ne),
        Filter::Gt(c, v) => holds(row, c, v, Ordering::is_gt),
        Filter::Gte(c, v) => holds(row, c, v, Ordering::is_ge),
        Filter::Lt(c, v) => holds(row, c, v, Ordering::is_lt),
        Filter::Lte(c, v) => holds(row, c, v, Ordering::is_le),
        Filter::IsNull(c) => present(row, c).is_none(),
        Filter::NotNull(c) => present(row, c).is_some(),
        Filter::AnyILike(columns, term) => {
            let term = term.to_lowercase();
            columns.iter().any(|c| {
                present(row, c)
                    .and_then(Value::as_str)
                    .is_some_and(|v| v.to_lowercase().contains(&term))
            })
        }
    }
}

// Nulls por último no ascendente (e primeiro no descendente), como no Postgres
fn order_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, GatewayError> {
        self.pause().await;
        let state = self.lock();
        state.ensure_available(query.table)?;

        let mut rows: Vec<&Row> = state
            .rows(query.table)
            .iter()
            .filter(|r| query.filters.iter().all(|f| matches(r, f)))
            .collect();

        rows.sort_by(|a, b| {
            for o in &query.order {
                let ord = order_values(present(a, &o.column), present(b, &o.column));
                let ord = if o.ascending { ord } else { ord.reverse() };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows
            .into_iter()
            .map(|r| state.project(r, &query.columns, &query.embeds))
            .collect())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, GatewayError> {
        self.pause().await;
        let mut row = into_row(table, row)?;
        let mut state = self.lock();
        state.ensure_available(table)?;

        let now = json!(Utc::now().to_rfc3339());
        row.entry("id").or_insert_with(|| json!(Uuid::new_v4().to_string()));
        for (column, value) in column_defaults(table) {
            row.entry(column).or_insert(value);
        }
        row.entry("created_at").or_insert_with(|| now.clone());
        if has_updated_at(table) {
            row.entry("updated_at").or_insert(now);
        }

        self.check_row(&state, table, &row)?;

        state.tables.entry(table).or_default().push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value, GatewayError> {
        self.pause().await;
        let patch = into_row(table, patch)?;
        let mut state = self.lock();
        state.ensure_available(table)?;

        let id = id.to_string();
        let mut row = state
            .find(table, &id)
            .cloned()
            .ok_or(GatewayError::NotFound(table))?;

        row.extend(patch);
        row.insert("id".to_string(), json!(id));
        if has_updated_at(table) {
            row.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        self.check_row(&state, table, &row)?;

        if let Some(slot) = state
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id.as_str())))
        {
            *slot = row.clone();
        }
        Ok(Value::Object(row))
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError> {
        self.pause().await;
        let mut state = self.lock();
        state.ensure_available(table)?;
        state.remove(table, &id.to_string(), self.policy);
        Ok(())
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64, GatewayError> {
        self.pause().await;
        let state = self.lock();
        state.ensure_available(table)?;

        let total = state
            .rows(table)
            .iter()
            .filter(|r| filters.iter().all(|f| matches(r, f)))
            .count();
        Ok(total as u64)
    }

    async fn next_sequence(&self, name: &str) -> Result<i64, GatewayError> {
        self.pause().await;
        let mut state = self.lock();
        let value = state.sequences.entry(name.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_of(row: &Value) -> Uuid {
        row["id"].as_str().and_then(|s| s.parse().ok()).unwrap()
    }

    async fn customer(db: &MemoryGateway, name: &str) -> Value {
        db.insert(Table::Customers, json!({ "name": name, "phone": "0500000000" }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn insert_applies_store_defaults() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let row = customer(&db, "Acme").await;

        assert_eq!(row["status"], "new_contact");
        assert!(row["id"].as_str().is_some());
        assert!(row["created_at"].as_str().is_some());
        assert!(row["updated_at"].as_str().is_some());

        let quotation = db
            .insert(
                Table::Quotations,
                json!({ "customer_id": row["id"], "quotation_no": "Q-00001", "amount": 100.0 }),
            )
            .await
            .unwrap();
        assert_eq!(quotation["status"], "draft");
        assert_eq!(quotation["services"], json!([]));
    }

    #[tokio::test]
    async fn missing_required_column_is_a_not_null_violation() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let err = db
            .insert(Table::Customers, json!({ "name": "Sem telefone" }))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Constraint { ref code, .. } if code == "23502"));
    }

    #[tokio::test]
    async fn unknown_activity_type_violates_check_constraint() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade).with_activity_types(&["created"]);
        let c = customer(&db, "Acme").await;

        let ok = db
            .insert(
                Table::Activities,
                json!({ "customer_id": c["id"], "type": "created", "description": "x" }),
            )
            .await;
        assert!(ok.is_ok());

        let err = db
            .insert(
                Table::Activities,
                json!({ "customer_id": c["id"], "type": "followup_completed", "description": "x" }),
            )
            .await
            .unwrap_err();
        match err {
            GatewayError::Constraint { code, message } => {
                assert_eq!(code, "23514");
                assert!(message.contains("activities_type_check"));
            }
            other => panic!("esperava Constraint, veio {other:?}"),
        }
    }

    #[tokio::test]
    async fn foreign_keys_are_checked_under_cascade_policy() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let err = db
            .insert(
                Table::Meetings,
                json!({
                    "customer_id": Uuid::new_v4().to_string(),
                    "meeting_date": "2026-10-16T10:00:00Z",
                    "meeting_type": "online"
                }),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Constraint { ref code, .. } if code == "23503"));
    }

    #[tokio::test]
    async fn deleting_a_parent_cascades_and_nulls_assignments() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let user = db
            .insert(Table::Users, json!({ "name": "Sara", "email": "sara@agency.sa", "role": "sales" }))
            .await
            .unwrap();
        let c = db
            .insert(
                Table::Customers,
                json!({ "name": "Acme", "phone": "1", "assigned_to": user["id"] }),
            )
            .await
            .unwrap();
        db.insert(
            Table::Followups,
            json!({ "customer_id": c["id"], "followup_date": "2026-10-16T10:00:00Z", "method": "call" }),
        )
        .await
        .unwrap();

        db.delete(Table::Users, id_of(&user)).await.unwrap();
        assert_eq!(db.rows(Table::Customers)[0]["assigned_to"], Value::Null);

        db.delete(Table::Customers, id_of(&c)).await.unwrap();
        assert!(db.rows(Table::Customers).is_empty());
        assert!(db.rows(Table::Followups).is_empty());
    }

    #[tokio::test]
    async fn unenforced_policy_leaves_orphans() {
        let db = MemoryGateway::new(ReferentialPolicy::Unenforced);
        let c = customer(&db, "Acme").await;
        db.insert(
            Table::Followups,
            json!({ "customer_id": c["id"], "followup_date": "2026-10-16T10:00:00Z", "method": "call" }),
        )
        .await
        .unwrap();

        db.delete(Table::Customers, id_of(&c)).await.unwrap();

        let orphans = db
            .select(&Query::table(Table::Followups).eq("customer_id", c["id"].clone()))
            .await
            .unwrap();
        assert_eq!(orphans.len(), 1);
    }

    #[tokio::test]
    async fn select_filters_orders_and_embeds() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let a = customer(&db, "Alpha").await;
        let b = customer(&db, "Beta").await;

        for (c, date) in [(&a, "2026-10-15T09:00:00Z"), (&b, "2026-10-17T09:00:00Z"), (&a, "2026-10-16T09:00:00Z")] {
            db.insert(
                Table::Meetings,
                json!({ "customer_id": c["id"], "meeting_date": date, "meeting_type": "online" }),
            )
            .await
            .unwrap();
        }

        let rows = db
            .select(
                &Query::table(Table::Meetings)
                    .embed(Embed::one("customer", Table::Customers, "customer_id").columns(&["id", "name"]))
                    .order("meeting_date", false),
            )
            .await
            .unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r["meeting_date"].as_str().unwrap()).collect();
        assert_eq!(dates, ["2026-10-17T09:00:00Z", "2026-10-16T09:00:00Z", "2026-10-15T09:00:00Z"]);
        assert_eq!(rows[0]["customer"], json!({ "id": b["id"], "name": "Beta" }));

        let alpha = db
            .select_one(
                &Query::table(Table::Customers)
                    .eq("id", a["id"].clone())
                    .embed(Embed::many(Table::Meetings, "customer_id")),
            )
            .await
            .unwrap();
        assert_eq!(alpha["meetings"].as_array().unwrap().len(), 2);

        let found = db
            .select(&Query::table(Table::Customers).search(&["name", "phone"], "BET"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"], "Beta");
    }

    #[tokio::test]
    async fn timestamps_compare_by_instant_across_offsets() {
        let db = MemoryGateway::new(ReferentialPolicy::Unenforced);
        let c = customer(&db, "Acme").await;
        db.insert(
            Table::Followups,
            json!({ "customer_id": c["id"], "followup_date": "2026-10-16T23:30:00+00:00", "method": "call" }),
        )
        .await
        .unwrap();

        // 23:30Z é depois de 00:00+03:00 (= 21:00Z)
        let n = db
            .count(
                Table::Followups,
                &[Filter::Lt("followup_date".into(), json!("2026-10-17T00:00:00+03:00"))],
            )
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn failing_table_reports_a_transient_error() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        db.set_failing(Table::Customers, true);

        let err = db.count(Table::Customers, &[]).await.unwrap_err();
        assert!(err.is_transient());

        db.set_failing(Table::Customers, false);
        assert_eq!(db.count(Table::Customers, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sequences_are_monotonic_per_name() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        assert_eq!(db.next_sequence("quotation_no").await.unwrap(), 1);
        assert_eq!(db.next_sequence("quotation_no").await.unwrap(), 2);
        assert_eq!(db.next_sequence("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let err = db
            .update(Table::Customers, Uuid::new_v4(), json!({ "status": "follow_up" }))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(Table::Customers)));
    }

    #[tokio::test]
    async fn update_moves_updated_at_forward_and_keeps_created_at() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let row = customer(&db, "Acme").await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let updated = db
            .update(Table::Customers, id_of(&row), json!({ "status": "follow_up" }))
            .await
            .unwrap();

        let instant = |v: &Value| DateTime::parse_from_rfc3339(v.as_str().unwrap()).unwrap();
        assert_eq!(updated["created_at"], row["created_at"]);
        assert!(instant(&updated["updated_at"]) > instant(&row["updated_at"]));
    }

    #[tokio::test]
    async fn defaults_for_users_meetings_and_quotations() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let user = db
            .insert(Table::Users, json!({ "name": "Sara", "email": "sara@agency.sa" }))
            .await
            .unwrap();
        assert_eq!(user["role"], "employee");
        assert_eq!(user["is_active"], true);

        let parent = customer(&db, "Acme").await;
        let meeting = db
            .insert(
                Table::Meetings,
                json!({ "customer_id": parent["id"], "meeting_date": "2026-10-16T10:00:00Z", "meeting_type": "online" }),
            )
            .await
            .unwrap();
        assert_eq!(meeting["purpose"], "");

        let quotation = db
            .insert(
                Table::Quotations,
                json!({ "customer_id": parent["id"], "quotation_no": "Q-00001", "amount": 100.0 }),
            )
            .await
            .unwrap();
        assert_eq!(quotation["send_date"], json!(Utc::now().date_naive().to_string()));
    }

    #[tokio::test]
    async fn user_email_is_unique() {
        let db = MemoryGateway::new(ReferentialPolicy::Cascade);
        let first = db
            .insert(Table::Users, json!({ "name": "Sara", "email": "sara@agency.sa" }))
            .await
            .unwrap();

        let err = db
            .insert(Table::Users, json!({ "name": "Outra Sara", "email": "sara@agency.sa" }))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Constraint { ref code, .. } if code == "23505"));

        // Regravar o próprio e-mail não conflita
        db.update(Table::Users, id_of(&first), json!({ "email": "sara@agency.sa", "phone": "0551" }))
            .await
            .unwrap();
    }
}
