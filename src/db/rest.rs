// src/db/rest.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::gateway::{DataGateway, GatewayError};
use super::query::{Embed, Filter, Query, Table};

// Cliente para a API REST gerada pelo PostgREST (Supabase).
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestGateway {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, GatewayError> {
        if base_url.trim().is_empty() || anon_key.trim().is_empty() {
            return Err(GatewayError::Config(
                "SUPABASE_URL e SUPABASE_ANON_KEY são obrigatórias".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    // Todo request leva o par apikey + bearer com a chave anônima
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.anon_key))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_body(status.as_u16(), &body))
    }

    async fn write(
        &self,
        method: Method,
        table: Table,
        params: Vec<(String, String)>,
        body: Value,
    ) -> Result<Value, GatewayError> {
        let builder = self
            .request(method, &self.table_url(table))
            .query(&params)
            .header("Prefer", "return=representation")
            .json(&body);

        let rows: Vec<Value> = self.send(builder).await?.json().await?;
        rows.into_iter().next().ok_or(GatewayError::NotFound(table))
    }
}

#[async_trait]
impl DataGateway for RestGateway {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, GatewayError> {
        let builder = self
            .request(Method::GET, &self.table_url(query.table))
            .query(&query_params(query));

        Ok(self.send(builder).await?.json().await?)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, GatewayError> {
        self.write(Method::POST, table, Vec::new(), row).await
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value, GatewayError> {
        let params = vec![("id".to_string(), format!("eq.{id}"))];
        self.write(Method::PATCH, table, params, patch).await
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(Method::DELETE, &self.table_url(table))
            .query(&[("id", format!("eq.{id}"))]);

        self.send(builder).await?;
        Ok(())
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64, GatewayError> {
        let mut params: Vec<(String, String)> = filters.iter().map(filter_param).collect();
        params.push(("select".to_string(), "id".to_string()));

        let builder = self
            .request(Method::HEAD, &self.table_url(table))
            .query(&params)
            .header("Prefer", "count=exact");

        let response = self.send(builder).await?;
        let range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GatewayError::Decode("Content-Range ausente na contagem".to_string()))?;

        parse_content_range(range)
    }

    async fn next_sequence(&self, name: &str) -> Result<i64, GatewayError> {
        let url = format!("{}/rest/v1/rpc/next_sequence", self.base_url);
        let builder = self
            .request(Method::POST, &url)
            .json(&json!({ "seq_name": name }));

        let value: Value = self.send(builder).await?.json().await?;
        value
            .as_i64()
            .ok_or_else(|| GatewayError::Decode(format!("Sequência '{name}' devolveu {value}")))
    }
}

// =============================================================================
//  TRADUÇÃO PARA O DIALETO DO POSTGREST
// =============================================================================

pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![(
        "select".to_string(),
        select_clause(&query.columns, &query.embeds),
    )];

    params.extend(query.filters.iter().map(filter_param));

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

pub(crate) fn select_clause(columns: &[String], embeds: &[Embed]) -> String {
    let mut parts: Vec<String> = if columns.is_empty() {
        vec!["*".to_string()]
    } else {
        columns.to_vec()
    };

    for embed in embeds {
        // `tabela!coluna` desambigua pela FK quando há mais de uma relação
        let target = format!("{}!{}", embed.table.name(), embed.via);
        let inner = select_clause(&embed.columns, &embed.embeds);
        let resource = match &embed.alias {
            Some(alias) => format!("{alias}:{target}({inner})"),
            None => format!("{target}({inner})"),
        };
        parts.push(resource);
    }

    parts.join(",")
}

fn filter_param(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq(col, v) => (col.clone(), format!("eq.{}", literal(v))),
        Filter::Neq(col, v) => (col.clone(), format!("neq.{}", literal(v))),
        Filter::Gt(col, v) => (col.clone(), format!("gt.{}", literal(v))),
        Filter::Gte(col, v) => (col.clone(), format!("gte.{}", literal(v))),
        Filter::Lt(col, v) => (col.clone(), format!("lt.{}", literal(v))),
        Filter::Lte(col, v) => (col.clone(), format!("lte.{}", literal(v))),
        Filter::IsNull(col) => (col.clone(), "is.null".to_string()),
        Filter::NotNull(col) => (col.clone(), "not.is.null".to_string()),
        Filter::AnyILike(cols, term) => {
            // Vírgula, parênteses e aspas quebram a gramática do `or=(...)`
            let term: String = term
                .chars()
                .filter(|c| !matches!(c, ',' | '(' | ')' | '"' | '*'))
                .collect();
            let group = cols
                .iter()
                .map(|c| format!("{c}.ilike.*{term}*"))
                .collect::<Vec<_>>()
                .join(",");
            ("or".to_string(), format!("({group})"))
        }
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

// "0-24/3573" ou "*/0"
pub(crate) fn parse_content_range(range: &str) -> Result<u64, GatewayError> {
    range
        .rsplit('/')
        .next()
        .and_then(|total| total.trim().parse::<u64>().ok())
        .ok_or_else(|| GatewayError::Decode(format!("Content-Range inválido: {range}")))
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

pub(crate) fn error_from_body(status: u16, body: &str) -> GatewayError {
    let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();

    let (code, message) = match parsed {
        Some(err) => {
            let message = match (err.message, err.details) {
                (Some(m), Some(d)) => format!("{m} ({d})"),
                (Some(m), None) => m,
                (None, Some(d)) => d,
                (None, None) => body.to_string(),
            };
            (err.code, message)
        }
        None => (None, body.to_string()),
    };

    match code.as_deref() {
        Some(c) if c.starts_with("23") => GatewayError::Constraint {
            code: c.to_string(),
            message,
        },
        _ => GatewayError::Status {
            status,
            code,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_embeds_with_fk_hints() {
        let query = Query::table(Table::Customers)
            .embed(Embed::one("assigned_user", Table::Users, "assigned_to").columns(&["id", "name"]))
            .embed(
                Embed::many(Table::CustomerServices, "customer_id")
                    .embed(Embed::one("service", Table::Services, "service_id").columns(&["id", "name"])),
            );

        assert_eq!(
            select_clause(&query.columns, &query.embeds),
            "*,assigned_user:users!assigned_to(id,name),customer_services!customer_id(*,service:services!service_id(id,name))"
        );
    }

    #[test]
    fn renders_filters_order_and_limit() {
        let query = Query::table(Table::Followups)
            .gte("followup_date", "2026-10-16T00:00:00+03:00")
            .lt("followup_date", "2026-10-17T00:00:00+03:00")
            .eq("is_done", false)
            .not_null("reason")
            .is_null("assigned_to")
            .neq("status", "draft")
            .gt("amount", 10)
            .lte("amount", 500)
            .order("followup_date", true)
            .limit(5);

        let params = query_params(&query);
        assert!(params.contains(&("followup_date".into(), "gte.2026-10-16T00:00:00+03:00".into())));
        assert!(params.contains(&("followup_date".into(), "lt.2026-10-17T00:00:00+03:00".into())));
        assert!(params.contains(&("is_done".into(), "eq.false".into())));
        assert!(params.contains(&("reason".into(), "not.is.null".into())));
        assert!(params.contains(&("assigned_to".into(), "is.null".into())));
        assert!(params.contains(&("status".into(), "neq.draft".into())));
        assert!(params.contains(&("amount".into(), "gt.10".into())));
        assert!(params.contains(&("amount".into(), "lte.500".into())));
        assert!(params.contains(&("order".into(), "followup_date.asc".into())));
        assert!(params.contains(&("limit".into(), "5".into())));
    }

    #[test]
    fn search_term_is_stripped_of_grammar_characters() {
        let query = Query::table(Table::Customers).search(&["name", "phone"], "ac,me (x)");
        let params = query_params(&query);
        assert!(params.contains(&("or".into(), "(name.ilike.*acme x*,phone.ilike.*acme x*)".into())));
    }

    #[test]
    fn parses_content_range_totals() {
        assert_eq!(parse_content_range("0-24/3573").unwrap(), 3573);
        assert_eq!(parse_content_range("*/0").unwrap(), 0);
        assert!(parse_content_range("0-24/*").is_err());
    }

    #[test]
    fn check_violation_becomes_constraint_error() {
        let body = r#"{"code":"23514","message":"new row for relation \"activities\" violates check constraint \"activities_type_check\"","details":null,"hint":null}"#;
        match error_from_body(400, body) {
            GatewayError::Constraint { code, message } => {
                assert_eq!(code, "23514");
                assert!(message.contains("activities_type_check"));
            }
            other => panic!("esperava Constraint, veio {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_kept_as_message() {
        match error_from_body(502, "Bad Gateway") {
            GatewayError::Status { status, code, message } => {
                assert_eq!(status, 502);
                assert!(code.is_none());
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("esperava Status, veio {other:?}"),
        }
    }
}
