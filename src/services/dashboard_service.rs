// src/services/dashboard_service.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Days, Local, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_ext::null_as_default, time::day_bounds},
    db::{query::Filter, DataGateway, GatewayError, Query, Table},
    models::{
        auth::UserSummary,
        crm::CustomerStatus,
        dashboard::{
            ConversionRate, DailyCount, DashboardStats, EmployeePerformance, FollowupCompletion, MonthlyCount,
            QuotationStats, ReasonCount, ReportBundle, SourceCount, StatusCount,
        },
    },
    services::{crm_service::assigned_user_embed, followup_service::due_today_filters},
};

const UNSPECIFIED: &str = "غير محدد";

// =============================================================================
//  LINHAS MÍNIMAS LIDAS PARA OS RELATÓRIOS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFacts {
    pub status: Option<String>,
    pub source: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub assigned_user: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotationFacts {
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowupFacts {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_done: bool,
}

fn customer_facts_query() -> Query {
    Query::table(Table::Customers)
        .columns(&["status", "source", "created_at", "assigned_to"])
        .embed(assigned_user_embed())
}

fn quotation_facts_query() -> Query {
    Query::table(Table::Quotations).columns(&["status", "amount", "reason"])
}

fn followup_facts_query() -> Query {
    Query::table(Table::Followups).columns(&["is_done"])
}

// =============================================================================
//  REDUTORES
// =============================================================================

/// Percentual com uma casa decimal; 0 quando não há base.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

// Maior contagem primeiro; empate pelo nome
fn by_count_desc(counts: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut entries: Vec<_> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// Toda etapa do funil aparece, mesmo com zero. Status desconhecidos entram
/// com a própria chave para que a soma bata com o total.
pub fn status_distribution(customers: &[CustomerFacts]) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = CustomerStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();

    for customer in customers {
        let status = customer.status.as_deref().unwrap_or(CustomerStatus::NewContact.as_str());
        *counts.entry(status.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn reduce_sources(customers: &[CustomerFacts]) -> Vec<SourceCount> {
    let mut counts = HashMap::new();
    for customer in customers {
        let source = customer.source.as_deref().unwrap_or(UNSPECIFIED);
        *counts.entry(source.to_string()).or_insert(0) += 1;
    }
    by_count_desc(counts)
        .into_iter()
        .map(|(source, count)| SourceCount { source, count })
        .collect()
}

// Ordem do funil, depois os desconhecidos
pub fn reduce_statuses(customers: &[CustomerFacts]) -> Vec<StatusCount> {
    let mut counts = status_distribution(customers);
    let mut result: Vec<StatusCount> = CustomerStatus::ALL
        .iter()
        .filter_map(|s| counts.remove_entry(s.as_str()))
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    result.extend(counts.into_iter().map(|(status, count)| StatusCount { status, count }));
    result
}

pub fn reduce_conversion(customers: &[CustomerFacts]) -> ConversionRate {
    let total = customers.len() as u64;
    let active = customers
        .iter()
        .filter(|c| c.status.as_deref() == Some(CustomerStatus::ActiveClient.as_str()))
        .count() as u64;

    ConversionRate {
        total,
        active,
        rate: percent(active, total),
    }
}

fn with_status<'a>(quotations: &'a [QuotationFacts], status: &'a str) -> impl Iterator<Item = &'a QuotationFacts> {
    quotations.iter().filter(move |q| q.status.as_deref() == Some(status))
}

pub fn reduce_quotations(quotations: &[QuotationFacts]) -> QuotationStats {
    QuotationStats {
        total: quotations.len() as u64,
        sent: with_status(quotations, "sent").count() as u64,
        accepted: with_status(quotations, "accepted").count() as u64,
        rejected: with_status(quotations, "rejected").count() as u64,
        total_amount: quotations.iter().map(|q| q.amount).sum(),
        accepted_amount: with_status(quotations, "accepted").map(|q| q.amount).sum(),
    }
}

pub fn reduce_rejection_reasons(quotations: &[QuotationFacts]) -> Vec<ReasonCount> {
    let mut counts = HashMap::new();
    for quotation in with_status(quotations, "rejected") {
        if let Some(reason) = quotation.reason.as_deref() {
            *counts.entry(reason.to_string()).or_insert(0) += 1;
        }
    }
    by_count_desc(counts)
        .into_iter()
        .map(|(reason, count)| ReasonCount { reason, count })
        .collect()
}

/// Clientes novos por mês (`YYYY-MM` no fuso de `tz`), do mais antigo ao mais recente.
pub fn reduce_monthly_growth<Tz: TimeZone>(customers: &[CustomerFacts], tz: &Tz) -> Vec<MonthlyCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for created_at in customers.iter().filter_map(|c| c.created_at) {
        let month = created_at.with_timezone(tz).date_naive().format("%Y-%m").to_string();
        *counts.entry(month).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

/// Os últimos 7 dias locais (hoje incluso), com zero nos dias sem cadastro.
pub fn reduce_weekly_new_customers<Tz: TimeZone>(customers: &[CustomerFacts], now: &DateTime<Tz>) -> Vec<DailyCount> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut counts: BTreeMap<_, u64> = (0..7)
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|day| (day, 0))
        .collect();

    for created_at in customers.iter().filter_map(|c| c.created_at) {
        let day = created_at.with_timezone(&tz).date_naive();
        if let Some(count) = counts.get_mut(&day) {
            *count += 1;
        }
    }

    counts
        .into_iter()
        .map(|(day, count)| DailyCount {
            date: day.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

pub fn reduce_followup_completion(followups: &[FollowupFacts]) -> FollowupCompletion {
    let total = followups.len() as u64;
    let done = followups.iter().filter(|f| f.is_done).count() as u64;
    FollowupCompletion {
        total,
        done,
        rate: percent(done, total),
    }
}

pub fn reduce_employee_performance(customers: &[CustomerFacts]) -> Vec<EmployeePerformance> {
    let mut counts: HashMap<Uuid, (String, u64)> = HashMap::new();
    for customer in customers {
        let Some(id) = customer.assigned_to else { continue };
        let name = customer
            .assigned_user
            .as_ref()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| UNSPECIFIED.to_string());
        counts.entry(id).or_insert((name, 0)).1 += 1;
    }

    let mut result: Vec<_> = counts
        .into_iter()
        .map(|(id, (name, count))| EmployeePerformance { id, name, count })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    result
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct DashboardService {
    gateway: Arc<dyn DataGateway>,
}

impl DashboardService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    async fn fetch<R: DeserializeOwned>(&self, query: &Query) -> Result<Vec<R>, GatewayError> {
        let rows = self.gateway.select(query).await?;
        Ok(serde_json::from_value(Value::Array(rows))?)
    }

    // 1. Cards do dashboard

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        self.dashboard_stats_at(&Local::now()).await
    }

    pub async fn dashboard_stats_at<Tz>(&self, now: &DateTime<Tz>) -> Result<DashboardStats, AppError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let (start, end) = day_bounds(now);
        let created_today = [
            Filter::Gte("created_at".into(), start.to_rfc3339().into()),
            Filter::Lt("created_at".into(), end.to_rfc3339().into()),
        ];
        let quotations_sent = [Filter::Eq("status".into(), "sent".into())];
        let active_clients = [Filter::Eq("status".into(), CustomerStatus::ActiveClient.as_str().into())];
        let followups_today = due_today_filters(now);
        let statuses = Query::table(Table::Customers).columns(&["status"]);

        let (total_customers, new_today, quotations_sent, active_clients, followups_today, customers) = tokio::try_join!(
            self.gateway.count(Table::Customers, &[]),
            self.gateway.count(Table::Customers, &created_today),
            self.gateway.count(Table::Quotations, &quotations_sent),
            self.gateway.count(Table::Customers, &active_clients),
            self.gateway.count(Table::Followups, &followups_today),
            self.fetch::<CustomerFacts>(&statuses),
        )?;

        Ok(DashboardStats {
            total_customers,
            new_today,
            quotations_sent,
            active_clients,
            followups_today,
            status_distribution: status_distribution(&customers),
        })
    }

    // 2. Relatórios avulsos

    pub async fn source_stats(&self) -> Result<Vec<SourceCount>, AppError> {
        let customers = self.fetch(&customer_facts_query()).await?;
        Ok(reduce_sources(&customers))
    }

    pub async fn status_stats(&self) -> Result<Vec<StatusCount>, AppError> {
        let customers = self.fetch(&customer_facts_query()).await?;
        Ok(reduce_statuses(&customers))
    }

    pub async fn conversion_rate(&self) -> Result<ConversionRate, AppError> {
        let customers = self.fetch(&customer_facts_query()).await?;
        Ok(reduce_conversion(&customers))
    }

    pub async fn quotation_stats(&self) -> Result<QuotationStats, AppError> {
        let quotations = self.fetch(&quotation_facts_query()).await?;
        Ok(reduce_quotations(&quotations))
    }

    pub async fn rejection_reasons(&self) -> Result<Vec<ReasonCount>, AppError> {
        let query = quotation_facts_query().eq("status", "rejected").not_null("reason");
        let quotations = self.fetch(&query).await?;
        Ok(reduce_rejection_reasons(&quotations))
    }

    pub async fn monthly_growth(&self) -> Result<Vec<MonthlyCount>, AppError> {
        let customers = self.fetch(&customer_facts_query()).await?;
        Ok(reduce_monthly_growth(&customers, &Local))
    }

    pub async fn weekly_new_customers(&self) -> Result<Vec<DailyCount>, AppError> {
        let customers = self.fetch(&customer_facts_query()).await?;
        Ok(reduce_weekly_new_customers(&customers, &Local::now()))
    }

    pub async fn followup_completion(&self) -> Result<FollowupCompletion, AppError> {
        let followups = self.fetch(&followup_facts_query()).await?;
        Ok(reduce_followup_completion(&followups))
    }

    pub async fn employee_performance(&self) -> Result<Vec<EmployeePerformance>, AppError> {
        let query = customer_facts_query().not_null("assigned_to");
        let customers = self.fetch(&query).await?;
        Ok(reduce_employee_performance(&customers))
    }

    // 3. Página de relatórios: três leituras, todos os redutores

    pub async fn reports(&self) -> Result<ReportBundle, AppError> {
        self.reports_at(&Local::now()).await
    }

    pub async fn reports_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<ReportBundle, AppError> {
        let customer_query = customer_facts_query();
        let quotation_query = quotation_facts_query();
        let followup_query = followup_facts_query();
        let (customers, quotations, followups) = tokio::try_join!(
            self.fetch::<CustomerFacts>(&customer_query),
            self.fetch::<QuotationFacts>(&quotation_query),
            self.fetch::<FollowupFacts>(&followup_query),
        )?;

        tracing::debug!(
            "📊 Relatórios: {} clientes, {} propostas, {} follow-ups",
            customers.len(),
            quotations.len(),
            followups.len()
        );

        Ok(ReportBundle {
            sources: reduce_sources(&customers),
            statuses: reduce_statuses(&customers),
            conversion: reduce_conversion(&customers),
            quotations: reduce_quotations(&quotations),
            rejection_reasons: reduce_rejection_reasons(&quotations),
            monthly_growth: reduce_monthly_growth(&customers, &now.timezone()),
            weekly_new_customers: reduce_weekly_new_customers(&customers, now),
            followup_completion: reduce_followup_completion(&followups),
            employee_performance: reduce_employee_performance(&customers),
        })
    }
}
