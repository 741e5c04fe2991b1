// src/models/dashboard.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// 1. Cards do topo do dashboard
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: u64,
    pub new_today: u64,
    pub quotations_sent: u64,
    pub active_clients: u64,
    pub followups_today: u64, // pendentes, só de hoje
    pub status_distribution: BTreeMap<String, u64>,
}

// 2. Distribuições simples
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReasonCount {
    pub reason: String,
    pub count: u64,
}

// "2026-10"
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyCount {
    pub month: String,
    pub count: u64,
}

// "2026-10-16"
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

// 3. Taxas
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ConversionRate {
    pub total: u64,
    pub active: u64,
    pub rate: f64, // %, uma casa decimal
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FollowupCompletion {
    pub total: u64,
    pub done: u64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationStats {
    pub total: u64,
    pub sent: u64,
    pub accepted: u64,
    pub rejected: u64,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    #[schema(value_type = f64)]
    pub accepted_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeePerformance {
    pub id: Uuid,
    pub name: String,
    pub count: u64,
}

// 4. Página de relatórios inteira numa resposta
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportBundle {
    pub sources: Vec<SourceCount>,
    pub statuses: Vec<StatusCount>,
    pub conversion: ConversionRate,
    pub quotations: QuotationStats,
    pub rejection_reasons: Vec<ReasonCount>,
    pub monthly_growth: Vec<MonthlyCount>,
    pub weekly_new_customers: Vec<DailyCount>,
    pub followup_completion: FollowupCompletion,
    pub employee_performance: Vec<EmployeePerformance>,
}
