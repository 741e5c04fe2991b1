// src/db/query.rs

use serde_json::Value;

// As relações expostas pela API REST do banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Customers,
    Meetings,
    Quotations,
    Followups,
    CustomerServices,
    Services,
    Users,
    Activities,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Meetings => "meetings",
            Table::Quotations => "quotations",
            Table::Followups => "followups",
            Table::CustomerServices => "customer_services",
            Table::Services => "services",
            Table::Users => "users",
            Table::Activities => "activities",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
//  FILTROS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    IsNull(String),
    NotNull(String),
    /// Qualquer uma das colunas contém o termo (case-insensitive).
    AnyILike(Vec<String>, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

// =============================================================================
//  JOINS EMBUTIDOS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A linha pai guarda a FK (`via`) que aponta para o `id` do filho.
    One,
    /// As linhas filhas guardam a FK (`via`) que aponta para o `id` do pai.
    Many,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub alias: Option<String>,
    pub table: Table,
    pub via: String,
    pub cardinality: Cardinality,
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
}

impl Embed {
    pub fn one(alias: &str, table: Table, via: &str) -> Self {
        Self {
            alias: Some(alias.to_string()),
            table,
            via: via.to_string(),
            cardinality: Cardinality::One,
            columns: Vec::new(),
            embeds: Vec::new(),
        }
    }

    pub fn many(table: Table, via: &str) -> Self {
        Self {
            alias: None,
            table,
            via: via.to_string(),
            cardinality: Cardinality::Many,
            columns: Vec::new(),
            embeds: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Chave sob a qual o recurso aparece na linha pai.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.table.name())
    }
}

// =============================================================================
//  QUERY
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            embeds: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(column.to_string(), value.into()))
    }

    #[cfg(test)]
    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Neq(column.to_string(), value.into()))
    }

    #[cfg(test)]
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gt(column.to_string(), value.into()))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gte(column.to_string(), value.into()))
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lt(column.to_string(), value.into()))
    }

    #[cfg(test)]
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lte(column.to_string(), value.into()))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(Filter::IsNull(column.to_string()))
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(Filter::NotNull(column.to_string()))
    }

    pub fn search(self, columns: &[&str], term: &str) -> Self {
        self.filter(Filter::AnyILike(
            columns.iter().map(|c| c.to_string()).collect(),
            term.to_string(),
        ))
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(OrderBy {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
