// src/config.rs

use std::{env, fmt::Display, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{ActivityLog, DataGateway, MemoryGateway, ReferentialPolicy, RestGateway},
    services::{
        auth::AuthService,
        catalog_service::CatalogService,
        crm_service::CrmService,
        dashboard_service::DashboardService,
        followup_service::FollowupService,
        meeting_service::MeetingService,
        quotation_service::{QuotationNumbering, QuotationService},
        user_service::UserService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStore {
    Rest,
    Memory,
}

impl FromStr for DataStore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(format!("DATA_STORE inválido: '{other}' (use rest|memory)")),
        }
    }
}

// Tudo o que vem do ambiente (.env)
#[derive(Clone)]
pub struct Settings {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub admin_user: String,
    pub admin_pass: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub data_store: DataStore,
    pub quotation_numbering: QuotationNumbering,
    pub cascade_deletes: bool,
    pub http_timeout: Duration,
    pub bind_addr: String,
    pub database_url: Option<String>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} inválido ('{raw}'): {e}")),
        _ => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let data_store = parse_var("DATA_STORE", DataStore::Rest)?;
        let supabase_url = var_or("SUPABASE_URL", "");
        let supabase_anon_key = var_or("SUPABASE_ANON_KEY", "");
        if data_store == DataStore::Rest && (supabase_url.is_empty() || supabase_anon_key.is_empty()) {
            bail!("SUPABASE_URL e SUPABASE_ANON_KEY devem ser definidos (ou use DATA_STORE=memory)");
        }

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            admin_user: var_or("ADMIN_USER", "admin"),
            admin_pass: var_or("ADMIN_PASS", "admin123"),
            jwt_secret,
            jwt_ttl_hours: parse_var("JWT_TTL_HOURS", 12)?,
            data_store,
            quotation_numbering: parse_var("QUOTATION_NUMBERING", QuotationNumbering::Sequence)?,
            cascade_deletes: parse_var("CASCADE_DELETES", true)?,
            http_timeout: Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", 10)?),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
        })
    }

    pub fn gateway(&self) -> anyhow::Result<Arc<dyn DataGateway>> {
        let gateway: Arc<dyn DataGateway> = match self.data_store {
            DataStore::Rest => Arc::new(
                RestGateway::new(&self.supabase_url, &self.supabase_anon_key, self.http_timeout)
                    .context("Falha ao configurar o cliente da API REST")?,
            ),
            DataStore::Memory => {
                let policy = if self.cascade_deletes {
                    ReferentialPolicy::Cascade
                } else {
                    ReferentialPolicy::Unenforced
                };
                tracing::warn!("⚠️ Usando banco em memória ({:?}): os dados somem ao reiniciar", policy);
                Arc::new(MemoryGateway::new(policy))
            }
        };
        Ok(gateway)
    }
}

// Aplica o schema no Postgres por trás da API REST
pub async fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Falha ao conectar ao banco para as migrações")?;

    sqlx::migrate!().run(&pool).await.context("Falha ao rodar as migrações")?;
    pool.close().await;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    Ok(())
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub gateway: Arc<dyn DataGateway>,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub meeting_service: MeetingService,
    pub quotation_service: QuotationService,
    pub followup_service: FollowupService,
    pub catalog_service: CatalogService,
    pub user_service: UserService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let settings = Settings::from_env()?;

        if let Some(database_url) = &settings.database_url {
            run_migrations(database_url).await?;
        }

        let gateway = settings.gateway()?;
        tracing::info!("✅ Camada de dados pronta ({:?})", settings.data_store);

        Ok(Self::from_gateway(settings, gateway))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_gateway(settings: Settings, gateway: Arc<dyn DataGateway>) -> Self {
        // Um único log de atividades: a fila de pendentes é compartilhada
        let activity_log = ActivityLog::new(gateway.clone());

        let auth_service = AuthService::new(
            settings.admin_user.clone(),
            settings.admin_pass.clone(),
            settings.jwt_secret.clone(),
            settings.jwt_ttl_hours,
        );

        Self {
            i18n_store: I18nStore::new(),
            auth_service,
            crm_service: CrmService::new(gateway.clone(), activity_log.clone()),
            meeting_service: MeetingService::new(gateway.clone(), activity_log.clone()),
            quotation_service: QuotationService::new(
                gateway.clone(),
                activity_log.clone(),
                settings.quotation_numbering,
            ),
            followup_service: FollowupService::new(gateway.clone(), activity_log.clone()),
            catalog_service: CatalogService::new(gateway.clone(), activity_log.clone()),
            user_service: UserService::new(gateway.clone(), activity_log),
            dashboard_service: DashboardService::new(gateway.clone()),
            gateway,
            settings,
        }
    }
}

#[cfg(test)]
impl Settings {
    pub fn for_tests() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            admin_user: "admin".into(),
            admin_pass: "admin123".into(),
            jwt_secret: "test-secret".into(),
            jwt_ttl_hours: 12,
            data_store: DataStore::Memory,
            quotation_numbering: QuotationNumbering::Sequence,
            cascade_deletes: true,
            http_timeout: Duration::from_secs(10),
            bind_addr: "127.0.0.1:0".into(),
            database_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_store_parses() {
        assert_eq!("memory".parse(), Ok(DataStore::Memory));
        assert_eq!("REST".parse(), Ok(DataStore::Rest));
        assert!("sqlite".parse::<DataStore>().is_err());
    }

    #[test]
    fn memory_store_needs_no_remote_credentials() {
        let settings = Settings::for_tests();
        assert!(settings.gateway().is_ok());
    }

    #[test]
    fn rest_store_requires_url_and_key() {
        let settings = Settings {
            data_store: DataStore::Rest,
            ..Settings::for_tests()
        };
        assert!(settings.gateway().is_err());
    }
}
