// src/config.rs

use anyhow::Context;
use axum::extract::FromRef;
use chrono_tz::Tz;
use std::{collections::BTreeMap, env, sync::Arc};

use crate::{
    common::db_utils::FacilityPools,
    db::{DashboardRepository, DeadlineRepository, DepartmentRepository, PlanRepository, RbacRepository, UserRepository},
    models::recinto::Recinto,
    services::{
        auth::AuthService,
        deadline_service::DeadlineService,
        department_service::DepartmentService,
        identity::{IdentityConfig, MicrosoftIdentity},
        mail::{GraphConfig, GraphMailer, Mailer},
        notifications::Notifier,
        plan_service::PlanService,
        rbac_service::RbacService,
        reminder::{PgReminderStore, ReminderJob},
        report_service::ReportService,
        skill::{SkillClient, SkillConfig, DEFAULT_BASE_URL},
        user_service::UserService,
    },
};

const DEFAULT_LOGIN_URL: &str = "https://login.microsoftonline.com";
const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com";

/// Configuração lida do ambiente (.env).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub database_urls: BTreeMap<Recinto, String>,
    pub graph: GraphConfig,
    pub identity: IdentityConfig,
    pub skill: SkillConfig,
    pub app_url: String,
    pub reminder_tz: Tz,
    pub reminder_enabled: bool,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{name} deve ser definida"))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn or_default(name: &str, default: &str) -> String {
    optional(name).unwrap_or_else(|| default.to_string())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        // CCCI e CEVP caem no banco do CCCR quando não configurados.
        let cccr_url = required("DATABASE_URL_CCCR")?;
        let mut database_urls = BTreeMap::new();
        database_urls.insert(Recinto::Cccr, cccr_url.clone());
        for (recinto, var) in [(Recinto::Ccci, "DATABASE_URL_CCCI"), (Recinto::Cevp, "DATABASE_URL_CEVP")] {
            database_urls.insert(recinto, optional(var).unwrap_or_else(|| cccr_url.clone()));
        }

        let login_url = or_default("MICROSOFT_LOGIN_URL", DEFAULT_LOGIN_URL);
        let client_id = required("MICROSOFT_CLIENT_ID")?;
        let tenant_id = required("MICROSOFT_TENANT_ID")?;

        let graph = GraphConfig {
            client_id: client_id.clone(),
            client_secret: required("MICROSOFT_CLIENT_SECRET")?,
            tenant_id: tenant_id.clone(),
            sender_email: required("MICROSOFT_SENDER_EMAIL")?,
            login_url: login_url.clone(),
            graph_url: or_default("MICROSOFT_GRAPH_URL", DEFAULT_GRAPH_URL),
        };

        let identity = IdentityConfig {
            jwks_url: optional("MICROSOFT_JWKS_URL").unwrap_or_else(|| {
                format!("{}/common/discovery/v2.0/keys", login_url.trim_end_matches('/'))
            }),
            audience: optional("MICROSOFT_SPA_CLIENT_ID").unwrap_or(client_id),
            // Lista separada por vírgula; padrão = o tenant da aplicação.
            allowed_tenants: optional("MICROSOFT_ALLOWED_TENANTS")
                .map(|v| v.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect())
                .unwrap_or_else(|| vec![tenant_id]),
        };

        let skill = SkillConfig {
            base_url: or_default("SKILL_BASE_URL", DEFAULT_BASE_URL),
            username: or_default("SKILL_USERNAME", ""),
            password: or_default("SKILL_PASSWORD", ""),
            company_auth_id: or_default("SKILL_COMPANY_AUTH_ID", ""),
        };

        let tz_name = or_default("REMINDER_TIMEZONE", "America/Mexico_City");
        let reminder_tz: Tz = tz_name
            .parse()
            .map_err(|e| anyhow::anyhow!("REMINDER_TIMEZONE inválido ({tz_name}): {e}"))?;

        let reminder_enabled = optional("REMINDER_ENABLED")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        Ok(Self {
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:3000"),
            jwt_secret: required("JWT_SECRET")?,
            database_urls,
            graph,
            identity,
            skill,
            app_url: or_default("APP_URL", "https://gh-planesdeaccion.web.app"),
            reminder_tz,
            reminder_enabled,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pools: FacilityPools,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub department_service: DepartmentService,
    pub rbac_service: RbacService,
    pub deadline_service: DeadlineService,
    pub plan_service: PlanService,
    pub report_service: ReportService,
    pub skill_client: SkillClient,
    pub reminder_job: ReminderJob,
}

// O proxy só precisa do cliente HTTP da Skill.
impl FromRef<AppState> for SkillClient {
    fn from_ref(state: &AppState) -> Self {
        state.skill_client.clone()
    }
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let cccr_url = config
            .database_urls
            .get(&Recinto::Cccr)
            .context("DATABASE_URL_CCCR deve ser definida")?;
        let pools = FacilityPools::connect_lazy(&config.database_urls, cccr_url)
            .context("URL de banco de dados inválida")?;
        tracing::info!("✅ {} banco(s) de dados configurado(s)", pools.distinct_count());

        let http = reqwest::Client::builder()
            .user_agent(concat!("planes-accion/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Falha ao criar o cliente HTTP")?;

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(pools.clone());
        let department_repo = DepartmentRepository::new(pools.clone());
        let rbac_repo = RbacRepository::new(pools.clone());
        let plan_repo = PlanRepository::new(pools.clone());
        let deadline_repo = DeadlineRepository::new(pools.clone());
        let dashboard_repo = DashboardRepository::new(pools.clone());

        let mailer: Arc<dyn Mailer> = Arc::new(GraphMailer::new(http.clone(), config.graph.clone()));
        let identity = Arc::new(MicrosoftIdentity::new(http.clone(), config.identity.clone()));
        let notifier = Notifier::new(
            mailer.clone(),
            Arc::new(user_repo.clone()),
            config.app_url.clone(),
            config.reminder_tz,
        );

        let auth_service = AuthService::new(user_repo.clone(), identity, config.jwt_secret.clone());
        let user_service = UserService::new(user_repo.clone(), department_repo.clone());
        let department_service = DepartmentService::new(department_repo.clone());
        let rbac_service = RbacService::new(rbac_repo, pools.clone());
        let deadline_service = DeadlineService::new(deadline_repo.clone(), department_repo.clone(), notifier.clone());
        let plan_service = PlanService::new(plan_repo.clone(), department_repo, deadline_repo.clone(), notifier);
        let report_service = ReportService::new(plan_repo, dashboard_repo, config.reminder_tz);
        let skill_client = SkillClient::new(http, config.skill.clone());

        let reminder_job = ReminderJob::new(
            Arc::new(PgReminderStore::new(deadline_repo, user_repo)),
            mailer,
            config.reminder_tz,
            config.app_url.clone(),
        );

        Ok(Self {
            pools,
            auth_service,
            user_service,
            department_service,
            rbac_service,
            deadline_service,
            plan_service,
            report_service,
            skill_client,
            reminder_job,
        })
    }
}
