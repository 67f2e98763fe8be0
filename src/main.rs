//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{any, get, post, put},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG, "info" por padrão)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env().context("Falha ao ler a configuração")?;
    let app_state = AppState::new(&config).context("Falha ao inicializar o estado da aplicação.")?;

    // Migrações: uma vez por banco físico (recintos podem compartilhar)
    for pool in app_state.pools.distinct_pools() {
        sqlx::migrate!()
            .run(pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados.")?;
    }
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if config.reminder_enabled {
        app_state.reminder_job.clone().spawn();
        tracing::info!("⏰ Lembrete de prazo agendado ({})", config.reminder_tz);
    }

    let guard = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users))
        .route("/me", get(handlers::auth::get_me))
        .route("/me/department", put(handlers::users::select_my_department))
        .route("/{uid}/role", put(handlers::users::update_role))
        .route("/{uid}/department", put(handlers::users::assign_department))
        .layer(guard());

    let department_routes = Router::new()
        .route("/"
               ,get(handlers::departments::list_departments)
               .post(handlers::departments::create_department)
        )
        .route("/{id}"
               ,put(handlers::departments::update_department)
               .delete(handlers::departments::delete_department)
        )
        .layer(guard());

    let role_routes = Router::new()
        .route("/", get(handlers::rbac::list_roles))
        .route("/permissions", get(handlers::rbac::get_matrix))
        .route("/{role}/permissions", put(handlers::rbac::update_role_permissions))
        .layer(guard());

    let deadline_routes = Router::new()
        .route("/"
               ,get(handlers::deadlines::get_deadline)
               .put(handlers::deadlines::set_deadline)
        )
        .route("/unlocks/{department_id}", put(handlers::deadlines::set_unlock))
        .layer(guard());

    let plan_routes = Router::new()
        .route("/"
               ,post(handlers::plans::create_plan)
               .get(handlers::plans::list_plans)
        )
        .route("/{id}"
               ,get(handlers::plans::get_plan)
               .put(handlers::plans::update_plan)
        )
        .route("/{id}/submit", post(handlers::plans::submit_plan))
        .layer(guard());

    let approval_routes = Router::new()
        .route("/", get(handlers::approvals::list_pending))
        .route("/{id}/approve", post(handlers::approvals::approve_plan))
        .route("/{id}/reject", post(handlers::approvals::reject_plan))
        .route("/{id}/review", post(handlers::approvals::review_plan))
        .layer(guard());

    let report_routes = Router::new()
        .route("/plans", get(handlers::reports::list_history))
        .route("/export", get(handlers::reports::export_history))
        .layer(guard());

    let dashboard_routes = Router::new()
        .route("/results", get(handlers::dashboard::get_results))
        .layer(guard());

    let evento_routes = Router::new()
        .route("/", get(handlers::eventos::list_eventos))
        .layer(guard());

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/api-skill/{*rest}", any(handlers::proxy::forward))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/departments", department_routes)
        .nest("/api/roles", role_routes)
        .nest("/api/deadlines", deadline_routes)
        .nest("/api/plans", plan_routes)
        .nest("/api/approvals", approval_routes)
        .nest("/api/reports", report_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/eventos", evento_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
