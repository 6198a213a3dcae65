// src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Catálogo de materiais + alerta de estoque baixo
    let material_routes = Router::new()
        .route(
            "/",
            post(handlers::materials::create_material)
                .get(handlers::materials::get_all_materials),
        )
        .route("/low-stock", get(handlers::materials::get_low_stock))
        .route("/{id}", put(handlers::materials::update_material))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Entradas de estoque (recebimento)
    let stock_entry_routes = Router::new()
        .route(
            "/",
            post(handlers::stock_entries::add_stock)
                .get(handlers::stock_entries::get_all_stock_entries),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Ciclo de vida das solicitações
    let request_routes = Router::new()
        .route(
            "/",
            post(handlers::requests::create_request).get(handlers::requests::list_requests),
        )
        .route(
            "/{id}",
            get(handlers::requests::get_request).put(handlers::requests::update_request),
        )
        .route("/{id}/approve", post(handlers::requests::approve_request))
        .route("/{id}/reject", post(handlers::requests::reject_request))
        .route("/{id}/dispatch", post(handlers::requests::dispatch_request))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/materials", material_routes)
        .nest("/api/stock-entries", stock_entry_routes)
        .nest("/api/requests", request_routes)
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
