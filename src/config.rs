// src/config.rs

use std::{env, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{MaterialRepository, RequestRepository, StockEntryRepository, UserRepository},
    services::{
        auth::AuthService, material_service::MaterialService, request_service::RequestService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub material_service: MaterialService,
    pub request_service: RequestService,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, a
    // aplicação não deve iniciar.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let material_repo = MaterialRepository::new(db_pool.clone());
        let request_repo = RequestRepository::new(db_pool.clone());
        let stock_entry_repo = StockEntryRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret, db_pool.clone());
        let material_service = MaterialService::new(
            material_repo.clone(),
            stock_entry_repo,
            db_pool.clone(),
        );
        let request_service =
            RequestService::new(request_repo, material_repo, db_pool.clone());

        Ok(Self {
            db_pool,
            auth_service,
            material_service,
            request_service,
        })
    }
}
