// Módulos de la aplicación
mod api;
mod app_state;
mod config;
mod error;
mod intent;
mod llm;
mod models;
mod parser;
mod prompts;
mod roadmap_service;
mod session;
mod store;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::{AppConfig, StoreBackend};
use crate::store::{InMemoryStore, Neo4jStore, RoadmapStore};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración (falla aquí si falta la clave del modelo)
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;

    // 3. Preparar el almacén
    let store = build_store(&cfg).await?;

    // 4. Inicializar gestor de LLMs
    let llm_manager =
        llm::LlmManager::from_config(&cfg).context("Error inicializando LLM Manager")?;

    // 5. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        store,
        llm: Arc::new(llm_manager),
    };

    // 6. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state))
        .fallback_service(ServeDir::new(&cfg.static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 7. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {}", cfg.server_addr))?;
    info!("🚀 Servidor escuchando en http://{}", cfg.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}

async fn build_store(cfg: &AppConfig) -> Result<Arc<dyn RoadmapStore>> {
    match cfg.store_backend {
        StoreBackend::Neo4j => {
            let neo4j = cfg
                .neo4j
                .as_ref()
                .ok_or_else(|| anyhow!("Faltan las credenciales de Neo4j"))?;
            let store = Neo4jStore::connect(neo4j)
                .await
                .context("Error conectando a Neo4j")?;
            store
                .ensure_schema()
                .await
                .context("Error asegurando el esquema de Neo4j")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!(
                "Usando almacén en memoria con {} usuario(s) precargado(s)",
                cfg.seed_users.len()
            );
            Ok(Arc::new(InMemoryStore::with_users(cfg.seed_users.clone())))
        }
    }
}
