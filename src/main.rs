use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use qdrant_rag_rig_webapp::api;
use qdrant_rag_rig_webapp::app_state::AppState;
use qdrant_rag_rig_webapp::config::AppConfig;
use qdrant_rag_rig_webapp::ingest::PdfTextExtractor;
use qdrant_rag_rig_webapp::llm::LlmManager;
use qdrant_rag_rig_webapp::vector_store::QdrantIndex;

#[tokio::main]
async fn main() {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = AppConfig::from_env().expect("Error al cargar la configuración");

    // 3. Conectar a Qdrant (incluye comprobación de salud)
    let index = QdrantIndex::connect(&cfg)
        .await
        .expect("Error conectando a Qdrant");

    // 4. Inicializar gestor de LLMs
    let llm = Arc::new(
        LlmManager::from_config(&cfg).expect("Error inicializando LLM Manager"),
    );

    // 5. Crear estado compartido de la aplicación
    let server_addr = cfg.server_addr.clone();
    let app_state = AppState {
        config: cfg,
        extractor: Arc::new(PdfTextExtractor),
        index: Arc::new(index),
        embedder: llm.clone(),
        synthesizer: llm,
    };

    // 6. Configurar el router de la API con CORS abierto
    let app = api::create_router(app_state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    // 7. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .unwrap();
    info!("🚀 Servidor escuchando en http://{}", server_addr);

    // Apagado ordenado con Ctrl-C
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await
        .unwrap();

    info!("✅ Servidor cerrado correctamente.");
}
