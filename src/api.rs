//! Capa HTTP de la aplicación: subida de contratos PDF y consultas RAG.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{app_state::AppState, ingest, rag};

/// Subidas de hasta 50 MB; el límite por defecto de axum (2 MB) se queda
/// corto para contratos escaneados.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct QueryPayload {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: u64,
    #[serde(default)]
    collection_name: Option<String>,
}

fn default_top_k() -> u64 {
    5
}

#[derive(Serialize)]
pub struct QueryResponse {
    query: String,
    top_k: u64,
    results: Vec<String>,
    response: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    filename: String,
    content_type: String,
    size: usize,
    clauses_stored: usize,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/uploadfile/", post(upload_file_handler))
        .route("/query/", post(query_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn upload_file_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<serde_json::Value>)> {
    let mut file_part: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("Formulario multipart inválido: {}", e)})),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("uploaded.pdf").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(&filename)
                    .first()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string())
            });
        let bytes = field
            .bytes()
            .await
            .map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": format!("No se pudo leer el fichero subido: {}", e)})),
                )
            })?
            .to_vec();

        file_part = Some((filename, content_type, bytes));
        break;
    }

    let Some((filename, content_type, bytes)) = file_part else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Falta el campo 'file' en el formulario."})),
        ));
    };

    // El nombre saneado identifica al documento y a su colección.
    let document = sanitize_document_name(&filename);
    if document.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "El nombre del fichero no contiene caracteres válidos."})),
        ));
    }

    let size = bytes.len();
    info!("Subida recibida: '{filename}' ({size} bytes), colección '{document}'");

    let result = ingest::ingest_document(
        state.extractor.as_ref(),
        state.index.as_ref(),
        state.embedder.as_ref(),
        &state.config,
        &document,
        &bytes,
    )
    .await;

    match result {
        Ok(summary) => {
            info!("¡Ingesta completada! {}", summary);
            Ok(Json(UploadResponse {
                filename: document,
                content_type,
                size,
                clauses_stored: summary.clauses_stored,
            }))
        }
        Err(e) => {
            error!("Error en la ingesta de '{document}': {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("Error al procesar el documento: {}", e)})),
            ))
        }
    }
}

#[axum::debug_handler]
async fn query_handler(
    State(state): State<AppState>,
    Json(payload): Json<QueryPayload>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<serde_json::Value>)> {
    if !(1..=10).contains(&payload.top_k) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "top_k debe estar entre 1 y 10."})),
        ));
    }

    let collection = payload
        .collection_name
        .clone()
        .unwrap_or_else(|| state.config.default_collection.clone());
    info!(
        "Consulta sobre la colección '{collection}' (top_k = {})",
        payload.top_k
    );

    let rag_result = rag::rag_query(
        state.index.as_ref(),
        state.embedder.as_ref(),
        state.synthesizer.as_ref(),
        &state.config,
        &payload.query,
        payload.top_k,
        &collection,
    )
    .await;

    match rag_result {
        Ok(outcome) => Ok(Json(QueryResponse {
            query: payload.query,
            top_k: payload.top_k,
            results: outcome.clauses,
            response: outcome.answer,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Error al procesar la consulta RAG: {}", e)})),
        )),
    }
}

#[axum::debug_handler]
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// --- Utilidades ---

/// Conserva caracteres alfanuméricos, espacios, puntos y guiones bajos, y
/// convierte los espacios en guiones bajos. El resultado sirve de nombre de
/// colección, así que puede quedar vacío para nombres sin nada aprovechable.
pub fn sanitize_document_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_'))
        .collect::<String>()
        .replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanea_nombres_con_espacios_y_simbolos() {
        assert_eq!(
            sanitize_document_name("My Contract (v2).pdf"),
            "My_Contract_v2.pdf"
        );
    }

    #[test]
    fn neutraliza_rutas_relativas() {
        assert_eq!(sanitize_document_name("../../etc/passwd"), "....etcpasswd");
    }

    #[test]
    fn conserva_guiones_bajos_y_unicode() {
        assert_eq!(
            sanitize_document_name("contrato_españa 2024.pdf"),
            "contrato_españa_2024.pdf"
        );
    }

    #[test]
    fn nombre_sin_caracteres_validos_queda_vacio() {
        assert_eq!(sanitize_document_name("@#$%&"), "");
    }
}
