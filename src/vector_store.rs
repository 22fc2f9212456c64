//! Pasarela al índice vectorial (Qdrant): ciclo de vida de las colecciones,
//! alta de puntos y búsqueda por similitud de coseno.
//!
//! Cada documento ingerido se corresponde 1:1 con una colección. Reingerir
//! un documento destruye su colección y la vuelve a crear (reemplazo total,
//! nunca añadido incremental).

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;

/// Resultado de una búsqueda: texto de la cláusula y similitud de coseno.
#[derive(Debug, Clone)]
pub struct ScoredClause {
    pub text: String,
    pub score: f32,
}

/// Contrato del índice vectorial. Implementado por `QdrantIndex` en
/// producción y por un índice en memoria en las pruebas.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Destruye la colección si existe y la crea vacía con `dims` dimensiones
    /// y distancia de coseno.
    async fn recreate_collection(&self, collection: &str, dims: u64) -> Result<()>;

    /// Inserta un punto (id recién generado, vector, payload `{text}`) por
    /// cláusula y devuelve cuántos se almacenaron. Los ids no son estables
    /// entre reingestas.
    async fn upsert_clauses(
        &self,
        collection: &str,
        vectors: Vec<Vec<f32>>,
        clauses: &[String],
    ) -> Result<usize>;

    /// Hasta `top_k` cláusulas en orden de similitud descendente. Si la
    /// colección no existe, el error del backend se propaga tal cual.
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<ScoredClause>>;
}

/// Implementación sobre Qdrant. Un único cliente compartido para todo el
/// proceso, creado en el arranque.
pub struct QdrantIndex {
    client: Qdrant,
}

impl QdrantIndex {
    /// Conecta con Qdrant y verifica el servicio antes de aceptar tráfico.
    pub async fn connect(cfg: &AppConfig) -> Result<Self> {
        let client = Qdrant::from_url(&cfg.qdrant_url)
            .api_key(cfg.qdrant_api_key.clone())
            .build()?;
        client
            .health_check()
            .await
            .map_err(|e| anyhow!("Qdrant no responde en {}: {e}", cfg.qdrant_url))?;
        info!("Conexión con Qdrant verificada en {}", cfg.qdrant_url);
        Ok(Self { client })
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn recreate_collection(&self, collection: &str, dims: u64) -> Result<()> {
        if self.client.collection_exists(collection).await? {
            self.client.delete_collection(collection).await?;
            debug!("Colección '{collection}' eliminada para su reemplazo");
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dims, Distance::Cosine)),
            )
            .await?;
        info!("Colección '{collection}' creada ({dims} dimensiones, coseno)");
        Ok(())
    }

    async fn upsert_clauses(
        &self,
        collection: &str,
        vectors: Vec<Vec<f32>>,
        clauses: &[String],
    ) -> Result<usize> {
        let mut points = Vec::with_capacity(clauses.len());
        for (vector, clause) in vectors.into_iter().zip(clauses) {
            let payload = Payload::try_from(serde_json::json!({ "text": clause }))
                .map_err(|e| anyhow!("payload inválido para Qdrant: {e}"))?;
            points.push(PointStruct::new(Uuid::new_v4().to_string(), vector, payload));
        }

        if points.is_empty() {
            return Ok(0);
        }

        let stored = points.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points))
            .await?;
        info!("{stored} cláusulas almacenadas en la colección '{collection}'");
        Ok(stored)
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<ScoredClause>> {
        let response = self
            .client
            .search_points(SearchPointsBuilder::new(collection, vector, top_k).with_payload(true))
            .await?;

        Ok(response
            .result
            .into_iter()
            .map(|hit| ScoredClause {
                text: clause_text(&hit.payload),
                score: hit.score,
            })
            .collect())
    }
}

/// Texto de la cláusula guardado en el payload del punto; cadena vacía si el
/// punto no lo trae. `Value::as_str` de qdrant devuelve `Option<&String>`.
fn clause_text(payload: &HashMap<String, Value>) -> String {
    payload
        .get("text")
        .and_then(|v| v.as_str())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extrae_el_texto_del_payload() {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), Value::from("cláusula almacenada"));
        assert_eq!(clause_text(&payload), "cláusula almacenada");
    }

    #[test]
    fn un_punto_sin_campo_text_da_cadena_vacia() {
        let mut payload = HashMap::new();
        payload.insert("body".to_string(), Value::from("otro campo"));
        assert_eq!(clause_text(&payload), "");
        assert_eq!(clause_text(&HashMap::new()), "");
    }
}
