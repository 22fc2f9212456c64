//! Ingesta de un contrato PDF: extracción de texto, segmentación en
//! cláusulas, embeddings e indexado en su colección del vector store.
//!
//! Las etapas corren en secuencia estricta y el fallo de cualquiera aborta
//! la ingesta con un error que identifica la etapa. Reingerir un documento
//! con el mismo nombre reemplaza por completo su colección.

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::embedder::{encode, Embedder};
use crate::segmenter::{self, SegmentationPath};
use crate::vector_store::VectorIndex;

/// Colaborador de extracción de texto: bytes de un PDF a texto plano.
/// Implementado por `PdfTextExtractor` en producción; las pruebas de la capa
/// HTTP usan stubs.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// Extracción sobre `pdf-extract`, a partir de los bytes subidos. Con pérdida:
/// la maquetación y las tablas no se conservan.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| anyhow!("{e}"))
    }
}

/// Resumen de los resultados de una operación de ingesta.
#[derive(Debug)]
pub struct IngestionSummary {
    pub document: String,
    pub clauses_segmented: usize,
    pub clauses_stored: usize,
    pub segmentation_path: SegmentationPath,
}

/// Implementa cómo se mostrará el resumen como texto.
impl std::fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resumen: documento '{}', {} cláusulas segmentadas (vía {}), {} almacenadas.",
            self.document,
            self.clauses_segmented,
            self.segmentation_path.as_str(),
            self.clauses_stored
        )
    }
}

/// Pipeline completo para un PDF subido: extraer → segmentar → embeber →
/// indexar. `document` debe llegar ya saneado; da nombre a la colección.
pub async fn ingest_document(
    extractor: &dyn TextExtractor,
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    cfg: &AppConfig,
    document: &str,
    bytes: &[u8],
) -> Result<IngestionSummary> {
    // --- Fase 1: Extracción ---
    let text = extractor
        .extract(bytes)
        .map_err(|e| anyhow!("fallo en la extracción del PDF '{document}': {e}"))?;
    debug!(
        "Extraídos {} caracteres del PDF '{document}'",
        text.chars().count()
    );

    ingest_text(index, embedder, cfg, document, &text).await
}

/// Etapas posteriores a la extracción, separadas para poder ejercitarlas
/// sin un PDF real.
///
/// El reemplazo de la colección (borrar, crear, alta) no es atómico en el
/// backend: una consulta concurrente puede ver la colección vacía o a medias.
pub async fn ingest_text(
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    cfg: &AppConfig,
    document: &str,
    text: &str,
) -> Result<IngestionSummary> {
    // --- Fase 2: Segmentación ---
    let segmentation = segmenter::segment(text, cfg.min_clause_length);
    let clauses = segmentation.clauses;
    debug!(
        "Documento '{document}': {} cláusulas segmentadas (vía {})",
        clauses.len(),
        segmentation.path.as_str()
    );
    if clauses.is_empty() {
        warn!(
            "Documento '{document}' sin cláusulas de al menos {} caracteres; \
             la colección quedará vacía",
            cfg.min_clause_length
        );
    }

    // --- Fase 3: Embeddings ---
    let vectors = if clauses.is_empty() {
        Vec::new()
    } else {
        encode(embedder, &clauses, cfg.embedding_batch_size, true)
            .await
            .map_err(|e| anyhow!("fallo en la etapa de embeddings de '{document}': {e}"))?
    };

    // --- Fase 4: Indexado (reemplazo total de la colección) ---
    index
        .recreate_collection(document, cfg.embedding_dims)
        .await
        .map_err(|e| anyhow!("fallo en la etapa de indexado de '{document}': {e}"))?;
    let stored = index
        .upsert_clauses(document, vectors, &clauses)
        .await
        .map_err(|e| anyhow!("fallo en la etapa de indexado de '{document}': {e}"))?;

    Ok(IngestionSummary {
        document: document.to_string(),
        clauses_segmented: clauses.len(),
        clauses_stored: stored,
        segmentation_path: segmentation.path,
    })
}
