//! Consulta RAG contra el índice de cláusulas.
//!
//! Flujo:
//!   1. Embedding de la pregunta con el mismo modelo usado en la ingesta.
//!   2. Búsqueda top-k por similitud de coseno en la colección del documento.
//!   3. El LLM redacta una respuesta fundamentada solo en lo recuperado.

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::config::AppConfig;
use crate::embedder::{encode, Embedder};
use crate::llm::AnswerSynthesizer;
use crate::vector_store::VectorIndex;

/// Respuesta final y las cláusulas que la fundamentan, en orden de
/// similitud descendente.
#[derive(Debug)]
pub struct QueryOutcome {
    pub answer: String,
    pub clauses: Vec<String>,
}

/// Respuesta devuelta sin llamar al LLM cuando la búsqueda no recupera nada.
const EMPTY_ANSWER: &str =
    "No relevant clauses were found in the indexed document for this question.";

/// Lanza una consulta RAG contra la colección indicada.
///
/// Si la colección no existe, el error NotFound del índice se propaga tal
/// cual. `top_k` debe venir ya validado por la capa de interfaz.
pub async fn rag_query(
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    synthesizer: &dyn AnswerSynthesizer,
    cfg: &AppConfig,
    question: &str,
    top_k: u64,
    collection: &str,
) -> Result<QueryOutcome> {
    // 1) Embedding de la pregunta
    let question_batch = vec![question.to_string()];
    let vectors = encode(embedder, &question_batch, cfg.embedding_batch_size, true).await?;
    let query_vector = vectors
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No se pudo generar el embedding de la pregunta"))?;

    // 2) Búsqueda top-k en la colección del documento
    let hits = index.search(collection, query_vector, top_k).await?;
    for (i, hit) in hits.iter().enumerate() {
        debug!(
            "Resultado {} en '{collection}': score {:.4}",
            i + 1,
            hit.score
        );
    }

    if hits.is_empty() {
        return Ok(QueryOutcome {
            answer: EMPTY_ANSWER.to_string(),
            clauses: Vec::new(),
        });
    }

    // 3) Respuesta fundamentada en las cláusulas recuperadas
    let clauses: Vec<String> = hits.into_iter().map(|hit| hit.text).collect();
    let answer = synthesizer.synthesize(question, &clauses).await?;

    Ok(QueryOutcome { answer, clauses })
}
