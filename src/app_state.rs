use std::sync::Arc;

use crate::config::AppConfig;
use crate::embedder::Embedder;
use crate::ingest::TextExtractor;
use crate::llm::AnswerSynthesizer;
use crate::vector_store::VectorIndex;

/// Estado compartido entre peticiones: configuración y colaboradores.
/// Se construye una vez en el arranque y después solo se lee.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub extractor: Arc<dyn TextExtractor>,
    pub index: Arc<dyn VectorIndex>,
    pub embedder: Arc<dyn Embedder>,
    pub synthesizer: Arc<dyn AnswerSynthesizer>,
}
