//! Abstracción sobre Rig para trabajar con distintos proveedores de LLM.
//! De momento se implementa OpenAI; Gemini/Ollama quedan preparados para el futuro.

use crate::config::{AppConfig, LlmProvider};
use crate::embedder::Embedder;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::embeddings::EmbeddingModel; // <- para .embed_texts

/// Redacta la respuesta final a partir de la pregunta y las cláusulas
/// recuperadas. Implementado por `LlmManager`; las pruebas usan stubs.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(&self, question: &str, clauses: &[String]) -> Result<String>;
}

/// Gestor de LLMs y embeddings. Se construye una vez en el arranque y se
/// comparte en modo lectura entre todas las peticiones.
#[derive(Debug, Clone)]
pub struct LlmManager {
    pub provider: LlmProvider,
    pub embedding_model: String,
    pub chat_model: String,
    /// Dimensión solicitada al proveedor de embeddings; la misma con la que
    /// se crean las colecciones.
    pub embedding_dims: usize,
}

impl LlmManager {
    /// Construye el gestor a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(Self {
            provider: cfg.llm_provider.clone(),
            embedding_model: cfg.llm_embedding_model.clone(),
            chat_model: cfg.llm_chat_model.clone(),
            embedding_dims: cfg.embedding_dims as usize,
        })
    }

    // ---------------------------------------------------------------------
    // EMBEDDINGS
    // ---------------------------------------------------------------------

    async fn embed_with_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        use rig::providers::openai::{self, TEXT_EMBEDDING_3_SMALL};
        // Trait para client.embedding_model(...)
        use rig::client::EmbeddingsClient as _;

        let client = openai::Client::from_env();

        // Modelo de embeddings: config o default
        let model_name = if self.embedding_model.is_empty() {
            TEXT_EMBEDDING_3_SMALL
        } else {
            self.embedding_model.as_str()
        };

        // La dimensión configurada viaja en la petición (parámetro
        // `dimensions` de OpenAI); sin ella el modelo responde con su
        // dimensión nativa y Qdrant rechaza los puntos.
        let embedding_model =
            client.embedding_model_with_ndims(model_name, self.embedding_dims);

        // Embeddings en bloque (.embed_texts viene de EmbeddingModel)
        let embeddings = embedding_model.embed_texts(texts.to_vec()).await?;

        if embeddings.len() != texts.len() {
            return Err(anyhow!(
                "Número de embeddings ({}) distinto al número de textos ({})",
                embeddings.len(),
                texts.len()
            ));
        }

        // Qdrant trabaja con f32; rig devuelve f64.
        Ok(embeddings
            .into_iter()
            .map(|emb| emb.vec.into_iter().map(|x| x as f32).collect())
            .collect())
    }

    // ---------------------------------------------------------------------
    // CHAT / COMPLETION
    // ---------------------------------------------------------------------

    async fn answer_with_openai(&self, question: &str, clauses: &[String]) -> Result<String> {
        use rig::providers::openai;
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        // El prompt va en inglés: los contratos y las preguntas del caso de
        // uso lo están.
        const SYSTEM_PROMPT: &str = r#"
You are a legal assistant specialized in contract clauses.
Answer only the stated legal question, using exclusively the clauses supplied in the prompt.
Be precise, avoid hallucinations, and cite only what's present in the clauses.
Include all relevant details from the clauses in a clear and understandable manner.
"#;

        let client = openai::Client::from_env();

        // Modelo de chat por defecto si no se ha configurado otro
        let model_name = if self.chat_model.is_empty() {
            "gpt-4o-mini"
        } else {
            self.chat_model.as_str()
        };

        let agent = client
            .agent(model_name)
            .preamble(SYSTEM_PROMPT)
            .build();

        let answer = agent.prompt(build_grounding_prompt(question, clauses)).await?;
        Ok(answer)
    }
}

#[async_trait]
impl Embedder for LlmManager {
    /// Calcula embeddings para un lote de textos.
    ///
    /// Nota: sólo implementado para OpenAI. Para otros proveedores
    /// se podrían añadir ramas adicionales al `match`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.provider {
            LlmProvider::OpenAI => self.embed_with_openai(texts).await,
            ref other => Err(anyhow!(
                "Proveedor LLM {:?} aún no implementado para embeddings",
                other
            )),
        }
    }
}

#[async_trait]
impl AnswerSynthesizer for LlmManager {
    /// Genera una respuesta fundamentada únicamente en las cláusulas dadas,
    /// en una sola llamada al modelo, sin reintentos ni streaming.
    async fn synthesize(&self, question: &str, clauses: &[String]) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAI => self.answer_with_openai(question, clauses).await,
            ref other => Err(anyhow!(
                "Proveedor LLM {:?} aún no implementado para chat",
                other
            )),
        }
    }
}

/// Prompt de usuario: la pregunta seguida de las cláusulas recuperadas como
/// lista con viñetas, en el orden en que llegaron.
pub fn build_grounding_prompt(question: &str, clauses: &[String]) -> String {
    let bullets = clauses
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!("Question: {question}\n\nRelevant Clauses:\n{bullets}\n\nAnswer:")
}
