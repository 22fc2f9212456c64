//! Carga y gestión de configuración de la aplicación (Qdrant + LLM + pipeline).

use std::env;

use anyhow::{anyhow, Result};
use url::Url;

#[derive(Clone, Debug)]
pub enum LlmProvider {
    OpenAI,
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!("Proveedor LLM no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub qdrant_url: String,
    pub qdrant_api_key: String,
    pub server_addr: String,

    pub llm_provider: LlmProvider,
    pub llm_embedding_model: String,
    pub llm_chat_model: String,

    /// Dimensión de los vectores; debe coincidir con el modelo de embeddings.
    pub embedding_dims: u64,
    pub embedding_batch_size: usize,
    /// Longitud mínima (en caracteres) para que una cláusula se indexe.
    pub min_clause_length: usize,
    /// Colección usada cuando la consulta no indica ninguna.
    pub default_collection: String,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let qdrant_url = env::var("QDRANT_URL")
            .map_err(|_| anyhow!("Falta QDRANT_URL en el entorno"))?;
        Url::parse(&qdrant_url)
            .map_err(|_| anyhow!("QDRANT_URL no es una URL válida: {qdrant_url}"))?;
        let qdrant_api_key = env::var("QDRANT_API_KEY")
            .map_err(|_| anyhow!("Falta QDRANT_API_KEY en el entorno"))?;

        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

        let llm_provider_str =
            env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let llm_provider = LlmProvider::from_str(&llm_provider_str)?;

        // rig lee OPENAI_API_KEY directamente del entorno; aquí solo se valida
        // su presencia para fallar en el arranque y no en la primera petición.
        if matches!(llm_provider, LlmProvider::OpenAI) {
            env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow!("Falta OPENAI_API_KEY en el entorno"))?;
        }

        let llm_embedding_model = env::var("LLM_EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());
        let llm_chat_model =
            env::var("LLM_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let embedding_dims = parse_var("EMBEDDING_DIMS", 768u64)?;
        let embedding_batch_size = parse_var("EMBEDDING_BATCH_SIZE", 32usize)?;
        let min_clause_length = parse_var("MIN_CLAUSE_LENGTH", 250usize)?;

        let default_collection =
            env::var("DEFAULT_COLLECTION").unwrap_or_else(|_| "default_user".to_string());

        Ok(Self {
            qdrant_url,
            qdrant_api_key,
            server_addr,
            llm_provider,
            llm_embedding_model,
            llm_chat_model,
            embedding_dims,
            embedding_batch_size,
            min_clause_length,
            default_collection,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow!("{name} debe ser un número entero, se recibió '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proveedor_conocido() {
        assert!(matches!(
            LlmProvider::from_str("OpenAI").unwrap(),
            LlmProvider::OpenAI
        ));
        assert!(matches!(
            LlmProvider::from_str("ollama").unwrap(),
            LlmProvider::Ollama
        ));
    }

    #[test]
    fn proveedor_desconocido_es_error() {
        let err = LlmProvider::from_str("mistral").unwrap_err();
        assert!(err.to_string().contains("no soportado"));
    }
}
