//! Sistema RAG para contratos legales en PDF: segmentación heurística en
//! cláusulas, embeddings, indexado en Qdrant y respuestas del LLM
//! fundamentadas en las cláusulas recuperadas.

pub mod api;
pub mod app_state;
pub mod config;
pub mod embedder;
pub mod ingest;
pub mod llm;
pub mod rag;
pub mod segmenter;
pub mod vector_store;
