//! Capa de embeddings: contrato del proveedor y política de lotes y
//! normalización. El proveedor real vive en `llm.rs`; las pruebas usan stubs.

use anyhow::Result;
use async_trait::async_trait;

/// Proveedor de embeddings. En producción lo implementa `LlmManager`;
/// en las pruebas, stubs deterministas.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embebe un lote de textos: un vector por texto, en el mismo orden.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Codifica `texts` delegando en el proveedor por lotes de `batch_size`,
/// normalizando cada vector a norma L2 unitaria si `normalize` es true.
///
/// Sin reintentos ni caché. La ingesta y la consulta deben usar el mismo
/// modelo de embeddings: si difieren, la similitud del coseno se degrada en
/// silencio, sin ningún error observable.
pub async fn encode(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    normalize: bool,
) -> Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let mut embedded = embedder.embed_batch(batch).await?;
        if normalize {
            for vector in &mut embedded {
                l2_normalize(vector);
            }
        }
        vectors.extend(embedded);
    }
    Ok(vectors)
}

/// Normaliza el vector en sitio; el vector cero se deja intacto.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Devuelve `[longitud del texto, 1.0]` por entrada y registra el tamaño
    /// de cada lote recibido.
    struct StubEmbedder {
        batches: Mutex<Vec<usize>>,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(texts.len());
            Ok(texts
                .iter()
                .map(|t| vec![t.chars().count() as f32, 1.0])
                .collect())
        }
    }

    fn textos(palabras: &[&str]) -> Vec<String> {
        palabras.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn respeta_el_tamano_de_lote_y_el_orden() {
        let stub = StubEmbedder::new();
        let entradas = textos(&["a", "bb", "ccc", "dddd", "eeeee"]);
        let vectores = tokio_test::block_on(encode(&stub, &entradas, 2, false)).unwrap();

        assert_eq!(*stub.batches.lock().unwrap(), vec![2, 2, 1]);
        let longitudes: Vec<f32> = vectores.iter().map(|v| v[0]).collect();
        assert_eq!(longitudes, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn normaliza_cuando_se_pide() {
        let stub = StubEmbedder::new();
        let entradas = textos(&["xxx"]);
        let vectores = tokio_test::block_on(encode(&stub, &entradas, 32, true)).unwrap();

        // [3, 1] tiene norma sqrt(10)
        let norma = (10.0f32).sqrt();
        assert!((vectores[0][0] - 3.0 / norma).abs() < 1e-6);
        assert!((vectores[0][1] - 1.0 / norma).abs() < 1e-6);
    }

    #[test]
    fn sin_normalizar_pasa_tal_cual() {
        let stub = StubEmbedder::new();
        let entradas = textos(&["xxx"]);
        let vectores = tokio_test::block_on(encode(&stub, &entradas, 32, false)).unwrap();
        assert_eq!(vectores[0], vec![3.0, 1.0]);
    }

    #[test]
    fn normalizar_vector_cero_lo_deja_intacto() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn lote_cero_no_entra_en_bucle_infinito() {
        let stub = StubEmbedder::new();
        let entradas = textos(&["a", "b"]);
        let vectores = tokio_test::block_on(encode(&stub, &entradas, 0, false)).unwrap();
        assert_eq!(vectores.len(), 2);
        assert_eq!(*stub.batches.lock().unwrap(), vec![1, 1]);
    }
}
