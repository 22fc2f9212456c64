//! Segmentación heurística de contratos en cláusulas.
//!
//! Primero se intenta una segmentación estructural buscando encabezados al
//! inicio de línea (etiquetas numéricas tipo "1.", "2.3", "10.1.2" o títulos
//! cortos tipo "Confidentiality:"). Si esa vía no retiene ninguna cláusula,
//! se descarta por completo y se cae a un troceo por líneas.

use std::sync::OnceLock;

use regex::Regex;

/// Límite de cláusula: etiqueta numérica de uno o dos dígitos (con grupos
/// ".d" opcionales y punto final opcional) seguida de espacio o fin de línea,
/// o una línea completa en formato título de 4 a 40 letras/espacios con dos
/// puntos opcionales. Anclado al inicio de línea para no cortar dentro de un
/// cuerpo.
const BOUNDARY_PATTERN: &str =
    r"(?m)^(?:\d{1,2}(?:\.\d{1,2})*\.?(?:[ \t]+|[ \t]*$)|[A-Z][a-z ]{3,39}:?[ \t]*$)";

static BOUNDARY: OnceLock<Regex> = OnceLock::new();

fn boundary() -> &'static Regex {
    BOUNDARY.get_or_init(|| {
        Regex::new(BOUNDARY_PATTERN).expect("patrón de límites de cláusula inválido")
    })
}

/// Vía por la que se obtuvieron las cláusulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationPath {
    /// Encabezados estructurales detectados.
    Structural,
    /// Troceo por líneas (el documento no tenía estructura reconocible).
    Lines,
}

impl SegmentationPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "estructural",
            Self::Lines => "por líneas",
        }
    }
}

/// Resultado de la segmentación: cláusulas en orden de documento y la vía usada.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub clauses: Vec<String>,
    pub path: SegmentationPath,
}

/// Divide el texto extraído en cláusulas de al menos `min_length` caracteres.
///
/// Las cláusulas resultantes vienen recortadas y con los saltos de línea
/// internos colapsados a espacios. Nunca falla: un documento sin estructura
/// ni líneas largas produce una lista vacía.
pub fn segment(text: &str, min_length: usize) -> Segmentation {
    let clauses = segment_structural(text, min_length);
    if !clauses.is_empty() {
        return Segmentation {
            clauses,
            path: SegmentationPath::Structural,
        };
    }

    Segmentation {
        clauses: segment_by_lines(text, min_length),
        path: SegmentationPath::Lines,
    }
}

/// Cuerpo de cada cláusula: desde el final de su límite hasta el inicio del
/// siguiente (o el final del texto). El texto anterior al primer límite se
/// descarta.
fn segment_structural(text: &str, min_length: usize) -> Vec<String> {
    let bounds: Vec<(usize, usize)> = boundary()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut clauses = Vec::new();
    for (i, &(_, body_start)) in bounds.iter().enumerate() {
        let body_end = bounds.get(i + 1).map_or(text.len(), |&(start, _)| start);
        let body = normalize_body(&text[body_start..body_end]);
        if body.chars().count() >= min_length {
            clauses.push(body);
        }
    }
    clauses
}

fn segment_by_lines(text: &str, min_length: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= min_length)
        .map(str::to_owned)
        .collect()
}

fn normalize_body(raw: &str) -> String {
    raw.trim().replace('\n', " ")
}
