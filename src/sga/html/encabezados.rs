//! Detección heurística de la fila de encabezados.
//!
//! El SGA a veces usa `<th>`, a veces `<td>` con estilo de encabezado y a veces no
//! emite encabezado (o lo emite con `<th>` vacíos). Orden de intentos:
//! 1. primera fila con celdas `<th>`;
//! 2. primera fila cuyo texto coincide con al menos dos palabras clave;
//! 3. sin encabezado: etiquetas posicionales `col1..colN`.

use crate::carreras::normalize_name;
use crate::sga::html::tablas::{Fila, Tabla};

/// Palabras clave (ya normalizadas) que delatan una fila de encabezado.
pub const HEADER_KEYWORDS: &[&str] = &[
    "cod",
    "nombre",
    "apellido",
    "paterno",
    "materno",
    "cedula",
    "procedencia",
    "email",
    "correo",
    "telefono",
    "pensum",
    "carrera",
];

/// Mínimo de celdas que deben coincidir para aceptar una fila `<td>` como encabezado.
pub const MIN_KEYWORD_MATCHES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origen {
    /// Fila con `<th>`.
    CeldasTh,
    /// Fila `<td>` reconocida por palabras clave.
    PalabrasClave,
    /// No se encontró encabezado.
    Posicional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encabezado {
    pub etiquetas: Vec<String>,
    /// Índice de la fila de encabezado dentro de la tabla, si existe.
    pub fila: Option<usize>,
    pub origen: Origen,
}

impl Encabezado {
    /// Etiqueta para la columna `idx` (0-based): la del encabezado si existe,
    /// posicional en otro caso.
    pub fn etiqueta(&self, idx: usize) -> String {
        match self.etiquetas.get(idx) {
            Some(e) => e.clone(),
            None => positional_label(idx),
        }
    }

    /// Si la columna `idx` puede alimentar campos por su posición. Sólo cuando la
    /// tabla no tiene encabezado o la celda del encabezado vino vacía; las columnas
    /// que sobran a la derecha de un encabezado con texto quedan fuera.
    pub fn admite_posicional(&self, idx: usize) -> bool {
        match self.origen {
            Origen::Posicional => true,
            Origen::CeldasTh | Origen::PalabrasClave => {
                self.etiquetas.get(idx).is_some_and(|e| is_positional_label(e))
            }
        }
    }

    /// Primera fila de datos.
    pub fn inicio_datos(&self) -> usize {
        self.fila.map(|f| f + 1).unwrap_or(0)
    }
}

/// `col1`, `col2`, ... (1-based, como las columnas que ve el usuario).
pub fn positional_label(idx: usize) -> String {
    format!("col{}", idx + 1)
}

pub fn is_positional_label(label: &str) -> bool {
    label.strip_prefix("col").is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

pub fn detectar_encabezado(tabla: &Tabla) -> Encabezado {
    if let Some(idx) = tabla.filas.iter().position(Fila::tiene_encabezados) {
        return Encabezado { etiquetas: etiquetas_de(&tabla.filas[idx]), fila: Some(idx), origen: Origen::CeldasTh };
    }

    if let Some(idx) = tabla.filas.iter().position(|f| coincidencias(f) >= MIN_KEYWORD_MATCHES) {
        return Encabezado { etiquetas: etiquetas_de(&tabla.filas[idx]), fila: Some(idx), origen: Origen::PalabrasClave };
    }

    Encabezado { etiquetas: Vec::new(), fila: None, origen: Origen::Posicional }
}

/// Palabras clave demasiado cortas para buscarlas como subcadena ("ci" aparece en
/// "Ciudad" o "Dirección"): sólo cuentan como palabra completa.
pub const HEADER_TOKENS: &[&str] = &["ci"];

/// Cantidad de celdas de la fila que contienen alguna palabra clave.
pub fn coincidencias(fila: &Fila) -> usize {
    fila.celdas.iter().filter(|c| es_palabra_clave(&c.texto)).count()
}

fn es_palabra_clave(texto: &str) -> bool {
    let norm = normalize_name(texto);
    if HEADER_KEYWORDS.iter().any(|kw| norm.contains(kw)) {
        return true;
    }
    // "C.I." se normaliza a "c i"; también se prueba la forma compacta
    let compacto = norm.replace(' ', "");
    HEADER_TOKENS.iter().any(|tk| compacto == *tk || norm.split_whitespace().any(|w| w == *tk))
}

// Las etiquetas vacías (p. ej. `<th width="15%"></th>`) se reemplazan por la posicional.
fn etiquetas_de(fila: &Fila) -> Vec<String> {
    fila.celdas
        .iter()
        .enumerate()
        .map(|(i, c)| if c.texto.trim().is_empty() { positional_label(i) } else { c.texto.trim().to_string() })
        .collect()
}
