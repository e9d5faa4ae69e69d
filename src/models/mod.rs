// Estructuras de datos principales del adaptador SGA

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::SgaFailure;

/// Una instancia del SGA legado (una por carrera o grupo de carreras).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramEndpoint {
    /// Identificador canónico en minúsculas, p. ej. "mecanica".
    pub program_key: String,
    /// URL absoluta, sin barra final.
    pub base_url: String,
    pub is_default: bool,
    /// Sinónimos aceptados por el resolvedor (acentos y mayúsculas no importan).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ProgramEndpoint {
    pub fn new(program_key: &str, base_url: &str, is_default: bool) -> Self {
        ProgramEndpoint {
            program_key: program_key.trim().to_lowercase(),
            base_url: normalize_base_url(base_url),
            is_default,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Une la URL base con una ruta del SGA (`/index.php/main`, ...).
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Quita espacios y barras finales: "http://host/sga/" -> "http://host/sga".
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Registro normalizado de un estudiante extraído de una tabla del SGA.
///
/// Se serializa con las claves que ya consume el frontend (`cod_ceta`, `nombres`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    #[serde(rename = "cod_ceta")]
    pub student_code: Option<String>,
    #[serde(rename = "nombres")]
    pub first_names: Option<String>,
    #[serde(rename = "ap_paterno")]
    pub last_name_paternal: Option<String>,
    #[serde(rename = "ap_materno")]
    pub last_name_maternal: Option<String>,
    #[serde(rename = "numero_doc")]
    pub national_id: Option<String>,
    #[serde(rename = "procedencia")]
    pub origin_place: Option<String>,
    #[serde(rename = "carrera")]
    pub program_name: Option<String>,
    #[serde(rename = "cod_pensum")]
    pub curriculum_code: Option<String>,
    #[serde(rename = "fecha_nacimiento")]
    pub birth_date: Option<String>,
    #[serde(rename = "lugar_nacimiento")]
    pub birth_place: Option<String>,
    #[serde(rename = "nro_serie_diploma")]
    pub diploma_serial_number: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    /// Columnas que no corresponden a ningún campo conocido (etiqueta original -> texto).
    #[serde(rename = "raw")]
    pub raw_fields: BTreeMap<String, String>,
}

impl StudentRecord {
    /// Un registro sin código ni nombres es ruido (separadores, filas vacías).
    pub fn is_identifiable(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
        filled(&self.student_code)
            || filled(&self.first_names)
            || filled(&self.last_name_paternal)
            || filled(&self.last_name_maternal)
    }
}

/// Variante `Success` de un resultado de búsqueda.
///
/// `total` es el conteo previo a la paginación, por lo que `total >= records.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lookup {
    pub records: Vec<StudentRecord>,
    pub total: usize,
}

impl Lookup {
    pub fn all(records: Vec<StudentRecord>) -> Self {
        let total = records.len();
        Lookup { records, total }
    }

    /// Aplica `records[offset .. offset + limit]` conservando el total completo.
    pub fn paginate(records: Vec<StudentRecord>, page: Pagination) -> Self {
        let total = records.len();
        let records = records.into_iter().skip(page.offset).take(page.limit).collect();
        Lookup { records, total }
    }
}

/// Resultado de toda operación de búsqueda del adaptador.
pub type LookupOutcome = Result<Lookup, SgaFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { limit: 100, offset: 0 }
    }
}

/// Contexto inmutable de una llamada: carrera pedida, endpoint resuelto y,
/// opcionalmente, el token obtenido con `authenticate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgaContext {
    pub program_identifier: String,
    pub endpoint: ProgramEndpoint,
    pub token: Option<String>,
}

impl SgaContext {
    pub fn new(program_identifier: &str, endpoint: ProgramEndpoint) -> Self {
        SgaContext {
            program_identifier: program_identifier.trim().to_string(),
            endpoint,
            token: None,
        }
    }

    /// Devuelve una copia del contexto con el token indicado.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        SgaContext { token: Some(token.into()), ..self.clone() }
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }
}

/// Estado de conectividad para mostrar en la UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
    /// Status HTTP observado, si hubo respuesta.
    pub status: Option<u16>,
    pub checked_at: String,
}

/// Criterios de búsqueda por nombre (sin recortar todavía).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameQuery {
    pub given_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
}

impl NameQuery {
    pub fn new(given_names: &str, paternal_surname: &str, maternal_surname: &str) -> Self {
        NameQuery {
            given_names: given_names.trim().to_string(),
            paternal_surname: paternal_surname.trim().to_string(),
            maternal_surname: maternal_surname.trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.given_names.is_empty() && self.paternal_surname.is_empty() && self.maternal_surname.is_empty()
    }
}

/// Criterio de listado por grupo (tercera rama de `buscar_estudiantes` en el SGA).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupQuery {
    pub cod_pensum: String,
    pub gestion: String,
    pub cod_grupo: String,
}
