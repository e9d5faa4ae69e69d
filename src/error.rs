//! Taxonomía de fallos del adaptador SGA.
//!
//! Ninguna operación del adaptador propaga errores de transporte crudos: todo se
//! convierte en un `SgaFailure` con su `ErrorKind` en el borde del adaptador.

use serde::Serialize;
use std::fmt;

/// Clase de fallo reportada al llamador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// El llamador violó una precondición (falta carrera, sin criterios de búsqueda).
    InvalidArgument,
    /// Credenciales rechazadas por el SGA.
    Unauthorized,
    /// Red caída, timeout, TLS.
    ConnectionError,
    /// El SGA respondió, pero con una página de error o un status inesperado.
    RemoteError,
    /// Búsqueda de un único registro sin resultados.
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::RemoteError => "remote_error",
            ErrorKind::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// Variante `Failure` del resultado de cualquier operación del adaptador.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct SgaFailure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl SgaFailure {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        SgaFailure { kind, detail: detail.into() }
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, detail)
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionError, detail)
    }

    pub fn remote(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteError, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, detail)
    }

    /// Mensaje legible para la respuesta HTTP. Nunca incluye HTML del SGA.
    pub fn user_message(&self) -> String {
        let base = match self.kind {
            ErrorKind::InvalidArgument => "Parámetros inválidos",
            ErrorKind::Unauthorized => "Credenciales inválidas",
            ErrorKind::ConnectionError => "Error de conexión con el SGA",
            ErrorKind::RemoteError => "Error en consulta SGA",
            ErrorKind::NotFound => "Estudiante no encontrado",
        };
        if self.detail.is_empty() {
            base.to_string()
        } else {
            format!("{}: {}", base, self.detail)
        }
    }
}

/// Errores al construir la configuración (antes de arrancar el servidor).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no hay ningún endpoint SGA configurado")]
    NoEndpoints,
    #[error("debe existir exactamente un endpoint por defecto (hay {0})")]
    DefaultCount(usize),
    #[error("clave de carrera duplicada: '{0}'")]
    DuplicateKey(String),
    #[error("alias '{alias}' apunta a '{first}' y a '{second}'")]
    AmbiguousAlias { alias: String, first: String, second: String },
    #[error("URL base inválida para '{key}': {url}")]
    InvalidUrl { key: String, url: String },
    #[error("entrada SGA_CARRERAS mal formada: '{0}'")]
    MalformedEntry(String),
    #[error("carrera por defecto '{0}' no está configurada")]
    UnknownDefault(String),
    #[error("valor numérico inválido en {var}: '{value}'")]
    InvalidNumber { var: String, value: String },
    #[error("no se pudo leer el mapa de campos {path}: {source}")]
    FieldMapIo { path: String, #[source] source: std::io::Error },
    #[error("mapa de campos inválido {path}: {source}")]
    FieldMapJson { path: String, #[source] source: serde_json::Error },
    #[error("campo desconocido en el mapa de campos: '{0}'")]
    UnknownField(String),
    #[error("no se pudo crear el cliente HTTP: {0}")]
    HttpClient(#[source] reqwest::Error),
}
