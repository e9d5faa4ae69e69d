//! Configuración del adaptador, leída una sola vez al arrancar.
//!
//! Variables reconocidas (también desde `.env`):
//!
//! - `SGA_API_URL`: URL base del endpoint `general` (por defecto `http://localhost/sga`).
//! - `SGA_CARRERAS`: endpoints adicionales, `clave|alias|alias=url;clave2=url2`.
//! - `SGA_CARRERA_DEFAULT`: clave del endpoint por defecto (`general`).
//! - `SGA_API_KEY`: cabecera `X-API-Key` para la API JSON.
//! - `SGA_HEALTH_TIMEOUT_SECS`, `SGA_LOOKUP_TIMEOUT_SECS`, `SGA_CONNECT_TIMEOUT_SECS`
//!   (el de conexión debe ser menor que los otros dos).
//! - `SGA_FIELD_MAP_FILE`: JSON con variantes extra de encabezados.
//! - `SGA_BIND`, `SGA_CORS_ORIGIN`: servidor HTTP.

use std::path::Path;
use std::time::Duration;

use crate::carreras::{normalize_name, EndpointResolver};
use crate::error::ConfigError;
use crate::models::ProgramEndpoint;
use crate::sga::campos::FieldMap;

pub const DEFAULT_API_URL: &str = "http://localhost/sga";
pub const DEFAULT_PROGRAM_KEY: &str = "general";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct SgaConfig {
    pub resolver: EndpointResolver,
    pub api_key: Option<String>,
    pub health_timeout: Duration,
    pub lookup_timeout: Duration,
    pub connect_timeout: Duration,
    pub field_map: FieldMap,
    pub bind: String,
    pub cors_origin: Option<String>,
}

impl SgaConfig {
    /// Configuración con los valores por defecto para un conjunto de endpoints ya validado.
    pub fn new(resolver: EndpointResolver) -> Self {
        SgaConfig {
            resolver,
            api_key: None,
            health_timeout: Duration::from_secs(5),
            lookup_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(3),
            field_map: FieldMap::default(),
            bind: DEFAULT_BIND.to_string(),
            cors_origin: None,
        }
    }

    /// Lee el entorno del proceso (cargando `.env` si existe).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Igual que `from_env` pero con una función de búsqueda inyectable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = get("SGA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let default_key = get("SGA_CARRERA_DEFAULT")
            .map(|k| normalize_name(&k))
            .unwrap_or_else(|| DEFAULT_PROGRAM_KEY.to_string());

        let mut entries = match get("SGA_CARRERAS") {
            Some(raw) => parse_carreras(&raw)?,
            None => Vec::new(),
        };
        if !entries.iter().any(|e| normalize_name(&e.program_key) == DEFAULT_PROGRAM_KEY) {
            entries.insert(0, ProgramEndpoint::new(DEFAULT_PROGRAM_KEY, &api_url, false));
        }

        let mut found = false;
        for e in entries.iter_mut() {
            e.is_default = normalize_name(&e.program_key) == default_key;
            found |= e.is_default;
        }
        if !found {
            return Err(ConfigError::UnknownDefault(default_key));
        }

        let mut config = SgaConfig::new(EndpointResolver::new(entries)?);
        config.api_key = get("SGA_API_KEY");
        if let Some(t) = secs(&get, "SGA_HEALTH_TIMEOUT_SECS")? {
            config.health_timeout = t;
        }
        if let Some(t) = secs(&get, "SGA_LOOKUP_TIMEOUT_SECS")? {
            config.lookup_timeout = t;
        }
        if let Some(t) = secs(&get, "SGA_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout = t;
        }
        // El timeout de conexión debe vencer antes que los de cada petición
        if config.connect_timeout >= config.health_timeout.min(config.lookup_timeout) {
            return Err(ConfigError::InvalidNumber {
                var: "SGA_CONNECT_TIMEOUT_SECS".to_string(),
                value: config.connect_timeout.as_secs().to_string(),
            });
        }
        if let Some(path) = get("SGA_FIELD_MAP_FILE") {
            config.field_map.merge_file(Path::new(&path))?;
        }
        if let Some(bind) = get("SGA_BIND") {
            config.bind = bind;
        }
        config.cors_origin = get("SGA_CORS_ORIGIN");
        Ok(config)
    }
}

fn secs<G>(get: &G, var: &str) -> Result<Option<Duration>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(None),
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(Duration::from_secs(n))),
            _ => Err(ConfigError::InvalidNumber { var: var.to_string(), value: v }),
        },
    }
}

/// `mecanica|Mecánica Automotriz|mechanical=http://10.0.0.5/sga;electricidad=http://10.0.0.6/sga`
pub fn parse_carreras(raw: &str) -> Result<Vec<ProgramEndpoint>, ConfigError> {
    let mut out = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (names, url) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedEntry(entry.to_string()))?;
        let mut names = names.split('|').map(str::trim).filter(|n| !n.is_empty());
        let key = names.next().ok_or_else(|| ConfigError::MalformedEntry(entry.to_string()))?;
        if url.trim().is_empty() {
            return Err(ConfigError::MalformedEntry(entry.to_string()));
        }
        out.push(ProgramEndpoint::new(key, url, false).with_aliases(names));
    }
    Ok(out)
}
