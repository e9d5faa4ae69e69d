//! Resolución de carrera -> instancia del SGA.
//!
//! Cada carrera puede vivir en un servidor SGA distinto. El resolvedor traduce el
//! texto libre que envía el frontend ("Mecánica Automotriz", "MECANICA", ...) a uno
//! de los endpoints configurados y cae al endpoint por defecto si no reconoce nada.

use std::collections::{HashMap, HashSet};

use crate::error::ConfigError;
use crate::models::ProgramEndpoint;

/// Normaliza un nombre legible: minúsculas, sin acentos, puntuación convertida a
/// espacios y espacios colapsados.
pub fn normalize_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let c = fold_accent(ch);
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mapa simple de acentos comunes en español/latam.
pub fn fold_accent(ch: char) -> char {
    match ch {
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'É' | 'È' | 'Ë' | 'Ê' | 'é' | 'è' | 'ë' | 'ê' => 'e',
        'Í' | 'Ì' | 'Ï' | 'Î' | 'í' | 'ì' | 'ï' | 'î' => 'i',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' | 'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'Ú' | 'Ù' | 'Ü' | 'Û' | 'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Ñ' | 'ñ' => 'n',
        'Ç' | 'ç' => 'c',
        other => other,
    }
}

/// Tabla inmutable de endpoints con su índice de alias.
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    endpoints: Vec<ProgramEndpoint>,
    /// nombre normalizado (clave o alias) -> índice en `endpoints`
    index: HashMap<String, usize>,
    default_idx: usize,
}

impl EndpointResolver {
    /// Valida los invariantes: al menos un endpoint, exactamente uno por defecto,
    /// claves únicas y alias sin ambigüedad.
    pub fn new(endpoints: Vec<ProgramEndpoint>) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let defaults: Vec<usize> = endpoints.iter().enumerate().filter(|(_, e)| e.is_default).map(|(i, _)| i).collect();
        if defaults.len() != 1 {
            return Err(ConfigError::DefaultCount(defaults.len()));
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut keys: HashSet<String> = HashSet::new();
        for (i, ep) in endpoints.iter().enumerate() {
            if !(ep.base_url.starts_with("http://") || ep.base_url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl { key: ep.program_key.clone(), url: ep.base_url.clone() });
            }

            let key = normalize_name(&ep.program_key);
            if key.is_empty() || !keys.insert(key.clone()) {
                return Err(ConfigError::DuplicateKey(ep.program_key.clone()));
            }
            insert_name(&mut index, &endpoints, key, i)?;

            for alias in &ep.aliases {
                let norm = normalize_name(alias);
                if norm.is_empty() { continue; }
                insert_name(&mut index, &endpoints, norm, i)?;
            }
        }

        Ok(EndpointResolver { endpoints, index, default_idx: defaults[0] })
    }

    /// Devuelve el endpoint para la carrera indicada; nunca falla.
    pub fn resolve(&self, program_identifier: &str) -> &ProgramEndpoint {
        let norm = normalize_name(program_identifier);
        if norm.is_empty() {
            return self.default_endpoint();
        }
        match self.index.get(&norm) {
            Some(&i) => &self.endpoints[i],
            None => {
                tracing::debug!(carrera = program_identifier, "carrera no reconocida, usando endpoint por defecto");
                self.default_endpoint()
            }
        }
    }

    pub fn default_endpoint(&self) -> &ProgramEndpoint {
        &self.endpoints[self.default_idx]
    }

    pub fn endpoints(&self) -> &[ProgramEndpoint] {
        &self.endpoints
    }
}

fn insert_name(index: &mut HashMap<String, usize>, endpoints: &[ProgramEndpoint], name: String, i: usize) -> Result<(), ConfigError> {
    match index.get(&name) {
        Some(&j) if j != i => Err(ConfigError::AmbiguousAlias {
            alias: name,
            first: endpoints[j].program_key.clone(),
            second: endpoints[i].program_key.clone(),
        }),
        Some(_) => Ok(()),
        None => {
            index.insert(name, i);
            Ok(())
        }
    }
}
