//! Tabla de equivalencias etiqueta -> campo de `StudentRecord`.
//!
//! Las distintas revisiones del SGA rotulan la misma columna de formas distintas
//! ("Cod. CETA", "CODIGO", "cod_ceta", ...). El mapeo es una lista ordenada de
//! `(campo, [variantes])`: para cada campo gana la primera variante, en orden, cuya
//! celda tenga texto. Las variantes se comparan normalizadas (sin acentos, sin
//! puntuación, en minúsculas), así que "Cod. CETA" y "COD_CETA" son la misma.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::carreras::fold_accent;
use crate::error::ConfigError;
use crate::models::StudentRecord;
use crate::sga::html::encabezados::is_positional_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Campo {
    StudentCode,
    FirstNames,
    LastNamePaternal,
    LastNameMaternal,
    NationalId,
    OriginPlace,
    ProgramName,
    CurriculumCode,
    BirthDate,
    BirthPlace,
    DiplomaSerialNumber,
    Email,
    Phone,
}

impl Campo {
    pub const ALL: [Campo; 13] = [
        Campo::StudentCode,
        Campo::FirstNames,
        Campo::LastNamePaternal,
        Campo::LastNameMaternal,
        Campo::NationalId,
        Campo::OriginPlace,
        Campo::ProgramName,
        Campo::CurriculumCode,
        Campo::BirthDate,
        Campo::BirthPlace,
        Campo::DiplomaSerialNumber,
        Campo::Email,
        Campo::Phone,
    ];

    fn slot<'a>(&self, r: &'a mut StudentRecord) -> &'a mut Option<String> {
        match self {
            Campo::StudentCode => &mut r.student_code,
            Campo::FirstNames => &mut r.first_names,
            Campo::LastNamePaternal => &mut r.last_name_paternal,
            Campo::LastNameMaternal => &mut r.last_name_maternal,
            Campo::NationalId => &mut r.national_id,
            Campo::OriginPlace => &mut r.origin_place,
            Campo::ProgramName => &mut r.program_name,
            Campo::CurriculumCode => &mut r.curriculum_code,
            Campo::BirthDate => &mut r.birth_date,
            Campo::BirthPlace => &mut r.birth_place,
            Campo::DiplomaSerialNumber => &mut r.diploma_serial_number,
            Campo::Email => &mut r.email,
            Campo::Phone => &mut r.phone,
        }
    }
}

/// Variantes observadas en las páginas del SGA. Las `colN` corresponden al listado
/// sin encabezado (o con `<th>` vacíos): Nº, Cod. CETA, Ap. Paterno, Ap. Materno,
/// Nombres, CI, Procedencia.
const DEFAULT_LABELS: &[(Campo, &[&str])] = &[
    (Campo::StudentCode, &["Cod. CETA", "cod_ceta", "Código CETA", "Código", "CODIGO", "Cod. Estudiante", "cod_estudiante", "Código Estudiante", "col2"]),
    (Campo::FirstNames, &["Nombres", "NOMBRES", "Nombre", "Nombre(s)", "nombres_est", "col5"]),
    (Campo::LastNamePaternal, &["Ap. Paterno", "Apellido Paterno", "AP_PATERNO", "ap_pat", "Paterno", "col3"]),
    (Campo::LastNameMaternal, &["Ap. Materno", "Apellido Materno", "AP_MATERNO", "ap_mat", "Materno", "col4"]),
    (Campo::NationalId, &["Cédula de Identidad", "CEDULA", "Cédula", "Numero_doc", "Nro. Documento", "CI", "C.I.", "Carnet", "col6"]),
    (Campo::OriginPlace, &["Procedencia", "PROCEDENCIA", "col7"]),
    (Campo::ProgramName, &["Carrera", "nombre_carrera", "Programa"]),
    (Campo::CurriculumCode, &["Pensum", "cod_pensum", "Cod. Pensum"]),
    (Campo::BirthDate, &["Fecha de Nacimiento", "Fecha Nacimiento", "F. Nacimiento", "fecha_nac"]),
    (Campo::BirthPlace, &["Lugar de Nacimiento", "Lugar Nacimiento", "lugar_nac"]),
    (Campo::DiplomaSerialNumber, &["Nro. Serie Diploma", "Serie Diploma", "Número de Serie", "nro_serie_diploma"]),
    (Campo::Email, &["Email", "E-mail", "Correo", "Correo Electrónico"]),
    (Campo::Phone, &["Teléfono", "TELEFONO", "Celular", "Tel."]),
];

/// Clave de comparación de una etiqueta: sin acentos, minúsculas, sólo alfanuméricos.
pub fn label_key(label: &str) -> String {
    label
        .chars()
        .map(fold_accent)
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Mapeo ordenado etiqueta -> campo. Se puede extender en tiempo de ejecución.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    entradas: Vec<(Campo, Vec<String>)>,
}

impl Default for FieldMap {
    fn default() -> Self {
        FieldMap {
            entradas: DEFAULT_LABELS
                .iter()
                .map(|(campo, vars)| (*campo, vars.iter().map(|v| label_key(v)).collect()))
                .collect(),
        }
    }
}

impl FieldMap {
    /// Agrega una variante al final de la lista del campo (menor prioridad).
    pub fn with_alias(mut self, campo: Campo, label: &str) -> Self {
        self.add_alias(campo, label);
        self
    }

    pub fn add_alias(&mut self, campo: Campo, label: &str) {
        let key = label_key(label);
        if key.is_empty() {
            return;
        }
        match self.entradas.iter_mut().find(|(c, _)| *c == campo) {
            Some((_, vars)) => {
                if !vars.contains(&key) {
                    vars.push(key);
                }
            }
            None => self.entradas.push((campo, vec![key])),
        }
    }

    /// Variantes (normalizadas) aceptadas para un campo, en orden de prioridad.
    pub fn variants(&self, campo: Campo) -> &[String] {
        self.entradas.iter().find(|(c, _)| *c == campo).map(|(_, v)| v.as_slice()).unwrap_or(&[])
    }

    /// Campo al que corresponde una etiqueta, si alguno.
    pub fn campo_de(&self, label: &str) -> Option<Campo> {
        let key = label_key(label);
        self.entradas.iter().find(|(_, vars)| vars.contains(&key)).map(|(c, _)| *c)
    }

    /// Agrega variantes desde un JSON `{"student_code": ["Matrícula"], ...}`.
    pub fn merge_json(&mut self, json: &str, origen: &str) -> Result<(), ConfigError> {
        let extra: HashMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|source| ConfigError::FieldMapJson { path: origen.to_string(), source })?;
        // Orden estable para que el resultado no dependa del HashMap
        let mut extra: Vec<(String, Vec<String>)> = extra.into_iter().collect();
        extra.sort_by(|a, b| a.0.cmp(&b.0));
        for (nombre, labels) in extra {
            let campo: Campo = serde_json::from_value(serde_json::Value::String(nombre.clone()))
                .map_err(|_| ConfigError::UnknownField(nombre.clone()))?;
            for l in labels {
                self.add_alias(campo, &l);
            }
        }
        Ok(())
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let origen = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FieldMapIo { path: origen.clone(), source })?;
        self.merge_json(&contents, &origen)
    }

    /// Construye un registro a partir de las columnas de una fila.
    ///
    /// Las columnas que no alimentan ningún campo quedan en `raw_fields`. Las variantes
    /// `colN` sólo se comparan con columnas marcadas como posicionales, y un código
    /// tomado por posición sólo se acepta si tiene algún dígito; así una tabla de
    /// maquetación sin encabezado no se confunde con datos.
    pub fn build_record(&self, fila: &[Columna]) -> StudentRecord {
        let keys: Vec<String> = fila.iter().map(|c| label_key(&c.etiqueta)).collect();
        let mut usados = vec![false; fila.len()];
        let mut record = StudentRecord::default();

        for (campo, vars) in &self.entradas {
            let elegido = vars.iter().find_map(|var| {
                keys.iter()
                    .enumerate()
                    .position(|(i, k)| k == var && !usados[i] && acepta(*campo, var, &fila[i]))
            });
            if let Some(i) = elegido {
                usados[i] = true;
                *campo.slot(&mut record) = Some(fila[i].texto.trim().to_string());
            }
        }

        let mut raw: BTreeMap<String, String> = BTreeMap::new();
        for (i, col) in fila.iter().enumerate() {
            if usados[i] || col.texto.trim().is_empty() {
                continue;
            }
            raw.entry(col.etiqueta.clone()).or_insert_with(|| col.texto.trim().to_string());
        }
        record.raw_fields = raw;
        record
    }
}

/// Una celda de datos con la etiqueta de su columna.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columna {
    pub etiqueta: String,
    pub texto: String,
    /// La columna no tiene encabezado con texto y se identifica por su posición.
    pub posicional: bool,
}

fn acepta(campo: Campo, var: &str, col: &Columna) -> bool {
    if col.texto.trim().is_empty() {
        return false;
    }
    if is_positional_label(var) {
        if !col.posicional {
            return false;
        }
        if campo == Campo::StudentCode {
            return col.texto.chars().any(|c| c.is_ascii_digit());
        }
    }
    true
}
