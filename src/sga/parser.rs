//! HTML del SGA -> lista de `StudentRecord`.

use crate::models::StudentRecord;
use crate::sga::campos::{Columna, FieldMap};
use crate::sga::html::{detectar_encabezado, extraer_tablas, Tabla};

/// Extrae los estudiantes de la primera tabla del documento que produzca al menos
/// un registro. Un cuerpo vacío o sin tablas útiles da una lista vacía; nunca falla.
pub fn parse_students(html: &str, campos: &FieldMap) -> Vec<StudentRecord> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    for (i, tabla) in extraer_tablas(html).iter().enumerate() {
        let registros = registros_de_tabla(tabla, campos);
        if !registros.is_empty() {
            tracing::debug!(tabla = i, registros = registros.len(), "tabla de estudiantes encontrada");
            return registros;
        }
    }
    Vec::new()
}

fn registros_de_tabla(tabla: &Tabla, campos: &FieldMap) -> Vec<StudentRecord> {
    let encabezado = detectar_encabezado(tabla);

    tabla
        .filas
        .iter()
        .skip(encabezado.inicio_datos())
        .filter(|f| f.tiene_datos())
        .map(|fila| {
            let columnas: Vec<Columna> = fila
                .celdas
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.encabezado)
                .map(|(i, c)| Columna {
                    etiqueta: encabezado.etiqueta(i),
                    texto: c.texto.clone(),
                    posicional: encabezado.admite_posicional(i),
                })
                .collect();
            campos.build_record(&columnas)
        })
        .filter(StudentRecord::is_identifiable)
        .collect()
}
