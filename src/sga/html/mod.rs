//! Lectura de las páginas HTML del SGA.

pub mod encabezados;
pub mod tablas;

pub use encabezados::{detectar_encabezado, Encabezado, Origen};
pub use tablas::{extraer_tablas, Celda, Fila, Tabla};
