//! Adaptador del SGA legado: transporte, parseo de HTML y mapeo de campos.

pub mod campos;
pub mod cliente;
pub mod html;
pub mod parser;

pub use campos::{Campo, Columna, FieldMap};
pub use cliente::{SgaClient, StudentSearch};
pub use parser::parse_students;
