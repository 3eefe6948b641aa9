//! Índice en memoria del directorio gestionado.
//!
//! - `scan`: función pura que reconstruye el índice a partir de los nombres
//!   de archivo y un lector.
//! - `types`: `DataSetIndex`, el mapa id → `Entry` con las consultas por
//!   contenido (matching, count, table).

pub mod scan;
mod types;

pub use scan::{build_index, parse_identifier, record_name, scan_directory, FileRole};
pub use types::DataSetIndex;
