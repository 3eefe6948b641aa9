//! simdb
//!
//! Fachada del workspace:
//! - Re-exporta `simdb-core` (manager, runner, modelos y errores).
//! - Los escenarios end-to-end viven en `tests/` de este crate.
//!
//! Puede usarse directamente o a través del binario `simdb` (crate
//! `simdb-cli`).

pub use simdb_core::*;
