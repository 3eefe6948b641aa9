//! Errores del core.
//!
//! Una única enum cubre la taxonomía completa; ninguna operación reintenta ni
//! recupera por su cuenta, todo se propaga al caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimDbError {
    /// El directorio gestionado no se puede crear o acceder.
    #[error("cannot prepare directory {}: {source}", .path.display())]
    Directory { path: PathBuf, #[source] source: io::Error },

    /// Identificador o archivo destino ya ocupado.
    #[error("entry already exists: {}", .path.display())]
    DuplicateEntry { path: PathBuf },

    /// No hay entrada con ese contenido, o `position` está fuera de rango.
    #[error("no entry at position {position} ({available} matching)")]
    Lookup { position: usize, available: usize },

    /// El proceso externo terminó con status distinto de cero.
    #[error("process '{executable}' failed (exit code {code:?}): {stderr}")]
    Process { executable: String, code: Option<i32>, stderr: String },

    /// El proceso externo ni siquiera pudo lanzarse.
    #[error("cannot launch '{executable}': {source}")]
    Launch { executable: String, #[source] source: io::Error },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// No queda un número libre después de `last` (`u64::MAX` ya en uso).
    #[error("no {kind} left after {last}")]
    Exhausted { kind: &'static str, last: u64 },
}

pub type Result<T> = std::result::Result<T, SimDbError>;
