//! `Entry`: un artifact almacenado y el `ParameterSet` que lo produjo.
//!
//! La misma estructura es el registro de índice que se persiste como
//! `<id>.entry.json` junto al artifact.
use serde::{Deserialize, Serialize};

use super::ParameterSet;

/// - `id`: identificador de almacenamiento, único en el directorio; nombra el
///   artifact y el registro.
/// - `slot`: número de la instancia dentro de su contenido; `(params, slot)`
///   es único y es lo que `create` recibe como identificador explícito.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "identifier")]
    pub id: u64,
    pub slot: u64,
    /// Nombre de archivo alternativo; no reemplaza al identificador.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(rename = "parameters")]
    pub params: ParameterSet,
}

impl Entry {
    pub fn new(id: u64, slot: u64, params: ParameterSet, alias: Option<String>) -> Self {
        Self { id, slot, alias, params }
    }

    /// Nombre del artifact sin extensión: el id, o el alias (con `-<slot>`
    /// para slots distintos de cero).
    pub fn file_stem(&self) -> String {
        match &self.alias {
            Some(alias) => alias_stem(alias, self.slot),
            None => self.id.to_string(),
        }
    }
}

pub fn alias_stem(alias: &str, slot: u64) -> String {
    if slot == 0 {
        alias.to_string()
    } else {
        format!("{alias}-{slot}")
    }
}
