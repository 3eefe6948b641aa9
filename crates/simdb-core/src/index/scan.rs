//! Reconstrucción del índice desde el contenido del directorio.
//!
//! Reglas:
//! - `<id>.entry.json` es el registro de una entrada (autoritativo).
//! - `<id>.<filetype>` sin registro se acepta si su contenido es un objeto
//!   JSON (directorios creados antes de existir los registros).
//! - Cualquier otro archivo, o uno que no parsea, no pertenece al set.
use std::io;
use std::path::Path;

use log::warn;

use crate::constants::RECORD_SUFFIX;
use crate::model::{Entry, ParameterSet};
use crate::storage::FileStore;

use super::DataSetIndex;

/// Papel de un nombre de archivo dentro del directorio gestionado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Record(u64),
    Artifact(u64),
    Unmanaged,
}

impl FileRole {
    pub fn classify(name: &str, filetype: &str) -> Self {
        if let Some(id) = strip_ext(name, RECORD_SUFFIX).and_then(parse_identifier) {
            return FileRole::Record(id);
        }
        match strip_ext(name, filetype).and_then(parse_identifier) {
            Some(id) => FileRole::Artifact(id),
            None => FileRole::Unmanaged,
        }
    }
}

fn strip_ext<'a>(name: &'a str, ext: &str) -> Option<&'a str> {
    name.strip_suffix(ext)?.strip_suffix('.')
}

/// Decimal canónico: sin signo, sin ceros a la izquierda.
pub fn parse_identifier(stem: &str) -> Option<u64> {
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if stem.len() > 1 && stem.starts_with('0') {
        return None;
    }
    stem.parse().ok()
}

/// Nombre del registro de índice de `id`.
pub fn record_name(id: u64) -> String {
    format!("{id}.{RECORD_SUFFIX}")
}

/// Construye el índice a partir de `names`, leyendo con `read` sólo los
/// archivos que pueden ser entradas. `read` devuelve `None` si el archivo no
/// se puede leer como texto.
///
/// Los registros se cargan por id ascendente; los artifacts sin registro
/// reciben el siguiente slot libre de su contenido.
pub fn build_index<F>(names: &[String], filetype: &str, mut read: F) -> DataSetIndex
    where F: FnMut(&str) -> Option<String>
{
    let mut records = Vec::new();
    let mut bare = Vec::new();
    for name in names {
        match FileRole::classify(name, filetype) {
            FileRole::Record(id) => {
                let Some(text) = read(name.as_str()) else {
                    warn!("skipping unreadable record {name}");
                    continue;
                };
                match serde_json::from_str::<Entry>(&text) {
                    Ok(entry) if entry.id == id => records.push(entry),
                    Ok(entry) => warn!("skipping record {name}: declares identifier {}", entry.id),
                    Err(e) => warn!("skipping malformed record {name}: {e}"),
                }
            }
            FileRole::Artifact(id) => bare.push((id, name)),
            FileRole::Unmanaged => {}
        }
    }
    records.sort_by_key(|e| e.id);
    bare.sort_by_key(|(id, _)| *id);

    let mut index = DataSetIndex::new();
    for entry in records {
        if index.slot_owner(&entry.params, entry.slot).is_some() {
            warn!("skipping record {}: slot {} already taken", entry.id, entry.slot);
        } else if let Some(owner) = index.stem_owner(&entry.file_stem()) {
            warn!("skipping record {}: file {} belongs to entry {owner}", entry.id, entry.file_stem());
        } else {
            index.insert(entry);
        }
    }
    for (id, name) in bare {
        // el archivo ya es el artifact de un registro (por id o por alias)
        if index.contains_id(id) || index.stem_owner(&id.to_string()).is_some() {
            continue;
        }
        let Some(Ok(params)) = read(name.as_str()).map(|text| ParameterSet::from_json_str(&text)) else {
            warn!("skipping {name}: no record and content is not a parameter set");
            continue;
        };
        match index.next_slot(&params) {
            Some(slot) => {
                index.insert(Entry::new(id, slot, params, None));
            }
            None => warn!("skipping {name}: no slot left for its content"),
        }
    }
    index
}

/// Lista `dir` en `store` y reconstruye el índice.
pub fn scan_directory<S: FileStore + ?Sized>(store: &S, dir: &Path, filetype: &str) -> io::Result<DataSetIndex> {
    let names = store.list(dir)?;
    Ok(build_index(&names, filetype, |name| store.read_to_string(&dir.join(name)).ok()))
}
