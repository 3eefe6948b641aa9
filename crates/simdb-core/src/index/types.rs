use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::errors::{Result, SimDbError};
use crate::model::{Entry, ParameterSet};

/// Mapa id → `Entry` ordenado por identificador, con el digest de cada
/// contenido precalculado para agrupar sin recanonicalizar.
#[derive(Debug, Clone, Default)]
pub struct DataSetIndex {
    entries: BTreeMap<u64, Entry>,
    digests: BTreeMap<u64, String>,
}

impl DataSetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `1 + max(id)`, o `0` con el índice vacío. `None` si `u64::MAX` ya
    /// está en uso.
    pub fn next_id(&self) -> Option<u64> {
        match self.entries.keys().next_back() {
            Some(max) => max.checked_add(1),
            None => Some(0),
        }
    }

    /// `1 + max(slot)` entre las entradas con contenido `params`, o `0` si no
    /// hay ninguna. `None` si `u64::MAX` ya está en uso.
    pub fn next_slot(&self, params: &ParameterSet) -> Option<u64> {
        match self.matching(params).last() {
            Some(last) => last.slot.checked_add(1),
            None => Some(0),
        }
    }

    /// Entrada con contenido `params` en el slot `slot`.
    pub fn slot_owner(&self, params: &ParameterSet, slot: u64) -> Option<&Entry> {
        self.matching(params).into_iter().find(|e| e.slot == slot)
    }

    pub fn contains_id(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// Inserta (o reemplaza) la entrada con su id.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        self.digests.insert(entry.id, entry.params.digest());
        self.entries.insert(entry.id, entry)
    }

    pub fn remove(&mut self, id: u64) -> Option<Entry> {
        self.digests.remove(&id);
        self.entries.remove(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.digests.clear();
    }

    /// Todas las entradas en orden ascendente de id.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Entradas cuyo contenido es igual a `params`, por slot ascendente. El
    /// índice en el vector resultante es la `position` de la entrada.
    pub fn matching(&self, params: &ParameterSet) -> Vec<&Entry> {
        let digest = params.digest();
        let mut found: Vec<&Entry> = self.entries
                                         .values()
                                         .filter(|e| self.digests.get(&e.id) == Some(&digest) && e.params == *params)
                                         .collect();
        found.sort_by_key(|e| e.slot);
        found
    }

    /// La entrada `position` entre las que coinciden con `params`.
    pub fn nth_matching(&self, params: &ParameterSet, position: usize) -> Result<&Entry> {
        let matches = self.matching(params);
        let available = matches.len();
        matches.into_iter()
               .nth(position)
               .ok_or(SimDbError::Lookup { position, available })
    }

    pub fn count(&self, params: &ParameterSet) -> usize {
        self.matching(params).len()
    }

    /// Contenidos distintos, ordenados por el menor id que los contiene.
    pub fn table(&self) -> Vec<ParameterSet> {
        let mut distinct: IndexMap<&str, &ParameterSet> = IndexMap::new();
        for (id, entry) in &self.entries {
            if let Some(digest) = self.digests.get(id) {
                distinct.entry(digest.as_str()).or_insert(&entry.params);
            }
        }
        distinct.into_values().cloned().collect()
    }

    /// Id de la entrada cuyo artifact se llama `<stem>.<filetype>`.
    pub fn stem_owner(&self, stem: &str) -> Option<u64> {
        self.entries.values().find(|e| e.file_stem() == stem).map(|e| e.id)
    }
}
