//! Core DataSetManager implementation

use std::path::{Path, PathBuf};

use log::{debug, info};
use uuid::Uuid;

use crate::config::ManagerConfig;
use crate::constants::STAGING_PREFIX;
use crate::errors::{Result, SimDbError};
use crate::index::{parse_identifier, record_name, scan_directory, DataSetIndex};
use crate::model::{alias_stem, Entry, ParameterSet};
use crate::process::{Invocation, Launcher, StreamSettings, SystemLauncher};
use crate::storage::{remove_if_present, DiskFileStore, FileStore};

/// Gestor de un directorio de artifacts indexados por `ParameterSet`.
///
/// Layout: `<directory>/<id>.<filetype>` (o `<alias>[-<slot>].<filetype>`)
/// para el artifact y `<directory>/<id>.entry.json` para su registro. El índice en
/// memoria refleja exactamente los registros presentes tras cada operación
/// que muta; cambios externos al directorio sólo se ven tras `reload`.
pub struct DataSetManager<S = DiskFileStore, L = SystemLauncher>
    where S: FileStore,
          L: Launcher
{
    config: ManagerConfig,
    streams: StreamSettings,
    store: S,
    launcher: L,
    index: DataSetIndex,
}

impl DataSetManager {
    /// Abre (o crea) el directorio sobre disco real con procesos del sistema.
    pub fn open(config: ManagerConfig) -> Result<Self> {
        Self::with_parts(config, DiskFileStore, SystemLauncher)
    }

    pub fn new(directory: impl Into<PathBuf>, executable: impl Into<String>, filetype: impl Into<String>) -> Result<Self> {
        Self::open(ManagerConfig::new(directory, executable, filetype))
    }
}

impl<S, L> DataSetManager<S, L>
    where S: FileStore,
          L: Launcher
{
    /// Crea el directorio si falta y carga las entradas existentes.
    pub fn with_parts(config: ManagerConfig, store: S, launcher: L) -> Result<Self> {
        config.validate()?;
        let mut manager = Self { config,
                                 streams: StreamSettings::default(),
                                 store,
                                 launcher,
                                 index: DataSetIndex::new() };
        manager.reload()?;
        info!("opened {} ({} entries)", manager.config.directory.display(), manager.index.len());
        Ok(manager)
    }

    /// Reconstruye el índice desde el directorio. Devuelve cuántas entradas
    /// quedaron indexadas.
    pub fn reload(&mut self) -> Result<usize> {
        self.ensure_directory()?;
        let dir = &self.config.directory;
        self.index = scan_directory(&self.store, dir, &self.config.filetype)
            .map_err(|source| SimDbError::Directory { path: dir.clone(), source })?;
        Ok(self.index.len())
    }

    fn ensure_directory(&self) -> Result<()> {
        let dir = &self.config.directory;
        self.store
            .create_dir_all(dir)
            .map_err(|source| SimDbError::Directory { path: dir.clone(), source })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    pub fn executable(&self) -> &str {
        &self.config.executable
    }

    pub fn filetype(&self) -> &str {
        &self.config.filetype
    }

    /// Cambia el programa usado por los próximos `create`.
    pub fn set_executable(&mut self, executable: impl Into<String>) -> Result<()> {
        let mut next = self.config.clone();
        next.executable = executable.into();
        next.validate()?;
        self.config = next;
        Ok(())
    }

    pub fn streams(&self) -> StreamSettings {
        self.streams
    }

    pub fn set_streams(&mut self, streams: StreamSettings) {
        self.streams = streams;
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Ruta del artifact con identificador `id` (sin tocar el disco).
    pub fn outfile(&self, id: u64) -> PathBuf {
        self.config.directory.join(format!("{id}.{}", self.config.filetype))
    }

    /// Ruta del artifact con nombre `alias` en el slot 0 (sin tocar el disco).
    pub fn outfile_alias(&self, alias: &str) -> PathBuf {
        self.outfile_named(alias, 0)
    }

    /// Ruta del artifact con nombre `alias` en el slot `slot`: `<alias>` para
    /// el slot 0, `<alias>-<slot>` para los demás.
    pub fn outfile_named(&self, alias: &str, slot: u64) -> PathBuf {
        self.config.directory.join(format!("{}.{}", alias_stem(alias, slot), self.config.filetype))
    }

    fn entry_path(&self, entry: &Entry) -> PathBuf {
        self.config.directory.join(format!("{}.{}", entry.file_stem(), self.config.filetype))
    }

    fn record_path(&self, id: u64) -> PathBuf {
        self.config.directory.join(record_name(id))
    }

    /// Ejecuta el programa para `params` y registra la nueva entrada.
    ///
    /// - `slot`: número de la instancia dentro de `params`; por defecto
    ///   `1 + max(slot)` de ese contenido (o 0). El mismo slot puede existir
    ///   para contenidos distintos.
    /// - `alias`: el artifact se llama `<alias>.<filetype>` (o
    ///   `<alias>-<slot>.<filetype>` fuera del slot 0) pero la entrada sigue
    ///   indexada por su identificador.
    ///
    /// El identificador de almacenamiento es siempre `1 + max(id)` (o 0).
    /// Falla con `DuplicateEntry` si `(params, slot)` ya existe o si el
    /// archivo destino pertenece a otra entrada o ya está en disco; nunca
    /// sobreescribe (ver `recreate`). Si el proceso falla no se registra
    /// nada, aunque un output parcial puede quedar en disco.
    pub fn create(&mut self, params: &ParameterSet, slot: Option<u64>, alias: Option<&str>) -> Result<PathBuf> {
        if let Some(alias) = alias {
            validate_alias(alias)?;
        }
        let slot = match slot {
            Some(slot) => slot,
            None => self.index
                        .next_slot(params)
                        .ok_or(SimDbError::Exhausted { kind: "slot", last: u64::MAX })?,
        };
        if let Some(existing) = self.index.slot_owner(params, slot) {
            return Err(SimDbError::DuplicateEntry { path: self.entry_path(existing) });
        }
        let id = self.index
                     .next_id()
                     .ok_or(SimDbError::Exhausted { kind: "identifier", last: u64::MAX })?;
        self.materialize(Entry::new(id, slot, params.clone(), alias.map(str::to_string)))
    }

    fn materialize(&mut self, entry: Entry) -> Result<PathBuf> {
        self.ensure_directory()?;
        let id = entry.id;
        let record = self.record_path(id);
        if self.index.contains_id(id) || self.store.is_file(&record) {
            return Err(SimDbError::DuplicateEntry { path: record });
        }
        let dest = self.entry_path(&entry);
        if self.index.stem_owner(&entry.file_stem()).is_some() || self.store.is_file(&dest) {
            return Err(SimDbError::DuplicateEntry { path: dest });
        }

        let staging = self.config
                          .directory
                          .join(format!("{STAGING_PREFIX}{}.json", Uuid::new_v4()));
        self.store.write(&staging, &entry.params.canonical_json())?;
        debug!("staged parameters for entry {id} at {}", staging.display());
        let launched = self.launcher.launch(&Invocation { executable: &self.config.executable,
                                                          input: &staging,
                                                          output: &dest,
                                                          working_dir: None,
                                                          stdout: self.streams.stdout,
                                                          stderr: self.streams.stderr });
        let cleaned = remove_if_present(&self.store, &staging);
        launched?;
        cleaned?;

        self.store.write(&record, &serde_json::to_string_pretty(&entry)?)?;
        info!("created entry {id} (slot {}) -> {}", entry.slot, dest.display());
        self.index.insert(entry);
        Ok(dest)
    }

    /// Ruta de la entrada `position` (0 = menor slot) con contenido `params`.
    pub fn select(&self, params: &ParameterSet, position: usize) -> Result<PathBuf> {
        let entry = self.index.nth_matching(params, position)?;
        Ok(self.entry_path(entry))
    }

    /// Contenidos distintos, ordenados por el menor id que los contiene.
    pub fn table(&self) -> Vec<ParameterSet> {
        self.index.table()
    }

    pub fn count(&self, params: &ParameterSet) -> usize {
        self.index.count(params)
    }

    /// Rutas de todos los artifacts, por id ascendente.
    pub fn files(&self) -> Vec<PathBuf> {
        self.index.entries().map(|e| self.entry_path(e)).collect()
    }

    /// Entradas indexadas, por id ascendente.
    pub fn entries(&self) -> Vec<&Entry> {
        self.index.entries().collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Borra registro y artifact de la entrada `position` con contenido
    /// `params`. Devuelve la ruta del artifact eliminado.
    ///
    /// El registro se borra primero: si falla, la entrada sigue intacta; si
    /// lo que falla es el artifact, la entrada ya salió del índice.
    pub fn delete(&mut self, params: &ParameterSet, position: usize) -> Result<PathBuf> {
        let entry = self.index.nth_matching(params, position)?.clone();
        let path = self.entry_path(&entry);
        remove_if_present(&self.store, &self.record_path(entry.id))?;
        self.index.remove(entry.id);
        remove_if_present(&self.store, &path)?;
        info!("deleted entry {} ({})", entry.id, path.display());
        Ok(path)
    }

    /// Sobreescritura explícita: borra la entrada `position` y la vuelve a
    /// crear con el mismo id, slot y alias.
    pub fn recreate(&mut self, params: &ParameterSet, position: usize) -> Result<PathBuf> {
        let entry = self.index.nth_matching(params, position)?.clone();
        self.delete(params, position)?;
        self.materialize(entry)
    }

    /// Elimina el directorio completo y vacía el índice. No falla si el
    /// directorio ya no existe.
    pub fn delete_all(&mut self) -> Result<()> {
        let dir = &self.config.directory;
        if self.store.is_dir(dir) {
            self.store
                .remove_dir_all(dir)
                .map_err(|source| SimDbError::Directory { path: dir.clone(), source })?;
        }
        self.index.clear();
        info!("removed {}", dir.display());
        Ok(())
    }
}

/// Un alias no puede salir del directorio ni parecerse a un nombre que el
/// scan interpreta (`<id>.<filetype>`, `<id>.entry.json`).
fn validate_alias(alias: &str) -> Result<()> {
    let reserved = parse_identifier(alias).is_some() || alias.ends_with(".entry");
    if reserved || alias.is_empty() || alias.starts_with('.') || alias.contains(['/', '\\']) {
        return Err(SimDbError::Config(format!("invalid alias '{alias}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{SimulatedLauncher, StreamPolicy};
    use crate::storage::InMemoryFileStore;
    use serde_json::json;

    type MemManager = DataSetManager<InMemoryFileStore, SimulatedLauncher>;

    fn manager(exe: &str, filetype: &str) -> (InMemoryFileStore, MemManager) {
        let store = InMemoryFileStore::new();
        let m = DataSetManager::with_parts(ManagerConfig::new("t", exe, filetype),
                                           store.clone(),
                                           SimulatedLauncher::new(store.clone())).unwrap();
        (store, m)
    }

    fn params(v: serde_json::Value) -> ParameterSet {
        ParameterSet::from_value(v).unwrap()
    }

    #[test]
    fn create_then_select_returns_outfile() {
        let (store, mut m) = manager("cp", "json");
        let hello = params(json!({"Hello": "World"}));
        let path = m.create(&hello, None, None).unwrap();
        assert_eq!(path, m.outfile(0));
        assert_eq!(m.select(&hello, 0).unwrap(), path);
        assert!(store.is_file(&path));
        assert_eq!(m.table(), vec![hello]);
    }

    #[test]
    fn staging_file_never_survives() {
        let (store, mut m) = manager("cp", "json");
        m.create(&params(json!({"a": 1})), None, None).unwrap();
        m.launcher().fail_next(1, "nope");
        assert!(m.create(&params(json!({"a": 2})), None, None).is_err());
        let names = store.list(Path::new("t")).unwrap();
        assert!(names.iter().all(|n| !n.starts_with(STAGING_PREFIX)), "{names:?}");
    }

    #[test]
    fn slots_grow_from_the_maximum_of_their_content() {
        let (_store, mut m) = manager("touch", "nc");
        let a = params(json!({"a": 1}));
        m.create(&a, Some(4), None).unwrap();
        let next = m.create(&a, None, None).unwrap();
        assert_eq!(next, m.outfile(1));
        let slots: Vec<u64> = m.entries().iter().map(|e| e.slot).collect();
        assert_eq!(slots, vec![4, 5]);
        m.create(&params(json!({"b": 1})), None, None).unwrap();
        assert_eq!(m.entries()[2].slot, 0);
    }

    #[test]
    fn duplicate_slot_is_rejected_only_for_the_same_content() {
        let (_store, mut m) = manager("touch", "th");
        let a = params(json!({"Hello": "World"}));
        let b = params(json!({"Hello2": "World"}));
        for slot in 0..17 {
            m.create(&a, Some(slot), None).unwrap();
        }
        let err = m.create(&a, Some(3), None).unwrap_err();
        assert!(matches!(err, SimDbError::DuplicateEntry { .. }));
        for slot in 0..7 {
            m.create(&b, Some(slot), None).unwrap();
        }
        assert_eq!(m.files().len(), 24);
        assert_eq!(m.count(&b), 7);
        assert_eq!(m.select(&b, 0).unwrap(), m.outfile(17));
    }

    #[test]
    fn exhausted_numbers_are_errors() {
        let (store, mut m) = manager("touch", "nc");
        let a = params(json!({"a": 1}));
        m.create(&a, Some(u64::MAX), None).unwrap();
        match m.create(&a, None, None) {
            Err(SimDbError::Exhausted { kind: "slot", .. }) => {}
            other => panic!("expected exhausted slots, got {other:?}"),
        }
        m.create(&params(json!({"b": 1})), None, None).unwrap();

        let last = Entry::new(u64::MAX, 0, params(json!({"c": 1})), None);
        store.write(&m.directory().join(record_name(u64::MAX)), &serde_json::to_string(&last).unwrap())
             .unwrap();
        m.reload().unwrap();
        match m.create(&params(json!({"d": 1})), None, None) {
            Err(SimDbError::Exhausted { kind: "identifier", .. }) => {}
            other => panic!("expected exhausted identifiers, got {other:?}"),
        }
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn unindexed_destination_on_disk_is_rejected() {
        let (store, mut m) = manager("touch", "nc");
        store.write(Path::new("t/0.nc"), "leftover").unwrap();
        let err = m.create(&params(json!({"a": 1})), Some(0), None).unwrap_err();
        assert!(matches!(err, SimDbError::DuplicateEntry { .. }));
    }

    #[test]
    fn table_is_ordered_by_lowest_identifier() {
        let (_store, mut m) = manager("touch", "th");
        let a = params(json!({"case": "A"}));
        let b = params(json!({"case": "B"}));
        m.create(&a, Some(0), None).unwrap();
        for slot in 1..=7 {
            m.create(&b, Some(slot), None).unwrap();
        }
        m.create(&a, Some(8), None).unwrap();
        assert_eq!(m.table(), vec![a.clone(), b.clone()]);
        assert_eq!(m.files().len(), 9);
        assert_eq!(m.select(&a, 1).unwrap(), m.outfile(8));
    }

    #[test]
    fn delete_removes_exactly_one_instance() {
        let (store, mut m) = manager("touch", "nc");
        let a = params(json!({"a": 1}));
        for id in 0..3 {
            m.create(&a, Some(id), None).unwrap();
        }
        let removed = m.delete(&a, 1).unwrap();
        assert_eq!(removed, m.outfile(1));
        assert!(!store.is_file(&removed));
        assert!(!store.is_file(Path::new("t/1.entry.json")));
        assert_eq!(m.count(&a), 2);
        assert_eq!(m.select(&a, 1).unwrap(), m.outfile(2));
        assert!(matches!(m.delete(&a, 2), Err(SimDbError::Lookup { position: 2, available: 2 })));
    }

    #[test]
    fn alias_names_the_file_but_not_the_identifier() {
        let (store, mut m) = manager("touch", "json");
        let hello = params(json!({"Hello": "World"}));
        m.create(&hello, Some(0), None).unwrap();
        m.delete(&hello, 0).unwrap();
        let named = m.create(&hello, Some(0), Some("hello")).unwrap();
        assert_eq!(named, m.outfile_alias("hello"));
        assert!(store.is_file(&named));
        assert_eq!(m.files(), vec![named.clone()]);
        let second = m.create(&hello, Some(1), Some("hello")).unwrap();
        assert_eq!(second, m.outfile_named("hello", 1));
        assert!(second.ends_with("hello-1.json"));
        assert_eq!(m.files(), vec![named, second]);
        assert_eq!(m.table(), vec![hello.clone()]);
        assert_eq!(m.count(&hello), 2);
        // `hello-1` ya es el archivo del slot 1
        let err = m.create(&params(json!({"x": 1})), None, Some("hello-1")).unwrap_err();
        assert!(matches!(err, SimDbError::DuplicateEntry { .. }));
    }

    #[test]
    fn aliases_that_look_like_managed_names_are_rejected() {
        let (store, mut m) = manager("cp", "json");
        let hello = params(json!({"Hello": "World"}));
        for alias in ["7", "0", "3.entry", "x.entry", "", ".hidden", "../escape", "a/b"] {
            match m.create(&hello, None, Some(alias)) {
                Err(SimDbError::Config(_)) => {}
                other => panic!("alias {alias:?} accepted: {other:?}"),
            }
        }
        assert_eq!(store.file_count(), 0);
        m.create(&hello, None, Some("07")).unwrap();
        m.create(&hello, None, Some("run")).unwrap();
        m.create(&hello, None, None).unwrap();

        let mut reopened = DataSetManager::with_parts(ManagerConfig::new("t", "cp", "json"),
                                                      store.clone(),
                                                      SimulatedLauncher::new(store.clone())).unwrap();
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.files(), m.files());
        reopened.delete(&hello, 2).unwrap();
        assert_eq!(reopened.reload().unwrap(), 2);
    }

    #[test]
    fn recreate_reuses_identifier_slot_and_alias() {
        let (_store, mut m) = manager("touch", "nc");
        let a = params(json!({"a": 1}));
        m.create(&a, Some(0), None).unwrap();
        m.create(&a, Some(3), Some("run")).unwrap();
        m.create(&a, None, None).unwrap();
        let again = m.recreate(&a, 1).unwrap();
        assert_eq!(again, m.outfile_named("run", 3));
        let layout: Vec<(u64, u64)> = m.entries().iter().map(|e| (e.id, e.slot)).collect();
        assert_eq!(layout, vec![(0, 0), (1, 3), (2, 4)]);
        assert_eq!(m.count(&a), 3);
    }

    #[test]
    fn delete_keeps_the_entry_when_its_record_cannot_be_removed() {
        let (store, mut m) = manager("touch", "nc");
        let a = params(json!({"a": 1}));
        let path = m.create(&a, None, None).unwrap();
        store.pin("t/0.entry.json");
        assert!(matches!(m.delete(&a, 0), Err(SimDbError::Io(_))));
        assert_eq!(m.select(&a, 0).unwrap(), path);
        assert!(store.is_file(&path));
    }

    #[test]
    fn delete_unindexes_before_removing_the_artifact() {
        let (store, mut m) = manager("touch", "nc");
        let a = params(json!({"a": 1}));
        let path = m.create(&a, None, None).unwrap();
        store.pin(path.clone());
        assert!(matches!(m.delete(&a, 0), Err(SimDbError::Io(_))));
        assert!(m.is_empty());
        assert!(matches!(m.select(&a, 0), Err(SimDbError::Lookup { .. })));
        assert!(!store.is_file(Path::new("t/0.entry.json")));
    }

    #[test]
    fn failed_process_adds_nothing() {
        let (_store, mut m) = manager("false", "nc");
        m.set_streams(StreamSettings { stdout: StreamPolicy::Suppress,
                                       stderr: StreamPolicy::Capture });
        let err = m.create(&params(json!({"a": 1})), None, None).unwrap_err();
        assert!(matches!(err, SimDbError::Process { code: Some(1), .. }));
        assert!(m.is_empty());
    }

    #[test]
    fn reopening_rebuilds_the_same_index() {
        let (store, mut m) = manager("touch", "nc");
        let a = params(json!({"a": 1}));
        let b = params(json!({"b": [1, 2]}));
        m.create(&a, None, None).unwrap();
        m.create(&b, None, Some("bee")).unwrap();
        m.create(&a, None, None).unwrap();
        let reopened = DataSetManager::with_parts(ManagerConfig::new("t", "touch", "nc"),
                                                  store.clone(),
                                                  SimulatedLauncher::new(store.clone())).unwrap();
        assert_eq!(reopened.files(), m.files());
        assert_eq!(reopened.table(), vec![a.clone(), b.clone()]);
        assert_eq!(reopened.count(&a), 2);
    }

    #[test]
    fn delete_all_is_idempotent_and_resets() {
        let (store, mut m) = manager("touch", "nc");
        m.create(&params(json!({"a": 1})), None, None).unwrap();
        m.delete_all().unwrap();
        assert!(!store.is_dir(Path::new("t")));
        assert!(m.is_empty());
        m.delete_all().unwrap();
        // create vuelve a preparar el directorio
        m.create(&params(json!({"a": 1})), None, None).unwrap();
        assert_eq!(m.files(), vec![m.outfile(0)]);
    }

    #[test]
    fn directory_over_a_file_fails() {
        let store = InMemoryFileStore::new();
        store.write(Path::new("t"), "occupied").unwrap();
        let result = DataSetManager::with_parts(ManagerConfig::new("t", "touch", "nc"),
                                                store.clone(),
                                                SimulatedLauncher::new(store));
        assert!(matches!(result, Err(SimDbError::Directory { .. })));
    }

    #[test]
    fn set_executable_validates() {
        let (_store, mut m) = manager("touch", "nc");
        assert!(m.set_executable("").is_err());
        assert_eq!(m.executable(), "touch");
        m.set_executable("cp").unwrap();
        assert_eq!(m.executable(), "cp");
    }
}
