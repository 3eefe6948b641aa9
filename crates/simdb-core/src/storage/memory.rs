//! Sistema de archivos en memoria para tests sin I/O.
//!
//! Es compartible (`Clone` comparte el mismo árbol) para que un launcher
//! falso pueda escribir el artifact en el mismo "disco" que lee el manager.
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::FileStore;

#[derive(Debug, Default)]
struct Tree {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, String>,
    pinned: BTreeSet<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryFileStore {
    inner: Rc<RefCell<Tree>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cantidad total de archivos almacenados (todas las rutas).
    pub fn file_count(&self) -> usize {
        self.inner.borrow().files.len()
    }

    /// Hace que `remove_file(path)` falle con `PermissionDenied`.
    pub fn pin(&self, path: impl Into<PathBuf>) {
        self.inner.borrow_mut().pinned.insert(path.into());
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

impl FileStore for InMemoryFileStore {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        let mut tree = self.inner.borrow_mut();
        for ancestor in dir.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            if tree.files.contains_key(ancestor) {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists,
                                          format!("{} is a file", ancestor.display())));
            }
        }
        for ancestor in dir.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            tree.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.borrow().dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.borrow().files.contains_key(path)
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let tree = self.inner.borrow();
        if !tree.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        Ok(tree.files
               .keys()
               .filter(|p| p.parent() == Some(dir))
               .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
               .collect())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.inner.borrow().files.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut tree = self.inner.borrow_mut();
        let parent_ok = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => tree.dirs.contains(p),
            _ => true,
        };
        if !parent_ok {
            return Err(not_found(path));
        }
        if tree.dirs.contains(path) {
            return Err(io::Error::other(format!("{} is a directory", path.display())));
        }
        tree.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut tree = self.inner.borrow_mut();
        if tree.pinned.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied,
                                      format!("{} is pinned", path.display())));
        }
        tree.files.remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }

    fn remove_dir_all(&self, dir: &Path) -> io::Result<()> {
        let mut tree = self.inner.borrow_mut();
        if !tree.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        tree.dirs.retain(|d| !d.starts_with(dir));
        tree.files.retain(|f, _| !f.starts_with(dir));
        Ok(())
    }
}
