//! Capacidad de sistema de archivos usada por el manager y el runner.
//!
//! El índice y las operaciones del manager sólo tocan disco a través de este
//! trait, lo que permite probarlos contra `InMemoryFileStore` sin I/O real.

mod disk;
mod memory;

use std::io;
use std::path::Path;

pub use disk::DiskFileStore;
pub use memory::InMemoryFileStore;

/// Operaciones mínimas sobre archivos y directorios.
pub trait FileStore {
    /// Crea `dir` y sus ancestros. Falla si algún componente es un archivo.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Nombres de los archivos (no subdirectorios) contenidos en `dir`.
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Crea o trunca `path`. El directorio padre debe existir.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, dir: &Path) -> io::Result<()>;
}

/// Borra `path` ignorando que no exista.
pub fn remove_if_present<S: FileStore + ?Sized>(store: &S, path: &Path) -> io::Result<bool> {
    match store.remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
