//! Configuración del manager.
//! Se construye explícitamente o desde variables de entorno (`.env` incluido):
//! `SIMDB_DIRECTORY`, `SIMDB_EXECUTABLE`, `SIMDB_FILETYPE`.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DIRECTORY, DEFAULT_EXECUTABLE, DEFAULT_FILETYPE, RECORD_SUFFIX};
use crate::errors::{Result, SimDbError};

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    pub directory: PathBuf,
    pub executable: String,
    /// Extensión de los artifacts, sin punto.
    pub filetype: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY, DEFAULT_EXECUTABLE, DEFAULT_FILETYPE)
    }
}

impl ManagerConfig {
    pub fn new(directory: impl Into<PathBuf>, executable: impl Into<String>, filetype: impl Into<String>) -> Self {
        Self { directory: directory.into(),
               executable: executable.into(),
               filetype: filetype.into() }
    }

    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let defaults = Self::default();
        Self { directory: env::var("SIMDB_DIRECTORY").map(PathBuf::from).unwrap_or(defaults.directory),
               executable: env::var("SIMDB_EXECUTABLE").unwrap_or(defaults.executable),
               filetype: env::var("SIMDB_FILETYPE").unwrap_or(defaults.filetype) }
    }

    pub fn validate(&self) -> Result<()> {
        if self.executable.trim().is_empty() {
            return Err(SimDbError::Config("executable must not be empty".into()));
        }
        let ft = self.filetype.as_str();
        if ft.is_empty() || ft.starts_with('.') || ft.contains(['/', '\\']) {
            return Err(SimDbError::Config(format!("invalid filetype '{ft}'")));
        }
        if ft == RECORD_SUFFIX {
            return Err(SimDbError::Config(format!("filetype '{ft}' is reserved for index records")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ManagerConfig::default();
        assert_eq!(cfg.directory, PathBuf::from("data"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_filetypes() {
        for ft in ["", ".json", "a/b", "entry.json"] {
            let cfg = ManagerConfig::new("d", "cp", ft);
            assert!(matches!(cfg.validate(), Err(SimDbError::Config(_))), "{ft:?} should be rejected");
        }
        assert!(ManagerConfig::new("d", " ", "nc").validate().is_err());
    }
}
