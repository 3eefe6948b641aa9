//! simdb-core: gestor de data sets indexados por contenido.
//!
//! Asocia `ParameterSet`s (mapeos JSON arbitrarios) con artifacts producidos
//! por un programa externo y guardados como archivos numerados en un
//! directorio.
pub mod config;
pub mod constants;
pub mod errors;
pub mod hashing;
pub mod index;
pub mod manager;
pub mod model;
pub mod process;
pub mod storage;

pub use config::ManagerConfig;
pub use errors::{Result, SimDbError};
pub use index::DataSetIndex;
pub use manager::DataSetManager;
pub use model::{Entry, ParameterSet};
pub use process::{Launcher, ProcessOutput, ProcessRunner, RunnerConfig, SimulatedLauncher, StreamPolicy, StreamSettings,
                  SystemLauncher};
pub use storage::{DiskFileStore, FileStore, InMemoryFileStore};
