//! Constantes del core.
//!
//! Nombres de archivo y valores por defecto que forman parte del layout en
//! disco. Cambiarlos rompe la compatibilidad con directorios existentes.

/// Directorio gestionado por defecto.
pub const DEFAULT_DIRECTORY: &str = "data";

/// Ejecutable por defecto (crea el archivo de salida vacío).
pub const DEFAULT_EXECUTABLE: &str = "touch";

/// Extensión por defecto de los artifacts.
pub const DEFAULT_FILETYPE: &str = "json";

/// Sufijo del registro de índice de cada entrada: `<id>.entry.json`.
pub const RECORD_SUFFIX: &str = "entry.json";

/// Prefijo de los archivos de staging que recibe el ejecutable.
pub const STAGING_PREFIX: &str = ".staging-";
