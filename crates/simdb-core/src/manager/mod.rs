//! DataSetManager: asocia `ParameterSet`s con artifacts numerados dentro de
//! un directorio y mantiene el índice en memoria sincronizado con él.

mod core;

pub use self::core::DataSetManager;
