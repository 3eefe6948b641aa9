//! `ProcessRunner`: serializa un `ParameterSet` a un archivo de entrada fijo,
//! ejecuta el programa con `[input, output]` y expone la ruta de salida.
//!
//! La configuración es un struct explícito y mutable (`RunnerConfig`) para
//! poder cambiar de ejecutable o directorio de trabajo entre llamadas sin
//! reconstruir el runner.
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{Invocation, Launcher, ProcessOutput, StreamPolicy, SystemLauncher};
use crate::errors::Result;
use crate::model::ParameterSet;
use crate::storage::{remove_if_present, DiskFileStore, FileStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub executable: String,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Directorio de trabajo del proceso. Las rutas relativas de `input` y
    /// `output` se resuelven contra él.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl RunnerConfig {
    pub fn new(executable: impl Into<String>, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self { executable: executable.into(),
               input: input.into(),
               output: output.into(),
               working_dir: None }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn input_path(&self) -> PathBuf {
        self.resolve(&self.input)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output)
    }
}

pub struct ProcessRunner<S = DiskFileStore, L = SystemLauncher>
    where S: FileStore,
          L: Launcher
{
    config: RunnerConfig,
    store: S,
    launcher: L,
}

impl ProcessRunner {
    /// Runner sobre disco real y procesos del sistema.
    pub fn new(executable: impl Into<String>, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self::with_parts(RunnerConfig::new(executable, input, output), DiskFileStore, SystemLauncher)
    }
}

impl<S, L> ProcessRunner<S, L>
    where S: FileStore,
          L: Launcher
{
    pub fn with_parts(config: RunnerConfig, store: S, launcher: L) -> Self {
        Self { config, store, launcher }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RunnerConfig {
        &mut self.config
    }

    pub fn set_executable(&mut self, executable: impl Into<String>) {
        self.config.executable = executable.into();
    }

    pub fn set_working_dir(&mut self, dir: Option<PathBuf>) {
        self.config.working_dir = dir;
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn input_path(&self) -> PathBuf {
        self.config.input_path()
    }

    /// Ruta donde el programa debe dejar su resultado.
    pub fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    /// Escribe `params` en el archivo de entrada y ejecuta el programa.
    /// Bloquea hasta que termina; un status distinto de cero es un error.
    pub fn run(&self, params: &ParameterSet, stdout: StreamPolicy, stderr: StreamPolicy) -> Result<ProcessOutput> {
        self.store.write(&self.input_path(), &params.canonical_json())?;
        debug!("runner: {} {} {}",
               self.config.executable,
               self.config.input.display(),
               self.config.output.display());
        // el proceso recibe las rutas tal cual: su cwd ya es `working_dir`
        self.launcher.launch(&Invocation { executable: &self.config.executable,
                                           input: &self.config.input,
                                           output: &self.config.output,
                                           working_dir: self.config.working_dir.as_deref(),
                                           stdout,
                                           stderr })
    }

    /// Borra los archivos de entrada y salida si existen.
    pub fn clean(&self) -> Result<()> {
        remove_if_present(&self.store, &self.input_path())?;
        remove_if_present(&self.store, &self.output_path())?;
        Ok(())
    }
}
