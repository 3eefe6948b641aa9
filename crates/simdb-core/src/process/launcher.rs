use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use super::StreamPolicy;
use crate::errors::{Result, SimDbError};
use crate::storage::{FileStore, InMemoryFileStore};

/// Una llamada concreta al ejecutable externo.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub executable: &'a str,
    pub input: &'a Path,
    pub output: &'a Path,
    pub working_dir: Option<&'a Path>,
    pub stdout: StreamPolicy,
    pub stderr: StreamPolicy,
}

/// Streams capturados; `None` cuando la política no era `Capture`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// Ejecuta una `Invocation` bloqueando hasta que el proceso termina.
pub trait Launcher {
    fn launch(&self, invocation: &Invocation<'_>) -> Result<ProcessOutput>;
}

/// Launcher real sobre `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

fn captured(policy: StreamPolicy, bytes: &[u8]) -> Option<String> {
    match policy {
        StreamPolicy::Capture => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

impl Launcher for SystemLauncher {
    fn launch(&self, invocation: &Invocation<'_>) -> Result<ProcessOutput> {
        debug!("launching {} {} {}",
               invocation.executable,
               invocation.input.display(),
               invocation.output.display());
        let mut command = Command::new(invocation.executable);
        command.arg(invocation.input)
               .arg(invocation.output)
               .stdin(std::process::Stdio::null())
               .stdout(invocation.stdout.stdio())
               .stderr(invocation.stderr.stdio());
        if let Some(dir) = invocation.working_dir {
            command.current_dir(dir);
        }
        let out = command.output()
                         .map_err(|source| SimDbError::Launch { executable: invocation.executable.to_string(),
                                                                source })?;
        let stdout = captured(invocation.stdout, &out.stdout);
        let stderr = captured(invocation.stderr, &out.stderr);
        if !out.status.success() {
            return Err(SimDbError::Process { executable: invocation.executable.to_string(),
                                             code: out.status.code(),
                                             stderr: stderr.unwrap_or_default() });
        }
        Ok(ProcessOutput { stdout, stderr })
    }
}

/// Launcher en memoria que emula un puñado de programas sobre un
/// `InMemoryFileStore`:
/// - `cp`: copia input → output.
/// - `touch`: crea output vacío si no existe.
/// - `echo`: no toca archivos; imprime los argumentos.
/// - `false`: termina con código 1.
///
/// Cualquier otro nombre falla como ejecutable inexistente. Con
/// `fail_next` se encolan fallos forzados para la próxima llamada.
#[derive(Debug, Default)]
pub struct SimulatedLauncher {
    store: InMemoryFileStore,
    calls: RefCell<Vec<(String, PathBuf, PathBuf)>>,
    forced: RefCell<VecDeque<(i32, String)>>,
}

impl SimulatedLauncher {
    pub fn new(store: InMemoryFileStore) -> Self {
        Self { store,
               calls: RefCell::new(Vec::new()),
               forced: RefCell::new(VecDeque::new()) }
    }

    /// La próxima invocación termina con `code` y `stderr` sin ejecutar nada.
    pub fn fail_next(&self, code: i32, stderr: impl Into<String>) {
        self.forced.borrow_mut().push_back((code, stderr.into()));
    }

    /// (executable, input, output) de cada invocación, en orden.
    pub fn calls(&self) -> Vec<(String, PathBuf, PathBuf)> {
        self.calls.borrow().clone()
    }

    fn resolve(invocation: &Invocation<'_>, path: &Path) -> PathBuf {
        match invocation.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn exec(&self, invocation: &Invocation<'_>) -> std::result::Result<String, (i32, String)> {
        let input = Self::resolve(invocation, invocation.input);
        let output = Self::resolve(invocation, invocation.output);
        let name = Path::new(invocation.executable).file_name()
                                                   .and_then(|n| n.to_str())
                                                   .unwrap_or(invocation.executable);
        match name {
            "cp" => {
                let text = self.store
                               .read_to_string(&input)
                               .map_err(|e| (1, format!("cp: {}: {e}", input.display())))?;
                self.store
                    .write(&output, &text)
                    .map_err(|e| (1, format!("cp: {}: {e}", output.display())))?;
                Ok(String::new())
            }
            "touch" => {
                if !self.store.is_file(&output) {
                    self.store
                        .write(&output, "")
                        .map_err(|e| (1, format!("touch: {}: {e}", output.display())))?;
                }
                Ok(String::new())
            }
            "echo" => Ok(format!("{} {}\n", invocation.input.display(), invocation.output.display())),
            "false" => Err((1, String::new())),
            _ => Err((127, String::new())),
        }
    }
}

impl Launcher for SimulatedLauncher {
    fn launch(&self, invocation: &Invocation<'_>) -> Result<ProcessOutput> {
        self.calls.borrow_mut().push((invocation.executable.to_string(),
                                      invocation.input.to_path_buf(),
                                      invocation.output.to_path_buf()));
        let forced = self.forced.borrow_mut().pop_front();
        let result = match forced {
            Some(failure) => Err(failure),
            None => self.exec(invocation),
        };
        match result {
            Ok(stdout) => Ok(ProcessOutput { stdout: captured(invocation.stdout, stdout.as_bytes()),
                                             stderr: captured(invocation.stderr, b"") }),
            Err((127, _)) => Err(SimDbError::Launch { executable: invocation.executable.to_string(),
                                                      source: io::Error::new(io::ErrorKind::NotFound,
                                                                             "no such program") }),
            Err((code, stderr)) => Err(SimDbError::Process { executable: invocation.executable.to_string(),
                                                             code: Some(code),
                                                             stderr: match invocation.stderr {
                                                                 StreamPolicy::Capture => stderr,
                                                                 _ => String::new(),
                                                             } }),
        }
    }
}
