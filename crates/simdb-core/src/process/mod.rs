//! Invocación del ejecutable externo.
//!
//! Contrato: `<executable> <input_file> <output_file>`; exit 0 es éxito y
//! cualquier otro status es un `ProcessError` con el stderr capturado.
//!
//! - `policy`: qué hacer con stdout/stderr en cada llamada.
//! - `launcher`: trait `Launcher` con la implementación real
//!   (`SystemLauncher`) y una simulada en memoria (`SimulatedLauncher`).
//! - `runner`: `ProcessRunner`, wrapper con archivos de entrada/salida fijos.

mod launcher;
mod policy;
mod runner;

pub use launcher::{Invocation, Launcher, ProcessOutput, SimulatedLauncher, SystemLauncher};
pub use policy::{StreamPolicy, StreamSettings};
pub use runner::{ProcessRunner, RunnerConfig};
