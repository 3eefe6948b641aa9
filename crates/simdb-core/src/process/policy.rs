use std::fmt;
use std::process::Stdio;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SimDbError;

/// Destino de un stream del proceso hijo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamPolicy {
    /// Descartado.
    #[default]
    Suppress,
    /// Heredado: aparece en la salida del proceso actual.
    Forward,
    /// Capturado y devuelto en `ProcessOutput`.
    Capture,
}

impl StreamPolicy {
    pub(crate) fn stdio(self) -> Stdio {
        match self {
            StreamPolicy::Suppress => Stdio::null(),
            StreamPolicy::Forward => Stdio::inherit(),
            StreamPolicy::Capture => Stdio::piped(),
        }
    }
}

impl fmt::Display for StreamPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamPolicy::Suppress => "suppress",
            StreamPolicy::Forward => "forward",
            StreamPolicy::Capture => "capture",
        };
        f.write_str(s)
    }
}

impl FromStr for StreamPolicy {
    type Err = SimDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "suppress" | "ignore" => Ok(StreamPolicy::Suppress),
            "forward" | "display" => Ok(StreamPolicy::Forward),
            "capture" => Ok(StreamPolicy::Capture),
            other => Err(SimDbError::Config(format!("unknown stream policy '{other}'"))),
        }
    }
}

/// Par de políticas (stdout, stderr) de una invocación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSettings {
    pub stdout: StreamPolicy,
    pub stderr: StreamPolicy,
}

impl Default for StreamSettings {
    /// stderr capturado para poder adjuntarlo al error si el proceso falla.
    fn default() -> Self {
        Self { stdout: StreamPolicy::Suppress,
               stderr: StreamPolicy::Capture }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_vocabularies() {
        assert_eq!("display".parse::<StreamPolicy>().unwrap(), StreamPolicy::Forward);
        assert_eq!("ignore".parse::<StreamPolicy>().unwrap(), StreamPolicy::Suppress);
        assert_eq!("Capture".parse::<StreamPolicy>().unwrap(), StreamPolicy::Capture);
        assert!("loud".parse::<StreamPolicy>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for p in [StreamPolicy::Suppress, StreamPolicy::Forward, StreamPolicy::Capture] {
            assert_eq!(p.to_string().parse::<StreamPolicy>().unwrap(), p);
        }
    }
}
