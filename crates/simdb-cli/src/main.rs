use std::path::PathBuf;

use simdb_core::{DataSetManager, ManagerConfig, ParameterSet, ProcessRunner, SimDbError, StreamPolicy};

const USAGE: &str = "Uso: simdb [--dir D] [--exe E] [--type T] <comando>
  create <json> [--id N] [--alias A]
  select <json> [--position K]
  recreate <json> [--position K]
  count <json>
  table | files
  delete <json> [--position K]
  delete-all
  run <json> --input I --output O [--capture]
  clean --input I --output O";

/// Argumentos ya separados: opciones globales, comando y sus flags.
#[derive(Debug, Default, PartialEq)]
struct Cli {
    dir: Option<String>,
    exe: Option<String>,
    filetype: Option<String>,
    command: String,
    json: Option<String>,
    id: Option<u64>,
    alias: Option<String>,
    position: usize,
    input: Option<String>,
    output: Option<String>,
    capture: bool,
}

fn parse(args: &[String]) -> Result<Cli, String> {
    let mut cli = Cli::default();
    let mut i = 0;
    let value = |i: usize, flag: &str| -> Result<String, String> {
        args.get(i).cloned().ok_or_else(|| format!("falta valor para {flag}"))
    };
    while i < args.len() {
        match args[i].as_str() {
            "--dir" => { i += 1; cli.dir = Some(value(i, "--dir")?); }
            "--exe" => { i += 1; cli.exe = Some(value(i, "--exe")?); }
            "--type" => { i += 1; cli.filetype = Some(value(i, "--type")?); }
            "--id" => {
                i += 1;
                cli.id = Some(value(i, "--id")?.parse().map_err(|_| "--id debe ser un entero no negativo".to_string())?);
            }
            "--alias" => { i += 1; cli.alias = Some(value(i, "--alias")?); }
            "--position" => {
                i += 1;
                cli.position = value(i, "--position")?.parse().map_err(|_| "--position debe ser un entero".to_string())?;
            }
            "--input" => { i += 1; cli.input = Some(value(i, "--input")?); }
            "--output" => { i += 1; cli.output = Some(value(i, "--output")?); }
            "--capture" => cli.capture = true,
            other if other.starts_with("--") => return Err(format!("opción desconocida: {other}")),
            other => {
                if cli.command.is_empty() {
                    cli.command = other.to_string();
                } else if cli.json.is_none() {
                    cli.json = Some(other.to_string());
                } else {
                    return Err(format!("argumento inesperado: {other}"));
                }
            }
        }
        i += 1;
    }
    if cli.command.is_empty() {
        return Err("falta el comando".into());
    }
    Ok(cli)
}

fn config_for(cli: &Cli) -> ManagerConfig {
    let mut cfg = ManagerConfig::from_env();
    if let Some(dir) = &cli.dir {
        cfg.directory = PathBuf::from(dir);
    }
    if let Some(exe) = &cli.exe {
        cfg.executable = exe.clone();
    }
    if let Some(ft) = &cli.filetype {
        cfg.filetype = ft.clone();
    }
    cfg
}

fn params_of(cli: &Cli) -> Result<ParameterSet, CliError> {
    let text = cli.json.as_deref().ok_or_else(|| CliError::Usage(format!("'{}' requiere <json>", cli.command)))?;
    Ok(ParameterSet::from_json_str(text)?)
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Core(SimDbError),
}

impl From<SimDbError> for CliError {
    fn from(e: SimDbError) -> Self {
        CliError::Core(e)
    }
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Core(SimDbError::Lookup { .. }) => 3,
            CliError::Core(SimDbError::DuplicateEntry { .. }) => 4,
            CliError::Core(SimDbError::Process { .. }) | CliError::Core(SimDbError::Launch { .. }) => 5,
            CliError::Core(_) => 1,
        }
    }
}

fn execute(cli: &Cli) -> Result<(), CliError> {
    match cli.command.as_str() {
        "run" | "clean" => {
            let (Some(input), Some(output)) = (&cli.input, &cli.output) else {
                return Err(CliError::Usage(format!("'{}' requiere --input y --output", cli.command)));
            };
            let exe = cli.exe.clone().unwrap_or_else(|| ManagerConfig::from_env().executable);
            let runner = ProcessRunner::new(exe, input, output);
            if cli.command == "clean" {
                runner.clean()?;
                return Ok(());
            }
            let policy = if cli.capture { StreamPolicy::Capture } else { StreamPolicy::Forward };
            let out = runner.run(&params_of(cli)?, policy, policy)?;
            if let Some(stdout) = out.stdout {
                print!("{stdout}");
            }
            println!("{}", runner.output_path().display());
            Ok(())
        }
        command => {
            let mut m = DataSetManager::open(config_for(cli))?;
            match command {
                "create" => println!("{}", m.create(&params_of(cli)?, cli.id, cli.alias.as_deref())?.display()),
                "select" => println!("{}", m.select(&params_of(cli)?, cli.position)?.display()),
                "recreate" => println!("{}", m.recreate(&params_of(cli)?, cli.position)?.display()),
                "count" => println!("{}", m.count(&params_of(cli)?)),
                "delete" => println!("{}", m.delete(&params_of(cli)?, cli.position)?.display()),
                "delete-all" => m.delete_all()?,
                "table" => {
                    for params in m.table() {
                        println!("{}", params.canonical_json());
                    }
                }
                "files" => {
                    for path in m.files() {
                        println!("{}", path.display());
                    }
                }
                other => return Err(CliError::Usage(format!("comando desconocido: {other}"))),
            }
            Ok(())
        }
    }
}

fn main() {
    // Cargar .env si existe para obtener SIMDB_*
    let _ = dotenvy::dotenv();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("[simdb] {e}\n{USAGE}");
            std::process::exit(2);
        }
    };
    if let Err(e) = execute(&cli) {
        match &e {
            CliError::Usage(msg) => eprintln!("[simdb {}] {msg}\n{USAGE}", cli.command),
            CliError::Core(err) => eprintln!("[simdb {}] error: {err}", cli.command),
        }
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_globals_command_and_flags() {
        let cli = parse(&args(&["--dir", "t", "--exe", "cp", "create", r#"{"a":1}"#, "--id", "4", "--alias", "x"])).unwrap();
        assert_eq!(cli.dir.as_deref(), Some("t"));
        assert_eq!(cli.exe.as_deref(), Some("cp"));
        assert_eq!(cli.command, "create");
        assert_eq!(cli.json.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(cli.id, Some(4));
        assert_eq!(cli.alias.as_deref(), Some("x"));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&args(&[])).is_err());
        assert!(parse(&args(&["select", "{}", "--position"])).is_err());
        assert!(parse(&args(&["select", "{}", "--position", "-1"])).is_err());
        assert!(parse(&args(&["table", "--verbose"])).is_err());
        assert!(parse(&args(&["count", "{}", "{}"])).is_err());
    }

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), 2);
        assert_eq!(CliError::Core(SimDbError::Lookup { position: 0, available: 0 }).exit_code(), 3);
        assert_eq!(CliError::Core(SimDbError::DuplicateEntry { path: "t/0.json".into() }).exit_code(), 4);
        assert_eq!(CliError::Core(SimDbError::Config("x".into())).exit_code(), 1);
    }

    #[test]
    fn missing_json_is_a_usage_error() {
        let cli = parse(&args(&["count"])).unwrap();
        assert!(matches!(params_of(&cli), Err(CliError::Usage(_))));
    }
}
