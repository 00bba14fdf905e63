//! Shell command - management shell with the config in the environment
//!
//! Loads and validates configuration, then launches an interactive shell
//! with every config leaf exported as a prefixed environment variable
//! (nested keys joined with `__`, uppercased). Piped stdin is executed as
//! script input; the command's exit code follows the shell's.

use std::path::PathBuf;
use std::process::Command;

use anyhow::Result;
use clap::{Args, ValueEnum};
use config::{AppConfig, EnvSource, SettingsBuilder};
use errors::SettingsError;
use serde_json::Value;
use tracing::debug;

use crate::output;

#[derive(Args)]
pub struct ShellArgs {
    /// Shell interface to launch (default: $SHELL, then bash, then sh)
    #[arg(long, value_enum)]
    pub interface: Option<Interface>,

    /// Scripts run through the shell before the prompt appears
    #[arg(long = "startup", value_name = "PATH")]
    pub startup: Vec<PathBuf>,

    /// Skip startup scripts
    #[arg(long)]
    pub no_rc: bool,

    /// Config files to load, in precedence order
    #[arg(long = "config", value_name = "PATH")]
    pub config: Vec<PathBuf>,

    /// Prefix for loaded and exported environment variables
    #[arg(long, default_value = "FLOE_")]
    pub env_prefix: String
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Interface {
    Zsh,
    Bash,
    Sh
}

impl Interface {
    fn program(self) -> &'static str {
        match self {
            Interface::Zsh => "zsh",
            Interface::Bash => "bash",
            Interface::Sh => "sh"
        }
    }
}

pub fn run(args: ShellArgs) -> Result<i32> {
    let builder = SettingsBuilder::<AppConfig>::new()
        .with_files(args.config.clone())
        .with_env(EnvSource::new(args.env_prefix.as_str()));

    let (tree, _model) = match builder.build() {
        Ok(loaded) => loaded,
        Err(SettingsError::Validation { issues }) => {
            output::error("configuration is invalid:");
            for issue in &issues {
                eprintln!("  {issue}");
            }
            return Ok(1);
        }
        Err(other) => return Err(other.into())
    };

    let exported = export_vars(&args.env_prefix, tree.root());
    debug!(count = exported.len(), "exporting config variables");

    let Some(shell) = resolve_shell(args.interface) else {
        output::error(&no_shell_message(args.interface));
        return Ok(1);
    };
    output::info(&format!("launching {shell}"));

    if !args.no_rc {
        for script in &args.startup {
            let status = Command::new(&shell)
                .arg(script)
                .envs(exported.iter().cloned())
                .status()?;
            if !status.success() {
                output::warn(&format!(
                    "startup script {} exited with {}",
                    script.display(),
                    status.code().unwrap_or(1)
                ));
            }
        }
    }

    let status = Command::new(&shell)
        .envs(exported.iter().cloned())
        .status()?;
    Ok(status.code().unwrap_or(1))
}

/// Flattens the config tree into prefixed environment variables.
///
/// Nested keys join with `__` and uppercase; string leaves export verbatim,
/// other scalars as their JSON text, sequences as inline JSON. Nulls are
/// not exported.
fn export_vars(prefix: &str, root: &Value) -> Vec<(String, String)> {
    let mut vars = Vec::new();
    if let Value::Object(map) = root {
        for (key, child) in map {
            let name = format!("{prefix}{}", key.to_uppercase());
            collect_vars(&name, child, &mut vars);
        }
    }
    vars.sort();
    vars
}

fn collect_vars(name: &str, value: &Value, vars: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                collect_vars(&format!("{name}__{}", key.to_uppercase()), child, vars);
            }
        }
        Value::Null => {}
        Value::String(text) => vars.push((name.to_string(), text.clone())),
        other => vars.push((name.to_string(), other.to_string()))
    }
}

/// Picks the shell to launch.
///
/// An explicit `--interface` wins. Otherwise `$SHELL` is used when it names
/// a known interface, then bash, then sh; candidates that cannot be spawned
/// are skipped.
fn resolve_shell(interface: Option<Interface>) -> Option<String> {
    let mut candidates: Vec<String> = Vec::new();
    match interface {
        Some(interface) => candidates.push(interface.program().to_string()),
        None => {
            if let Ok(shell) = std::env::var("SHELL") {
                let known = ["zsh", "bash", "sh"];
                if shell
                    .rsplit('/')
                    .next()
                    .is_some_and(|name| known.contains(&name))
                {
                    candidates.push(shell);
                }
            }
            candidates.push("bash".to_string());
            candidates.push("sh".to_string());
        }
    }
    candidates.into_iter().find(|candidate| is_spawnable(candidate))
}

fn no_shell_message(interface: Option<Interface>) -> String {
    match interface {
        Some(interface) => format!("{} is not available on this system", interface.program()),
        None => "no usable shell found (tried $SHELL, bash, sh)".to_string()
    }
}

fn is_spawnable(program: &str) -> bool {
    Command::new(program)
        .arg("-c")
        .arg("exit 0")
        .status()
        .is_ok()
}
