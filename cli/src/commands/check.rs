//! Check command - configuration validation
//!
//! Loads configuration from files and the environment, validates it against
//! the settings schema and validates every `databases` section against its
//! registered database schema. Exit code 1 on any issue, or on warnings
//! under `--strict`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use config::{AppConfig, EnvSource, LoaderRegistry, SettingsBuilder};
use db::DbConfigRegistry;
use errors::{SettingsError, ValidationIssue};
use serde_json::json;

use crate::output;

#[derive(Args)]
pub struct CheckArgs {
    /// Config files to load, in precedence order
    #[arg(long = "config", value_name = "PATH")]
    pub config: Vec<PathBuf>,

    /// Prefix for environment-variable configuration
    #[arg(long, default_value = "FLOE_")]
    pub env_prefix: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Fail on warnings (exit code 1)
    #[arg(long)]
    pub strict: bool
}

pub fn run(args: CheckArgs) -> Result<i32> {
    let warnings = scan_file_warnings(&args.config);

    let builder = SettingsBuilder::<AppConfig>::new()
        .with_files(args.config.clone())
        .with_env(EnvSource::new(args.env_prefix.as_str()));

    let mut issues: Vec<ValidationIssue> = Vec::new();
    let model = match builder.build() {
        Ok((_, model)) => Some(model),
        Err(SettingsError::Validation { issues: found }) => {
            issues = found;
            None
        }
        Err(other) => return Err(other.into())
    };

    if let Some(model) = &model {
        let registry = DbConfigRegistry::with_builtins();
        for (name, section) in &model.databases {
            if let Err(err) = registry.parse(name, section) {
                issues.push(ValidationIssue {
                    path: format!("databases.{name}"),
                    code: "database".to_string(),
                    message: err.to_string()
                });
            }
        }
    }

    let ok = issues.is_empty();
    let failed = !ok || (args.strict && !warnings.is_empty());

    if args.json {
        let report = json!({
            "ok": ok,
            "issues": issues,
            "warnings": warnings
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(i32::from(failed));
    }

    output::header("Configuration Check");
    println!();

    for warning in &warnings {
        output::warn(warning);
    }

    if let Some(model) = &model {
        println!("  {} {}", "Title:".dimmed(), model.service.title.cyan());
        println!("  {} {}", "Version:".dimmed(), model.service.version.cyan());
        println!(
            "  {} {}",
            "Debug:".dimmed(),
            model.debug.to_string().cyan()
        );
        println!(
            "  {} {}",
            "Databases:".dimmed(),
            model.databases.len().to_string().cyan()
        );
        println!();
    }

    if ok {
        output::success("configuration is valid");
    } else {
        output::error(&format!("{} issue(s) found:", issues.len()));
        for issue in &issues {
            eprintln!("  {}", issue.to_string().red());
        }
    }
    if failed && ok {
        output::error("failing on warnings (--strict)");
    }

    Ok(i32::from(failed))
}

/// Pre-flight warnings for requested files the loader will skip.
fn scan_file_warnings(paths: &[PathBuf]) -> Vec<String> {
    let registry = LoaderRegistry::with_builtins();
    let mut warnings = Vec::new();
    for path in paths {
        if registry.loader_for(path).is_err() {
            warnings.push(format!("no loader for {}", path.display()));
        } else if !path.exists() {
            warnings.push(format!("config file not found: {}", path.display()));
        }
    }
    warnings
}
