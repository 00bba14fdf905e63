pub mod check;
pub mod shell;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "floe",
    author,
    version,
    about = "Floe - configuration and application bootstrap toolkit",
    long_about = "Loads layered configuration (files, environment, secrets), validates it \
                  against the settings schema and hands the result to your application."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Open a management shell with the validated config exported")]
    Shell(shell::ShellArgs),

    #[command(about = "Load and validate configuration, reporting issues")]
    Check(check::CheckArgs)
}
