use std::path::PathBuf;

use clap::Parser;

/// Keep an application up to date from its deployment and start it.
///
/// Arguments not recognized as launcher options are forwarded to the
/// application. `--app=<location>`, `--uri=<base>` and `--cache-dir=<dir>`
/// are also read by the launcher itself.
#[derive(Clone, Debug, Parser)]
#[command(name = "relaunch", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Launcher configuration file [default: relaunch.toml next to the executable]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Manifest bundled with the launcher [default: app.json next to the executable]
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Log filter, e.g. `info` or `relaunch_core=debug`
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,

    /// Connect timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Read timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub read_timeout: Option<u64>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Launch parameters, forwarded to the application
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}
