//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// viewloader - inspect layered, module-namespaced template resolution
#[derive(Parser)]
#[command(
    name = "vl",
    about = "Inspect layered, module-namespaced template resolution",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Disable filesystem watching
    #[arg(long = "no-watch", global = true)]
    pub no_watch: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a logical name into module and residual path
    Parse {
        /// Logical template name
        name: String,
    },

    /// Resolve a logical name and print where it came from
    Resolve {
        /// Logical template name
        name: String,

        /// Resolve through this module's loader chain instead of the search paths
        #[arg(short, long)]
        module: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print a template file rewritten for a module
    Rewrite {
        /// Template file
        file: PathBuf,

        /// Module to namespace references with
        #[arg(short, long)]
        module: String,
    },

    /// Show a module's view folders in precedence order
    Folders {
        /// Module name
        module: String,
    },

    /// List every available template and where it resolves
    List {
        /// List a module's view folders instead of the search paths
        #[arg(short, long)]
        module: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Watch the search paths and print update events until interrupted
    Watch {
        /// Resolve these names first so their changes are reported
        #[arg(short, long, num_args = 1..)]
        preload: Vec<String>,
    },
}

/// Output format for resolve/list commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
