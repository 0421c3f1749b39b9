//! vl - viewloader CLI
//!
//! Inspects template resolution from a shell.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use viewloader::cli::{Cli, Command, OutputFormat};
use viewloader::{
    LoaderChain, LoaderConfig, LoaderRegistry, ModuleViewFolders, PathResolver, UPDATE_EVENT, ViewFolderResolver,
    list_templates, reference, rewrite,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = LoaderConfig::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = LoaderConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if cli.no_watch {
        config.no_watch = true;
    }

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Parse { name } => cmd_parse(&name),
        Command::Resolve { name, module, format } => cmd_resolve(config, &name, module.as_deref(), format),
        Command::Rewrite { file, module } => cmd_rewrite(&file, &module),
        Command::Folders { module } => cmd_folders(&config, &module),
        Command::List { module, format } => cmd_list(&config, module.as_deref(), format),
        Command::Watch { preload } => cmd_watch(&config, &preload).await,
    }
}

fn cmd_parse(name: &str) -> Result<()> {
    let parsed = reference::parse(name);
    println!("module:   {}", parsed.module.as_deref().unwrap_or("-"));
    println!("residual: {}", parsed.residual);
    Ok(())
}

/// The requested module's loader first, then the root search paths
fn build_chain(config: LoaderConfig, module: Option<&str>) -> LoaderChain {
    let folders: Arc<dyn ViewFolderResolver> = Arc::new(ModuleViewFolders::from_config(&config));
    let root = Arc::new(PathResolver::from_config(&config, Arc::clone(&folders)));
    match module {
        Some(module) => {
            let registry = LoaderRegistry::new(config, folders);
            LoaderChain::new(vec![registry.resolver_for(module), root])
        }
        None => LoaderChain::new(vec![root]),
    }
}

fn cmd_resolve(mut config: LoaderConfig, name: &str, module: Option<&str>, format: OutputFormat) -> Result<()> {
    config.no_watch = true;
    let chain = build_chain(config, module);
    let found = chain
        .get_source(name)
        .with_context(|| format!("Failed to resolve {}", name))?
        .ok_or_else(|| eyre!("Template not found: {}", name))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
        OutputFormat::Text => {
            println!("{} {}", "path:".cyan(), found.path.display());
            println!("{}", found.source);
        }
    }
    Ok(())
}

fn cmd_rewrite(file: &Path, module: &str) -> Result<()> {
    let source = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let rewritten = rewrite(&source, module).with_context(|| format!("Failed to rewrite {}", file.display()))?;
    print!("{}", rewritten);
    Ok(())
}

fn cmd_folders(config: &LoaderConfig, module: &str) -> Result<()> {
    let folders = ModuleViewFolders::from_config(config).folders_for(module);
    if folders.is_empty() {
        return Err(eyre!("Unknown module: {}", module));
    }
    for (i, dir) in folders.iter().enumerate() {
        let marker = if dir.is_dir() { "✓".green() } else { "-".dimmed() };
        println!("{:>2}. {} {}", i + 1, marker, dir.display());
    }
    Ok(())
}

fn cmd_list(config: &LoaderConfig, module: Option<&str>, format: OutputFormat) -> Result<()> {
    let dirs = match module {
        Some(module) => ModuleViewFolders::from_config(config).folders_for(module),
        None => config.resolved_search_paths(),
    };
    let entries = list_templates(&dirs);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}  {}", entry.name.cyan(), entry.path.display());
                for shadowed in &entry.shadowed {
                    println!("    {} {}", "shadows".yellow(), shadowed.display());
                }
            }
            println!("{} templates", entries.len());
        }
    }
    Ok(())
}

async fn cmd_watch(config: &LoaderConfig, preload: &[String]) -> Result<()> {
    let folders = Arc::new(ModuleViewFolders::from_config(config));
    let resolver = PathResolver::from_config(config, folders);
    if !resolver.is_watching() {
        return Err(eyre!("Watching is disabled (no-watch)"));
    }

    for name in preload {
        match resolver.get_source(name)? {
            Some(found) => println!("{} {} -> {}", "loaded".green(), name, found.path.display()),
            None => println!("{} {}", "missing".yellow(), name),
        }
    }

    resolver.on(UPDATE_EVENT, |name| {
        println!("{} {}", "update".cyan(), name);
        Ok(())
    });

    info!("Watching {} search paths, press Ctrl-C to stop", resolver.search_paths().len());
    tokio::signal::ctrl_c().await?;
    resolver.stop_watching();
    Ok(())
}
