//! crudcheck CLI - contract and behavior checks for the customer API

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crudcheck_core::Config;
use crudcheck_emu::{Method, RequestDescriptor};
use crudcheck_runner::{run_suite, ApiTarget, Contract, EmulatedTarget, LiveTarget};

#[derive(Parser)]
#[command(name = "crudcheck")]
#[command(about = "Dual-mode contract and behavior checks for the customer API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the assertion suite
    Run {
        /// Base URL of a live deployment. Overrides BASE_URL and the
        /// config file; when nothing supplies a URL, the suite runs
        /// against the built-in emulated backend.
        #[arg(short, long)]
        base_url: Option<String>,

        /// Config file (default: .crudcheck.toml)
        #[arg(short, long)]
        config: Option<String>,

        /// OpenAPI document for contract validation. When unset, the
        /// contract is fetched from the target's /v3/api-docs.
        #[arg(long)]
        openapi: Option<String>,

        /// Skip contract validation entirely
        #[arg(long)]
        no_contract: bool,
    },

    /// Initialize config file
    Init,

    /// Show configuration status
    Doctor,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            base_url,
            config,
            openapi,
            no_contract,
        } => {
            let cfg = if let Some(path) = config {
                Config::load(Path::new(&path))?
            } else {
                Config::load_default()?
            };

            let resolved = cfg.resolve_base_url(base_url.as_deref());
            let target: Box<dyn ApiTarget> = match &resolved {
                Some(url) => Box::new(
                    LiveTarget::new(url, cfg.headers.clone())
                        .with_context(|| format!("cannot build client for {url}"))?,
                ),
                None => Box::new(EmulatedTarget::new()),
            };

            let contract = if no_contract {
                None
            } else {
                Some(load_contract(
                    openapi.as_deref().map(Path::new).or(cfg.openapi.as_deref()),
                    target.as_ref(),
                )?)
            };

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  target:   {}", target.describe());
                eprintln!(
                    "  contract: {}",
                    contract.as_ref().map_or_else(
                        || "disabled".to_string(),
                        |c| format!("{} operations", c.operation_count())
                    )
                );
                let db = cfg.resolve_db();
                if db.is_configured() {
                    eprintln!("  db:       {} (external verification tooling)", db.url);
                }
                eprintln!();
            }

            let report = run_suite(target.as_ref(), contract.as_ref())
                .context("suite aborted before completing")?;

            match cli.output {
                OutputFormat::Terminal => {
                    print!("{}", report.to_terminal());
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Silent => {}
            }

            Ok(report.exit_code())
        }

        Commands::Init => {
            let config_path = ".crudcheck.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: live deployment to test (unset = emulation)");
            println!("  - openapi: contract document (unset = fetch from target)");
            println!("  - headers: API keys sent on every live request");
            println!("  - db: connection parameters for external DB verification");
            Ok(0)
        }

        Commands::Doctor => {
            println!("crudcheck doctor");
            println!("================\n");

            let config_ok = Path::new(".crudcheck.toml").exists();
            println!(
                "[{}] Config file (.crudcheck.toml)",
                if config_ok { "OK" } else { "--" }
            );

            let cfg = Config::load_default()?;
            match cfg.resolve_base_url(None) {
                Some(url) => println!("[OK] Target: live ({url})"),
                None => println!("[OK] Target: emulated backend (no base URL configured)"),
            }

            if let Some(path) = &cfg.openapi {
                println!(
                    "[{}] OpenAPI document ({})",
                    if path.exists() { "OK" } else { "NG" },
                    path.display()
                );
            } else {
                println!("[--] OpenAPI document (will fetch from target's /v3/api-docs)");
            }

            let db = cfg.resolve_db();
            if db.is_configured() {
                println!("[OK] DB parameters ({})", db.url);
            } else {
                println!("[--] DB parameters (external verification disabled)");
            }

            if !config_ok {
                println!("\nCreate config file:");
                println!("  crudcheck init");
            }

            Ok(0)
        }
    }
}

/// Contract source, in order: local file, then the target's own
/// /v3/api-docs endpoint.
fn load_contract(path: Option<&Path>, target: &dyn ApiTarget) -> Result<Contract> {
    if let Some(path) = path {
        return Contract::load(path)
            .with_context(|| format!("cannot load contract from {}", path.display()));
    }
    let resp = target
        .send(&RequestDescriptor::new(Method::Get, "/v3/api-docs"))
        .context("cannot fetch contract from /v3/api-docs")?;
    let doc = resp
        .body
        .context("target served an empty OpenAPI document")?;
    Contract::from_document(&doc).context("target served an unusable OpenAPI document")
}
