use clap::{Parser, Subcommand};
use simple_blog::config::{self, LayerSelector};
use simple_blog::output;
use simple_blog::scan::{self, BuildOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simple-blog")]
#[command(about = "Content pipeline for a Markdown blog")]
#[command(long_about = "\
Content pipeline for a Markdown blog

Reads Markdown articles with a YAML (---) or TOML (+++) header, merges layered
configuration, resolves menus and taxonomies, and writes a JSON manifest for a
renderer to consume.

Site structure:

  site/
  ├── config.toml                  # Root config (or config.yaml)
  ├── config/
  │   ├── _default/config.toml     # Shared layer
  │   ├── _default/config.fr.toml  # Locale layer
  │   └── production/config.toml   # Environment layer (--environment)
  └── content/
      ├── _index.md                # Home section metadata
      ├── about.md                 # → /about/
      └── posts/
          ├── _index.md            # Section title, description, weight
          ├── hello-world.md       # → /posts/hello-world/
          └── first-trip/index.md  # Leaf bundle → /posts/first-trip/

Run 'simple-blog gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Environment whose config layer is applied
    #[arg(long, default_value = "production", global = true)]
    environment: String,

    /// Locale whose config layers are applied (defaults to default_locale)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Include documents marked as drafts
    #[arg(long, global = true)]
    drafts: bool,

    /// Include documents dated in the future
    #[arg(long, global = true)]
    future: bool,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the site and write the manifest
    Scan {
        /// Manifest file to write
        #[arg(long, default_value = ".simple-blog/manifest.json")]
        output: PathBuf,
    },
    /// Validate the site without writing anything
    Check,
    /// Show the config layers that were loaded and the merged result
    Config,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = BuildOptions {
        environment: cli.environment.clone(),
        locale: cli.locale.clone(),
        drafts: cli.drafts,
        future: cli.future,
        ..BuildOptions::default()
    };

    match cli.command {
        Command::Scan {
            output: manifest_path,
        } => {
            let manifest = run_scan(&cli.source, &options)?;
            if let Some(parent) = manifest_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&manifest_path, json)?;
            output::print_scan_output(&manifest);
            println!("==> Manifest written to {}", manifest_path.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = run_scan(&cli.source, &options)?;
            output::print_scan_output(&manifest);
            println!("==> Content is valid");
        }
        Command::Config => {
            let selector = LayerSelector {
                environment: &options.environment,
                locale: options.locale.as_deref(),
            };
            let resolved = config::load_config(&cli.source, &selector)?;
            output::print_config_output(&resolved)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run the scan, tagging failures with their error kind.
fn run_scan(source: &std::path::Path, options: &BuildOptions) -> Result<scan::Manifest, Box<dyn std::error::Error>> {
    scan::scan(source, options).map_err(|e| format!("{} error: {}", e.kind(), e).into())
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
