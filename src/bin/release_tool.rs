//! Release Tool CLI
//!
//! Lists, re-exports and compares releases from AppStream and AppData files.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::Context;
use appstream_release::config::OutputFormat;
use appstream_release::{vercmp, Node, NodeContext, ReleaseSet, ToolConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "release-tool")]
#[command(about = "Inspect and rewrite AppStream release metadata")]
struct Cli {
    /// Configuration file (layered over appstream.toml lookups)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List releases newest-first
    List {
        /// AppStream or AppData XML file
        file: PathBuf,
        /// Locale of the description to print
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Write the merged releases back out
    Export {
        /// AppStream or AppData XML file
        file: PathBuf,
        /// Target AppStream API version
        #[arg(long)]
        api_version: Option<f64>,
        /// Emit JSON instead of XML
        #[arg(long)]
        json: bool,
    },

    /// Compare two version strings
    Compare { a: String, b: String },

    /// Print the effective configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ToolConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::List { file, locale } => {
            let ctx = config.context_for(&file);
            let mut releases = load_releases(&file, &ctx)?;
            releases.sort();

            let locale = locale.unwrap_or_else(|| config.parse.locale.clone());
            println!("{} release(s) in {}", releases.len(), file.display());
            for release in &releases {
                let date = release
                    .date()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "undated".to_string());
                println!();
                println!("  {} ({})", release.version().unwrap_or("unversioned"), date);
                for location in release.locations() {
                    println!("    location: {}", location);
                }
                for checksum in release.checksums() {
                    println!(
                        "    {}: {} {}",
                        checksum.kind(),
                        checksum.filename().unwrap_or("-"),
                        checksum.value().unwrap_or("-")
                    );
                }
                if let Some(description) = release.description(Some(locale.as_str())) {
                    println!("    {}", description);
                }
            }
            Ok(())
        }

        Commands::Export {
            file,
            api_version,
            json,
        } => {
            let mut ctx = config.context_for(&file);
            if let Some(version) = api_version {
                ctx.version = version;
            }
            let mut releases = load_releases(&file, &ctx)?;

            if json {
                releases.sort();
                let out = match config.output.format {
                    OutputFormat::Pretty => serde_json::to_string_pretty(&releases)?,
                    OutputFormat::Compact => serde_json::to_string(&releases)?,
                };
                println!("{}", out);
            } else {
                let mut root = Node::root();
                releases.insert(&mut root, &ctx);
                println!("{}", root.to_xml());
            }
            Ok(())
        }

        Commands::Compare { a, b } => {
            match vercmp(Some(a.as_str()), Some(b.as_str())) {
                Some(Ordering::Less) => println!("{} < {}", a, b),
                Some(Ordering::Equal) => println!("{} = {}", a, b),
                Some(Ordering::Greater) => println!("{} > {}", a, b),
                None => println!("{} and {} are not comparable", a, b),
            }
            Ok(())
        }

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Parse every `<releases>` block in the document into one set
fn load_releases(path: &Path, ctx: &NodeContext) -> anyhow::Result<ReleaseSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut root =
        Node::from_xml(&text).with_context(|| format!("parsing {}", path.display()))?;

    tracing::info!("reading {} as {}", path.display(), ctx.source_kind);

    let mut releases = ReleaseSet::new();
    root.try_for_each_named("releases", &mut |node: &mut Node| releases.parse(node, ctx))
        .with_context(|| format!("reading releases from {}", path.display()))?;
    Ok(releases)
}
