use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eigenface::config::{self, Config};
use eigenface::report::{Headless, Presenter, SaveToDir};
use eigenface::session;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "eigenface")]
#[command(
    version,
    about = "Eigenface recognition over the ORL face database"
)]
struct Cli {
    /// Config file (defaults to eigenface.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Fit eigenfaces, recognize the probe and report the recognition rate
    Recognize {
        /// Seed for the candidate shuffle (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Probe image, laid out as <database>/s<subject>/<sample>.pgm
        #[arg(long)]
        probe: Option<PathBuf>,
        /// Save the probe and the matched image as PNGs in this directory
        #[arg(long)]
        save_images: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the config path as well
        #[arg(long)]
        write: bool,
    },
}

impl Default for Commands {
    /// Running without a subcommand recognizes with the configured defaults.
    fn default() -> Self {
        Commands::Recognize {
            seed: None,
            probe: None,
            save_images: None,
            json: false,
        }
    }
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let cfg = config::load_config(config_path)?;

    match cli.command.unwrap_or_default() {
        Commands::Recognize {
            seed,
            probe,
            save_images,
            json,
        } => {
            let cfg = apply_overrides(cfg, seed, probe, save_images);
            recognize(&cfg, json)
        }
        Commands::Config { write } => show_config(&cfg, config_path, write),
    }
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(
    cfg: Config,
    seed: Option<u64>,
    probe: Option<PathBuf>,
    save_images: Option<PathBuf>,
) -> Config {
    Config {
        seed: seed.or(cfg.seed),
        probe: probe.unwrap_or(cfg.probe),
        save_images: save_images.or(cfg.save_images),
        ..cfg
    }
}

fn recognize(cfg: &Config, json: bool) -> Result<()> {
    info!("Database: {}", cfg.database.display());
    info!("Probe: {}", cfg.probe.display());

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut presenter: Box<dyn Presenter> = match &cfg.save_images {
        Some(dir) => Box::new(SaveToDir::new(dir)),
        None => Box::new(Headless),
    };

    let summary =
        session::run(cfg, &mut rng, presenter.as_mut()).context("Recognition run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print();
    }
    Ok(())
}

fn show_config(cfg: &Config, path: Option<&Path>, write: bool) -> Result<()> {
    print!("{}", toml::to_string_pretty(cfg)?);
    if write {
        config::save_config(cfg, path).context("Failed to write config")?;
        let shown = path.unwrap_or(&config::CONFIG_PATH);
        info!("✓ Config written to {}", shown.display());
    }
    Ok(())
}
