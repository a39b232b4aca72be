use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use roundwin::actor::decorator::replay::{Script, replay};
use roundwin::common::config::{RoundedCornersConfig, Settings};
use roundwin::common::log;
use roundwin::model::shadow_style;
use tracing::debug;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log debug output to stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the default configuration.
    DefaultConfig,
    /// Validate a configuration file and print the shadow styles it produces.
    CheckConfig {
        /// Defaults to the user config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run a scripted session against the in-memory compositor and print the
    /// resulting scene.
    Replay {
        script: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the scene as JSON instead of a tree.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    sigpipe::reset();
    let cli = Cli::parse();
    log::init(cli.verbose);

    match cli.command {
        Command::DefaultConfig => {
            let text = Settings::default().to_toml().context("serializing default config")?;
            print!("{text}");
        }
        Command::CheckConfig { config } => check_config(config)?,
        Command::Replay { script, config, json } => {
            let settings = load_settings(config)?;
            let script = Script::read(&script)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("building runtime")?;
            let decorator = runtime.block_on(replay(script, settings));

            let mut out = std::io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &decorator.compositor().snapshot())?;
                writeln!(out)?;
            } else {
                let mut tree = String::new();
                ascii_tree::write_tree(&mut tree, &decorator.compositor().scene_tree())?;
                write!(out, "{tree}")?;
            }
        }
    }
    Ok(())
}

fn load_settings(path: Option<PathBuf>) -> anyhow::Result<Settings> {
    let path = match path {
        Some(path) => path,
        None => match Settings::default_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("no config file, using defaults");
                return Ok(Settings::default());
            }
        },
    };
    Ok(Settings::read(&path)?)
}

fn check_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let source = path
        .clone()
        .or_else(Settings::default_path)
        .filter(|p| p.exists())
        .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
    let settings = load_settings(path)?;

    println!("config ok: {source}");
    let corners = settings.rounded_corners.unwrap_or_else(RoundedCornersConfig::default);
    println!("effective radius: {}", corners.effective_radius());
    for (label, focused) in [("focused", true), ("unfocused", false)] {
        let style = shadow_style::compute(
            settings.rounded_corners.as_ref(),
            &settings.shadow_for(focused),
            1.0,
            1.0,
            false,
        );
        match style {
            Some(style) => println!("{label}: {}", style.inner_css()),
            None => println!("{label}: no style (corner settings missing)"),
        }
    }
    Ok(())
}
