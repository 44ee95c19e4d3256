//! Euphoriae Render - run WAV files through the effect engine
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use euphoriae_dsp::effects::EqLayout;
use euphoriae_engine::{presets, EffectProfile};
use euphoriae_render::{read_wav, render, write_wav, RenderConfig, RenderOptions};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "euphoriae-render")]
#[command(about = "Render audio files through the Euphoriae effect engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a WAV file
    Render {
        /// Input WAV file
        input: PathBuf,
        /// Output WAV file
        output: PathBuf,
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Effect profile applied on top of the configured effects
        #[arg(short, long, value_parser = parse_profile)]
        profile: Option<EffectProfile>,
        /// EQ preset applied last
        #[arg(long)]
        preset: Option<String>,
        /// Write the effective settings as JSON next to the output
        #[arg(long)]
        save_settings: bool,
    },
    /// List EQ presets and effect profiles
    Presets,
    /// Print the effective configuration as JSON
    ShowConfig {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_profile(name: &str) -> std::result::Result<EffectProfile, String> {
    EffectProfile::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = EffectProfile::ALL.iter().map(EffectProfile::name).collect();
        format!("unknown profile '{name}' (expected one of: {})", known.join(", "))
    })
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "euphoriae_render=info,euphoriae_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            config,
            profile,
            preset,
            save_settings,
        } => {
            let config = RenderConfig::load(config.as_deref())?;
            let audio = read_wav(&input)?;
            info!(
                "Loaded {} ({} ch, {} Hz, {:.2} s)",
                input.display(),
                audio.channels,
                audio.sample_rate,
                audio.duration_secs()
            );

            let options = RenderOptions { profile, preset };
            let (rendered, report) = render(&audio, &config, &options)?;
            if !report.faults.is_empty() {
                warn!("Engine reported faults: {:#x}", report.faults.bits());
            }

            write_wav(&output, &rendered, config.output.float)?;
            info!("Wrote {}", output.display());

            if save_settings {
                let path = output.with_extension("json");
                let json = report.settings.to_json()?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Settings saved to {}", path.display());
            }
        }
        Commands::Presets => {
            for layout in [EqLayout::TenBand, EqLayout::FiveBand] {
                println!("{}-band presets:", layout.count());
                for preset in presets::presets(layout) {
                    println!("  {:<14} {:?}", preset.name, preset.levels);
                }
            }
            println!("Profiles:");
            for profile in EffectProfile::ALL {
                let preset = profile.preset().unwrap_or("-");
                println!("  {:<14} preset {preset}", profile.name());
            }
        }
        Commands::ShowConfig { config } => {
            let config = RenderConfig::load(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
