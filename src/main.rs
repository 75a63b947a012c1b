//! playroom: a toddler-friendly arcade in the terminal (Snake, Tetris, Dino).

mod announce;
mod app;
mod carousel;
mod engine;
mod input;
mod logging;
mod rng;
mod runner;
mod snake;
mod tetris;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use carousel::GameKind;
use clap::{Parser, ValueEnum};

/// Runtime options the app needs, derived from the CLI.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Skip the carousel and mount this game right away.
    pub game: Option<GameKind>,
    pub seed: Option<u64>,
    pub mute: bool,
    pub frame_rate: f64,
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            game: args.game,
            seed: args.seed,
            mute: args.mute,
            frame_rate: args.frame_rate.clamp(1.0, 240.0),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        logging::init(path, args.log_level).context("setting up logging")?;
    }
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(e) => {
            log::warn!("{e}; using the default theme");
            let mut theme = theme::Theme::default();
            theme.apply_palette(args.palette);
            theme
        }
    };
    let config = GameConfig::from(&args);
    log::info!("starting playroom with {config:?}");
    let mut app = App::new(config, theme);
    app.run()?;
    log::info!("bye");
    Ok(())
}

/// Snake, Tetris and a jump runner for small hands, in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "playroom",
    version,
    about = "A toddler-friendly arcade in the terminal: pick Snake, Tetris or Dino from a carousel.",
    long_about = "playroom hosts a few small games picked from a carousel.\n\n\
        CAROUSEL:\n  Left/Right  Browse    Enter/Space  Play    q  Quit\n\n\
        IN A GAME:\n  s  Start   p  Pause   r  Reset   n  Single step   Esc/Tab  Back to carousel\n\
        \x20 Snake   arrows steer\n\
        \x20 Tetris  Left/Right move, Up rotate, Down soft drop, Space hard drop\n\
        \x20 Dino    Space/Up jump (also starts the run)\n\n\
        Use --theme to load a btop-style theme file (theme[key]=\"#RRGGBB\")."
)]
pub struct Args {
    /// Skip the carousel and start with this game.
    #[arg(short, long)]
    pub game: Option<GameKind>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the crayon palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Seed for food, pieces and obstacles; random when omitted.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Do not ring the terminal bell for sound cues.
    #[arg(long)]
    pub mute: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE", value_parser = parse_frame_rate)]
    pub frame_rate: f64,

    /// Write logs to this file (nothing is logged without it).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log level (error, warn, info, debug, trace). Overrides RUST_LOG.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<log::LevelFilter>,
}

/// Finite and positive; the range clamp happens in `GameConfig`.
fn parse_frame_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("expected a positive frame rate, got {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let args = Args::try_parse_from(["playroom"]).unwrap();
        let config = GameConfig::from(&args);
        assert_eq!(config.game, None);
        assert!(!config.mute);
        assert_eq!(args.palette, Palette::Normal);
        assert!(args.log_file.is_none());
    }

    #[test]
    fn cli_game_aliases_and_flags() {
        let args = Args::try_parse_from([
            "playroom",
            "--game",
            "dino",
            "--seed",
            "42",
            "--palette",
            "colourblind",
            "--log-level",
            "debug",
            "--frame-rate",
            "1000",
        ])
        .unwrap();
        let config = GameConfig::from(&args);
        assert_eq!(config.game, Some(GameKind::Runner));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.frame_rate, 240.0);
        assert_eq!(args.palette, Palette::Colorblind);
        assert_eq!(args.log_level, Some(log::LevelFilter::Debug));
    }

    #[test]
    fn cli_rejects_unknown_game() {
        assert!(Args::try_parse_from(["playroom", "--game", "pong"]).is_err());
    }

    #[test]
    fn cli_rejects_unusable_frame_rates() {
        for rate in ["NaN", "inf", "-inf", "0", "-5", "fast"] {
            let parsed = Args::try_parse_from(["playroom", "--frame-rate", rate]);
            assert!(parsed.is_err(), "{rate} accepted");
        }
        let args = Args::try_parse_from(["playroom", "--frame-rate", "0.5"]).unwrap();
        assert_eq!(GameConfig::from(&args).frame_rate, 1.0);
    }
}
