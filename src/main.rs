//! Blockfall — classic falling-block puzzle game in the terminal.

mod app;
mod board;
mod game;
mod input;
mod piece;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use log::{LevelFilter, info, warn};
use std::fs::File;
use std::path::PathBuf;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        warn!("theme not loaded, using classic colours: {e}");
        let mut t = theme::Theme::classic();
        t.apply_palette(args.palette);
        t
    });
    info!("starting blockfall (seed {:?})", args.seed);
    let mut app = App::new(&args, theme);
    app.run()?;
    Ok(())
}

/// Log only to a file; the terminal belongs to the game.
fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Classic falling-block puzzle in the terminal. Complete horizontal rows to clear them and score.",
    long_about = "Blockfall is a terminal puzzle game on a 10x20 board.\n\n\
        Tetrominoes fall from the top. Move and rotate them so they complete full rows; \
        full rows are cleared and score 100/300/500/800 points times your level for 1-4 rows. \
        Every 1000 points raises the level and speeds up the fall.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move     Up or k      Rotate\n  Down or j          Soft drop  Space/Enter  Hard drop\n  P                  Pause      Q / Esc      Quit\n\n\
        After game over, any key starts a new game."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"#RRGGBB\"). Keys: piece_i..piece_z, bg, grid, border, main_fg, title.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Seed for the piece sequence (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Disable the line-clear flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Write log output to this file (nothing is logged otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for --log-file; RUST_LOG overrides it.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: LevelFilter,
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
