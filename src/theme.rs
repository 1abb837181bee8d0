//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::piece::PieceKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Theme-file keys for piece colours, in [`PieceKind::ALL`] order.
const PIECE_KEYS: [&str; 7] = [
    "piece_i", "piece_o", "piece_t", "piece_l", "piece_j", "piece_s", "piece_z",
];

/// Piece and UI colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Piece colours indexed by [`PieceKind::index`].
    pub pieces: [Color; 7],
    /// Background behind the board and panels.
    pub bg: Color,
    /// Dots marking empty board cells.
    pub grid: Color,
    /// Borders.
    pub border: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Titles and labels.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Classic arcade colours on a dark grid.
    pub fn classic() -> Self {
        Self {
            pieces: PieceKind::ALL.map(PieceKind::color),
            bg: Color::Rgb(0, 0, 0),
            grid: Color::Rgb(40, 40, 40),
            border: Color::Rgb(90, 90, 90),
            main_fg: Color::Rgb(255, 255, 255),
            title: Color::Rgb(255, 255, 0),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Without a path the classic theme is used. Missing keys keep their classic value.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))?
            }
            None => Self::classic(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override piece colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.pieces = [
                    Color::Rgb(0x00, 0xFF, 0xFF), // I cyan
                    Color::Rgb(0xFF, 0xFF, 0x00), // O yellow
                    Color::Rgb(0xFF, 0x00, 0xFF), // T magenta
                    Color::Rgb(0xFF, 0x88, 0x00), // L orange
                    Color::Rgb(0x33, 0x66, 0xFF), // J blue
                    Color::Rgb(0x00, 0xFF, 0x00), // S green
                    Color::Rgb(0xFF, 0x00, 0x00), // Z red
                ];
                self.grid = Color::Rgb(0x10, 0x10, 0x10);
            }
            Palette::Colorblind => {
                // Okabe-Ito inspired; no red/green pairs
                self.pieces = [
                    Color::Rgb(0x56, 0xB4, 0xE9), // I sky blue
                    Color::Rgb(0xF0, 0xE4, 0x42), // O yellow
                    Color::Rgb(0xCC, 0x79, 0xA7), // T reddish purple
                    Color::Rgb(0xE6, 0x9F, 0x00), // L orange
                    Color::Rgb(0x00, 0x72, 0xB2), // J blue
                    Color::Rgb(0x00, 0x9E, 0x73), // S bluish green
                    Color::Rgb(0xD5, 0x5E, 0x00), // Z vermillion
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let classic = Self::classic();
        let get = |key: &str, fallback: Color| -> Result<Color, ThemeError> {
            map.get(key).map_or(Ok(fallback), |v| parse_hex(v))
        };
        let mut pieces = classic.pieces;
        for (slot, key) in pieces.iter_mut().zip(PIECE_KEYS) {
            *slot = get(key, *slot)?;
        }
        Ok(Self {
            pieces,
            bg: get("bg", classic.bg)?,
            grid: get("grid", classic.grid)?,
            border: get("border", classic.border)?,
            main_fg: get("main_fg", classic.main_fg)?,
            title: get("title", classic.title)?,
        })
    }

    #[inline]
    pub fn piece_color(&self, kind: PieceKind) -> Color {
        self.pieces[kind.index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    match hex.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}
