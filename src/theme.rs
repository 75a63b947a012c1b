//! Colours: btop-style `theme[key]="value"` files with hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block colours per tetromino colour id 1..=7 plus the board and snake/runner paint.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Index 0 is colour id 1 (I) through index 6 for id 7 (Z).
    pub blocks: [Color; 7],
    pub bg: Color,
    pub div_line: Color,
    pub main_fg: Color,
    pub title: Color,
    pub inactive_fg: Color,
    pub snake_head: Color,
    pub snake_body: Color,
    pub food: Color,
    pub runner: Color,
    pub obstacle: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("cannot read theme file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex colour: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::crayon()
    }
}

/// Compile-time `#RRGGBB`.
const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Theme {
    /// Bright crayon palette (tailwind 400/500 shades).
    pub fn crayon() -> Self {
        Self {
            blocks: [
                rgb(0x22D3EE), // cyan-400
                rgb(0x3B82F6), // blue-500
                rgb(0xF97316), // orange-500
                rgb(0xFACC15), // yellow-400
                rgb(0x22C55E), // green-500
                rgb(0xA855F7), // purple-500
                rgb(0xEF4444), // red-500
            ],
            bg: rgb(0x1E2230),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xE2E8F0),
            title: rgb(0xFCD34D),
            inactive_fg: rgb(0x64748B),
            snake_head: rgb(0x059669), // emerald-600
            snake_body: rgb(0x34D399), // emerald-400
            food: rgb(0xFB7185),       // rose-400
            runner: rgb(0x10B981),     // emerald-500
            obstacle: rgb(0x94A3B8),
        }
    }

    /// Load a btop-style theme file; `None` or a missing file gives the default.
    /// `palette` then overrides the block colours.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&text))?
            }
            Some(p) => {
                log::warn!("theme file {} not found, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.blocks = [
                    rgb(0x00FFFF),
                    rgb(0x0088FF),
                    rgb(0xFF8800),
                    rgb(0xFFFF00),
                    rgb(0x00FF00),
                    rgb(0xFF00FF),
                    rgb(0xFF0000),
                ];
                self.bg = Color::Black;
                self.food = rgb(0xFF0000);
                self.snake_body = rgb(0x00FF00);
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito
                self.blocks = [
                    rgb(0x56B4E9),
                    rgb(0x0072B2),
                    rgb(0xE69F00),
                    rgb(0xF0E442),
                    rgb(0x009E73),
                    rgb(0xCC79A7),
                    rgb(0xD55E00),
                ];
                self.food = rgb(0xE69F00);
                self.snake_body = rgb(0x56B4E9);
                self.snake_head = rgb(0x0072B2);
            }
        }
    }

    /// Keys missing from the file keep their default; a present but
    /// malformed value is an error.
    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        let pick = |key: &str, slot: &mut Color| -> Result<(), ThemeError> {
            if let Some(v) = map.get(key) {
                *slot = parse_hex(v)?;
            }
            Ok(())
        };
        const BLOCK_KEYS: [&str; 7] = [
            "block_i", "block_j", "block_l", "block_o", "block_s", "block_t", "block_z",
        ];
        for (key, slot) in BLOCK_KEYS.into_iter().zip(theme.blocks.iter_mut()) {
            pick(key, slot)?;
        }
        pick("main_bg", &mut theme.bg)?;
        pick("div_line", &mut theme.div_line)?;
        pick("main_fg", &mut theme.main_fg)?;
        pick("title", &mut theme.title)?;
        pick("inactive_fg", &mut theme.inactive_fg)?;
        pick("snake_head", &mut theme.snake_head)?;
        pick("snake_body", &mut theme.snake_body)?;
        pick("food", &mut theme.food)?;
        pick("runner", &mut theme.runner)?;
        pick("obstacle", &mut theme.obstacle)?;
        Ok(theme)
    }

    /// Colour for a board colour id (1..=7); 0 is the background.
    #[inline]
    pub fn block_color(&self, id: u8) -> Color {
        match id {
            0 => self.bg,
            n => self.blocks[(n as usize - 1) % self.blocks.len()],
        }
    }
}

/// `theme[key]="value"` lines into key -> value; comments and junk skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let digits = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.trim().to_string());
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let value = u32::from_str_radix(digits, 16).map_err(|_| bad())?;
    match digits.len() {
        6 => Ok(rgb(value)),
        3 => {
            let nibble = |shift: u32| ((value >> shift) & 0xF) as u8 * 17;
            Ok(Color::Rgb(nibble(8), nibble(4), nibble(0)))
        }
        _ => Err(bad()),
    }
}
