//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::grid::Hue;
use crate::surface::Stroke;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark shape colours and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Shape hues in `Hue` order: red, blue, green, yellow, purple.
    pub hues: [Color; 5],
    /// Particles of a cell that was already empty.
    pub neutral: Color,
    /// Board background.
    pub bg: Color,
    /// Border.
    pub div_line: Color,
    /// Text (score, status).
    pub main_fg: Color,
    /// Highlight / titles; also the score flash.
    pub title: Color,
    /// Outline of the selected cell.
    pub selection: Color,
    /// Outline of the keyboard cursor.
    pub cursor: Color,
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
        Self::onedark_default()
    }
}

/// `#RRGGBB` literal known to be valid.
const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Theme {
    /// One Dark defaults (onedark.theme values).
    pub fn onedark_default() -> Self {
        Self {
            hues: [
                rgb(0xE06C75), // red
                rgb(0x61AFEF), // blue
                rgb(0x98C379), // green
                rgb(0xE5C07B), // yellow
                rgb(0xC678DD), // purple
            ],
            neutral: rgb(0xFFFFFF),
            bg: rgb(0x282C34),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            selection: rgb(0xFFFFFF),
            cursor: rgb(0x56B6C2),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            Some(p) => {
                log::warn!("theme file {} not found, using defaults", p.display());
                return Ok(Self::default_for_palette(palette));
            }
            None => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override shape hues for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.hues = [
                    rgb(0xFF0000),
                    rgb(0x0088FF),
                    rgb(0x00FF00),
                    rgb(0xFFFF00),
                    rgb(0xFF00FF),
                ];
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito style hues.
                self.hues = [
                    rgb(0xCC3311),
                    rgb(0x0077BB),
                    rgb(0x009988),
                    rgb(0xEE7733),
                    rgb(0xEE3377),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let d = Self::onedark_default();
        Self {
            hues: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.hues[0]),
                get("cpu_box").unwrap_or(d.hues[1]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.hues[2]),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(d.hues[3]),
                get("net_box").unwrap_or(d.hues[4]),
            ],
            neutral: get("hi_fg").unwrap_or(d.neutral),
            bg: get("main_bg").or_else(|| get("meter_bg")).unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            selection: get("selected_fg").unwrap_or(d.selection),
            cursor: get("proc_misc").unwrap_or(d.cursor),
        }
    }

    #[inline]
    pub fn hue_color(&self, hue: Hue) -> Color {
        match hue {
            Hue::Red => self.hues[0],
            Hue::Blue => self.hues[1],
            Hue::Green => self.hues[2],
            Hue::Yellow => self.hues[3],
            Hue::Purple => self.hues[4],
            Hue::Neutral => self.neutral,
        }
    }

    #[inline]
    pub fn stroke_color(&self, stroke: Stroke) -> Color {
        match stroke {
            Stroke::Selection => self.selection,
            Stroke::Cursor => self.cursor,
        }
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
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| v * scale)
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?)),
        3 => Ok(Color::Rgb(channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?)),
        _ => Err(invalid()),
    }
}
