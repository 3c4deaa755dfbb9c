use crate::{EventTable, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const GREEN: Rgb = Rgb(0x00, 0xCD, 0x00);
pub const YELLOW: Rgb = Rgb(0xFF, 0xFF, 0x00);
pub const RED: Rgb = Rgb(0xFF, 0x00, 0x00);
pub const BLUE: Rgb = Rgb(0x00, 0x00, 0xFF);
pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
pub const PITCH_GREEN: Rgb = Rgb(0x03, 0x66, 0x02);

/// Color used for events whose value has no mapping entry.
pub const DEFAULT_EVENT_COLOR: Rgb = GREEN;

/// Quick-pick colors offered when cycling a mapping entry.
pub const PALETTE: [Rgb; 8] = [
    GREEN,
    YELLOW,
    RED,
    BLUE,
    Rgb(0xFF, 0x8C, 0x00),
    Rgb(0x00, 0xBF, 0xFF),
    Rgb(0xFF, 0x00, 0xFF),
    WHITE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Mix `self` over `background` with the given opacity.
    pub fn blend(self, background: Rgb, alpha: f64) -> Rgb {
        let alpha = alpha.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| {
            (f64::from(fg) * alpha + f64::from(bg) * (1.0 - alpha)).round() as u8
        };
        Rgb(
            mix(self.0, background.0),
            mix(self.1, background.1),
            mix(self.2, background.2),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid color '{}': expected #RRGGBB", self.0)
    }
}

impl std::error::Error for ColorParseError {}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

// ---------------------------------------------------------------------------
// Default color schemes
// ---------------------------------------------------------------------------

/// Default colors proposed for recognized outcome values.
///
/// `Coordinates` proposes green for both success and failure; `Classic`
/// proposes blue and red. Anything unrecognized is yellow in both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Coordinates,
    Classic,
}

impl ColorScheme {
    pub fn label(&self) -> &'static str {
        match self {
            ColorScheme::Coordinates => "coordinates",
            ColorScheme::Classic => "classic",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ColorScheme::Coordinates => ColorScheme::Classic,
            ColorScheme::Classic => ColorScheme::Coordinates,
        }
    }

    fn success(&self) -> Rgb {
        match self {
            ColorScheme::Coordinates => GREEN,
            ColorScheme::Classic => BLUE,
        }
    }

    fn failure(&self) -> Rgb {
        match self {
            ColorScheme::Coordinates => GREEN,
            ColorScheme::Classic => RED,
        }
    }
}

/// Recognized outcome labels and the keywords used by the color overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorLabels {
    pub success: String,
    pub failure: String,
    /// Case-insensitive substring marking an unsuccessful outcome.
    pub failure_keyword: String,
    /// Case-insensitive substring marking a high pass.
    pub high_keyword: String,
}

impl Default for ColorLabels {
    fn default() -> Self {
        Self {
            success: "Erfolgreich".to_string(),
            failure: "Nicht erfolgreich".to_string(),
            failure_keyword: "nicht erfolgreich".to_string(),
            high_keyword: "hoch".to_string(),
        }
    }
}

pub fn default_color(value: &Value, scheme: ColorScheme, labels: &ColorLabels) -> Rgb {
    match value.as_text() {
        Some(text) if text == labels.success => scheme.success(),
        Some(text) if text == labels.failure => scheme.failure(),
        _ => YELLOW,
    }
}

// ---------------------------------------------------------------------------
// Per-column mapping
// ---------------------------------------------------------------------------

/// Value -> color assignment for one chosen column. Rebuilt from defaults
/// whenever the column (or scheme) changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMapping {
    pub column: Option<String>,
    pub entries: BTreeMap<Value, Rgb>,
}

impl ColorMapping {
    pub fn build(
        table: &EventTable,
        column: &str,
        scheme: ColorScheme,
        labels: &ColorLabels,
    ) -> Self {
        let Some(idx) = table.column_index(column) else {
            return Self::default();
        };
        let entries = table
            .distinct(idx)
            .into_iter()
            .map(|value| {
                let color = default_color(&value, scheme, labels);
                (value, color)
            })
            .collect();
        Self { column: Some(column.to_string()), entries }
    }

    pub fn get(&self, value: &Value) -> Option<Rgb> {
        self.entries.get(value).copied()
    }

    /// Override one value's color. Values outside the mapping are ignored.
    pub fn set(&mut self, value: &Value, color: Rgb) -> bool {
        match self.entries.get_mut(value) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    /// Step a value's color to the next palette entry.
    pub fn cycle(&mut self, value: &Value) -> Option<Rgb> {
        let current = self.get(value)?;
        let next = PALETTE
            .iter()
            .position(|c| *c == current)
            .map(|i| PALETTE[(i + 1) % PALETTE.len()])
            .unwrap_or(PALETTE[0]);
        self.set(value, next);
        Some(next)
    }

    pub fn values(&self) -> impl Iterator<Item = (&Value, &Rgb)> {
        self.entries.iter()
    }
}

/// Resolve an event's display color.
///
/// Priority: unsuccessful outcome, then high pass, then the user's mapping,
/// then the default event color.
pub fn resolve_color(is_failure: bool, is_high: bool, mapped: Option<Rgb>) -> Rgb {
    if is_failure {
        RED
    } else if is_high {
        YELLOW
    } else {
        mapped.unwrap_or(DEFAULT_EVENT_COLOR)
    }
}
