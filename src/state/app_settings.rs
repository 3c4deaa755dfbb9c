use log::{LevelFilter, debug, warn};
use passmap_core::colors::{ColorLabels, ColorScheme};
use passmap_core::loader::{DEFAULT_ENCODINGS, Encoding};
use passmap_core::pitch::{DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH};
use passmap_core::scene::EventColumns;
use passmap_core::session::VizConfig;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

/// Overrides the settings file location.
pub const CONFIG_ENV: &str = "PASSMAP_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<String>,
    pub responsive: bool,
    pub color_scheme: ColorScheme,
    pub exclude_time: bool,
    pub field_width: f64,
    pub field_height: f64,
    /// Decoding attempts, in order.
    pub encodings: Vec<Encoding>,
    pub columns: EventColumns,
    pub labels: ColorLabels,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            responsive: true,
            color_scheme: ColorScheme::default(),
            exclude_time: true,
            field_width: DEFAULT_FIELD_WIDTH,
            field_height: DEFAULT_FIELD_HEIGHT,
            encodings: DEFAULT_ENCODINGS.to_vec(),
            columns: EventColumns::default(),
            labels: ColorLabels::default(),
        }
    }
}

impl AppSettings {
    /// Read the settings file. A missing file yields defaults; an unreadable or
    /// malformed one yields defaults and a warning.
    pub fn load() -> Self {
        let Some(path) = settings_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    debug!("settings loaded from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("ignoring malformed settings {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!("could not read settings {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(content)?;
        settings.sanitize();
        Ok(settings)
    }

    fn sanitize(&mut self) {
        if !(self.field_width.is_finite() && self.field_width > 0.0) {
            warn!("field_width {} is not usable, using {DEFAULT_FIELD_WIDTH}", self.field_width);
            self.field_width = DEFAULT_FIELD_WIDTH;
        }
        if !(self.field_height.is_finite() && self.field_height > 0.0) {
            warn!("field_height {} is not usable, using {DEFAULT_FIELD_HEIGHT}", self.field_height);
            self.field_height = DEFAULT_FIELD_HEIGHT;
        }
        if self.encodings.is_empty() {
            self.encodings = DEFAULT_ENCODINGS.to_vec();
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level.as_deref().map(LevelFilter::from_str) {
            Some(Ok(level)) => level,
            Some(Err(_)) => {
                warn!("unknown log_level {:?}, using info", self.log_level);
                LevelFilter::Info
            }
            None => LevelFilter::Info,
        }
    }

    pub fn viz_config(&self) -> VizConfig {
        VizConfig {
            responsive: self.responsive,
            color_scheme: self.color_scheme,
            exclude_time: self.exclude_time,
            field_width: self.field_width,
            field_height: self.field_height,
            columns: self.columns.clone(),
            labels: self.labels.clone(),
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    resolve_settings_path(
        std::env::var(CONFIG_ENV).ok(),
        std::env::var("XDG_CONFIG_HOME").ok(),
        std::env::var("HOME").ok(),
    )
}

fn resolve_settings_path(
    explicit: Option<String>,
    xdg_config_home: Option<String>,
    home: Option<String>,
) -> Option<PathBuf> {
    let usable = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    if let Some(path) = usable(explicit) {
        return Some(PathBuf::from(path));
    }
    if let Some(config_dir) = usable(xdg_config_home) {
        return Some(PathBuf::from(config_dir).join("passmap").join("settings.json"));
    }
    usable(home).map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("passmap")
            .join("settings.json")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        assert_eq!(AppSettings::parse("{}").unwrap(), AppSettings::default());
    }

    #[test]
    fn partial_settings_keep_other_defaults() {
        let settings = AppSettings::parse(
            r#"{
                "responsive": false,
                "color_scheme": "classic",
                "encodings": ["utf-8", "cp1252"],
                "columns": { "outcome": "Result" },
                "labels": { "high_keyword": "high" }
            }"#,
        )
        .unwrap();
        assert!(!settings.responsive);
        assert_eq!(settings.color_scheme, ColorScheme::Classic);
        assert_eq!(settings.encodings, vec![Encoding::Utf8, Encoding::Windows1252]);
        assert_eq!(settings.columns.outcome, "Result");
        assert_eq!(settings.columns.height, "Passhöhe");
        assert_eq!(settings.labels.high_keyword, "high");
        assert_eq!(settings.labels.success, "Erfolgreich");
        assert!(settings.exclude_time);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AppSettings::parse("{ responsive: yes").is_err());
        assert!(AppSettings::parse(r#"{"color_scheme": "neon"}"#).is_err());
    }

    #[test]
    fn unusable_dimensions_fall_back() {
        let settings =
            AppSettings::parse(r#"{"field_width": 0, "field_height": -3, "encodings": []}"#)
                .unwrap();
        assert_eq!(settings.field_width, DEFAULT_FIELD_WIDTH);
        assert_eq!(settings.field_height, DEFAULT_FIELD_HEIGHT);
        assert_eq!(settings.encodings, DEFAULT_ENCODINGS.to_vec());
    }

    #[test]
    fn log_level_defaults_to_info() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.level_filter(), LevelFilter::Info);
        settings.log_level = Some("debug".into());
        assert_eq!(settings.level_filter(), LevelFilter::Debug);
        settings.log_level = Some("loud".into());
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn viz_config_carries_settings() {
        let settings = AppSettings { exclude_time: false, field_width: 100.0, ..Default::default() };
        let config = settings.viz_config();
        assert!(!config.exclude_time);
        assert_eq!(config.field_width, 100.0);
        assert_eq!(config.field_height, DEFAULT_FIELD_HEIGHT);
    }

    #[test]
    fn settings_path_precedence() {
        let s = |v: &str| Some(v.to_string());
        assert_eq!(
            resolve_settings_path(s("/tmp/p.json"), s("/xdg"), s("/home/u")),
            Some(PathBuf::from("/tmp/p.json"))
        );
        assert_eq!(
            resolve_settings_path(s(" "), s("/xdg"), s("/home/u")),
            Some(PathBuf::from("/xdg/passmap/settings.json"))
        );
        assert_eq!(
            resolve_settings_path(None, None, s("/home/u")),
            Some(PathBuf::from("/home/u/.config/passmap/settings.json"))
        );
        assert_eq!(resolve_settings_path(None, s(""), None), None);
    }
}
