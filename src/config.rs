use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{MetricGetter, ResultRecord};

/// Which result columns the dialog shows. Every column is independently
/// optional; an absent key in the settings file takes the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPreferences {
    pub index: bool,
    pub artist: bool,
    pub album: bool,
    pub title: bool,
    pub duration: bool,
    pub year: bool,
    pub genre: bool,
    pub format: bool,
    pub channels: bool,
    pub bit_depth: bool,
    pub bitrate: bool,
    pub sample_rate: bool,
    pub momentary_max: bool,
    pub short_term_max: bool,
    pub integrated: bool,
    pub rms: bool,
    pub sample_peak: bool,
    pub true_peak: bool,
    pub psr: bool,
    pub plr: bool,
    pub crest_factor: bool,
    pub loudness_range: bool,
    pub dynamic_range: bool,
    pub album_dynamic_range: bool,
    pub pure_dynamics: bool,
    pub album_pure_dynamics: bool,
}

impl DisplayPreferences {
    /// Every column hidden.
    pub fn none() -> Self {
        Self::with_all(false)
    }

    /// Every column shown.
    pub fn all() -> Self {
        Self::with_all(true)
    }

    fn with_all(on: bool) -> Self {
        Self {
            index: on,
            artist: on,
            album: on,
            title: on,
            duration: on,
            year: on,
            genre: on,
            format: on,
            channels: on,
            bit_depth: on,
            bitrate: on,
            sample_rate: on,
            momentary_max: on,
            short_term_max: on,
            integrated: on,
            rms: on,
            sample_peak: on,
            true_peak: on,
            psr: on,
            plr: on,
            crest_factor: on,
            loudness_range: on,
            dynamic_range: on,
            album_dynamic_range: on,
            pure_dynamics: on,
            album_pure_dynamics: on,
        }
    }
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            year: false,
            genre: false,
            format: false,
            channels: false,
            bit_depth: false,
            bitrate: false,
            sample_rate: false,
            momentary_max: false,
            short_term_max: false,
            psr: false,
            crest_factor: false,
            ..Self::all()
        }
    }
}

/// Tag field names used when writing results back to tracks.
/// An empty name disables that tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSettings {
    pub dynamic_range: String,
    pub album_dynamic_range: String,
    pub pure_dynamics: String,
    pub album_pure_dynamics: String,
    pub loudness_range: String,
    pub integrated: String,
    pub true_peak: String,
    /// Decimal places written into tag values.
    pub precision: usize,
}

impl Default for TagSettings {
    fn default() -> Self {
        Self {
            dynamic_range: "DYNAMIC RANGE".to_string(),
            album_dynamic_range: "ALBUM DYNAMIC RANGE".to_string(),
            pure_dynamics: "PURE DYNAMICS".to_string(),
            album_pure_dynamics: "ALBUM PURE DYNAMICS".to_string(),
            loudness_range: String::new(),
            integrated: String::new(),
            true_peak: String::new(),
            precision: 2,
        }
    }
}

impl TagSettings {
    /// Every configurable tag paired with the metric it stores, disabled
    /// (empty) names included.
    pub fn pairs(&self) -> Vec<(String, MetricGetter)> {
        fn pair(name: &str, getter: MetricGetter) -> (String, MetricGetter) {
            (name.to_string(), getter)
        }
        vec![
            pair(&self.dynamic_range, |r: &ResultRecord| r.dynamic_range),
            pair(&self.album_dynamic_range, |r: &ResultRecord| r.album_dynamic_range),
            pair(&self.pure_dynamics, |r: &ResultRecord| r.pure_dynamics),
            pair(&self.album_pure_dynamics, |r: &ResultRecord| r.album_pure_dynamics),
            pair(&self.loudness_range, |r: &ResultRecord| r.loudness_range),
            pair(&self.integrated, |r: &ResultRecord| r.integrated),
            pair(&self.true_peak, |r: &ResultRecord| r.true_peak),
        ]
    }

    /// Names of the enabled tags, in declaration order.
    pub fn enabled_names(&self) -> Vec<String> {
        self.pairs()
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display: DisplayPreferences,
    pub tags: TagSettings,
}

impl Settings {
    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse settings {}", path.display()))
    }
}
