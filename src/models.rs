use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to a track in the host catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Extracts one numeric metric from a record.
pub type MetricGetter = fn(&ResultRecord) -> f64;

/// Analysis outcome for one track. Metrics that could not be measured hold
/// negative infinity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: TrackId,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub channels: String,
    #[serde(default)]
    pub bit_depth: String,
    #[serde(default)]
    pub bitrate: String,
    #[serde(default)]
    pub sample_rate: String,

    #[serde(with = "metric", default = "metric::missing")]
    pub momentary_max: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub short_term_max: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub integrated: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub rms: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub sample_peak: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub true_peak: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub psr: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub plr: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub crest_factor: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub loudness_range: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub dynamic_range: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub album_dynamic_range: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub pure_dynamics: f64,
    #[serde(with = "metric", default = "metric::missing")]
    pub album_pure_dynamics: f64,
}

impl ResultRecord {
    /// A record with empty metadata and every metric unmeasured.
    pub fn new(id: TrackId) -> Self {
        let missing = f64::NEG_INFINITY;
        Self {
            id,
            artist: String::new(),
            album: String::new(),
            title: String::new(),
            duration: String::new(),
            year: String::new(),
            genre: String::new(),
            format: String::new(),
            channels: String::new(),
            bit_depth: String::new(),
            bitrate: String::new(),
            sample_rate: String::new(),
            momentary_max: missing,
            short_term_max: missing,
            integrated: missing,
            rms: missing,
            sample_peak: missing,
            true_peak: missing,
            psr: missing,
            plr: missing,
            crest_factor: missing,
            loudness_range: missing,
            dynamic_range: missing,
            album_dynamic_range: missing,
            pure_dynamics: missing,
            album_pure_dynamics: missing,
        }
    }
}

/// Timing of the analysis run that produced a set of records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Wall-clock seconds spent analyzing.
    pub processing_secs: f64,
    /// Total duration of the analyzed audio in seconds.
    pub audio_secs: f64,
}

impl AnalysisSummary {
    /// Realtime multiple: seconds of audio analyzed per second of processing.
    pub fn speed(&self) -> f64 {
        if self.processing_secs > 0.0 {
            self.audio_secs / self.processing_secs
        } else {
            0.0
        }
    }

    /// Comment lines describing the run, without prefixes or line endings.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Processing time: {:.2} s", self.processing_secs),
            format!("Processing speed: {:.1}x realtime", self.speed()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub records: Vec<ResultRecord>,
    #[serde(default)]
    pub summary: AnalysisSummary,
}

/// JSON has no infinities; unmeasured metrics travel as `null`.
mod metric {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn missing() -> f64 {
        f64::NEG_INFINITY
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_else(missing))
    }
}
