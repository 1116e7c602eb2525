//! Column catalog for the results table.
//!
//! Every column the dialog can show is declared once in [`catalog`]; the
//! user's [`DisplayPreferences`] pick which of them are built.

use std::fmt;
use std::str::FromStr;

use crate::config::DisplayPreferences;
use crate::format::format_metric;
use crate::models::{MetricGetter, ResultRecord};

/// Produces the display text of a metadata field.
pub type TextGetter = fn(&ResultRecord) -> String;

/// Where a column's cell text comes from.
#[derive(Clone, Copy)]
enum Accessor {
    /// 1-based storage position of the record.
    Position,
    Text(TextGetter),
    Metric(MetricGetter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnId {
    Index,
    Artist,
    Album,
    Title,
    Duration,
    Year,
    Genre,
    Format,
    Channels,
    BitDepth,
    Bitrate,
    SampleRate,
    MomentaryMax,
    ShortTermMax,
    Integrated,
    Rms,
    SamplePeak,
    TruePeak,
    Psr,
    Plr,
    CrestFactor,
    LoudnessRange,
    DynamicRange,
    AlbumDynamicRange,
    PureDynamics,
    AlbumPureDynamics,
}

impl ColumnId {
    pub const ALL: [ColumnId; 26] = [
        ColumnId::Index,
        ColumnId::Artist,
        ColumnId::Album,
        ColumnId::Title,
        ColumnId::Duration,
        ColumnId::Year,
        ColumnId::Genre,
        ColumnId::Format,
        ColumnId::Channels,
        ColumnId::BitDepth,
        ColumnId::Bitrate,
        ColumnId::SampleRate,
        ColumnId::MomentaryMax,
        ColumnId::ShortTermMax,
        ColumnId::Integrated,
        ColumnId::Rms,
        ColumnId::SamplePeak,
        ColumnId::TruePeak,
        ColumnId::Psr,
        ColumnId::Plr,
        ColumnId::CrestFactor,
        ColumnId::LoudnessRange,
        ColumnId::DynamicRange,
        ColumnId::AlbumDynamicRange,
        ColumnId::PureDynamics,
        ColumnId::AlbumPureDynamics,
    ];

    /// Stable key used in settings files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            ColumnId::Index => "index",
            ColumnId::Artist => "artist",
            ColumnId::Album => "album",
            ColumnId::Title => "title",
            ColumnId::Duration => "duration",
            ColumnId::Year => "year",
            ColumnId::Genre => "genre",
            ColumnId::Format => "format",
            ColumnId::Channels => "channels",
            ColumnId::BitDepth => "bit_depth",
            ColumnId::Bitrate => "bitrate",
            ColumnId::SampleRate => "sample_rate",
            ColumnId::MomentaryMax => "momentary_max",
            ColumnId::ShortTermMax => "short_term_max",
            ColumnId::Integrated => "integrated",
            ColumnId::Rms => "rms",
            ColumnId::SamplePeak => "sample_peak",
            ColumnId::TruePeak => "true_peak",
            ColumnId::Psr => "psr",
            ColumnId::Plr => "plr",
            ColumnId::CrestFactor => "crest_factor",
            ColumnId::LoudnessRange => "loudness_range",
            ColumnId::DynamicRange => "dynamic_range",
            ColumnId::AlbumDynamicRange => "album_dynamic_range",
            ColumnId::PureDynamics => "pure_dynamics",
            ColumnId::AlbumPureDynamics => "album_pure_dynamics",
        }
    }

    fn shown(self, prefs: &DisplayPreferences) -> bool {
        match self {
            ColumnId::Index => prefs.index,
            ColumnId::Artist => prefs.artist,
            ColumnId::Album => prefs.album,
            ColumnId::Title => prefs.title,
            ColumnId::Duration => prefs.duration,
            ColumnId::Year => prefs.year,
            ColumnId::Genre => prefs.genre,
            ColumnId::Format => prefs.format,
            ColumnId::Channels => prefs.channels,
            ColumnId::BitDepth => prefs.bit_depth,
            ColumnId::Bitrate => prefs.bitrate,
            ColumnId::SampleRate => prefs.sample_rate,
            ColumnId::MomentaryMax => prefs.momentary_max,
            ColumnId::ShortTermMax => prefs.short_term_max,
            ColumnId::Integrated => prefs.integrated,
            ColumnId::Rms => prefs.rms,
            ColumnId::SamplePeak => prefs.sample_peak,
            ColumnId::TruePeak => prefs.true_peak,
            ColumnId::Psr => prefs.psr,
            ColumnId::Plr => prefs.plr,
            ColumnId::CrestFactor => prefs.crest_factor,
            ColumnId::LoudnessRange => prefs.loudness_range,
            ColumnId::DynamicRange => prefs.dynamic_range,
            ColumnId::AlbumDynamicRange => prefs.album_dynamic_range,
            ColumnId::PureDynamics => prefs.pure_dynamics,
            ColumnId::AlbumPureDynamics => prefs.album_pure_dynamics,
        }
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ColumnId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ColumnId::ALL
            .into_iter()
            .find(|id| id.key() == wanted)
            .ok_or_else(|| format!("unknown column '{}'", s))
    }
}

/// A displayable column bound to its accessors.
#[derive(Clone)]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub name: &'static str,
    pub enabled: bool,
    pub is_index: bool,
    pub is_numeric: bool,
    accessor: Accessor,
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("is_index", &self.is_index)
            .field("is_numeric", &self.is_numeric)
            .finish()
    }
}

impl ColumnDescriptor {
    fn index() -> Self {
        Self {
            id: ColumnId::Index,
            name: "#",
            enabled: true,
            is_index: true,
            is_numeric: false,
            accessor: Accessor::Position,
        }
    }

    fn text(id: ColumnId, name: &'static str, text: TextGetter) -> Self {
        Self {
            id,
            name,
            enabled: true,
            is_index: false,
            is_numeric: false,
            accessor: Accessor::Text(text),
        }
    }

    fn metric(id: ColumnId, name: &'static str, getter: MetricGetter) -> Self {
        Self {
            id,
            name,
            enabled: true,
            is_index: false,
            is_numeric: true,
            accessor: Accessor::Metric(getter),
        }
    }

    /// Numeric value of this column for `record`; `None` for text columns.
    pub fn value(&self, record: &ResultRecord) -> Option<f64> {
        match self.accessor {
            Accessor::Metric(getter) => Some(getter(record)),
            Accessor::Position | Accessor::Text(_) => None,
        }
    }

    /// Display text for the record stored at `position`.
    pub fn text_of(&self, position: usize, record: &ResultRecord) -> String {
        match self.accessor {
            Accessor::Position => (position + 1).to_string(),
            Accessor::Text(getter) => getter(record),
            Accessor::Metric(getter) => format_metric(getter(record)),
        }
    }

    /// Whether fixed-width output right-aligns this column.
    pub fn right_aligned(&self) -> bool {
        self.is_numeric || self.is_index
    }
}

/// Every column the dialog knows about, in display order.
pub fn catalog() -> Vec<ColumnDescriptor> {
    use ColumnDescriptor as C;
    use ColumnId::*;

    vec![
        C::index(),
        C::text(Artist, "Artist", |r| r.artist.clone()),
        C::text(Album, "Album", |r| r.album.clone()),
        C::text(Title, "Title", |r| r.title.clone()),
        C::text(Duration, "Duration", |r| r.duration.clone()),
        C::text(Year, "Year", |r| r.year.clone()),
        C::text(Genre, "Genre", |r| r.genre.clone()),
        C::text(Format, "Format", |r| r.format.clone()),
        C::text(Channels, "Channels", |r| r.channels.clone()),
        C::text(BitDepth, "Bit depth", |r| r.bit_depth.clone()),
        C::text(Bitrate, "Bitrate", |r| r.bitrate.clone()),
        C::text(SampleRate, "Sample rate", |r| r.sample_rate.clone()),
        C::metric(MomentaryMax, "Momentary max", |r| r.momentary_max),
        C::metric(ShortTermMax, "Short-term max", |r| r.short_term_max),
        C::metric(Integrated, "Integrated", |r| r.integrated),
        C::metric(Rms, "RMS", |r| r.rms),
        C::metric(SamplePeak, "Sample peak", |r| r.sample_peak),
        C::metric(TruePeak, "True peak", |r| r.true_peak),
        C::metric(Psr, "PSR", |r| r.psr),
        C::metric(Plr, "PLR", |r| r.plr),
        C::metric(CrestFactor, "Crest factor", |r| r.crest_factor),
        C::metric(LoudnessRange, "LRA", |r| r.loudness_range),
        C::metric(DynamicRange, "DR", |r| r.dynamic_range),
        C::metric(AlbumDynamicRange, "Album DR", |r| r.album_dynamic_range),
        C::metric(PureDynamics, "PD", |r| r.pure_dynamics),
        C::metric(AlbumPureDynamics, "Album PD", |r| r.album_pure_dynamics),
    ]
}

/// Build the enabled columns, preserving catalog order.
pub fn build_columns(prefs: &DisplayPreferences) -> Vec<ColumnDescriptor> {
    catalog()
        .into_iter()
        .filter(|column| column.id.shown(prefs))
        .collect()
}
