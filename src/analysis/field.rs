//! The closed set of analysis fields served by the remote API.

use serde::{Deserialize, Serialize};

/// A track analysis field that is fetched over the network once and cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisField {
    Bars,
    Beats,
    Duration,
    EndOfFadeIn,
    Key,
    Loudness,
    Metadata,
    Mode,
    Sections,
    Segments,
    StartOfFadeOut,
    Tatums,
    Tempo,
    TimeSignature,
}

impl AnalysisField {
    /// Every cached field, in table order
    pub const ALL: [AnalysisField; 14] = [
        AnalysisField::Bars,
        AnalysisField::Beats,
        AnalysisField::Duration,
        AnalysisField::EndOfFadeIn,
        AnalysisField::Key,
        AnalysisField::Loudness,
        AnalysisField::Metadata,
        AnalysisField::Mode,
        AnalysisField::Sections,
        AnalysisField::Segments,
        AnalysisField::StartOfFadeOut,
        AnalysisField::Tatums,
        AnalysisField::Tempo,
        AnalysisField::TimeSignature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bars => "bars",
            Self::Beats => "beats",
            Self::Duration => "duration",
            Self::EndOfFadeIn => "end_of_fade_in",
            Self::Key => "key",
            Self::Loudness => "loudness",
            Self::Metadata => "metadata",
            Self::Mode => "mode",
            Self::Sections => "sections",
            Self::Segments => "segments",
            Self::StartOfFadeOut => "start_of_fade_out",
            Self::Tatums => "tatums",
            Self::Tempo => "tempo",
            Self::TimeSignature => "time_signature",
        }
    }

    /// Remote method that serves this field
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Bars => "get_bars",
            Self::Beats => "get_beats",
            Self::Duration => "get_duration",
            Self::EndOfFadeIn => "get_end_of_fade_in",
            Self::Key => "get_key",
            Self::Loudness => "get_loudness",
            Self::Metadata => "get_metadata",
            Self::Mode => "get_mode",
            Self::Sections => "get_sections",
            Self::Segments => "get_segments",
            Self::StartOfFadeOut => "get_start_of_fade_out",
            Self::Tatums => "get_tatums",
            Self::Tempo => "get_tempo",
            Self::TimeSignature => "get_time_signature",
        }
    }

    /// Position of this field in [`AnalysisField::ALL`]
    pub(crate) fn slot(&self) -> usize {
        *self as usize
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == s)
    }
}

impl std::fmt::Display for AnalysisField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
