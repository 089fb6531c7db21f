//! Lazily cached track analysis
//!
//! [`AudioAnalysis`] resolves a track id once, then fetches each analysis
//! field on first access and keeps it until [`AudioAnalysis::refresh_all`].
//!
//! ```
//! use remix::analysis::{mock::MockAnalyzeApi, AudioAnalysis};
//!
//! let api = MockAnalyzeApi::new();
//! let analysis = AudioAnalysis::new("TRABC123", &api).unwrap();
//! analysis.bars().unwrap(); // network fetch
//! analysis.bars().unwrap(); // cached
//! assert_eq!(api.total_fetches(), 1);
//! ```

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::analysis::field::AnalysisField;
use crate::analysis::remote::AnalyzeApi;
use crate::error::{RemixError, Result};

type Slot = Mutex<Option<Value>>;

/// Analysis of one track, fetched field by field and memoized
pub struct AudioAnalysis<A: AnalyzeApi> {
    id: String,
    api: A,
    // Indexed by `AnalysisField::slot`. The lock is held across a fetch so a
    // field never has more than one request in flight.
    fields: [Slot; 14],
}

macro_rules! field_accessors {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            #[doc = concat!("The `", stringify!($name), "` analysis field, fetched on first access")]
            pub fn $name(&self) -> Result<Value> {
                self.get(AnalysisField::$field)
            }
        )*
    };
}

impl<A: AnalyzeApi> AudioAnalysis<A> {
    /// Create an analysis for an audio reference
    ///
    /// A reference that names an existing file or contains a `.` is treated
    /// as something to upload (a path or URL) and the returned track id is
    /// used. Anything else is taken to already be a track id.
    pub fn new(audio: &str, api: A) -> Result<Self> {
        if audio.trim().is_empty() {
            return Err(RemixError::invalid(
                "audio reference must be a filename, URL, or track id",
            ));
        }

        let id = if looks_like_file_or_url(audio) {
            let id = api.upload(audio)?;
            tracing::info!("Uploaded {} for analysis as {}", audio, id);
            id
        } else {
            audio.to_string()
        };

        Ok(Self {
            id,
            api,
            fields: std::array::from_fn(|_| Mutex::new(None)),
        })
    }

    /// Create an analysis from a loosely typed value, such as a manifest entry
    ///
    /// Only JSON strings are accepted.
    pub fn from_value(audio: &Value, api: A) -> Result<Self> {
        match audio {
            Value::String(s) => Self::new(s, api),
            other => Err(RemixError::invalid(format!(
                "audio reference must be a string representing a filename or track id, got {}",
                other
            ))),
        }
    }

    /// Remote track identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Return a field, fetching it over the network if it is not cached yet
    ///
    /// A failed fetch leaves the field unset; the next access tries again.
    pub fn get(&self, field: AnalysisField) -> Result<Value> {
        let mut slot = lock(&self.fields[field.slot()]);
        if let Some(value) = slot.as_ref() {
            return Ok(value.clone());
        }

        let value = self.fetch(field)?;
        *slot = Some(value.clone());
        Ok(value)
    }

    /// Return a field deserialized into `T`
    pub fn get_as<T: DeserializeOwned>(&self, field: AnalysisField) -> Result<T> {
        let value = self.get(field)?;
        Ok(serde_json::from_value(value)?)
    }

    /// The cached value of a field, without touching the network
    pub fn cached(&self, field: AnalysisField) -> Option<Value> {
        lock(&self.fields[field.slot()]).clone()
    }

    pub fn is_cached(&self, field: AnalysisField) -> bool {
        lock(&self.fields[field.slot()]).is_some()
    }

    /// Force every field to be fetched again
    ///
    /// Fields are cleared and re-fetched one at a time in table order. If a
    /// fetch fails the error is returned immediately; that field is left
    /// unset and later fields keep their previous values.
    pub fn refresh_all(&self) -> Result<()> {
        tracing::debug!("Refreshing all analysis fields for {}", self.id);
        for field in AnalysisField::ALL {
            let mut slot = lock(&self.fields[field.slot()]);
            *slot = None;
            *slot = Some(self.fetch(field)?);
        }
        Ok(())
    }

    field_accessors! {
        bars => Bars,
        beats => Beats,
        duration => Duration,
        end_of_fade_in => EndOfFadeIn,
        key => Key,
        loudness => Loudness,
        metadata => Metadata,
        mode => Mode,
        sections => Sections,
        segments => Segments,
        start_of_fade_out => StartOfFadeOut,
        tatums => Tatums,
        tempo => Tempo,
        time_signature => TimeSignature,
    }

    fn fetch(&self, field: AnalysisField) -> Result<Value> {
        tracing::debug!("Fetching analysis field {} for {}", field, self.id);
        self.api.fetch(&self.id, field).map_err(|e| {
            tracing::warn!("Fetching {} for {} failed: {}", field, self.id, e);
            e
        })
    }
}

impl<A: AnalyzeApi> std::fmt::Debug for AudioAnalysis<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached: Vec<&str> = AnalysisField::ALL
            .iter()
            .filter(|field| self.is_cached(**field))
            .map(|field| field.as_str())
            .collect();
        f.debug_struct("AudioAnalysis")
            .field("id", &self.id)
            .field("cached", &cached)
            .finish()
    }
}

fn looks_like_file_or_url(audio: &str) -> bool {
    Path::new(audio).is_file() || audio.contains('.')
}

fn lock(slot: &Slot) -> MutexGuard<'_, Option<Value>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
