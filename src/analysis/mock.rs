//! In-memory analysis API for testing
//!
//! Serves canned values without any network access and counts every call,
//! so cache behavior can be verified precisely.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::analysis::field::AnalysisField;
use crate::analysis::remote::AnalyzeApi;
use crate::error::{RemixError, Result};

/// Mock analysis API with per-field call counters and failure injection
pub struct MockAnalyzeApi {
    thing_id: String,
    values: HashMap<AnalysisField, Value>,
    fetch_counts: [AtomicUsize; 14],
    uploads: Mutex<Vec<String>>,
    fetched_ids: Mutex<Vec<String>>,
    failing: Mutex<HashSet<AnalysisField>>,
    fail_upload: AtomicBool,
}

impl MockAnalyzeApi {
    pub fn new() -> Self {
        Self {
            thing_id: "TRMOCK00000000000001".to_string(),
            values: default_values(),
            fetch_counts: Default::default(),
            uploads: Mutex::new(Vec::new()),
            fetched_ids: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            fail_upload: AtomicBool::new(false),
        }
    }

    /// Track id returned by `upload`
    pub fn with_thing_id(mut self, thing_id: impl Into<String>) -> Self {
        self.thing_id = thing_id.into();
        self
    }

    pub fn with_value(mut self, field: AnalysisField, value: Value) -> Self {
        self.values.insert(field, value);
        self
    }

    /// Make every fetch of `field` fail until [`MockAnalyzeApi::recover`] is called
    pub fn fail_field(&self, field: AnalysisField) {
        lock(&self.failing).insert(field);
    }

    pub fn recover(&self, field: AnalysisField) {
        lock(&self.failing).remove(&field);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    /// Number of fetch calls made for `field`, including failed ones
    pub fn fetch_count(&self, field: AnalysisField) -> usize {
        self.fetch_counts[field.slot()].load(Ordering::SeqCst)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetch_counts
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    pub fn upload_count(&self) -> usize {
        lock(&self.uploads).len()
    }

    /// Audio references passed to `upload`, in call order
    pub fn uploads(&self) -> Vec<String> {
        lock(&self.uploads).clone()
    }

    /// Track ids passed to `fetch`, in call order
    pub fn fetched_ids(&self) -> Vec<String> {
        lock(&self.fetched_ids).clone()
    }
}

impl Default for MockAnalyzeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzeApi for MockAnalyzeApi {
    fn upload(&self, audio: &str) -> Result<String> {
        lock(&self.uploads).push(audio.to_string());
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(RemixError::remote("upload", "mock upload failure"));
        }
        Ok(self.thing_id.clone())
    }

    fn fetch(&self, id: &str, field: AnalysisField) -> Result<Value> {
        self.fetch_counts[field.slot()].fetch_add(1, Ordering::SeqCst);
        lock(&self.fetched_ids).push(id.to_string());

        if lock(&self.failing).contains(&field) {
            return Err(RemixError::remote(field.endpoint(), "mock fetch failure"));
        }
        Ok(self.values.get(&field).cloned().unwrap_or(Value::Null))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn default_values() -> HashMap<AnalysisField, Value> {
    let beats: Vec<Value> = (0..8)
        .map(|i| json!({ "start": i as f64 * 0.5, "duration": 0.5, "confidence": 0.9 }))
        .collect();

    HashMap::from([
        (
            AnalysisField::Bars,
            json!([
                { "start": 0.0, "duration": 2.0, "confidence": 0.8 },
                { "start": 2.0, "duration": 2.0, "confidence": 0.7 }
            ]),
        ),
        (AnalysisField::Beats, Value::Array(beats)),
        (AnalysisField::Duration, json!(4.0)),
        (AnalysisField::EndOfFadeIn, json!(0.0)),
        (AnalysisField::Key, json!({ "value": 9, "confidence": 0.6 })),
        (AnalysisField::Loudness, json!(-11.5)),
        (
            AnalysisField::Metadata,
            json!({ "artist": "Mock Artist", "title": "Mock Title", "samplerate": 44100 }),
        ),
        (AnalysisField::Mode, json!({ "value": 1, "confidence": 0.5 })),
        (
            AnalysisField::Sections,
            json!([{ "start": 0.0, "duration": 4.0 }]),
        ),
        (
            AnalysisField::Segments,
            json!([
                { "start": 0.0, "duration": 0.25 },
                { "start": 0.25, "duration": 0.4 }
            ]),
        ),
        (AnalysisField::StartOfFadeOut, json!(3.75)),
        (
            AnalysisField::Tatums,
            json!([{ "start": 0.0, "duration": 0.25 }]),
        ),
        (AnalysisField::Tempo, json!({ "value": 120.0, "confidence": 0.95 })),
        (
            AnalysisField::TimeSignature,
            json!({ "value": 4, "confidence": 1.0 }),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_a_default_value() {
        let mock = MockAnalyzeApi::new();
        for field in AnalysisField::ALL {
            assert!(!mock.fetch("TR1", field).unwrap().is_null(), "{}", field);
        }
        assert_eq!(mock.total_fetches(), AnalysisField::ALL.len());
    }

    #[test]
    fn test_failure_injection_counts_calls() {
        let mock = MockAnalyzeApi::new();
        mock.fail_field(AnalysisField::Tempo);
        assert!(mock.fetch("TR1", AnalysisField::Tempo).is_err());
        mock.recover(AnalysisField::Tempo);
        assert!(mock.fetch("TR1", AnalysisField::Tempo).is_ok());
        assert_eq!(mock.fetch_count(AnalysisField::Tempo), 2);
    }
}
