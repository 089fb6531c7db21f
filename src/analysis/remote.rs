//! Remote analysis API collaborator
//!
//! [`AnalyzeApi`] is the seam between the cache and the network. The HTTP
//! implementation talks to the analysis service; tests use
//! [`MockAnalyzeApi`](crate::analysis::mock::MockAnalyzeApi).

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::analysis::config::AnalyzeConfig;
use crate::analysis::field::AnalysisField;
use crate::error::{RemixError, Result};

/// Operations the analysis cache needs from the remote service
pub trait AnalyzeApi {
    /// Upload a local file or URL for analysis, returning its track id
    fn upload(&self, audio: &str) -> Result<String>;

    /// Fetch a single analysis field for a track id
    fn fetch(&self, id: &str, field: AnalysisField) -> Result<serde_json::Value>;
}

impl<T: AnalyzeApi + ?Sized> AnalyzeApi for &T {
    fn upload(&self, audio: &str) -> Result<String> {
        (**self).upload(audio)
    }

    fn fetch(&self, id: &str, field: AnalysisField) -> Result<serde_json::Value> {
        (**self).fetch(id, field)
    }
}

impl<T: AnalyzeApi + ?Sized> AnalyzeApi for Box<T> {
    fn upload(&self, audio: &str) -> Result<String> {
        (**self).upload(audio)
    }

    fn fetch(&self, id: &str, field: AnalysisField) -> Result<serde_json::Value> {
        (**self).fetch(id, field)
    }
}

/// Extract the track id from an upload response document
///
/// The id is the text of the first `<thingID>` element.
pub fn parse_thing_id(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut in_thing_id = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"thingID" => {
                in_thing_id = true;
            }
            Ok(Event::Text(text)) if in_thing_id => {
                let value = text.unescape().map_err(|e| {
                    RemixError::remote("upload", format!("malformed thingID text: {}", e))
                })?;
                return Ok(value.trim().to_string());
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"thingID" => {
                return Err(RemixError::remote("upload", "thingID element is empty"));
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"thingID" => {
                return Err(RemixError::remote("upload", "thingID element is empty"));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(RemixError::remote(
                    "upload",
                    format!("malformed response XML: {}", e),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Err(RemixError::remote("upload", "response has no thingID element"))
}

/// Analysis API client over blocking HTTP
pub struct HttpAnalyzeApi {
    config: AnalyzeConfig,
    #[cfg(feature = "http")]
    client: reqwest::blocking::Client,
}

impl HttpAnalyzeApi {
    /// Create a client using `REMIX_ANALYZE_*` environment configuration
    pub fn from_env() -> Result<Self> {
        Self::with_config(AnalyzeConfig::from_env())
    }

    #[cfg(feature = "http")]
    pub fn with_config(config: AnalyzeConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RemixError::remote("connect", e.to_string()))?;

        Ok(Self { config, client })
    }

    #[cfg(not(feature = "http"))]
    pub fn with_config(config: AnalyzeConfig) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzeConfig {
        &self.config
    }
}

#[cfg(feature = "http")]
fn map_send_error(operation: &str, timeout_ms: u64, e: reqwest::Error) -> RemixError {
    if e.is_timeout() {
        RemixError::remote(operation, format!("timed out after {}ms", timeout_ms))
    } else if e.is_connect() {
        RemixError::remote(operation, format!("cannot connect: {}", e))
    } else {
        RemixError::remote(operation, e.to_string())
    }
}

/// Multipart body carrying the API key and the file contents
#[cfg(feature = "http")]
fn upload_form(api_key: &str, path: &str) -> Result<reqwest::blocking::multipart::Form> {
    reqwest::blocking::multipart::Form::new()
        .text("api_key", api_key.to_string())
        .file("file", path)
        .map_err(|e| RemixError::remote("upload", format!("cannot read {}: {}", path, e)))
}

#[cfg(feature = "http")]
impl AnalyzeApi for HttpAnalyzeApi {
    fn upload(&self, audio: &str) -> Result<String> {
        let url = self.config.method_url("upload");
        let request = if std::path::Path::new(audio).is_file() {
            tracing::info!("Uploading local file {} for analysis", audio);
            let form = upload_form(&self.config.api_key, audio)?;
            self.client.post(&url).multipart(form)
        } else {
            tracing::info!("Submitting URL {} for analysis", audio);
            self.client.post(&url).form(&[
                ("api_key", self.config.api_key.as_str()),
                ("url", audio),
            ])
        };

        let response = request
            .send()
            .map_err(|e| map_send_error("upload", self.config.timeout_ms, e))?;

        if !response.status().is_success() {
            return Err(RemixError::remote(
                "upload",
                format!("server returned {}", response.status()),
            ));
        }

        let body = response
            .text()
            .map_err(|e| RemixError::remote("upload", e.to_string()))?;
        parse_thing_id(&body)
    }

    fn fetch(&self, id: &str, field: AnalysisField) -> Result<serde_json::Value> {
        let url = self.config.method_url(field.endpoint());
        tracing::debug!("Fetching {} for track {}", field, id);

        let response = self
            .client
            .get(&url)
            .query(&[("id", id), ("api_key", self.config.api_key.as_str())])
            .send()
            .map_err(|e| map_send_error(field.endpoint(), self.config.timeout_ms, e))?;

        if !response.status().is_success() {
            return Err(RemixError::remote(
                field.endpoint(),
                format!("server returned {}", response.status()),
            ));
        }

        response.json::<serde_json::Value>().map_err(|e| {
            RemixError::remote(field.endpoint(), format!("invalid response: {}", e))
        })
    }
}

#[cfg(not(feature = "http"))]
impl AnalyzeApi for HttpAnalyzeApi {
    fn upload(&self, _audio: &str) -> Result<String> {
        Err(RemixError::remote(
            "upload",
            "HTTP support not compiled. Build with --features http",
        ))
    }

    fn fetch(&self, _id: &str, field: AnalysisField) -> Result<serde_json::Value> {
        Err(RemixError::remote(
            field.endpoint(),
            "HTTP support not compiled. Build with --features http",
        ))
    }
}
