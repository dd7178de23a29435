//! MusicBrainz API client with rate limiting
//!
//! MusicBrainz etiquette allows one request per second per client. The
//! [`RateLimiter`] gate is constructed once per run and injected, so every
//! request in the process(es) sharing it observes the same interval no
//! matter which endpoint it targets.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// JSON web service base (releases, recordings)
pub const WS2_BASE_URL: &str = "https://musicbrainz.org/ws/2";
/// Linked-data base (per-entity JSON-LD documents)
pub const LOD_BASE_URL: &str = "https://musicbrainz.org";
const USER_AGENT: &str = "cuegraph/0.1.0 (https://github.com/cuegraph/cuegraph)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// One request per second
pub const RATE_LIMIT_MS: u64 = 1000;

/// MusicBrainz client errors
#[derive(Debug, Error)]
pub enum MbError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No MusicBrainz source available for {0}")]
    Unavailable(String),
}

/// Rate gate enforcing a minimum interval between requests
///
/// Shared via `Arc` by everything that talks to MusicBrainz during a run.
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// MusicBrainz API client over both the web service and linked-data surfaces
pub struct MusicBrainzClient {
    http: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    ws2_base: String,
    lod_base: String,
}

impl MusicBrainzClient {
    /// Create a client against the public MusicBrainz endpoints
    pub fn new(rate_limiter: Arc<RateLimiter>) -> Result<Self, MbError> {
        Self::with_endpoints(rate_limiter, WS2_BASE_URL, LOD_BASE_URL)
    }

    /// Create a client against custom endpoints (used by tests)
    pub fn with_endpoints(
        rate_limiter: Arc<RateLimiter>,
        ws2_base: impl Into<String>,
        lod_base: impl Into<String>,
    ) -> Result<Self, MbError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MbError::Network(e.to_string()))?;

        Ok(Self {
            http,
            rate_limiter,
            ws2_base: ws2_base.into(),
            lod_base: lod_base.into(),
        })
    }

    /// Fetch the linked-data release document and normalize its track list
    pub async fn release_document(&self, mbid: &str) -> Result<LodRelease, MbError> {
        let url = format!("{}/release/{}", self.lod_base, mbid);
        let response = self
            .get_checked(&url, Some("application/ld+json"), mbid)
            .await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| MbError::Parse(e.to_string()))?;
        Ok(LodRelease::from_value(&value))
    }

    /// Look up a release on the web service, with recordings and labels
    pub async fn release_lookup(&self, mbid: &str) -> Result<MbRelease, MbError> {
        let url = format!(
            "{}/release/{}?inc=recordings+labels&fmt=json",
            self.ws2_base, mbid
        );
        let response = self.get_checked(&url, None, mbid).await?;
        response
            .json()
            .await
            .map_err(|e| MbError::Parse(e.to_string()))
    }

    /// Look up the works a recording is a performance of
    pub async fn recording_works(&self, mbid: &str) -> Result<Vec<MbWork>, MbError> {
        let url = format!("{}/recording/{}?inc=work-rels&fmt=json", self.ws2_base, mbid);
        let response = self.get_checked(&url, None, mbid).await?;
        let recording: MbRecording = response
            .json()
            .await
            .map_err(|e| MbError::Parse(e.to_string()))?;
        Ok(recording
            .relations
            .into_iter()
            .filter_map(|r| r.work)
            .collect())
    }

    /// Rate-gated GET with common status triage
    async fn get_checked(
        &self,
        url: &str,
        accept: Option<&'static str>,
        what: &str,
    ) -> Result<reqwest::Response, MbError> {
        self.rate_limiter.wait().await;
        debug!(url = %url, "Querying MusicBrainz");

        let mut request = self.http.get(url);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        let response = request
            .send()
            .await
            .map_err(|e| MbError::Network(e.to_string()))?;

        let status = response.status();
        if status == 404 {
            return Err(MbError::NotFound(what.to_string()));
        }
        if status == 503 {
            return Err(MbError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MbError::Api(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

/// MusicBrainz release (web service lookup)
#[derive(Debug, Clone, Deserialize)]
pub struct MbRelease {
    pub id: String,
    pub title: Option<String>,
    /// Release date, possibly partial ("1994" or "1994-03")
    pub date: Option<String>,
    #[serde(rename = "label-info", default)]
    pub label_info: Vec<MbLabelInfo>,
    #[serde(default)]
    pub media: Vec<MbMedium>,
}

/// Label attachment on a release
#[derive(Debug, Clone, Deserialize)]
pub struct MbLabelInfo {
    #[serde(rename = "catalog-number")]
    pub catalog_number: Option<String>,
    pub label: Option<MbLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MbLabel {
    pub id: String,
    pub name: Option<String>,
}

/// One medium (disc) of a release
#[derive(Debug, Clone, Deserialize)]
pub struct MbMedium {
    pub position: Option<u32>,
    #[serde(default)]
    pub tracks: Vec<MbTrack>,
}

/// One track slot on a medium
#[derive(Debug, Clone, Deserialize)]
pub struct MbTrack {
    pub id: String,
    pub position: Option<u32>,
    pub title: Option<String>,
    pub recording: Option<MbRecording>,
}

/// MusicBrainz recording
#[derive(Debug, Clone, Deserialize)]
pub struct MbRecording {
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub relations: Vec<MbRelation>,
}

/// Relation from a recording to another entity
#[derive(Debug, Clone, Deserialize)]
pub struct MbRelation {
    #[serde(rename = "type")]
    pub relation_type: Option<String>,
    pub work: Option<MbWork>,
}

/// MusicBrainz work (musical composition)
#[derive(Debug, Clone, Deserialize)]
pub struct MbWork {
    pub id: String,
    pub title: Option<String>,
}

/// One track from the linked-data release document, normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LodTrack {
    /// Composite position string, "disc.track" on multi-disc releases
    pub number: Option<String>,
    pub title: Option<String>,
    /// Work MBIDs referenced through `recordingOf`
    pub work_ids: Vec<String>,
}

/// Normalized linked-data release document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LodRelease {
    pub tracks: Vec<LodTrack>,
}

impl LodRelease {
    /// Normalize the raw JSON-LD value
    ///
    /// Linked-data values come in singular-or-array form depending on
    /// cardinality, so every access coerces through [`coerce_array`].
    /// Unrecognized shapes degrade to missing fields, never to errors.
    pub fn from_value(value: &Value) -> Self {
        let tracks = coerce_array(value.get("track"))
            .into_iter()
            .map(|track| LodTrack {
                number: field_string(track, "trackNumber"),
                title: field_string(track, "name"),
                work_ids: coerce_array(track.get("recordingOf"))
                    .into_iter()
                    .filter_map(reference_mbid)
                    .collect(),
            })
            .collect();
        Self { tracks }
    }
}

/// View a JSON-LD value as a list: arrays as-is, a lone value as one item
fn coerce_array(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

/// String-or-number field accessor
fn field_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract the MBID from an entity reference (IRI string or `@id` object)
fn reference_mbid(value: &Value) -> Option<String> {
    let iri = match value {
        Value::String(s) => s.as_str(),
        Value::Object(_) => value.get("@id").and_then(Value::as_str)?,
        _ => return None,
    };
    let tail = iri.rsplit('/').next().unwrap_or(iri);
    uuid::Uuid::parse_str(tail).ok().map(|_| tail.to_string())
}
