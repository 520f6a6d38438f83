//! Event sinks: where records are persisted
//!
//! A sink accepts one record per call and may fail. Failures are reported
//! through the returned result; the transport decides what to do with them.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::{validate_table, validate_timeout, SinkConfig, SinkType};
use crate::error::{TrackerError, TrackerResult};
use crate::record::EventRecord;

/// Append-only event store
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Sink name (for logging)
    fn name(&self) -> &str;

    /// Persist one record
    async fn insert(&self, record: &EventRecord) -> TrackerResult<()>;
}

/// Build the sink selected by configuration
pub fn build_sink(config: &SinkConfig) -> TrackerResult<Arc<dyn EventSink>> {
    let sink: Arc<dyn EventSink> = match config.sink_type {
        SinkType::Memory => Arc::new(MemorySink::new()),
        SinkType::Log => Arc::new(LogSink),
        SinkType::File => {
            let path = config.file_path.clone().ok_or_else(|| {
                TrackerError::Config("file sink requires sink.file_path".to_string())
            })?;
            Arc::new(JsonlSink::new(path)?)
        }
        SinkType::Rest => Arc::new(RestSink::from_config(config)?),
    };
    Ok(sink)
}

/// In-memory sink
///
/// Keeps every record it receives. Useful for tests and for hosts that
/// drain records themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<Vec<EventRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far, in arrival order
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
    }
}

#[async_trait]
impl EventSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, record: &EventRecord) -> TrackerResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| TrackerError::Internal("memory sink lock poisoned".to_string()))?;
        records.push(record.clone());
        Ok(())
    }
}

/// Sink that only writes to the diagnostic log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn insert(&self, record: &EventRecord) -> TrackerResult<()> {
        let details = serde_json::to_string(&record.details)?;
        tracing::info!(
            target: "activity",
            user_id = %record.actor,
            activity_type = %record.activity_type,
            page = %record.page,
            details = %details,
            screen_width = record.device.screen_width,
            screen_height = record.device.screen_height,
            "activity recorded"
        );
        Ok(())
    }
}

/// JSON lines file sink
///
/// Appends one line per record: the wire shape plus `created_at`, the time
/// `track` was called.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlSink {
    /// Create a sink writing to `path`, creating parent directories
    pub fn new<P: Into<PathBuf>>(path: P) -> TrackerResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[derive(Serialize)]
struct StoredLine<'a> {
    #[serde(flatten)]
    record: &'a EventRecord,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl EventSink for JsonlSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn insert(&self, record: &EventRecord) -> TrackerResult<()> {
        let mut line = serde_json::to_vec(&StoredLine {
            record,
            created_at: record.occurred_at,
        })?;
        line.push(b'\n');

        // One writer at a time so lines never interleave
        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Hosted backend sink
///
/// Inserts one row per record through the backend's REST interface:
/// `POST {base_url}/rest/v1/{table}`.
#[derive(Debug, Clone)]
pub struct RestSink {
    endpoint: String,
    timeout_ms: u64,
    http_client: reqwest::Client,
}

impl RestSink {
    /// Create from sink configuration
    pub fn from_config(config: &SinkConfig) -> TrackerResult<Self> {
        let base_url = config
            .rest_url
            .as_deref()
            .ok_or_else(|| TrackerError::Config("rest sink requires sink.rest_url".to_string()))?;
        Self::new(base_url, config.api_key.as_deref(), &config.table, config.timeout_ms)
    }

    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        table: &str,
        timeout_ms: u64,
    ) -> TrackerResult<Self> {
        validate_table(table)?;
        validate_timeout(timeout_ms)?;

        let mut headers = HeaderMap::new();
        headers.insert("prefer", HeaderValue::from_static("return=minimal"));
        if let Some(key) = api_key {
            let invalid =
                |_| TrackerError::Config("api key is not a valid header value".to_string());
            headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid)?);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| TrackerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            timeout_ms,
            http_client,
        })
    }

    /// Full insert URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventSink for RestSink {
    fn name(&self) -> &str {
        "rest"
    }

    async fn insert(&self, record: &EventRecord) -> TrackerResult<()> {
        let body = serde_json::to_vec(record)?;

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TrackerError::Timeout(self.timeout_ms)
                } else {
                    TrackerError::from(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(TrackerError::SinkRejected {
            status: status.as_u16(),
            message,
        })
    }
}
