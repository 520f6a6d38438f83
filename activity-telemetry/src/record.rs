//! Event records and their construction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::activity::ActivityType;
use crate::environment::{ClientEnvironment, DeviceContext};

/// Free-form event details. Values are restricted to JSON.
pub type Details = Map<String, Value>;

/// One tracked action, in the shape the activity table stores it
///
/// Serializes field-exact to
/// `{user_id, activity_type, page, details, device_info, ip_address}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Validated actor id
    #[serde(rename = "user_id")]
    pub actor: String,

    pub activity_type: ActivityType,

    pub page: String,

    #[serde(default)]
    pub details: Details,

    #[serde(rename = "device_info")]
    pub device: DeviceContext,

    /// Filled in by the sink from the observed network origin. Always
    /// `None` when the record leaves this crate.
    #[serde(rename = "ip_address", default)]
    pub origin_address: Option<String>,

    /// When `track` was called. Not part of the wire shape; the remote
    /// store stamps its own creation time. Logged by the transport and
    /// written as `created_at` by the file sink.
    #[serde(skip, default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,
}

impl EventRecord {
    /// Assemble a record from caller input and the current environment.
    ///
    /// `actor` is taken as already validated. A missing `page` resolves to
    /// the environment's current path, missing `details` to an empty map.
    /// `details` is moved in as-is. The device snapshot is read fresh on
    /// every call.
    pub fn build(
        actor: String,
        activity_type: ActivityType,
        page: Option<&str>,
        details: Option<Details>,
        environment: &dyn ClientEnvironment,
    ) -> Self {
        let page = match page {
            Some(p) => p.to_string(),
            None => environment.current_path(),
        };

        Self {
            actor,
            activity_type,
            page,
            details: details.unwrap_or_default(),
            device: environment.device_context(),
            origin_address: None,
            occurred_at: Utc::now(),
        }
    }

    /// Wire-shape JSON
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
