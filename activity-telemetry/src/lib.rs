//! Activity Telemetry - client-side user activity tracking
//!
//! Records user actions (page views, logins, uploads, wallet connects) as
//! structured events and sends them to an append-only store:
//! - Resolves the current actor from an identity source
//! - Drops events for anonymous or malformed actors
//! - Stamps each event with a fresh device snapshot
//! - Delivers best-effort, without blocking the caller
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     ACTIVITY TRACKER                        │
//! │                                                             │
//! │  track(type, page?, details?)                               │
//! │        │                                                    │
//! │        ▼                                                    │
//! │  ┌─────────────┐  none / malformed                          │
//! │  │  Identity   │──────────────────────► return (no-op)      │
//! │  │  Source     │                                            │
//! │  └─────────────┘                                            │
//! │        │ valid actor                                        │
//! │        ▼                                                    │
//! │  ┌─────────────┐  ◄── Client Environment                    │
//! │  │ EventRecord │      (current path, device snapshot)       │
//! │  └─────────────┘                                            │
//! │        │                                                    │
//! │        ▼                                                    │
//! │  ┌─────────────┐  spawn, return immediately                 │
//! │  │  Transport  │─────────────────────────┐                  │
//! │  └─────────────┘                         ▼                  │
//! │                      ┌──────┬──────┬──────┬──────┐          │
//! │                      │ REST │ File │ Log  │Memory│  sinks   │
//! │                      └──────┴──────┴──────┴──────┘          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use activity_telemetry::{ActivityTracker, ActivityType, SessionIdentity, TrackerConfig};
//!
//! let session = SessionIdentity::new();
//! let config = TrackerConfig::from_file("telemetry.json")?.with_env_overrides()?;
//! let (tracker, environment) = ActivityTracker::from_config(&config, Arc::new(session.clone()))?;
//!
//! session.sign_in(user_id);
//! environment.navigate("/login");
//! tracker.track(ActivityType::Login, None, Some(details));
//! ```

pub mod activity;
pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod identity;
pub mod pages;
pub mod record;
pub mod sink;
pub mod tracker;
pub mod transport;

pub use activity::ActivityType;
pub use config::{DeviceConfig, SinkConfig, SinkType, TrackerConfig};
pub use environment::{ClientEnvironment, DeviceContext, HostEnvironment};
pub use error::{TrackerError, TrackerResult};
pub use identity::{is_valid_identifier, IdentitySource, SessionIdentity, StaticIdentity};
pub use pages::{PageViewTracker, RouteNames};
pub use record::{Details, EventRecord};
pub use sink::{build_sink, EventSink, JsonlSink, LogSink, MemorySink, RestSink};
pub use tracker::ActivityTracker;
pub use transport::EventTransport;
