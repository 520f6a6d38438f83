//! The public tracking entry point

use std::sync::Arc;

use crate::activity::ActivityType;
use crate::config::TrackerConfig;
use crate::environment::{ClientEnvironment, HostEnvironment};
use crate::error::TrackerResult;
use crate::identity::{is_valid_identifier, IdentitySource};
use crate::record::{Details, EventRecord};
use crate::sink::{build_sink, EventSink};
use crate::transport::EventTransport;

/// Records user actions on behalf of the current actor
///
/// Cheap to clone; clones share the identity source, environment and sink.
#[derive(Clone)]
pub struct ActivityTracker {
    identity: Arc<dyn IdentitySource>,
    environment: Arc<dyn ClientEnvironment>,
    transport: EventTransport,
    enabled: bool,
}

impl ActivityTracker {
    /// Create a tracker on the current tokio runtime
    pub fn new(
        identity: Arc<dyn IdentitySource>,
        environment: Arc<dyn ClientEnvironment>,
        sink: Arc<dyn EventSink>,
    ) -> TrackerResult<Self> {
        Ok(Self::with_transport(
            identity,
            environment,
            EventTransport::new(sink)?,
        ))
    }

    /// Create a tracker around an existing transport
    pub fn with_transport(
        identity: Arc<dyn IdentitySource>,
        environment: Arc<dyn ClientEnvironment>,
        transport: EventTransport,
    ) -> Self {
        Self {
            identity,
            environment,
            transport,
            enabled: true,
        }
    }

    /// Wire a tracker from configuration, using the host environment
    ///
    /// Returns the environment too so the host can report navigation and
    /// resizes into it.
    pub fn from_config(
        config: &TrackerConfig,
        identity: Arc<dyn IdentitySource>,
    ) -> TrackerResult<(Self, HostEnvironment)> {
        config.validate()?;
        let environment = HostEnvironment::new(&config.device);
        let sink = build_sink(&config.sink)?;

        let mut tracker = Self::new(identity, Arc::new(environment.clone()), sink)?;
        tracker.enabled = config.enabled;
        Ok((tracker, environment))
    }

    /// Whether `track` does anything at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record an action.
    ///
    /// Returns immediately. Nothing is built or sent when there is no
    /// signed-in actor or the actor id is malformed. Sink failures are
    /// logged by the transport and never reach the caller.
    pub fn track(
        &self,
        activity_type: ActivityType,
        page: Option<&str>,
        details: Option<Details>,
    ) {
        if !self.enabled {
            return;
        }

        let Some(actor) = self.resolve_actor(activity_type) else {
            return;
        };

        let record = EventRecord::build(
            actor,
            activity_type,
            page,
            details,
            self.environment.as_ref(),
        );
        self.transport.emit(record);
    }

    /// The signed-in actor, if there is one with a well-formed id
    pub fn current_actor(&self) -> Option<String> {
        self.identity
            .current_actor_id()
            .filter(|id| is_valid_identifier(id))
    }

    fn resolve_actor(&self, activity_type: ActivityType) -> Option<String> {
        // TODO: report malformed actor ids to the auth layer instead of only a debug line
        match self.identity.current_actor_id() {
            Some(id) if is_valid_identifier(&id) => Some(id),
            Some(_) => {
                tracing::debug!(
                    activity_type = %activity_type,
                    "Skipping activity tracking: invalid user ID"
                );
                None
            }
            None => {
                tracing::debug!(
                    activity_type = %activity_type,
                    "Skipping activity tracking: no user"
                );
                None
            }
        }
    }

    /// Record an action named by its wire string.
    ///
    /// For callers that only have a string. An unrecognized name is an
    /// error and nothing is tracked.
    pub fn track_named(
        &self,
        name: &str,
        page: Option<&str>,
        details: Option<Details>,
    ) -> TrackerResult<()> {
        let activity_type: ActivityType = name.parse()?;
        self.track(activity_type, page, details);
        Ok(())
    }
}

impl std::fmt::Debug for ActivityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityTracker")
            .field("sink", &self.transport.sink_name())
            .field("enabled", &self.enabled)
            .finish()
    }
}
