//! Actor identity: validation and sources

use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;

/// Canonical 8-4-4-4-12 hex identifier, any case
static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("identifier pattern is valid")
});

/// Check that a candidate actor id is in canonical UUID textual form.
///
/// Total: any string is a valid input, and a malformed id is a normal
/// `false`, not an error.
pub fn is_valid_identifier(candidate: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(candidate)
}

/// Provider of the current actor's identifier
///
/// Read-only from the tracker's point of view. Implementations should be
/// cheap: this is called once per tracked event.
pub trait IdentitySource: Send + Sync {
    /// The signed-in actor, or `None` for an anonymous session
    fn current_actor_id(&self) -> Option<String>;
}

/// Shared session slot, updated by whatever owns authentication
///
/// Clones share the same slot, so the auth layer can keep one handle and
/// give another to the tracker.
#[derive(Debug, Clone, Default)]
pub struct SessionIdentity {
    current: Arc<RwLock<Option<String>>>,
}

impl SessionIdentity {
    /// Create an anonymous session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session that is already signed in
    pub fn signed_in(actor_id: impl Into<String>) -> Self {
        let session = Self::new();
        session.sign_in(actor_id);
        session
    }

    /// Record the signed-in actor
    pub fn sign_in(&self, actor_id: impl Into<String>) {
        if let Ok(mut current) = self.current.write() {
            *current = Some(actor_id.into());
        }
    }

    /// Clear the signed-in actor
    pub fn sign_out(&self) {
        if let Ok(mut current) = self.current.write() {
            *current = None;
        }
    }
}

impl IdentitySource for SessionIdentity {
    fn current_actor_id(&self) -> Option<String> {
        self.current.read().ok().and_then(|c| c.clone())
    }
}

/// Fixed identity
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn actor(actor_id: impl Into<String>) -> Self {
        Self(Some(actor_id.into()))
    }
}

impl IdentitySource for StaticIdentity {
    fn current_actor_id(&self) -> Option<String> {
        self.0.clone()
    }
}
