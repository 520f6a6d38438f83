//! Page view tracking driven by navigation

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::activity::ActivityType;
use crate::record::Details;
use crate::tracker::ActivityTracker;

/// Route path to human-readable page name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteNames(BTreeMap<String, String>);

impl RouteNames {
    /// Empty table; every page is named by its path
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace a route name
    pub fn with_route(mut self, path: impl Into<String>, name: impl Into<String>) -> Self {
        self.0.insert(path.into(), name.into());
        self
    }

    /// Display name for `path`, or the path itself when unnamed
    pub fn page_name<'a>(&'a self, path: &'a str) -> &'a str {
        self.0.get(path).map(String::as_str).unwrap_or(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RouteNames {
    fn default() -> Self {
        Self::empty()
            .with_route("/", "Dashboard")
            .with_route("/metrics", "Health Metrics")
            .with_route("/vitals", "Vitals")
            .with_route("/trends", "Trends")
            .with_route("/alerts", "Alerts")
            .with_route("/blockchain", "Blockchain")
            .with_route("/profile", "User Profile")
            .with_route("/settings", "Settings")
    }
}

/// Emits `view_page` when the location or the signed-in actor changes
///
/// Hosts call [`on_navigation`](PageViewTracker::on_navigation) on every
/// route change and every auth change. Repeated calls for the same page
/// and actor are ignored.
#[derive(Debug)]
pub struct PageViewTracker {
    tracker: ActivityTracker,
    routes: RouteNames,
    last_seen: Mutex<Option<(String, String)>>,
}

impl PageViewTracker {
    pub fn new(tracker: ActivityTracker, routes: RouteNames) -> Self {
        Self {
            tracker,
            routes,
            last_seen: Mutex::new(None),
        }
    }

    /// Report the current location. Returns whether a page view was sent.
    pub fn on_navigation(&self, path: &str) -> bool {
        if !self.tracker.is_enabled() {
            return false;
        }
        // Signing out forgets the last view, so signing back in on the same
        // page produces a new one.
        let Some(actor) = self.tracker.current_actor() else {
            if let Ok(mut last) = self.last_seen.lock() {
                *last = None;
            }
            return false;
        };

        let seen = (path.to_string(), actor);
        {
            let Ok(mut last) = self.last_seen.lock() else {
                return false;
            };
            if last.as_ref() == Some(&seen) {
                return false;
            }
            *last = Some(seen);
        }

        let mut details = Details::new();
        details.insert("pageName".to_string(), json!(self.routes.page_name(path)));
        self.tracker.track(ActivityType::ViewPage, Some(path), Some(details));
        true
    }
}
