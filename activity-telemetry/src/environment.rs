//! Client environment: current location and device snapshot

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::config::DeviceConfig;

/// Snapshot of the client device at emission time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceContext {
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

/// Ambient client state the tracker reads on every event
///
/// Both methods are called per `track` call and must return the state as
/// of that moment. Implementations must not cache snapshots.
pub trait ClientEnvironment: Send + Sync {
    /// Path of the current navigable location, e.g. `/profile`
    fn current_path(&self) -> String;

    /// Fresh device snapshot
    fn device_context(&self) -> DeviceContext;
}

#[derive(Debug, Clone)]
struct ScreenState {
    path: String,
    user_agent: String,
    language: String,
    platform: String,
    width: u32,
    height: u32,
}

impl ScreenState {
    fn snapshot(&self) -> DeviceContext {
        DeviceContext {
            user_agent: self.user_agent.clone(),
            language: self.language.clone(),
            platform: self.platform.clone(),
            screen_width: self.width,
            screen_height: self.height,
        }
    }
}

/// Environment of the process the tracker is embedded in
///
/// Device fields come from [`DeviceConfig`], falling back to what the host
/// reports (`LANG`, target OS and architecture). The embedding application
/// reports navigation and window size changes. Clones share state.
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    state: Arc<RwLock<ScreenState>>,
}

impl HostEnvironment {
    /// Build from configuration
    pub fn new(config: &DeviceConfig) -> Self {
        let user_agent = config.user_agent.clone().unwrap_or_else(|| {
            format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        });
        let language = config
            .language
            .clone()
            .or_else(|| std::env::var("LANG").ok().and_then(|l| normalize_locale(&l)))
            .unwrap_or_else(|| "en-US".to_string());
        let platform = config.platform.clone().unwrap_or_else(|| {
            format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
        });

        Self {
            state: Arc::new(RwLock::new(ScreenState {
                path: "/".to_string(),
                user_agent,
                language,
                platform,
                width: config.screen_width,
                height: config.screen_height,
            })),
        }
    }

    /// Environment with fixed device fields, for tests and headless hosts
    pub fn simulated(path: &str, width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(RwLock::new(ScreenState {
                path: path.to_string(),
                user_agent: "Mozilla/5.0 (X11; Linux x86_64) Simulated".to_string(),
                language: "en-US".to_string(),
                platform: "Linux x86_64".to_string(),
                width,
                height,
            })),
        }
    }

    /// Record a navigation
    pub fn navigate(&self, path: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.path = path.into();
        }
    }

    /// Record a window or display size change
    pub fn resize(&self, width: u32, height: u32) {
        if let Ok(mut state) = self.state.write() {
            state.width = width;
            state.height = height;
        }
    }

    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.user_agent = user_agent.into();
        }
    }

    pub fn set_language(&self, language: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.language = language.into();
        }
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::new(&DeviceConfig::default())
    }
}

impl ClientEnvironment for HostEnvironment {
    fn current_path(&self) -> String {
        self.state
            .read()
            .map(|s| s.path.clone())
            .unwrap_or_else(|_| "/".to_string())
    }

    fn device_context(&self) -> DeviceContext {
        match self.state.read() {
            Ok(state) => state.snapshot(),
            Err(poisoned) => poisoned.into_inner().snapshot(),
        }
    }
}

/// `en_US.UTF-8` -> `en-US`. `C` and `POSIX` carry no language.
fn normalize_locale(raw: &str) -> Option<String> {
    let tag = raw.split(['.', '@']).next().unwrap_or("").trim();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(tag.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("en_US.UTF-8").as_deref(), Some("en-US"));
        assert_eq!(normalize_locale("de_DE@euro").as_deref(), Some("de-DE"));
        assert_eq!(normalize_locale("fr").as_deref(), Some("fr"));
        assert_eq!(normalize_locale("C"), None);
        assert_eq!(normalize_locale("POSIX.UTF-8"), None);
        assert_eq!(normalize_locale(""), None);
    }

    #[test]
    fn test_host_environment_uses_config() {
        let config = DeviceConfig {
            user_agent: Some("HealthDash/2.1".to_string()),
            language: Some("nl-NL".to_string()),
            platform: Some("MacIntel".to_string()),
            screen_width: 1440,
            screen_height: 900,
        };
        let env = HostEnvironment::new(&config);
        let device = env.device_context();

        assert_eq!(device.user_agent, "HealthDash/2.1");
        assert_eq!(device.language, "nl-NL");
        assert_eq!(device.platform, "MacIntel");
        assert_eq!((device.screen_width, device.screen_height), (1440, 900));
        assert_eq!(env.current_path(), "/");
    }

    #[test]
    fn test_host_environment_defaults() {
        let env = HostEnvironment::default();
        let device = env.device_context();

        assert!(device.user_agent.starts_with("activity-telemetry/"));
        assert!(device.platform.contains(std::env::consts::OS));
        assert!(!device.language.is_empty());
    }

    #[test]
    fn test_snapshots_are_independent() {
        let env = HostEnvironment::simulated("/", 1920, 1080);
        let before = env.device_context();
        env.resize(768, 1024);
        let after = env.device_context();

        assert_eq!((before.screen_width, before.screen_height), (1920, 1080));
        assert_eq!((after.screen_width, after.screen_height), (768, 1024));
    }

    #[test]
    fn test_device_context_wire_names() {
        let device = HostEnvironment::simulated("/", 1280, 720).device_context();
        let json = serde_json::to_value(&device).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["language", "platform", "screenHeight", "screenWidth", "userAgent"]
        );
    }
}
