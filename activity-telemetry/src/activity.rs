//! Recognized activity kinds

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// The closed set of user actions the tracker records.
///
/// Serialized with the snake_case wire names the activity table expects.
/// Adding a kind means extending this enum; free-form strings are rejected
/// by [`FromStr`](std::str::FromStr).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    // Session
    Login,
    Logout,
    Registration,

    // Navigation
    ViewPage,
    ViewMetrics,
    ViewVitals,
    ViewAlerts,
    ViewBlockchain,

    // Profile and settings
    UpdateProfile,
    UpdateSettings,

    // Files
    UploadFile,
    DownloadFile,
    ExportMedicalHistory,

    // Wallet
    ConnectWallet,
    DisconnectWallet,
}

impl ActivityType {
    /// Every recognized activity, in declaration order
    pub const ALL: [ActivityType; 15] = [
        ActivityType::Login,
        ActivityType::Logout,
        ActivityType::Registration,
        ActivityType::ViewPage,
        ActivityType::ViewMetrics,
        ActivityType::ViewVitals,
        ActivityType::ViewAlerts,
        ActivityType::ViewBlockchain,
        ActivityType::UpdateProfile,
        ActivityType::UpdateSettings,
        ActivityType::UploadFile,
        ActivityType::DownloadFile,
        ActivityType::ExportMedicalHistory,
        ActivityType::ConnectWallet,
        ActivityType::DisconnectWallet,
    ];

    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Login => "login",
            ActivityType::Logout => "logout",
            ActivityType::Registration => "registration",
            ActivityType::ViewPage => "view_page",
            ActivityType::ViewMetrics => "view_metrics",
            ActivityType::ViewVitals => "view_vitals",
            ActivityType::ViewAlerts => "view_alerts",
            ActivityType::ViewBlockchain => "view_blockchain",
            ActivityType::UpdateProfile => "update_profile",
            ActivityType::UpdateSettings => "update_settings",
            ActivityType::UploadFile => "upload_file",
            ActivityType::DownloadFile => "download_file",
            ActivityType::ExportMedicalHistory => "export_medical_history",
            ActivityType::ConnectWallet => "connect_wallet",
            ActivityType::DisconnectWallet => "disconnect_wallet",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActivityType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| TrackerError::UnknownActivityType(s.to_string()))
    }
}
