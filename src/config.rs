use crate::api::DEFAULT_API_URL;
use crate::model::{DateRange, MapSelection, SsidFilter};
use std::path::PathBuf;
use std::time::Duration;

/// Auto-refresh period used by the interactive session
pub const AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Startup settings for a dashboard session
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_url: String,
    pub refresh_interval: Duration,
    pub export_dir: PathBuf,
    pub map: MapSelection,
    pub ssid: SsidFilter,
    /// `None` starts on yesterday
    pub dates: Option<DateRange>,
    pub device_id: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            refresh_interval: AUTO_REFRESH_INTERVAL,
            export_dir: PathBuf::from("exports"),
            map: MapSelection::default(),
            ssid: SsidFilter::default(),
            dates: None,
            device_id: None,
        }
    }
}
