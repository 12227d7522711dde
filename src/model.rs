use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar date range selected in the filter panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Single-day range covering yesterday in local time
    pub fn yesterday() -> Self {
        let day = Local::now().date_naive() - Duration::days(1);
        Self::new(Some(day), Some(day))
    }

    /// Both bounds, only when both are set
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SsidFilter {
    All,
    #[default]
    MainNetwork,
    Disconnected,
    OtherNetworks,
}

impl SsidFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            SsidFilter::All => "all",
            SsidFilter::MainNetwork => "main_network",
            SsidFilter::Disconnected => "disconnected",
            SsidFilter::OtherNetworks => "other_networks",
        }
    }
}

impl FromStr for SsidFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(SsidFilter::All),
            "main_network" | "main" => Ok(SsidFilter::MainNetwork),
            "disconnected" => Ok(SsidFilter::Disconnected),
            "other_networks" | "other" => Ok(SsidFilter::OtherNetworks),
            other => Err(format!("unknown ssid filter '{}'", other)),
        }
    }
}

impl fmt::Display for SsidFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facility map, also the dataset-scoping key sent to the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapSelection {
    #[default]
    Patio,
    Tmut,
}

impl MapSelection {
    pub fn as_str(self) -> &'static str {
        match self {
            MapSelection::Patio => "patio",
            MapSelection::Tmut => "tmut",
        }
    }

    /// Fixed camera pose shown when the map is selected or reset
    pub fn camera(self) -> CameraPose {
        match self {
            MapSelection::Patio => CameraPose {
                center_lon: -38.811906,
                center_lat: -3.549906,
                zoom: 16.0,
                bearing: 52.0,
                pitch: 0.0,
            },
            MapSelection::Tmut => CameraPose {
                center_lon: -38.797690,
                center_lat: -3.525506,
                zoom: 15.5,
                bearing: 50.0,
                pitch: 0.0,
            },
        }
    }
}

impl FromStr for MapSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patio" => Ok(MapSelection::Patio),
            "tmut" => Ok(MapSelection::Tmut),
            other => Err(format!("unknown map '{}'", other)),
        }
    }
}

impl fmt::Display for MapSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPose {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

/// Zoom level used when flying to a single critical point
pub const FOCUS_ZOOM: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Attention,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Good, Severity::Attention, Severity::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Good => "good",
            Severity::Attention => "attention",
            Severity::Critical => "critical",
        }
    }

    /// Popup heading for a zone of this severity
    pub fn zone_title(self) -> &'static str {
        match self {
            Severity::Good => "Zona de Rede Boa",
            Severity::Attention => "Zona de Rede Média",
            Severity::Critical => "Zona de Rede Ruim",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "good" => Ok(Severity::Good),
            "attention" => Ok(Severity::Attention),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown layer '{}'", other)),
        }
    }
}

/// Client-side display filter, never sent to the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerVisibility {
    pub good: bool,
    pub attention: bool,
    pub critical: bool,
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self {
            good: true,
            attention: true,
            critical: true,
        }
    }
}

impl LayerVisibility {
    pub fn is_visible(&self, severity: Severity) -> bool {
        match severity {
            Severity::Good => self.good,
            Severity::Attention => self.attention,
            Severity::Critical => self.critical,
        }
    }

    pub fn set(&mut self, severity: Severity, visible: bool) {
        match severity {
            Severity::Good => self.good = visible,
            Severity::Attention => self.attention = visible,
            Severity::Critical => self.critical = visible,
        }
    }
}

/// One clustered measurement group, delivered as a GeoJSON point feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(rename = "type", default = "feature_type")]
    pub feature_type: String,
    pub geometry: PointGeometry,
    pub properties: ZoneProperties,
}

fn feature_type() -> String {
    "Feature".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type", default = "point_type")]
    pub geometry_type: String,
    /// GeoJSON order: longitude first
    pub coordinates: [f64; 2],
}

fn point_type() -> String {
    "Point".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Severity>,
    pub point_count: u32,
    pub radius: f64,
    pub opacity: f64,
    #[serde(default)]
    pub point_details: Vec<PointDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDetail {
    pub id: String,
    pub time: String,
    #[serde(default)]
    pub ssid: String,
}

impl Zone {
    pub fn lon(&self) -> f64 {
        self.geometry.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.geometry.coordinates[1]
    }

    pub fn radius(&self) -> f64 {
        self.properties.radius
    }

    pub fn opacity(&self) -> f64 {
        self.properties.opacity
    }

    pub fn point_count(&self) -> u32 {
        self.properties.point_count
    }

    pub fn point_details(&self) -> &[PointDetail] {
        &self.properties.point_details
    }
}

/// Raw `/api/map_data` response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneCollection {
    #[serde(default)]
    pub good_zones: Vec<Zone>,
    #[serde(default)]
    pub attention_zones: Vec<Zone>,
    #[serde(default)]
    pub critical_zones: Vec<Zone>,
}

impl ZoneCollection {
    pub fn layer(&self, severity: Severity) -> &[Zone] {
        match severity {
            Severity::Good => &self.good_zones,
            Severity::Attention => &self.attention_zones,
            Severity::Critical => &self.critical_zones,
        }
    }

    pub fn layer_mut(&mut self, severity: Severity) -> &mut Vec<Zone> {
        match severity {
            Severity::Good => &mut self.good_zones,
            Severity::Attention => &mut self.attention_zones,
            Severity::Critical => &mut self.critical_zones,
        }
    }

    /// Zone counts as (good, attention, critical)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.good_zones.len(),
            self.attention_zones.len(),
            self.critical_zones.len(),
        )
    }
}

/// One ranked grid cell in the "worst locations" chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPointRow {
    pub grid_id: String,
    #[serde(default)]
    pub critical_count: u32,
    #[serde(default)]
    pub attention_count: u32,
    #[serde(default)]
    pub total_problems: u32,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl CriticalPointRow {
    /// Coordinates of the worst measurement in the cell, when the server sent both
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Headline numbers; always fetched fresh, never cached
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KpiSummary {
    #[serde(default)]
    pub total_measurements: u64,
    #[serde(default)]
    pub critical_percentage: f64,
    #[serde(default)]
    pub disconnections: u64,
    #[serde(default)]
    pub worst_tablet: Option<String>,
}

/// Every input that drives a reconciliation cycle
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ViewState {
    pub dates: DateRange,
    pub ssid: SsidFilter,
    pub device_id: String,
    pub map: MapSelection,
    pub layers: LayerVisibility,
}
