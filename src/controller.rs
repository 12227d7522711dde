//! Dashboard view-state controller.
//!
//! Owns every piece of mutable dashboard state: the filter controls, the
//! last accepted date range, the response cache and the status panel. A
//! reconciliation cycle is split in three steps so the session can run
//! fetches concurrently with user input:
//!
//! 1. [`Dashboard::begin_cycle`] reads and validates the filters,
//! 2. [`fetch_cycle`] issues the three API reads against one snapshot,
//! 3. [`Dashboard::commit`] writes the cache atomically and re-renders.
//!
//! Commits are applied in the order they arrive. An older cycle finishing
//! after a newer one overwrites it.

use crate::api::{ApiError, DashboardApi};
use crate::cache::{project, ProjectedView, ResponseCache};
use crate::clipboard::Clipboard;
use crate::config::DashboardConfig;
use crate::events::{Effect, UiEvent};
use crate::filters::{read_and_validate, FilterInputs, ValidatedFilters};
use crate::model::{
    CriticalPointRow, DateRange, KpiSummary, LayerVisibility, ViewState, ZoneCollection,
};
use crate::render::{ChartView, MapView};
use crate::status::{self, StatusPanel};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Filter snapshot for one cycle
#[derive(Debug, Clone)]
pub struct CycleRequest {
    pub seq: u64,
    pub is_auto: bool,
    pub filters: ValidatedFilters,
}

#[derive(Debug, Clone)]
pub struct CycleData {
    pub kpis: KpiSummary,
    pub zones: ZoneCollection,
    pub critical_points: Vec<CriticalPointRow>,
}

/// All three reads settled; `Err` holds the first failure
#[derive(Debug)]
pub struct CycleOutcome {
    pub seq: u64,
    pub is_auto: bool,
    pub result: Result<CycleData, ApiError>,
}

/// Issue the three reads concurrently and wait until all of them settle.
pub async fn fetch_cycle<A: DashboardApi + ?Sized>(api: &A, request: CycleRequest) -> CycleOutcome {
    let filters = &request.filters;
    let (kpis, zones, critical_points) = tokio::join!(
        api.kpis(filters),
        api.map_data(filters),
        api.critical_points(filters)
    );

    let result = match (kpis, zones, critical_points) {
        (Ok(kpis), Ok(zones), Ok(critical_points)) => Ok(CycleData {
            kpis,
            zones,
            critical_points,
        }),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => Err(e),
    };

    CycleOutcome {
        seq: request.seq,
        is_auto: request.is_auto,
        result,
    }
}

pub struct Dashboard<A: ?Sized, M, C> {
    api: Arc<A>,
    map: M,
    chart: C,
    clipboard: Clipboard,
    export_dir: PathBuf,
    inputs: FilterInputs,
    last_valid: DateRange,
    layers: LayerVisibility,
    cache: ResponseCache,
    rendered: Option<ProjectedView>,
    status: StatusPanel,
    next_seq: u64,
    last_committed: u64,
}

impl<A, M, C> Dashboard<A, M, C>
where
    A: DashboardApi + ?Sized,
    M: MapView,
    C: ChartView,
{
    pub fn new(api: Arc<A>, mut map: M, chart: C, config: &DashboardConfig) -> Self {
        map.init();
        map.set_view(config.map);

        let dates = config.dates.unwrap_or_else(DateRange::yesterday);
        let inputs = FilterInputs {
            dates,
            ssid: config.ssid,
            device_id: config.device_id.clone().unwrap_or_default(),
            map: config.map,
            dates_invalid: false,
        };

        Self {
            api,
            map,
            chart,
            clipboard: Clipboard::default(),
            export_dir: config.export_dir.clone(),
            inputs,
            last_valid: dates,
            layers: LayerVisibility::default(),
            cache: ResponseCache::default(),
            rendered: None,
            status: StatusPanel::default(),
            next_seq: 0,
            last_committed: 0,
        }
    }

    #[cfg(test)]
    pub fn with_clipboard(mut self, clipboard: Clipboard) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn api(&self) -> Arc<A> {
        self.api.clone()
    }

    pub fn status(&self) -> &StatusPanel {
        &self.status
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    #[cfg(test)]
    pub fn inputs(&self) -> &FilterInputs {
        &self.inputs
    }

    #[cfg(test)]
    pub fn last_valid(&self) -> DateRange {
        self.last_valid
    }

    #[cfg(test)]
    pub fn rendered(&self) -> Option<&ProjectedView> {
        self.rendered.as_ref()
    }

    #[cfg(test)]
    pub fn last_committed(&self) -> u64 {
        self.last_committed
    }

    #[cfg(test)]
    pub fn map_view(&self) -> &M {
        &self.map
    }

    #[cfg(test)]
    pub fn chart_view(&self) -> &C {
        &self.chart
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            dates: self.inputs.dates,
            ssid: self.inputs.ssid,
            device_id: self.inputs.device_id.clone(),
            map: self.inputs.map,
            layers: self.layers,
        }
    }

    /// Read and validate the filters. `None` means validation failed and no
    /// request must be sent.
    pub fn begin_cycle(&mut self, is_auto: bool) -> Option<CycleRequest> {
        if !is_auto {
            self.status.loading = true;
        }

        let (title, style) = status::chart_title(self.inputs.ssid);
        self.status.chart_title = title.to_string();
        self.status.chart_style = style;
        self.chart.set_title(title, style);

        match read_and_validate(&mut self.inputs, &mut self.last_valid) {
            Ok(filters) => {
                self.status.date_info = status::date_status(&filters.range);
                self.status.device_info = status::device_status(filters.device_id.as_deref());

                self.next_seq += 1;
                info!(
                    cycle = self.next_seq,
                    map = %filters.map,
                    ssid = %filters.ssid,
                    tablet = filters.device_id.as_deref().unwrap_or("*"),
                    auto = is_auto,
                    "Starting reconciliation"
                );
                Some(CycleRequest {
                    seq: self.next_seq,
                    is_auto,
                    filters,
                })
            }
            Err(e) => {
                warn!("Rejected filters: {}", e);
                self.status.date_info = status::INVALID_DATES.to_string();
                if !is_auto {
                    self.status.loading = false;
                }
                None
            }
        }
    }

    /// Commit a settled cycle: all three results or none of them.
    pub fn commit(&mut self, outcome: CycleOutcome) {
        if outcome.seq < self.last_committed {
            debug!(
                cycle = outcome.seq,
                newer = self.last_committed,
                "Older cycle overwrites newer data"
            );
        }
        // watermark of the newest cycle ever committed, never moves back
        self.last_committed = self.last_committed.max(outcome.seq);

        match outcome.result {
            Ok(data) => {
                let (good, attention, critical) = data.zones.counts();
                info!(
                    cycle = outcome.seq,
                    good,
                    attention,
                    critical,
                    ranked = data.critical_points.len(),
                    "Committed dashboard data"
                );
                self.cache.store(data.zones, data.critical_points);
                self.status.kpis = Some(data.kpis);
                self.render();
            }
            Err(e) => {
                // previous map and chart stay on screen
                error!(cycle = outcome.seq, "Failed to refresh dashboard: {}", e);
                self.cache.clear();
                self.status.date_info = status::LOAD_FAILED.to_string();
            }
        }

        if !outcome.is_auto {
            self.status.loading = false;
        }
    }

    pub async fn reconcile(&mut self, is_auto: bool) {
        if let Some(request) = self.begin_cycle(is_auto) {
            let outcome = fetch_cycle(self.api.as_ref(), request).await;
            self.commit(outcome);
        }
    }

    /// Re-derive the view from cache and hand it to the renderers
    fn render(&mut self) {
        match project(&self.cache, self.layers) {
            Some(view) => {
                let totals = self.cache.zones.as_ref().map_or((0, 0, 0), ZoneCollection::counts);
                self.map.draw(&view.zones, totals);
                if view.critical_points.is_empty() {
                    self.chart.show_empty(status::NO_CHART_DATA);
                } else {
                    self.chart.draw(&view.critical_points);
                }
                self.rendered = Some(view);
            }
            None => {
                self.map.show_empty(status::NO_CHART_DATA);
                self.chart.show_empty(status::NO_CHART_DATA);
                self.rendered = None;
            }
        }
    }

    /// Handle one user interaction and report what the caller must do next.
    pub fn apply(&mut self, event: UiEvent) -> Effect {
        debug!(?event, "Handling event");
        match event {
            UiEvent::SelectMap(map) => {
                self.inputs.map = map;
                self.map.set_view(map);
                Effect::Reconcile
            }
            UiEvent::SetDates { start, end } => {
                self.inputs.dates = DateRange::new(start, end);
                Effect::Reconcile
            }
            UiEvent::SetSsid(ssid) => {
                self.inputs.ssid = ssid;
                Effect::Reconcile
            }
            UiEvent::SearchDevice(device_id) => {
                self.inputs.device_id = device_id;
                Effect::Reconcile
            }
            UiEvent::ClearDevice => {
                self.inputs.device_id.clear();
                Effect::Reconcile
            }
            UiEvent::ToggleLayer { layer, visible } => {
                self.layers.set(layer, visible);
                self.render();
                Effect::None
            }
            UiEvent::ResetFilters => {
                self.inputs.dates = DateRange::yesterday();
                Effect::Reconcile
            }
            UiEvent::ResetMap => {
                self.map.set_view(self.inputs.map);
                Effect::None
            }
            UiEvent::BarClicked(index) => {
                let location = self
                    .rendered
                    .as_ref()
                    .and_then(|view| view.critical_points.get(index))
                    .and_then(CriticalPointRow::location);
                match location {
                    Some((lat, lon)) => self.map.focus(lat, lon),
                    None => debug!(index, "No location for chart bar"),
                }
                Effect::None
            }
            UiEvent::InspectZone { layer, index } => {
                let zone = self
                    .rendered
                    .as_ref()
                    .and_then(|view| view.zones.layer(layer).get(index));
                match zone {
                    Some(zone) => self.map.show_popup(layer, zone),
                    None => debug!(layer = layer.as_str(), index, "No such zone"),
                }
                Effect::None
            }
            UiEvent::CopyId(id) => Effect::Copy(id),
            UiEvent::Export => Effect::Export,
            UiEvent::Refresh => Effect::Reconcile,
            UiEvent::Help => Effect::ShowHelp,
            UiEvent::Quit => Effect::Quit,
        }
    }

    /// Copy a measurement ID; returns the transient feedback text
    pub fn copy_id(&self, id: &str) -> &'static str {
        match self.clipboard.copy_text(id) {
            Ok(()) => status::COPY_OK,
            Err(e) => {
                warn!("Failed to copy ID {}: {}", id, e);
                status::COPY_FAILED
            }
        }
    }

    /// Filters for the export endpoint: last accepted range plus the current controls
    pub fn export_filters(&self) -> ValidatedFilters {
        let device = self.inputs.device_id.trim();
        ValidatedFilters {
            map: self.inputs.map,
            ssid: self.inputs.ssid,
            range: self.last_valid,
            device_id: (!device.is_empty()).then(|| device.to_string()),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }
}
