//! Map and chart widgets.
//!
//! The controller only sees the two traits; the text implementations draw
//! into any writer so the terminal session and the tests share them.

use crate::model::{
    CameraPose, CriticalPointRow, MapSelection, Severity, Zone, ZoneCollection, FOCUS_ZOOM,
};
use std::io::Write;
use tracing::warn;

pub trait MapView {
    fn init(&mut self);
    fn set_view(&mut self, map: MapSelection);
    /// `totals` are the per-layer counts before layer toggles, for the legend
    fn draw(&mut self, zones: &ZoneCollection, totals: (usize, usize, usize));
    fn focus(&mut self, lat: f64, lon: f64);
    fn show_popup(&mut self, severity: Severity, zone: &Zone);
    fn show_empty(&mut self, message: &str);
}

pub trait ChartView {
    fn set_title(&mut self, title: &str, style: &str);
    fn draw(&mut self, rows: &[CriticalPointRow]);
    fn show_empty(&mut self, message: &str);
}

const BAR_WIDTH: usize = 40;

pub struct TextMap<W: Write> {
    out: W,
    camera: CameraPose,
}

impl<W: Write> TextMap<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            camera: MapSelection::default().camera(),
        }
    }

    #[cfg(test)]
    pub fn camera(&self) -> CameraPose {
        self.camera
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!("Failed to write map output: {}", e);
        }
    }
}

impl<W: Write> MapView for TextMap<W> {
    fn init(&mut self) {
        self.camera = MapSelection::default().camera();
        let camera = self.camera;
        self.emit(&format!(
            "[mapa] inicializado em ({:.6}, {:.6}) zoom {}",
            camera.center_lat, camera.center_lon, camera.zoom
        ));
    }

    fn set_view(&mut self, map: MapSelection) {
        self.camera = map.camera();
        let camera = self.camera;
        self.emit(&format!(
            "[mapa] {}: centro ({:.6}, {:.6}) zoom {} rotação {}°",
            map, camera.center_lat, camera.center_lon, camera.zoom, camera.bearing
        ));
    }

    fn draw(&mut self, zones: &ZoneCollection, totals: (usize, usize, usize)) {
        let (good, attention, critical) = totals;
        self.emit("───────────────────────────────────────────────────────────────────");
        self.emit(&format!(
            "  Zonas  boas: {:>4}   atenção: {:>4}   críticas: {:>4}",
            good, attention, critical
        ));
        self.emit("───────────────────────────────────────────────────────────────────");
        for severity in [Severity::Critical, Severity::Attention, Severity::Good] {
            for (index, zone) in zones.layer(severity).iter().enumerate() {
                self.emit(&format!(
                    "  {:<9} #{:<3} ({:.6}, {:.6})  raio {:>4.0}  opacidade {:.2}  medições {}",
                    severity.as_str(),
                    index,
                    zone.lat(),
                    zone.lon(),
                    zone.radius(),
                    zone.opacity(),
                    zone.point_count()
                ));
            }
        }
    }

    fn focus(&mut self, lat: f64, lon: f64) {
        // bearing is kept from the current view
        self.camera.center_lat = lat;
        self.camera.center_lon = lon;
        self.camera.zoom = FOCUS_ZOOM;
        self.emit(&format!(
            "[mapa] foco em ({:.6}, {:.6}) zoom {}",
            lat, lon, FOCUS_ZOOM
        ));
    }

    fn show_popup(&mut self, severity: Severity, zone: &Zone) {
        self.emit(&format!("  {}", severity.zone_title()));
        self.emit(&format!("  Medições Agrupadas: {}", zone.point_count()));
        for detail in zone.point_details() {
            self.emit(&format!("    {}, {}, {}", detail.id, detail.time, detail.ssid));
        }
    }

    fn show_empty(&mut self, message: &str) {
        self.emit(&format!("[mapa] {}", message));
    }
}

pub struct TextChart<W: Write> {
    out: W,
}

impl<W: Write> TextChart<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!("Failed to write chart output: {}", e);
        }
    }
}

impl<W: Write> ChartView for TextChart<W> {
    fn set_title(&mut self, title: &str, style: &str) {
        self.emit(&format!("{} [{}]", title, style));
    }

    fn draw(&mut self, rows: &[CriticalPointRow]) {
        let max_total = rows.iter().map(|r| r.total_problems).max().unwrap_or(0).max(1);
        self.emit("  Ranking dos Piores Locais        (█ Críticos  ▒ Atenção)");
        for (index, row) in rows.iter().enumerate() {
            let scale = |count: u32| (count as usize * BAR_WIDTH) / max_total as usize;
            let bar = format!(
                "{}{}",
                "█".repeat(scale(row.critical_count)),
                "▒".repeat(scale(row.attention_count))
            );
            self.emit(&format!(
                "  {:>2}. {:<16} {:<width$} {} + {}",
                index + 1,
                row.grid_id,
                bar,
                row.critical_count,
                row.attention_count,
                width = BAR_WIDTH
            ));
            self.emit(&format!("      Total de Problemas: {}", row.total_problems));
        }
    }

    fn show_empty(&mut self, message: &str) {
        self.emit(&format!("[gráfico] {}", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PointDetail, PointGeometry, ZoneProperties};

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn focus_keeps_bearing_and_zooms_in() {
        let mut map = TextMap::new(Vec::new());
        map.set_view(MapSelection::Tmut);
        map.focus(-3.52, -38.79);
        let camera = map.camera();
        assert_eq!(camera.zoom, FOCUS_ZOOM);
        assert_eq!(camera.bearing, 50.0);
        assert_eq!(camera.center_lat, -3.52);
    }

    #[test]
    fn popup_lists_every_measurement() {
        let zone = Zone {
            feature_type: "Feature".to_string(),
            geometry: PointGeometry {
                geometry_type: "Point".to_string(),
                coordinates: [-38.8, -3.5],
            },
            properties: ZoneProperties {
                status: Some(Severity::Attention),
                point_count: 2,
                radius: 15.0,
                opacity: 0.54,
                point_details: vec![
                    PointDetail {
                        id: "abc".to_string(),
                        time: "09:00:01".to_string(),
                        ssid: "2G_6qmzayp".to_string(),
                    },
                    PointDetail {
                        id: "def".to_string(),
                        time: "09:00:31".to_string(),
                        ssid: "disconnected".to_string(),
                    },
                ],
            },
        };
        let mut map = TextMap::new(Vec::new());
        map.show_popup(Severity::Attention, &zone);
        let out = text(map.into_inner());
        assert!(out.contains("Zona de Rede Média"));
        assert!(out.contains("Medições Agrupadas: 2"));
        assert!(out.contains("def, 09:00:31, disconnected"));
    }

    #[test]
    fn legend_counts_hidden_layers() {
        let zone = Zone {
            feature_type: "Feature".to_string(),
            geometry: PointGeometry {
                geometry_type: "Point".to_string(),
                coordinates: [-38.8, -3.5],
            },
            properties: ZoneProperties {
                status: Some(Severity::Good),
                point_count: 1,
                radius: 10.0,
                opacity: 0.4,
                point_details: Vec::new(),
            },
        };
        let visible = ZoneCollection {
            good_zones: vec![zone],
            ..ZoneCollection::default()
        };
        let mut map = TextMap::new(Vec::new());
        map.draw(&visible, (1, 2, 3));
        let out = text(map.into_inner());
        assert!(out.contains("boas:    1   atenção:    2   críticas:    3"));
        assert!(!out.contains("attention #"));
    }

    #[test]
    fn chart_scales_to_largest_row() {
        let rows = vec![
            CriticalPointRow {
                grid_id: "g1".to_string(),
                critical_count: 3,
                attention_count: 1,
                total_problems: 4,
                lat: None,
                lon: None,
            },
            CriticalPointRow {
                grid_id: "g2".to_string(),
                critical_count: 0,
                attention_count: 2,
                total_problems: 2,
                lat: None,
                lon: None,
            },
        ];
        let mut chart = TextChart::new(Vec::new());
        chart.draw(&rows);
        let out = text(chart.into_inner());
        assert!(out.contains(&"█".repeat(30)));
        assert!(out.contains(&"▒".repeat(20)));
        assert!(out.contains("Total de Problemas: 4"));
    }
}
