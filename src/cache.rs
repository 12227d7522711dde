//! Last committed server responses and the layer-filtered view derived from them.

use crate::model::{CriticalPointRow, LayerVisibility, Severity, ZoneCollection};

/// Two-slot cache, overwritten (never merged) by each committed cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCache {
    pub zones: Option<ZoneCollection>,
    pub critical_points: Option<Vec<CriticalPointRow>>,
}

impl ResponseCache {
    pub fn store(&mut self, zones: ZoneCollection, critical_points: Vec<CriticalPointRow>) {
        self.zones = Some(zones);
        self.critical_points = Some(critical_points);
    }

    pub fn clear(&mut self) {
        self.zones = None;
        self.critical_points = None;
    }

    pub fn is_populated(&self) -> bool {
        self.zones.is_some() && self.critical_points.is_some()
    }
}

/// What the map and chart renderers actually receive
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedView {
    pub zones: ZoneCollection,
    pub critical_points: Vec<CriticalPointRow>,
}

/// Apply layer visibility to the cached responses.
///
/// Returns `None` when either slot is empty. Hidden zone layers come back
/// empty; hidden severities are zeroed in every row, `total_problems` is
/// recomputed and rows left with no problems are dropped. Row order is
/// the server's ranking.
pub fn project(cache: &ResponseCache, layers: LayerVisibility) -> Option<ProjectedView> {
    let (zones, rows) = match (&cache.zones, &cache.critical_points) {
        (Some(zones), Some(rows)) => (zones, rows),
        _ => return None,
    };

    let mut projected_zones = zones.clone();
    for severity in Severity::ALL {
        if !layers.is_visible(severity) {
            projected_zones.layer_mut(severity).clear();
        }
    }

    let critical_points = rows
        .iter()
        .cloned()
        .map(|mut row| {
            if !layers.critical {
                row.critical_count = 0;
            }
            if !layers.attention {
                row.attention_count = 0;
            }
            row.total_problems = row.critical_count + row.attention_count;
            row
        })
        .filter(|row| row.total_problems > 0)
        .collect();

    Some(ProjectedView {
        zones: projected_zones,
        critical_points,
    })
}
