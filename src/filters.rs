//! Filter reader and validator.
//!
//! Turns the raw filter controls into the parameter set shared by every
//! API call of a reconciliation cycle.

use crate::model::{DateRange, MapSelection, SsidFilter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// Current state of the filter controls, as the user left them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterInputs {
    pub dates: DateRange,
    pub ssid: SsidFilter,
    pub device_id: String,
    pub map: MapSelection,
    /// Inline invalid styling on both date fields
    pub dates_invalid: bool,
}

/// Accepted filter snapshot; every request of one cycle uses the same copy
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFilters {
    pub map: MapSelection,
    pub ssid: SsidFilter,
    pub range: DateRange,
    pub device_id: Option<String>,
}

impl ValidatedFilters {
    /// Query string shared by `/api/kpis`, `/api/map_data` and `/api/critical_points`
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("map", self.map.as_str().to_string())];
        pairs.extend(self.export_pairs());
        pairs
    }

    /// Query string for `/api/export`, which is not scoped to a map
    pub fn export_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("ssid_filter", self.ssid.as_str().to_string())];
        if let Some((start, end)) = self.range.bounds() {
            pairs.push(("start_date", start.format("%Y-%m-%d").to_string()));
            pairs.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        if let Some(ref device) = self.device_id {
            pairs.push(("tablet_id", device.clone()));
        }
        pairs
    }
}

/// Read the filter controls and accept them, or revert the dates.
///
/// An inverted range puts `last_valid` back into the date fields and flags
/// them invalid; `last_valid` itself is left untouched. On success the
/// accepted range becomes the new `last_valid`.
pub fn read_and_validate(
    inputs: &mut FilterInputs,
    last_valid: &mut DateRange,
) -> Result<ValidatedFilters, ValidationError> {
    if let (Some(start), Some(end)) = (inputs.dates.start, inputs.dates.end) {
        if start > end {
            inputs.dates = *last_valid;
            inputs.dates_invalid = true;
            return Err(ValidationError::InvalidDateRange { start, end });
        }
    }

    inputs.dates_invalid = false;
    *last_valid = inputs.dates;

    let device = inputs.device_id.trim();
    Ok(ValidatedFilters {
        map: inputs.map,
        ssid: inputs.ssid,
        range: inputs.dates,
        device_id: (!device.is_empty()).then(|| device.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    fn inputs(start: &str, end: &str) -> FilterInputs {
        FilterInputs {
            dates: DateRange::new(date(start), date(end)),
            ..FilterInputs::default()
        }
    }

    #[test]
    fn valid_range_updates_last_valid() {
        let mut last_valid = DateRange::new(date("2024-01-01"), date("2024-01-02"));
        for (start, end) in [("2024-03-09", "2024-03-10"), ("2024-03-10", "2024-03-10")] {
            let mut inputs = inputs(start, end);
            let filters = read_and_validate(&mut inputs, &mut last_valid).unwrap();
            assert_eq!(last_valid, DateRange::new(date(start), date(end)));
            assert_eq!(filters.range, last_valid);
            assert!(!inputs.dates_invalid);
        }
    }

    #[test]
    fn inverted_range_reverts_inputs() {
        let previous = DateRange::new(date("2024-03-01"), date("2024-03-02"));
        let mut last_valid = previous;
        let mut inputs = inputs("2024-03-10", "2024-03-09");

        let err = read_and_validate(&mut inputs, &mut last_valid).unwrap_err();

        assert!(matches!(err, ValidationError::InvalidDateRange { .. }));
        assert_eq!(last_valid, previous);
        assert_eq!(inputs.dates, previous);
        assert!(inputs.dates_invalid);
    }

    #[test]
    fn next_valid_read_clears_invalid_flag() {
        let mut last_valid = DateRange::default();
        let mut inputs = inputs("2024-03-10", "2024-03-09");
        assert!(read_and_validate(&mut inputs, &mut last_valid).is_err());

        inputs.dates = DateRange::new(date("2024-03-09"), date("2024-03-10"));
        assert!(read_and_validate(&mut inputs, &mut last_valid).is_ok());
        assert!(!inputs.dates_invalid);
    }

    #[test]
    fn device_id_is_trimmed_and_blank_means_none() {
        let mut last_valid = DateRange::default();
        let mut inputs = FilterInputs {
            device_id: "  TAB-042 ".to_string(),
            ..FilterInputs::default()
        };
        let filters = read_and_validate(&mut inputs, &mut last_valid).unwrap();
        assert_eq!(filters.device_id.as_deref(), Some("TAB-042"));

        inputs.device_id = "   ".to_string();
        let filters = read_and_validate(&mut inputs, &mut last_valid).unwrap();
        assert_eq!(filters.device_id, None);
    }

    #[test]
    fn query_pairs_include_dates_only_when_both_set() {
        let mut last_valid = DateRange::default();
        let mut half = FilterInputs {
            dates: DateRange::new(date("2024-03-09"), None),
            map: MapSelection::Tmut,
            ssid: SsidFilter::Disconnected,
            ..FilterInputs::default()
        };
        let filters = read_and_validate(&mut half, &mut last_valid).unwrap();
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("map", "tmut".to_string()),
                ("ssid_filter", "disconnected".to_string()),
            ]
        );

        let mut full = inputs("2024-03-09", "2024-03-10");
        full.device_id = "TAB-042".to_string();
        let filters = read_and_validate(&mut full, &mut last_valid).unwrap();
        assert_eq!(
            filters.export_pairs(),
            vec![
                ("ssid_filter", "main_network".to_string()),
                ("start_date", "2024-03-09".to_string()),
                ("end_date", "2024-03-10".to_string()),
                ("tablet_id", "TAB-042".to_string()),
            ]
        );
    }
}
