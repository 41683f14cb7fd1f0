//! Attributes attached to every stored field.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tc_common::{LatLonGrid, TimeAxis};

use crate::error::{Result, StoreError};

/// Descriptive metadata and coordinates of a stored field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Variable name (e.g. `U300`, `vorticity`, `TC`).
    pub name: String,
    /// Physical units.
    #[serde(default)]
    pub units: String,
    /// Human-readable description.
    #[serde(default)]
    pub long_name: String,
    /// Time coordinate.
    pub time: Vec<NaiveDateTime>,
    /// Latitude coordinate (degrees).
    pub lat: Vec<f64>,
    /// Longitude coordinate (degrees).
    pub lon: Vec<f64>,
    /// Input fingerprint for cached diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, grid: &LatLonGrid, time: &TimeAxis) -> Self {
        Self {
            name: name.into(),
            units: String::new(),
            long_name: String::new(),
            time: time.times.clone(),
            lat: grid.lat.clone(),
            lon: grid.lon.clone(),
            fingerprint: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = long_name.into();
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Serialize into a Zarr attribute map.
    pub fn to_attributes(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(StoreError::invalid_metadata(format!(
                "field metadata serialized to non-object: {}",
                other
            ))),
        }
    }

    /// Deserialize from a Zarr attribute map.
    pub fn from_attributes(attrs: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(attrs.clone()))
            .map_err(|e| StoreError::invalid_metadata(e.to_string()))
    }

    pub fn grid(&self) -> Result<LatLonGrid> {
        Ok(LatLonGrid::new(self.lat.clone(), self.lon.clone())?)
    }

    pub fn time_axis(&self) -> Result<TimeAxis> {
        Ok(TimeAxis::new(self.time.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_attributes_preserve_coordinates() {
        let grid = LatLonGrid::new(vec![-1.0, 0.0, 1.0], vec![0.0, 1.25]).unwrap();
        let start = NaiveDate::from_ymd_opt(1990, 7, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let time = TimeAxis::regular(start, Duration::hours(1), 2);

        let meta = FieldMetadata::new("U300", &grid, &time)
            .with_units("m/s")
            .with_fingerprint("abc");
        let attrs = meta.to_attributes().unwrap();
        assert_eq!(attrs["units"], serde_json::json!("m/s"));

        let restored = FieldMetadata::from_attributes(&attrs).unwrap();
        assert_eq!(restored, meta);
        assert_eq!(restored.grid().unwrap(), grid);
        assert_eq!(restored.time_axis().unwrap(), time);
    }

    #[test]
    fn test_missing_fingerprint_is_omitted() {
        let grid = LatLonGrid::new(vec![0.0], vec![0.0]).unwrap();
        let time = TimeAxis::new(vec![]).unwrap();
        let attrs = FieldMetadata::new("PSL", &grid, &time).to_attributes().unwrap();
        assert!(!attrs.contains_key("fingerprint"));
    }
}
