use chrono::{DateTime, Utc};
use serde::Deserialize;

// Every per-feature field is optional so that one malformed entry can be
// skipped without rejecting the whole document.

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    // GeoJSON order: [longitude, latitude]
    #[serde(default)]
    pub coordinates: Option<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    pub train_number: Option<u32>,
    pub speed: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub departure_date: Option<String>,
}

impl Feature {
    fn coordinate(&self, index: usize) -> Option<f64> {
        self.geometry.as_ref()?.coordinates.as_ref()?.get(index).copied()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinate(1)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinate(0)
    }
}
