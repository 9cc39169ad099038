use crate::feed_types::FeatureCollection;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainPosition {
    pub train_number: u32,
    pub latitude: f64,
    pub longitude: f64,
    // km/h
    pub speed: f64,
    pub observed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
}

/// One fetched, immutable set of train positions.
#[derive(Clone, Debug)]
pub struct TrainSnapshot {
    pub fetched_at: DateTime<Utc>,
    positions: Vec<TrainPosition>,
}

impl TrainSnapshot {
    /// Builds a snapshot keeping the last entry for any repeated train number.
    pub fn new(fetched_at: DateTime<Utc>, positions: Vec<TrainPosition>) -> Self {
        let mut index: HashMap<u32, usize> = HashMap::new();
        let mut unique: Vec<TrainPosition> = Vec::with_capacity(positions.len());

        for position in positions {
            match index.get(&position.train_number) {
                Some(&i) => unique[i] = position,
                None => {
                    index.insert(position.train_number, unique.len());
                    unique.push(position);
                }
            }
        }

        Self {
            fetched_at,
            positions: unique,
        }
    }

    pub fn from_feed(doc: FeatureCollection, fetched_at: DateTime<Utc>) -> Self {
        let mut positions = Vec::with_capacity(doc.features.len());

        for feature in doc.features {
            let coordinates = (feature.latitude(), feature.longitude());
            let props = feature.properties.unwrap_or_default();

            let Some(train_number) = props.train_number else {
                warn!("Skipping feature without a train number");
                continue;
            };
            let (Some(latitude), Some(longitude)) = coordinates else {
                warn!(train_number, "Skipping feature without coordinates");
                continue;
            };
            let Some(speed) = props.speed else {
                warn!(train_number, "Skipping feature without speed");
                continue;
            };

            positions.push(TrainPosition {
                train_number,
                latitude,
                longitude,
                speed,
                observed_at: props.timestamp.unwrap_or(fetched_at),
                departure_date: props.departure_date,
            });
        }

        Self::new(fetched_at, positions)
    }

    pub fn positions(&self) -> &[TrainPosition] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Matches on the decimal form of the train number.
    pub fn find(&self, train_number: &str) -> Option<&TrainPosition> {
        self.positions
            .iter()
            .find(|p| p.train_number.to_string() == train_number)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconVariant {
    Moving,
    Stopped,
}

impl IconVariant {
    pub fn for_speed(speed: f64) -> Self {
        if speed > 0.0 {
            IconVariant::Moving
        } else {
            IconVariant::Stopped
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub train_number: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub icon: IconVariant,
    pub label: String,
}

/// Train number -> displayed marker. Owned by the poller and rebuilt from
/// nothing on every start.
#[derive(Debug, Default)]
pub struct MarkerState {
    markers: HashMap<u32, Marker>,
}

impl MarkerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, train_number: u32) -> Option<&Marker> {
        self.markers.get(&train_number)
    }

    pub fn upsert(&mut self, marker: Marker) {
        self.markers.insert(marker.train_number, marker);
    }

    pub fn remove(&mut self, train_number: u32) -> Option<Marker> {
        self.markers.remove(&train_number)
    }

    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.markers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(train_number: u32, speed: f64) -> TrainPosition {
        TrainPosition {
            train_number,
            latitude: 60.0,
            longitude: 25.0,
            speed,
            observed_at: Utc::now(),
            departure_date: None,
        }
    }

    #[test]
    fn test_icon_depends_only_on_speed() {
        assert_eq!(IconVariant::for_speed(0.0), IconVariant::Stopped);
        assert_eq!(IconVariant::for_speed(0.1), IconVariant::Moving);
        assert_eq!(IconVariant::for_speed(120.0), IconVariant::Moving);
        assert_eq!(IconVariant::for_speed(-1.0), IconVariant::Stopped);
    }

    #[test]
    fn test_duplicate_train_numbers_keep_last() {
        let snapshot = TrainSnapshot::new(
            Utc::now(),
            vec![position(1, 10.0), position(2, 0.0), position(1, 50.0)],
        );
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.positions()[0].train_number, 1);
        assert_eq!(snapshot.positions()[0].speed, 50.0);
    }

    #[test]
    fn test_find_compares_decimal_form() {
        let snapshot = TrainSnapshot::new(Utc::now(), vec![position(555, 0.0)]);
        assert!(snapshot.find("555").is_some());
        assert!(snapshot.find("0555").is_none());
        assert!(snapshot.find("999").is_none());
    }

    #[test]
    fn test_from_feed_skips_features_without_coordinates() {
        let json = r#"{"features":[
            {"geometry":{"coordinates":[24.9,60.2]},"properties":{"trainNumber":7,"speed":0}},
            {"geometry":{"coordinates":[24.9]},"properties":{"trainNumber":8,"speed":0}}
        ]}"#;
        let doc: FeatureCollection = serde_json::from_str(json).unwrap();
        let fetched_at = Utc::now();
        let snapshot = TrainSnapshot::from_feed(doc, fetched_at);

        assert_eq!(snapshot.len(), 1);
        let p = &snapshot.positions()[0];
        assert_eq!(p.train_number, 7);
        assert_eq!((p.latitude, p.longitude), (60.2, 24.9));
        assert_eq!(p.observed_at, fetched_at);
    }

    #[test]
    fn test_from_feed_keeps_valid_features_next_to_malformed_ones() {
        let json = r#"{"features":[
            {"geometry":{"coordinates":[24.9,60.2]},"properties":{"trainNumber":7,"speed":30}},
            {"geometry":{"coordinates":[25.0,61.0]},"properties":{"trainNumber":8,"speed":null}},
            {"geometry":null,"properties":{"trainNumber":9,"speed":0}},
            {"geometry":{"coordinates":[25.0,61.0]},"properties":{"speed":10}}
        ]}"#;
        let doc: FeatureCollection = serde_json::from_str(json).unwrap();
        let snapshot = TrainSnapshot::from_feed(doc, Utc::now());

        assert_eq!(snapshot.len(), 1);
        let p = &snapshot.positions()[0];
        assert_eq!(p.train_number, 7);
        assert_eq!(p.speed, 30.0);
    }
}
