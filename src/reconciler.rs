use crate::dropdown::TrainDropdown;
use crate::map::MapSurface;
use crate::state::{IconVariant, Marker, MarkerState, TrainPosition, TrainSnapshot};
use chrono::NaiveTime;
use std::collections::HashSet;
use tracing::debug;

/// Train numbers classified by how a snapshot changes the marker set.
/// Each list is sorted ascending.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_add: Vec<u32>,
    pub to_update: Vec<u32>,
    pub to_remove: Vec<u32>,
}

pub fn plan(previous_keys: &HashSet<u32>, snapshot: &TrainSnapshot) -> ReconcilePlan {
    let mut result = ReconcilePlan::default();
    let mut seen = HashSet::with_capacity(snapshot.len());

    for position in snapshot.positions() {
        seen.insert(position.train_number);
        if previous_keys.contains(&position.train_number) {
            result.to_update.push(position.train_number);
        } else {
            result.to_add.push(position.train_number);
        }
    }

    result.to_remove = previous_keys
        .iter()
        .filter(|k| !seen.contains(k))
        .copied()
        .collect();

    result.to_add.sort_unstable();
    result.to_update.sort_unstable();
    result.to_remove.sort_unstable();
    result
}

pub fn popup_text(train_number: impl std::fmt::Display, speed: f64, updated_at: NaiveTime) -> String {
    format!(
        "Train number: {}<br>Speed: {} km/h<br>Location updated at {}",
        train_number,
        speed,
        updated_at.format("%H:%M:%S")
    )
}

pub fn marker_for(position: &TrainPosition, updated_at: NaiveTime) -> Marker {
    Marker {
        train_number: position.train_number,
        latitude: position.latitude,
        longitude: position.longitude,
        icon: IconVariant::for_speed(position.speed),
        label: popup_text(position.train_number, position.speed, updated_at),
    }
}

/// Applies `snapshot` to the marker state and the map surface, then rebuilds
/// the dropdown from the resulting keys.
pub fn reconcile<M: MapSurface + ?Sized>(
    markers: &mut MarkerState,
    snapshot: &TrainSnapshot,
    surface: &M,
    dropdown: &TrainDropdown,
    updated_at: NaiveTime,
) -> ReconcilePlan {
    let previous: HashSet<u32> = markers.keys().collect();
    let result = plan(&previous, snapshot);

    for position in snapshot.positions() {
        let marker = marker_for(position, updated_at);
        if markers.get(position.train_number).is_some() {
            surface.update_marker(&marker);
        } else {
            surface.add_marker(&marker);
        }
        markers.upsert(marker);
    }

    for train_number in &result.to_remove {
        surface.remove_marker(*train_number);
        markers.remove(*train_number);
    }

    dropdown.rebuild(markers.keys());

    debug!(
        added = result.to_add.len(),
        updated = result.to_update.len(),
        removed = result.to_remove.len(),
        "Reconciled snapshot"
    );

    result
}
