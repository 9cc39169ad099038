use crate::state::Marker;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{PoisonError, RwLock};

// Finland
pub const INITIAL_CENTER: (f64, f64) = (63.0, 26.0);
pub const INITIAL_ZOOM: u8 = 6;
pub const LOCATE_ZOOM: u8 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Viewport {
    pub center: (f64, f64),
    pub zoom: u8,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: INITIAL_CENTER,
            zoom: INITIAL_ZOOM,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Popup {
    pub position: (f64, f64),
    pub content: String,
}

/// Display surface the reconciler and locator draw on.
pub trait MapSurface: Send + Sync {
    fn set_view(&self, center: (f64, f64), zoom: u8);
    fn add_marker(&self, marker: &Marker);
    fn update_marker(&self, marker: &Marker);
    fn remove_marker(&self, train_number: u32);
    fn open_popup(&self, popup: Popup);
}

/// Server-side model of the Leaflet map, read by the HTTP routes.
#[derive(Debug, Default)]
pub struct WebMap {
    markers: DashMap<u32, Marker>,
    view: RwLock<Viewport>,
    popup: RwLock<Option<Popup>>,
}

#[derive(Debug, Serialize)]
pub struct ViewState {
    pub viewport: Viewport,
    pub popup: Option<Popup>,
}

impl WebMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers ordered by train number.
    pub fn markers(&self) -> Vec<Marker> {
        let mut markers: Vec<Marker> = self.markers.iter().map(|r| r.value().clone()).collect();
        markers.sort_by_key(|m| m.train_number);
        markers
    }

    #[cfg(test)]
    pub fn marker(&self, train_number: u32) -> Option<Marker> {
        self.markers.get(&train_number).map(|r| r.value().clone())
    }

    pub fn viewport(&self) -> Viewport {
        *self.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn popup(&self) -> Option<Popup> {
        self.popup
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            viewport: self.viewport(),
            popup: self.popup(),
        }
    }
}

impl MapSurface for WebMap {
    fn set_view(&self, center: (f64, f64), zoom: u8) {
        *self.view.write().unwrap_or_else(PoisonError::into_inner) = Viewport { center, zoom };
    }

    fn add_marker(&self, marker: &Marker) {
        self.markers.insert(marker.train_number, marker.clone());
    }

    fn update_marker(&self, marker: &Marker) {
        if let Some(mut existing) = self.markers.get_mut(&marker.train_number) {
            *existing = marker.clone();
        } else {
            self.markers.insert(marker.train_number, marker.clone());
        }
    }

    fn remove_marker(&self, train_number: u32) {
        self.markers.remove(&train_number);
    }

    fn open_popup(&self, popup: Popup) {
        *self.popup.write().unwrap_or_else(PoisonError::into_inner) = Some(popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::IconVariant;

    fn marker(train_number: u32, icon: IconVariant) -> Marker {
        Marker {
            train_number,
            latitude: 61.0,
            longitude: 24.0,
            icon,
            label: format!("Train number: {}", train_number),
        }
    }

    #[test]
    fn test_initial_view_is_finland() {
        let map = WebMap::new();
        assert_eq!(map.viewport(), Viewport { center: (63.0, 26.0), zoom: 6 });
        assert!(map.popup().is_none());
    }

    #[test]
    fn test_marker_lifecycle() {
        let map = WebMap::new();
        map.add_marker(&marker(10, IconVariant::Moving));
        map.add_marker(&marker(3, IconVariant::Stopped));

        let numbers: Vec<u32> = map.markers().iter().map(|m| m.train_number).collect();
        assert_eq!(numbers, vec![3, 10]);

        map.update_marker(&marker(10, IconVariant::Stopped));
        assert_eq!(map.marker(10).unwrap().icon, IconVariant::Stopped);

        map.remove_marker(3);
        assert!(map.marker(3).is_none());
        assert_eq!(map.markers().len(), 1);
    }

    #[test]
    fn test_set_view_and_popup() {
        let map = WebMap::new();
        map.set_view((60.2, 24.9), LOCATE_ZOOM);
        map.open_popup(Popup {
            position: (60.2, 24.9),
            content: "hello".to_string(),
        });

        let state = map.view_state();
        assert_eq!(state.viewport.zoom, 12);
        assert_eq!(state.viewport.center, (60.2, 24.9));
        assert_eq!(state.popup.unwrap().content, "hello");
    }
}
