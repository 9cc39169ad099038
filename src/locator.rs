use crate::map::{LOCATE_ZOOM, MapSurface, Popup};
use crate::reconciler::popup_text;
use crate::source::{FetchError, TrainSource};
use crate::state::{IconVariant, TrainPosition};
use chrono::{Local, NaiveTime};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Train number {0} not found.")]
    NotFound(String),

    #[error("An error occurred while searching for the train.")]
    Fetch(#[from] FetchError),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocatedTrain {
    #[serde(flatten)]
    pub position: TrainPosition,
    pub icon: IconVariant,
    pub zoom: u8,
}

/// Finds a single train on demand, independently of the poller's markers.
pub struct Locator<S, M: ?Sized> {
    source: Arc<S>,
    surface: Arc<M>,
}

impl<S: TrainSource, M: MapSurface + ?Sized> Locator<S, M> {
    pub fn new(source: Arc<S>, surface: Arc<M>) -> Self {
        Self { source, surface }
    }

    pub async fn locate(&self, train_number: &str) -> Result<LocatedTrain, LocateError> {
        locate(&*self.source, &*self.surface, train_number, Local::now().time()).await
    }
}

/// Fetches a fresh snapshot and, on a match, centers the view on the train
/// and opens its popup. A miss leaves the view untouched.
pub async fn locate<S, M>(
    source: &S,
    surface: &M,
    train_number: &str,
    updated_at: NaiveTime,
) -> Result<LocatedTrain, LocateError>
where
    S: TrainSource,
    M: MapSurface + ?Sized,
{
    let snapshot = source.fetch().await.map_err(|e| {
        error!("Error searching for train: {}", e);
        LocateError::from(e)
    })?;

    let Some(position) = snapshot.find(train_number) else {
        info!(train_number, "Train not found");
        return Err(LocateError::NotFound(train_number.to_string()));
    };

    let center = (position.latitude, position.longitude);
    surface.set_view(center, LOCATE_ZOOM);
    surface.open_popup(Popup {
        position: center,
        content: popup_text(train_number, position.speed, updated_at),
    });

    Ok(LocatedTrain {
        position: position.clone(),
        icon: IconVariant::for_speed(position.speed),
        zoom: LOCATE_ZOOM,
    })
}
