use crate::dropdown::TrainDropdown;
use crate::map::MapSurface;
use crate::reconciler::{ReconcilePlan, reconcile};
use crate::source::TrainSource;
use crate::state::MarkerState;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Owns the marker state and drives one reconciliation per tick.
pub struct Poller<S, M: ?Sized> {
    source: Arc<S>,
    surface: Arc<M>,
    dropdown: Arc<TrainDropdown>,
    markers: MarkerState,
}

impl<S, M> Poller<S, M>
where
    S: TrainSource + 'static,
    M: MapSurface + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, surface: Arc<M>, dropdown: Arc<TrainDropdown>) -> Self {
        Self {
            source,
            surface,
            dropdown,
            markers: MarkerState::new(),
        }
    }

    pub fn markers(&self) -> &MarkerState {
        &self.markers
    }

    /// Runs a single cycle. On a failed fetch the markers are left as they
    /// were and the dropdown is rebuilt from them; returns `None`.
    pub async fn poll_once(&mut self) -> Option<ReconcilePlan> {
        match self.source.fetch().await {
            Ok(snapshot) => {
                let plan = reconcile(
                    &mut self.markers,
                    &snapshot,
                    &*self.surface,
                    &self.dropdown,
                    Local::now().time(),
                );
                info!(
                    trains = snapshot.len(),
                    fetched_at = %snapshot.fetched_at,
                    added = plan.to_add.len(),
                    removed = plan.to_remove.len(),
                    "Data updated at {}",
                    Local::now().format("%H:%M:%S")
                );
                Some(plan)
            }
            Err(e) => {
                error!("Error fetching train data: {}", e);
                self.dropdown.rebuild(self.markers.keys());
                None
            }
        }
    }

    /// Polls immediately, then every `period` until the handle is stopped.
    pub fn start(mut self, period: Duration) -> PollerHandle<S, M> {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Fetching train data every {} seconds...", period.as_secs());

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        self.poll_once().await;
                    }
                }
            }

            info!("Poller stopped");
            self
        });

        PollerHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Dropping the handle also stops the poller.
pub struct PollerHandle<S, M: ?Sized> {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Poller<S, M>>,
}

impl<S, M: ?Sized> PollerHandle<S, M> {
    /// Stops the schedule after any in-flight cycle and hands the poller back.
    pub async fn stop(mut self) -> Result<Poller<S, M>, tokio::task::JoinError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.await
    }
}
