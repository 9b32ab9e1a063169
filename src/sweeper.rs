use log::{info, trace};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::light::LightDispatcher;
use crate::note::SharedNotes;

/// Periodically drops notes that have not been refreshed within `max_age`
/// and switches the light off when the last one goes.
pub struct ExpirySweeper {
    notes: SharedNotes,
    lights: LightDispatcher,
    period: Duration,
    max_age: Duration,
}

/// Owner of a running sweeper. Dropping it stops the sweeper too.
pub struct SweeperHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the sweeper and waits for any pass in progress to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.task.await;
    }
}

impl ExpirySweeper {
    pub fn new(
        notes: SharedNotes,
        lights: LightDispatcher,
        period: Duration,
        max_age: Duration,
    ) -> Self {
        Self {
            notes,
            lights,
            period,
            max_age,
        }
    }

    /// One pass. Returns whether the light was told to switch off.
    pub async fn sweep(&self, now: Instant) -> bool {
        let went_dark = self
            .notes
            .prune_then(now, self.max_age, || self.lights.turn_off())
            .await;
        if went_dark {
            info!("No notes pressed (timer check)");
        } else {
            trace!("Sweep found nothing new to turn off");
        }
        went_dark
    }

    pub fn spawn(self) -> SweeperHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        self.sweep(Instant::now()).await;
                    }
                }
            }
        });

        SweeperHandle { stop_tx, task }
    }
}
