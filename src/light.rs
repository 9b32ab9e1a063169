use log::{debug, info, warn};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::color::LightState;
use crate::error::LightError;

/// Something that can switch the physical light.
pub trait LightClient: Send + Sync + 'static {
    fn set_color(
        &self,
        rgb: [u8; 3],
        brightness: u8,
    ) -> impl Future<Output = Result<(), LightError>> + Send;

    fn turn_off(&self) -> impl Future<Output = Result<(), LightError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    SetColor(LightState),
    TurnOff,
}

/// Outcome of one light call, handed to whoever watches the report channel.
#[derive(Debug)]
pub struct LightReport {
    pub command: LightCommand,
    pub result: Result<(), LightError>,
}

/// Queues light commands for a single worker task, so callers never wait on
/// the network and the light sees commands in the order they were issued.
#[derive(Debug, Clone)]
pub struct LightDispatcher {
    tx: mpsc::UnboundedSender<LightCommand>,
}

impl LightDispatcher {
    pub fn spawn<L: LightClient>(
        client: L,
        reports: mpsc::UnboundedSender<LightReport>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                let result = match command {
                    LightCommand::SetColor(state) => {
                        client.set_color(state.rgb, state.brightness).await
                    }
                    LightCommand::TurnOff => client.turn_off().await,
                };
                let _ = reports.send(LightReport { command, result });
            }
        });

        (Self { tx }, worker)
    }

    pub fn set_color(&self, state: LightState) {
        self.send(LightCommand::SetColor(state));
    }

    pub fn turn_off(&self) {
        self.send(LightCommand::TurnOff);
    }

    fn send(&self, command: LightCommand) {
        if self.tx.send(command).is_err() {
            warn!("Light worker has stopped, dropping {:?}", command);
        }
    }
}

/// Logs every light report until all dispatchers are gone.
pub async fn log_reports(mut reports: mpsc::UnboundedReceiver<LightReport>) {
    while let Some(report) = reports.recv().await {
        match (report.command, report.result) {
            (LightCommand::SetColor(state), Ok(())) => debug!(
                "Light color changed to {:?} with brightness {}",
                state.rgb, state.brightness
            ),
            (LightCommand::TurnOff, Ok(())) => info!("Light turned off"),
            (LightCommand::SetColor(_), Err(e)) => warn!("Failed to change light color: {e}"),
            (LightCommand::TurnOff, Err(e)) => warn!("Failed to turn off light: {e}"),
        }
    }
}
